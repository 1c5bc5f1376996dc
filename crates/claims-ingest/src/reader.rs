//! Raw CSV reading with Polars.

use std::path::Path;

use polars::prelude::{Column as PlColumn, CsvReadOptions, DataFrame, DataType, SerReader};

use crate::error::{IngestError, Result};

/// Check that the input exists and is readable.
pub fn check_input(path: &Path) -> Result<()> {
    std::fs::metadata(path).map(|_| ()).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Read a delimited file with every column as text.
///
/// Schema inference is disabled so that identifiers such as postal codes keep
/// their leading zeros; typing happens afterwards in [`coerce`](crate::coerce).
pub fn read_raw_table(path: &Path, delimiter: u8, max_rows: Option<usize>) -> Result<DataFrame> {
    check_input(path)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(max_rows)
        .map_parse_options(|opts| opts.with_separator(delimiter))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_shape(&df, path)?;
    Ok(df)
}

/// Reject empty frames and blank header cells.
fn validate_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    if df
        .get_column_names()
        .iter()
        .any(|name| name.trim().is_empty())
    {
        return Err(IngestError::EmptyColumnName {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Cells of a Polars column as optional strings.
pub fn column_cells(column: &PlColumn) -> Result<Vec<Option<String>>> {
    let series = column
        .cast(&DataType::String)
        .map(PlColumn::take_materialized_series)?;
    let values = series.str()?;
    Ok(values
        .into_iter()
        .map(|cell| cell.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_keeps_text() {
        let file = create_temp_csv("PostalCode,TotalClaims\n0122,0\n2000,150.5\n");
        let df = read_raw_table(file.path(), b',', None).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);

        let postal = column_cells(df.column("PostalCode").unwrap()).unwrap();
        assert_eq!(postal, vec![Some("0122".to_string()), Some("2000".to_string())]);
    }

    #[test]
    fn test_read_pipe_delimited() {
        let file = create_temp_csv("A|B\n1|x\n");
        let df = read_raw_table(file.path(), b'|', None).unwrap();
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_read_max_rows() {
        let file = create_temp_csv("A\n1\n2\n3\n");
        let df = read_raw_table(file.path(), b',', Some(2)).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = create_temp_csv("A,B\n");
        let result = read_raw_table(file.path(), b',', None);
        assert!(matches!(
            result,
            Err(IngestError::EmptyCsv { .. } | IngestError::CsvParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = read_raw_table(Path::new("/nonexistent/claims.csv"), b',', None);
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}

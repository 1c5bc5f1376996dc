//! Conversion of the raw pipe-delimited extract to CSV.

use std::path::Path;

use tracing::info;

use crate::error::{IngestError, Result};

/// Rewrite a delimited text file as comma-separated CSV.
///
/// Returns the number of data records written (header excluded).
pub fn convert_delimited(input: &Path, output: &Path, delimiter: u8) -> Result<usize> {
    crate::reader::check_input(input)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(input)
        .map_err(|source| IngestError::Convert {
            path: input.to_path_buf(),
            record: 0,
            source,
        })?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IngestError::FileWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut writer = csv::Writer::from_path(output).map_err(|source| IngestError::Convert {
        path: output.to_path_buf(),
        record: 0,
        source,
    })?;

    let mut records = 0usize;
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| IngestError::Convert {
            path: input.to_path_buf(),
            record: index,
            source,
        })?;
        writer
            .write_record(record.iter().map(str::trim))
            .map_err(|source| IngestError::Convert {
                path: output.to_path_buf(),
                record: index,
                source,
            })?;
        records += 1;
    }
    writer.flush().map_err(|source| IngestError::FileWrite {
        path: output.to_path_buf(),
        source,
    })?;

    let data_records = records.saturating_sub(1);
    info!(
        input = %input.display(),
        output = %output.display(),
        records = data_records,
        "converted delimited extract"
    );
    Ok(data_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn converts_pipe_to_comma() {
        let mut input = NamedTempFile::new().unwrap();
        write!(input, "PolicyID|Province|TotalClaims\n1|Gauteng|0\n2|Western Cape, North|12.5\n").unwrap();
        let dir = tempdir().unwrap();
        let output = dir.path().join("out/claims.csv");

        let written = convert_delimited(input.path(), &output, b'|').unwrap();
        assert_eq!(written, 2);

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "PolicyID,Province,TotalClaims\n1,Gauteng,0\n2,\"Western Cape, North\",12.5\n"
        );
    }

    #[test]
    fn missing_input() {
        let dir = tempdir().unwrap();
        let result = convert_delimited(&dir.path().join("nope.txt"), &dir.path().join("o.csv"), b'|');
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}

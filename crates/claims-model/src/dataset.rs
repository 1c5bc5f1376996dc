//! In-memory table of typed columns.

use std::collections::HashSet;

use crate::column::{Column, ColumnData, ColumnKind};
use crate::error::{DataError, Result};

/// Ordered collection of equally long, uniquely named columns.
///
/// Every column holds exactly [`height`](Dataset::height) values; the
/// constructors and mutators reject anything that would break this.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    height: usize,
}

impl Dataset {
    /// Build a dataset, rejecting ragged or duplicate columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(DataError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
            if column.len() != height {
                return Err(DataError::LengthMismatch {
                    column: column.name().to_string(),
                    expected: height,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, height })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.get_column(name).ok_or_else(|| DataError::ColumnNotFound {
            column: name.to_string(),
        })
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| DataError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Look up a column and check its kind.
    pub fn column_of_kind(&self, name: &str, kind: ColumnKind) -> Result<&Column> {
        let column = self.column(name)?;
        if column.kind() != kind {
            return Err(DataError::KindMismatch {
                column: name.to_string(),
                expected: kind,
                found: column.kind(),
            });
        }
        Ok(column)
    }

    /// Append a column, or replace the existing column with the same name.
    pub fn upsert_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.height {
            return Err(DataError::LengthMismatch {
                column: column.name().to_string(),
                expected: self.height,
                found: column.len(),
            });
        }
        if self.columns.is_empty() {
            self.height = column.len();
        }
        match self.columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Replace the values of an existing column, keeping its position.
    pub fn replace_data(&mut self, name: &str, data: ColumnData) -> Result<()> {
        if data.len() != self.height {
            return Err(DataError::LengthMismatch {
                column: name.to_string(),
                expected: self.height,
                found: data.len(),
            });
        }
        *self.column_mut(name)?.data_mut() = data;
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let index = self.columns.iter().position(|c| c.name() == name)?;
        let removed = self.columns.remove(index);
        if self.columns.is_empty() {
            self.height = 0;
        }
        Some(removed)
    }

    /// New dataset holding the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&row) = rows.iter().find(|&&row| row >= self.height) {
            return Err(DataError::RowOutOfBounds {
                row,
                height: self.height,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name(), c.data().take(rows)))
            .collect();
        Ok(Self {
            columns,
            height: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::numeric("TotalClaims", vec![Some(0.0), Some(120.0), None]),
            Column::categorical("Province", vec![Some("Gauteng"), None, Some("Limpopo")]),
        ])
        .unwrap()
    }

    #[test]
    fn construction_checks_shape() {
        let ds = sample();
        assert_eq!(ds.height(), 3);
        assert_eq!(ds.width(), 2);
        assert_eq!(ds.column_names(), vec!["TotalClaims", "Province"]);

        let ragged = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(matches!(ragged, Err(DataError::LengthMismatch { .. })));

        let duplicate = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("a", vec![Some(2.0)]),
        ]);
        assert_eq!(
            duplicate,
            Err(DataError::DuplicateColumn {
                column: "a".to_string()
            })
        );
    }

    #[test]
    fn lookup_by_kind() {
        let ds = sample();
        assert!(ds.column_of_kind("TotalClaims", ColumnKind::Numeric).is_ok());
        assert!(matches!(
            ds.column_of_kind("Province", ColumnKind::Numeric),
            Err(DataError::KindMismatch { .. })
        ));
        assert!(matches!(
            ds.column("Gender"),
            Err(DataError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn upsert_and_drop() {
        let mut ds = sample();
        ds.upsert_column(Column::boolean("HasClaim", vec![Some(false), Some(true), None]))
            .unwrap();
        assert_eq!(ds.width(), 3);
        assert!(ds.upsert_column(Column::numeric("x", vec![Some(1.0)])).is_err());

        ds.upsert_column(Column::numeric("TotalClaims", vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();
        assert_eq!(ds.width(), 3);
        assert_eq!(ds.column_names()[0], "TotalClaims");

        assert!(ds.drop_column("Province").is_some());
        assert!(ds.drop_column("Province").is_none());
    }

    #[test]
    fn take_rows_preserves_schema() {
        let ds = sample();
        let subset = ds.take_rows(&[2, 0]).unwrap();
        assert_eq!(subset.height(), 2);
        assert_eq!(
            subset.column("Province").unwrap().data().label(0).as_deref(),
            Some("Limpopo")
        );
        assert!(matches!(
            ds.take_rows(&[5]),
            Err(DataError::RowOutOfBounds { row: 5, height: 3 })
        ));
    }
}

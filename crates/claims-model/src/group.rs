use serde::{Deserialize, Serialize};

/// Labeled subset of a dataset, selected by equality on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Partition field the group was selected on.
    pub field: String,
    /// Value of `field` shared by every row in the group.
    pub label: String,
    /// Row indices into the source dataset, ascending.
    pub rows: Vec<usize>,
}

impl Group {
    pub fn new(field: impl Into<String>, label: impl Into<String>, rows: Vec<usize>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Control and test arms of an A/B comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    pub control: Group,
    pub test: Group,
}

impl Segmentation {
    pub fn field(&self) -> &str {
        &self.control.field
    }

    pub fn groups(&self) -> [&Group; 2] {
        [&self.control, &self.test]
    }
}

//! Raw tabular text extracted from a results document

use serde::{Deserialize, Serialize};

use crate::models::{ColumnMapping, Field};

/// One data row as split from the source text
///
/// Rows may carry fewer (or more) cells than the header row. Reads go through
/// [`RawRow::cell`], which reports out-of-range and blank cells as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    /// Trimmed cell at `index`, or `None` if out of range or blank
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.0
            .get(index)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Cell holding `field` under `mapping`
    pub fn field(&self, mapping: &ColumnMapping, field: Field) -> Option<&str> {
        mapping.get(field).and_then(|index| self.cell(index))
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every cell is blank
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|c| c.trim().is_empty())
    }
}

impl From<Vec<String>> for RawRow {
    fn from(cells: Vec<String>) -> Self {
        Self(cells)
    }
}

impl From<Vec<&str>> for RawRow {
    fn from(cells: Vec<&str>) -> Self {
        Self(cells.into_iter().map(str::to_string).collect())
    }
}

/// Header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

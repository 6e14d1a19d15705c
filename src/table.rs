use polars::prelude::*;
use serde::Serialize;

use crate::schema::trip;

/// Which optional columns a dataset carries.
///
/// Computed once from the CSV header. A column that is present but has null
/// cells still counts as present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DatasetCapabilities {
    pub has_gender: bool,
    pub has_birth_year: bool,
}

impl DatasetCapabilities {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            has_gender: schema.contains(trip::GENDER),
            has_birth_year: schema.contains(trip::BIRTH_YEAR),
        }
    }

    /// Gender and birth-year statistics are reported together or not at all.
    pub fn has_demographics(&self) -> bool {
        self.has_gender && self.has_birth_year
    }
}

/// Trip rows left after month/day filtering, with derived columns attached.
#[derive(Debug, Clone)]
pub struct FilteredTable {
    frame: DataFrame,
    capabilities: DatasetCapabilities,
}

impl FilteredTable {
    pub(crate) fn new(frame: DataFrame, capabilities: DatasetCapabilities) -> Self {
        Self {
            frame,
            capabilities,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn capabilities(&self) -> DatasetCapabilities {
        self.capabilities
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Up to `len` rows starting at `offset`. Empty once `offset` is past the end.
    pub fn page(&self, offset: usize, len: usize) -> DataFrame {
        let offset = offset.min(self.height());
        self.frame.slice(offset as i64, len)
    }
}

//! Result table output port trait.

use crate::domain::error::TsbatchError;
use crate::domain::table::CombinedTable;
use std::path::Path;

/// Port for writing the combined metric table.
pub trait ResultPort {
    /// Write the whole table or nothing.
    fn write(&self, table: &CombinedTable, path: &Path) -> Result<(), TsbatchError>;
}

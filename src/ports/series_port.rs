//! Raw series access port trait.

use crate::domain::error::TsbatchError;
use crate::domain::raw_series::RawSeries;

pub trait SeriesPort {
    /// Read one source. Fails with `MissingColumn` when either the date or the
    /// value column is absent.
    fn load(
        &self,
        source: &str,
        date_column: &str,
        value_column: &str,
    ) -> Result<RawSeries, TsbatchError>;
}

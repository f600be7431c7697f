//! Configuration access port trait.

use crate::domain::error::TsbatchError;

/// Read access to `[section] key = value` settings.
///
/// Missing keys fall back to `default`; present keys that do not parse are
/// errors rather than silently replaced.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TsbatchError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TsbatchError>;
}

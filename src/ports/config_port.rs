//! Configuration access port trait.

use std::path::PathBuf;

pub trait ConfigPort {
    /// Trimmed value; blank values read as missing.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_path(&self, section: &str, key: &str) -> Option<PathBuf>;
}

//! Report generation port trait.

use crate::domain::analysis::ReportRow;
use crate::domain::error::SmacrossError;
use std::path::Path;

/// Port for writing the per-instrument summary table.
pub trait ReportPort {
    fn write(&self, rows: &[ReportRow], output_path: &Path) -> Result<(), SmacrossError>;
}

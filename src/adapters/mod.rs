//! Concrete adapter implementations for ports.

pub mod chart_svg;
pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod datayes_adapter;
pub mod file_config_adapter;

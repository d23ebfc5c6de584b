//! Port traits for collaborator boundaries.

pub mod config_port;
pub mod history_port;
pub mod report_port;

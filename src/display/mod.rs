// src/display/mod.rs
//! Status output

pub mod report;

pub use report::{ReportFormat, StatusReport, StatusReporter};

//! Episode and batch report output.

mod json_report;

pub use json_report::{JsonReportWriter, ReportError};

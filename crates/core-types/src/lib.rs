pub mod error;
pub mod schemas;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use schemas::{BinCreate, NewBin, NewReport, ReportCreate};
pub use structs::{
    Bin, BinWithReports, Coordinates, Report, REPORT_STATUS_DONE, REPORT_STATUS_FULL,
};

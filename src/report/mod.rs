//! Report module - CSV reports, run summary and run export

pub mod run_report;
pub mod summary;
pub mod writer;

pub use run_report::*;
pub use summary::*;
pub use writer::*;

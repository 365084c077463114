//! Pipeline module - loading, cohort selection and descriptive statistics

pub mod categorical;
pub mod cohort;
pub mod columns;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod loader;
pub mod numeric;
pub mod orchestrator;

pub use categorical::*;
pub use cohort::*;
pub use columns::*;
pub use config::*;
pub use dictionary::*;
pub use error::*;
pub use loader::*;
pub use numeric::*;
pub use orchestrator::*;

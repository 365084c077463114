//! cohortstats: descriptive statistics reports for clinical cohorts
//!
//! Loads preop and intraop cohort tables, splits them by time window and
//! outcome label, and writes one CSV of numeric or categorical summaries per
//! combination.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;

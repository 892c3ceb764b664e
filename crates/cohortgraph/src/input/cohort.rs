//! Cohort identifiers attached to every edge of a run.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{CohortGraphError, Result};

/// Format of the run timestamp embedded in cohort identifiers and file names.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Identifies one cohort extract within one run:
/// `{dataset_id}|{dataset_name}|{year}|{run_timestamp}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortId {
    pub dataset_id: String,
    pub dataset_name: String,
    pub year: String,
    pub run_timestamp: String,
}

impl CohortId {
    /// Create an identifier from its parts.
    pub fn new(
        dataset_id: impl Into<String>,
        dataset_name: impl Into<String>,
        year: impl Into<String>,
        run_timestamp: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            dataset_name: dataset_name.into(),
            year: year.into(),
            run_timestamp: run_timestamp.into(),
        }
    }

    /// Build an identifier for a cohort file stem.
    ///
    /// The year is taken from `year` when given, otherwise from the first
    /// `_`-separated segment of the stem that is a four-digit number
    /// (e.g. `Asthma_UNC_PEGS_patient_2010_v4_binned` gives `2010`).
    pub fn from_stem(
        stem: &str,
        dataset_name: &str,
        year: Option<&str>,
        run_started: DateTime<Local>,
    ) -> Result<Self> {
        let year = match year {
            Some(y) => y.to_string(),
            None => detect_year(stem).ok_or_else(|| {
                CohortGraphError::Config(format!(
                    "cannot determine cohort year from '{}'; pass it explicitly",
                    stem
                ))
            })?,
        };

        Ok(Self::new(
            stem,
            dataset_name,
            year,
            run_started.format(RUN_TIMESTAMP_FORMAT).to_string(),
        ))
    }
}

impl fmt::Display for CohortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.dataset_id, self.dataset_name, self.year, self.run_timestamp
        )
    }
}

fn detect_year(stem: &str) -> Option<String> {
    stem.split('_')
        .find(|seg| seg.len() == 4 && seg.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

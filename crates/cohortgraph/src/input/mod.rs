//! Cohort extract loading.

mod cohort;
mod parser;
mod source;

pub use cohort::{CohortId, RUN_TIMESTAMP_FORMAT};
pub use parser::{Parser, ParserConfig};
pub use source::{CohortSource, DataTable};

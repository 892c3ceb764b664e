//! Feature schema and per-column discretization rules.

mod column;
mod feature;
mod label;

pub use column::{resolve_columns, ColumnInfo, Discretization, FeatureDescription, FeatureQualifier};
pub use feature::{FeatureSchema, FeatureSchemaEntry, NameLookup, DEFAULT_SECTION};
pub use label::{normalize_value, sort_labels, Label, Threshold, ThresholdDirection};

//! Turning raw cohort values into discrete codes.

mod encoder;
mod matcher;

pub use encoder::{EncodedColumn, EncodedTable, EncodingGap, FeatureEncoder, MISSING};
pub use matcher::EnumMatcher;

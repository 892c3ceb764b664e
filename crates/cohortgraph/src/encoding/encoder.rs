//! Feature encoder and usefulness filter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::matcher::EnumMatcher;
use crate::error::{CohortGraphError, Result};
use crate::input::DataTable;
use crate::schema::{ColumnInfo, Discretization};

/// Marker for a row with no valid code.
pub const MISSING: f64 = f64::NAN;

/// Token that integer columns use for an absent value.
const MISSING_TOKEN: &str = "Missing";

/// Codes for one column, one per input row.
#[derive(Debug, Clone)]
pub struct EncodedColumn {
    pub info: ColumnInfo,
    codes: Vec<f64>,
}

impl EncodedColumn {
    pub fn new(info: ColumnInfo, codes: Vec<f64>) -> Self {
        Self { info, codes }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn codes(&self) -> &[f64] {
        &self.codes
    }

    /// Code at a row, `None` if missing.
    pub fn code(&self, row: usize) -> Option<f64> {
        self.codes.get(row).copied().filter(|c| c.is_finite())
    }

    /// Number of rows with a valid code.
    pub fn present_count(&self) -> usize {
        self.codes.iter().filter(|c| c.is_finite()).count()
    }

    /// A column is useful when at least one row has a valid code.
    pub fn is_useful(&self) -> bool {
        self.codes.iter().any(|c| c.is_finite())
    }
}

/// A non-blank raw value that matched no code of its column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingGap {
    pub column: String,
    pub value: String,
    pub occurrences: usize,
}

/// All encoded columns of an extract plus the values that were lost.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    pub row_count: usize,
    pub columns: Vec<EncodedColumn>,
    pub gaps: Vec<EncodingGap>,
}

impl EncodedTable {
    /// Columns with at least one valid code, in schema order.
    pub fn useful_columns(&self) -> Vec<&EncodedColumn> {
        self.columns.iter().filter(|c| c.is_useful()).collect()
    }
}

/// Encodes data table columns according to their [`ColumnInfo`].
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode every resolved column of a table.
    pub fn encode_table(table: &DataTable, columns: &[ColumnInfo]) -> Result<EncodedTable> {
        let mut encoded = Vec::with_capacity(columns.len());
        let mut gaps = Vec::new();

        for info in columns {
            let (column, column_gaps) = Self::encode_column(table, info)?;
            encoded.push(column);
            gaps.extend(column_gaps);
        }

        let useful = encoded.iter().filter(|c| c.is_useful()).count();
        info!(columns = encoded.len(), useful, "Encoded features");

        Ok(EncodedTable {
            row_count: table.row_count(),
            columns: encoded,
            gaps,
        })
    }

    /// Encode a single column.
    pub fn encode_column(
        table: &DataTable,
        info: &ColumnInfo,
    ) -> Result<(EncodedColumn, Vec<EncodingGap>)> {
        let values = table.column_values(info.position);

        let (codes, gaps) = match &info.discretization {
            Discretization::IntegerRange { .. } => (encode_integers(&info.name, values)?, Vec::new()),
            Discretization::Enumerated { labels } => {
                let matcher = EnumMatcher::new(labels);
                encode_enumerated(&info.name, &matcher, values)
            }
        };

        debug!(
            column = %info.name,
            present = codes.iter().filter(|c| c.is_finite()).count(),
            "Encoded column"
        );

        Ok((EncodedColumn::new(info.clone(), codes), gaps))
    }
}

fn encode_integers<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> Result<Vec<f64>> {
    values
        .enumerate()
        .map(|(row, raw)| {
            let raw = raw.trim();
            if raw.is_empty() || raw == MISSING_TOKEN {
                return Ok(MISSING);
            }
            raw.parse::<f64>().map_err(|_| CohortGraphError::Encoding {
                column: column.to_string(),
                row,
                value: raw.to_string(),
            })
        })
        .collect()
}

fn encode_enumerated<'a>(
    column: &str,
    matcher: &EnumMatcher,
    values: impl Iterator<Item = &'a str>,
) -> (Vec<f64>, Vec<EncodingGap>) {
    let mut unmatched: IndexMap<&str, usize> = IndexMap::new();

    let codes = values
        .map(|raw| {
            if raw.trim().is_empty() {
                return MISSING;
            }
            match matcher.code_for(raw) {
                Some(code) => code as f64,
                None => {
                    *unmatched.entry(raw).or_default() += 1;
                    MISSING
                }
            }
        })
        .collect();

    let gaps = unmatched
        .into_iter()
        .map(|(value, occurrences)| {
            warn!(column, value, occurrences, "Value matches no category; recorded as missing");
            EncodingGap {
                column: column.to_string(),
                value: value.to_string(),
                occurrences,
            }
        })
        .collect();

    (codes, gaps)
}

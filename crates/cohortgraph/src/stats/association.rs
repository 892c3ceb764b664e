//! Association result and correlation predicate for a column pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::chi_squared::{chi_squared_test, ChiSquared, TABLE_EPSILON};
use super::contingency::ContingencyTable;
use super::fisher::{fisher_exact, FisherExact};
use crate::error::{CohortGraphError, Result};
use crate::schema::ColumnInfo;

/// Odds ratio beyond which a binary pair is called directionally correlated.
pub const ODDS_RATIO_THRESHOLD: f64 = 1.25;

/// z-score of a two-sided 95% interval.
const Z_95: f64 = 1.96;

/// Binary vocabularies, falsy value first, compared case-insensitively.
const TRUTHY_VOCABULARIES: &[(&str, &str)] = &[
    ("false", "true"),
    ("0", "1"),
    ("no", "yes"),
    ("negative", "positive"),
];

/// Relation label attached to an association edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    #[serde(rename = "biolink:correlated_with")]
    CorrelatedWith,
    #[serde(rename = "biolink:positively_correlated_with")]
    PositivelyCorrelatedWith,
    #[serde(rename = "biolink:negatively_correlated_with")]
    NegativelyCorrelatedWith,
}

impl Predicate {
    /// The Biolink CURIE for this predicate.
    pub fn curie(&self) -> &'static str {
        match self {
            Predicate::CorrelatedWith => "biolink:correlated_with",
            Predicate::PositivelyCorrelatedWith => "biolink:positively_correlated_with",
            Predicate::NegativelyCorrelatedWith => "biolink:negatively_correlated_with",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.curie())
    }
}

/// Odds statistics of a complete 2×2 table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsStatistics {
    pub fisher: FisherExact,
    /// `(a/b) / (c/d)`.
    pub odds_ratio: f64,
    pub log_odds_ratio: f64,
    pub standard_error: f64,
    /// 95% confidence interval of the log-odds ratio.
    pub log_odds_ratio_ci: (f64, f64),
}

/// Statistics computed for one column pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationResult {
    pub chi_squared: ChiSquared,
    pub total_sample_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odds: Option<OddsStatistics>,
    pub predicate: Predicate,
}

/// Test a contingency table built from `subject` (columns) and `object` (rows).
pub fn associate(
    table: &ContingencyTable,
    subject: &ColumnInfo,
    object: &ColumnInfo,
) -> Result<AssociationResult> {
    let chi_squared = chi_squared_test(table)?;

    let odds = if table.is_2x2() && !table.has_zero_cell() {
        Some(odds_statistics(table)?)
    } else {
        None
    };

    let predicate = select_predicate(odds.as_ref(), subject, object);

    Ok(AssociationResult {
        chi_squared,
        total_sample_size: table.total(),
        odds,
        predicate,
    })
}

fn odds_statistics(table: &ContingencyTable) -> Result<OddsStatistics> {
    let (a, b, c, d) = (table.get(0, 0), table.get(0, 1), table.get(1, 0), table.get(1, 1));
    let fisher = fisher_exact(a, b, c, d)?;

    let (af, bf, cf, df) = (a as f64, b as f64, c as f64, d as f64);
    let odds_ratio = (af / bf) / (cf / df);
    let log_odds_ratio = odds_ratio.ln();
    let standard_error = [af, bf, cf, df]
        .iter()
        .map(|v| 1.0 / (v + TABLE_EPSILON))
        .sum::<f64>()
        .sqrt();

    if !log_odds_ratio.is_finite() || !standard_error.is_finite() {
        return Err(CohortGraphError::Statistics(format!(
            "log-odds ratio is not finite for [[{}, {}], [{}, {}]]",
            a, b, c, d
        )));
    }

    Ok(OddsStatistics {
        fisher,
        odds_ratio,
        log_odds_ratio,
        standard_error,
        log_odds_ratio_ci: (
            log_odds_ratio - Z_95 * standard_error,
            log_odds_ratio + Z_95 * standard_error,
        ),
    })
}

/// Neutral unless both columns are binary truthy features whose log-odds
/// ratio clears `ln(ODDS_RATIO_THRESHOLD)` in either direction.
fn select_predicate(odds: Option<&OddsStatistics>, subject: &ColumnInfo, object: &ColumnInfo) -> Predicate {
    let (Some(odds), Some(subject_flipped), Some(object_flipped)) =
        (odds, truthy_orientation(subject), truthy_orientation(object))
    else {
        return Predicate::CorrelatedWith;
    };

    // Codes run falsy-to-truthy unless the sorted labels put the truthy one first.
    let log_odds = if subject_flipped != object_flipped {
        -odds.log_odds_ratio
    } else {
        odds.log_odds_ratio
    };

    let threshold = ODDS_RATIO_THRESHOLD.ln();
    if log_odds > threshold {
        Predicate::PositivelyCorrelatedWith
    } else if log_odds < -threshold {
        Predicate::NegativelyCorrelatedWith
    } else {
        Predicate::CorrelatedWith
    }
}

/// `Some(flipped)` if the column's domain is exactly a truthy vocabulary;
/// `flipped` is true when the truthy value holds code 0.
fn truthy_orientation(column: &ColumnInfo) -> Option<bool> {
    let keys = column.domain_keys();
    let [first, second] = keys.as_slice() else {
        return None;
    };

    TRUTHY_VOCABULARIES.iter().find_map(|&(falsy, truthy)| {
        if first == falsy && second == truthy {
            Some(false)
        } else if first == truthy && second == falsy {
            Some(true)
        } else {
            None
        }
    })
}

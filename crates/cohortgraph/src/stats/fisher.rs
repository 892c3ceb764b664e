//! Fisher's exact test for 2×2 tables.

use serde::{Deserialize, Serialize};

use super::special::ln_gamma;
use crate::error::{CohortGraphError, Result};

/// Relative tolerance when comparing table probabilities to the observed one.
const RELATIVE_TOLERANCE: f64 = 1e-7;

/// Result of a two-sided Fisher exact test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FisherExact {
    /// Sample odds ratio `ad / bc`.
    pub odds_ratio: f64,
    pub p_value: f64,
}

/// Two-sided Fisher exact test for `[[a, b], [c, d]]`.
///
/// The p-value sums the hypergeometric probabilities of every table with the
/// observed margins that is no more likely than the observed table.
pub fn fisher_exact(a: u64, b: u64, c: u64, d: u64) -> Result<FisherExact> {
    let n = a + b + c + d;
    if n == 0 {
        return Err(CohortGraphError::Statistics(
            "Fisher exact test on an empty table".to_string(),
        ));
    }

    let odds_ratio = if b == 0 || c == 0 {
        f64::INFINITY
    } else {
        (a as f64 * d as f64) / (b as f64 * c as f64)
    };

    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;

    let lo = col1.saturating_sub(row2);
    let hi = row1.min(col1);

    let ln_total = ln_choose(n, col1);
    let probability = |x: u64| (ln_choose(row1, x) + ln_choose(row2, col1 - x) - ln_total).exp();

    let observed = probability(a);
    let threshold = observed * (1.0 + RELATIVE_TOLERANCE);
    let p_value: f64 = (lo..=hi)
        .map(probability)
        .filter(|&p| p <= threshold)
        .sum();

    Ok(FisherExact {
        odds_ratio,
        p_value: p_value.min(1.0),
    })
}

fn ln_choose(n: u64, k: u64) -> f64 {
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

fn ln_factorial(n: u64) -> f64 {
    ln_gamma(n as f64 + 1.0)
}

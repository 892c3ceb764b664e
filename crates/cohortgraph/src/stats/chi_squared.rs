//! Chi-squared test of independence.

use serde::{Deserialize, Serialize};

use super::contingency::ContingencyTable;
use super::special::chi_squared_survival;
use crate::error::{CohortGraphError, Result};

/// Added to every cell before testing so no expected frequency is zero.
pub const TABLE_EPSILON: f64 = f32::EPSILON as f64;

/// Result of a chi-squared test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquared {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64,
}

/// Pearson's chi-squared test on `table + TABLE_EPSILON`, without Yates'
/// continuity correction.
pub fn chi_squared_test(table: &ContingencyTable) -> Result<ChiSquared> {
    let (rows, cols) = table.shape();
    if rows == 0 || cols == 0 {
        return Err(CohortGraphError::Statistics(format!(
            "cannot test an empty {}x{} table",
            rows, cols
        )));
    }

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Ok(ChiSquared {
            statistic: 0.0,
            dof,
            p_value: 1.0,
        });
    }

    let observed = |r: usize, c: usize| table.get(r, c) as f64 + TABLE_EPSILON;
    let row_totals: Vec<f64> = (0..rows).map(|r| (0..cols).map(|c| observed(r, c)).sum()).collect();
    let col_totals: Vec<f64> = (0..cols).map(|c| (0..rows).map(|r| observed(r, c)).sum()).collect();
    let total: f64 = row_totals.iter().sum();

    let mut statistic = 0.0;
    for (r, row_total) in row_totals.iter().enumerate() {
        for (c, col_total) in col_totals.iter().enumerate() {
            let expected = row_total * col_total / total;
            let diff = observed(r, c) - expected;
            statistic += diff * diff / expected;
        }
    }

    if !statistic.is_finite() {
        return Err(CohortGraphError::Statistics(format!(
            "chi-squared statistic is not finite ({})",
            statistic
        )));
    }

    Ok(ChiSquared {
        statistic,
        dof,
        p_value: chi_squared_survival(statistic, dof),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_table_is_independent() {
        let table = ContingencyTable::from_counts(&[vec![1, 1], vec![1, 1]]);
        let result = chi_squared_test(&table).unwrap();
        assert_eq!(result.dof, 1);
        assert!(result.statistic.abs() < 1e-9);
        assert!((result.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_known_statistic() {
        // Every expected count is 25, so the statistic is 4 * 5^2 / 25.
        let table = ContingencyTable::from_counts(&[vec![30, 20], vec![20, 30]]);
        let result = chi_squared_test(&table).unwrap();
        assert!((result.statistic - 4.0).abs() < 1e-6);
        assert!((result.p_value - 0.045_500_263_896_358_41).abs() < 1e-6);
    }

    #[test]
    fn test_dof_matches_shape() {
        let table = ContingencyTable::from_counts(&[vec![3, 1, 4], vec![1, 5, 9], vec![2, 6, 5]]);
        let result = chi_squared_test(&table).unwrap();
        assert_eq!(result.dof, 4);
        assert!((0.0..=1.0).contains(&result.p_value));
    }

    #[test]
    fn test_single_row_has_no_dof() {
        let table = ContingencyTable::from_counts(&[vec![3, 1, 4]]);
        let result = chi_squared_test(&table).unwrap();
        assert_eq!(result.dof, 0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_all_zero_table_is_finite() {
        let table = ContingencyTable::zeros(2, 2);
        let result = chi_squared_test(&table).unwrap();
        assert!(result.statistic.is_finite());
    }

    #[test]
    fn test_empty_shape_is_an_error() {
        let table = ContingencyTable::zeros(0, 2);
        assert!(chi_squared_test(&table).is_err());
    }
}

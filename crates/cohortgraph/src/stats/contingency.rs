//! Joint occurrence counts for a pair of encoded columns.

use serde::{Deserialize, Serialize};

use crate::encoding::EncodedColumn;

/// Count matrix over the domains of two columns.
///
/// Object-column values index rows and subject-column values index columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    rows: usize,
    cols: usize,
    counts: Vec<u64>,
    /// Rows where both values were present but at least one fell outside
    /// its column's domain.
    out_of_domain: usize,
}

/// One cell with its share of the row, column and table totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyCell {
    pub frequency: u64,
    pub row_percentage: Option<f64>,
    pub col_percentage: Option<f64>,
    pub total_percentage: Option<f64>,
}

/// Marginal count of one domain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalSummary {
    pub frequency: u64,
    pub percentage: Option<f64>,
}

impl ContingencyTable {
    /// An all-zero table of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            counts: vec![0; rows * cols],
            out_of_domain: 0,
        }
    }

    /// Build a table from nested rows. Rows shorter than the first are
    /// padded with zeros.
    pub fn from_counts(counts: &[Vec<u64>]) -> Self {
        let rows = counts.len();
        let cols = counts.first().map_or(0, Vec::len);
        let mut table = Self::zeros(rows, cols);
        for (r, row) in counts.iter().enumerate() {
            for (c, &v) in row.iter().take(cols).enumerate() {
                table.counts[r * cols + c] = v;
            }
        }
        table
    }

    /// Count the rows where both columns have a code.
    pub fn build(subject: &EncodedColumn, object: &EncodedColumn) -> Self {
        let mut table = Self::zeros(object.info.range(), subject.info.range());

        for (&s, &o) in subject.codes().iter().zip(object.codes()) {
            if !(s.is_finite() && o.is_finite()) {
                continue;
            }
            match (subject.info.code_index(s), object.info.code_index(o)) {
                (Some(c), Some(r)) => table.counts[r * table.cols + c] += 1,
                _ => table.out_of_domain += 1,
            }
        }

        table
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.counts[row * self.cols + col]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn out_of_domain(&self) -> usize {
        self.out_of_domain
    }

    pub fn is_2x2(&self) -> bool {
        self.shape() == (2, 2)
    }

    pub fn has_zero_cell(&self) -> bool {
        self.counts.iter().any(|&v| v == 0)
    }

    pub fn row_totals(&self) -> Vec<u64> {
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.get(r, c)).sum())
            .collect()
    }

    pub fn col_totals(&self) -> Vec<u64> {
        (0..self.cols)
            .map(|c| (0..self.rows).map(|r| self.get(r, c)).sum())
            .collect()
    }

    /// Every cell with its row, column and total shares.
    pub fn cells(&self) -> Vec<Vec<ContingencyCell>> {
        let row_totals = self.row_totals();
        let col_totals = self.col_totals();
        let total = self.total();

        (0..self.rows)
            .map(|r| {
                (0..self.cols)
                    .map(|c| {
                        let v = self.get(r, c);
                        ContingencyCell {
                            frequency: v,
                            row_percentage: share(v, row_totals[r]),
                            col_percentage: share(v, col_totals[c]),
                            total_percentage: share(v, total),
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Marginals of the object column (one per table row).
    pub fn row_summary(&self) -> Vec<MarginalSummary> {
        summarize(self.row_totals())
    }

    /// Marginals of the subject column (one per table column).
    pub fn col_summary(&self) -> Vec<MarginalSummary> {
        summarize(self.col_totals())
    }
}

fn share(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

fn summarize(totals: Vec<u64>) -> Vec<MarginalSummary> {
    let sum: u64 = totals.iter().sum();
    totals
        .into_iter()
        .map(|frequency| MarginalSummary {
            frequency,
            percentage: share(frequency, sum),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::MISSING;
    use crate::schema::{ColumnInfo, FeatureSchemaEntry};

    fn encoded(name: &str, entry: FeatureSchemaEntry, codes: Vec<f64>) -> EncodedColumn {
        EncodedColumn::new(ColumnInfo::from_entry(name, 0, &entry).unwrap(), codes)
    }

    #[test]
    fn test_build_orientation() {
        let subject = encoded("s", FeatureSchemaEntry::enumerated(["a", "b", "c"]), vec![0.0, 2.0, 2.0]);
        let object = encoded("o", FeatureSchemaEntry::enumerated(["x", "y"]), vec![1.0, 0.0, 1.0]);

        let table = ContingencyTable::build(&subject, &object);
        assert_eq!(table.shape(), (2, 3));
        assert_eq!(table.get(1, 0), 1);
        assert_eq!(table.get(0, 2), 1);
        assert_eq!(table.get(1, 2), 1);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn test_only_jointly_present_rows_count() {
        let subject = encoded("s", FeatureSchemaEntry::integer(0, 5), vec![1.0, MISSING, 3.0, 4.0]);
        let object = encoded("o", FeatureSchemaEntry::enumerated(["no", "yes"]), vec![0.0, 1.0, MISSING, 1.0]);

        let table = ContingencyTable::build(&subject, &object);
        assert_eq!(table.shape(), (2, 6));
        assert_eq!(table.total(), 2);
        assert_eq!(table.get(0, 1), 1);
        assert_eq!(table.get(1, 4), 1);
    }

    #[test]
    fn test_out_of_domain_codes_are_not_counted() {
        let subject = encoded("s", FeatureSchemaEntry::integer(1, 2), vec![1.0, 7.0]);
        let object = encoded("o", FeatureSchemaEntry::integer(1, 2), vec![2.0, 2.0]);

        let table = ContingencyTable::build(&subject, &object);
        assert_eq!(table.total(), 1);
        assert_eq!(table.out_of_domain(), 1);
    }

    #[test]
    fn test_cells_and_marginals() {
        let table = ContingencyTable::from_counts(&[vec![1, 3], vec![0, 0]]);
        let cells = table.cells();
        assert_eq!(cells[0][1].row_percentage, Some(0.75));
        assert_eq!(cells[0][1].col_percentage, Some(1.0));
        assert_eq!(cells[1][0].row_percentage, None);
        assert_eq!(cells[0][0].total_percentage, Some(0.25));

        let rows = table.row_summary();
        assert_eq!(rows[0].frequency, 4);
        assert_eq!(rows[1].percentage, Some(0.0));
        assert!(table.has_zero_cell());
    }
}

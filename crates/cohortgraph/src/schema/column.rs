//! Matching schema entries to data columns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::feature::{FeatureSchema, FeatureSchemaEntry, NameLookup};
use super::label::{sort_labels, Label};
use crate::error::{CohortGraphError, Result};

/// How a column's raw values become discrete codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discretization {
    /// Codes are positions `0..labels.len()` in the sorted label list.
    Enumerated { labels: Vec<Label> },
    /// Codes are the integers `minimum..=maximum` themselves.
    IntegerRange { minimum: i64, maximum: i64 },
}

/// A schema entry bound to a column of the cohort extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column (and feature) name.
    pub name: String,
    /// Zero-based position in the data table.
    pub position: usize,
    pub discretization: Discretization,
    pub categories: Vec<String>,
    pub name_lookup: Vec<NameLookup>,
}

/// One `=` qualifier per domain value of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureQualifier {
    pub operator: String,
    pub value: Value,
}

/// A feature name with its full value domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescription {
    pub feature_name: String,
    pub feature_qualifiers: Vec<FeatureQualifier>,
}

impl ColumnInfo {
    /// Derive column info from a schema entry.
    ///
    /// Returns `None` for entries that are neither a non-empty enum nor an
    /// integer type with both bounds declared.
    pub fn from_entry(name: &str, position: usize, entry: &FeatureSchemaEntry) -> Option<Self> {
        let discretization = match &entry.labels {
            Some(labels) if !labels.is_empty() => {
                let mut labels = labels.clone();
                sort_labels(&mut labels);
                Discretization::Enumerated { labels }
            }
            _ if entry.is_integer_type() => {
                let (minimum, maximum) = (entry.minimum?, entry.maximum?);
                if maximum < minimum {
                    return None;
                }
                Discretization::IntegerRange { minimum, maximum }
            }
            _ => return None,
        };

        Some(Self {
            name: name.to_string(),
            position,
            discretization,
            categories: entry.categories.clone(),
            name_lookup: entry.name_lookup.clone(),
        })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.discretization, Discretization::IntegerRange { .. })
    }

    /// Sorted enum labels; empty for integer columns.
    pub fn labels(&self) -> &[Label] {
        match &self.discretization {
            Discretization::Enumerated { labels } => labels,
            Discretization::IntegerRange { .. } => &[],
        }
    }

    pub fn min_code(&self) -> i64 {
        match &self.discretization {
            Discretization::Enumerated { .. } => 0,
            Discretization::IntegerRange { minimum, .. } => *minimum,
        }
    }

    pub fn max_code(&self) -> i64 {
        match &self.discretization {
            Discretization::Enumerated { labels } => labels.len() as i64 - 1,
            Discretization::IntegerRange { maximum, .. } => *maximum,
        }
    }

    /// Number of distinct codes, `max_code - min_code + 1`.
    pub fn range(&self) -> usize {
        (self.max_code() - self.min_code() + 1) as usize
    }

    /// Index of a code within the domain, if it belongs to it.
    pub fn code_index(&self, code: f64) -> Option<usize> {
        if !code.is_finite() || code.fract() != 0.0 {
            return None;
        }
        let offset = code as i64 - self.min_code();
        (0..self.range() as i64)
            .contains(&offset)
            .then_some(offset as usize)
    }

    /// Lowercased matching keys of the domain values.
    pub fn domain_keys(&self) -> Vec<String> {
        match &self.discretization {
            Discretization::Enumerated { labels } => {
                labels.iter().map(|l| l.key().to_lowercase()).collect()
            }
            Discretization::IntegerRange { minimum, maximum } => {
                (*minimum..=*maximum).map(|v| v.to_string()).collect()
            }
        }
    }

    /// Feature name with one `=` qualifier per domain value.
    pub fn feature_description(&self) -> FeatureDescription {
        let values: Vec<Value> = match &self.discretization {
            Discretization::Enumerated { labels } => labels
                .iter()
                .map(|l| serde_json::to_value(l).unwrap_or(Value::Null))
                .collect(),
            Discretization::IntegerRange { minimum, maximum } => {
                (*minimum..=*maximum).map(Value::from).collect()
            }
        };

        FeatureDescription {
            feature_name: self.name.clone(),
            feature_qualifiers: values
                .into_iter()
                .map(|value| FeatureQualifier {
                    operator: "=".to_string(),
                    value,
                })
                .collect(),
        }
    }
}

/// Bind schema entries to the columns of an extract, in schema order.
///
/// Entries whose name is not a column, that declare no name lookups, or that
/// have no usable discretization are skipped.
pub fn resolve_columns(headers: &[String], schema: &FeatureSchema) -> Result<Vec<ColumnInfo>> {
    let mut columns = Vec::new();

    for (feature, entry) in schema.iter() {
        let Some(position) = headers.iter().position(|h| h == feature) else {
            continue;
        };

        if entry.name_lookup.is_empty() {
            continue;
        }

        let column = &headers[position];
        if column != feature {
            return Err(CohortGraphError::SchemaMismatch {
                feature: feature.to_string(),
                column: column.clone(),
            });
        }

        if let Some(info) = ColumnInfo::from_entry(column, position, entry) {
            columns.push(info);
        }
    }

    Ok(columns)
}

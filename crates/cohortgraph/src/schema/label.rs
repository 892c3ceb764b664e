//! Enumerated category labels and their canonical matching form.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Open-ended threshold tokens such as `>60` or `< 18`.
static THRESHOLD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([<>])\s*(-?\d+(?:\.\d+)?)\s*$").expect("threshold pattern is valid")
});

/// One category label of an enumerated feature, as written in the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Direction of an open-ended threshold token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdDirection {
    /// `>N`: values strictly above `N`.
    Above,
    /// `<N`: values strictly below `N`.
    Below,
}

/// A parsed threshold token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub direction: ThresholdDirection,
    pub bound: f64,
}

impl Threshold {
    /// Whether a numeric value falls on the open side of this threshold.
    pub fn admits(&self, value: f64) -> bool {
        match self.direction {
            ThresholdDirection::Above => value > self.bound,
            ThresholdDirection::Below => value < self.bound,
        }
    }
}

impl Label {
    /// Whether this label is a string in the schema.
    pub fn is_text(&self) -> bool {
        matches!(self, Label::Text(_))
    }

    /// Numeric value of a non-string label. Booleans count as 0 and 1.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Label::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Label::Integer(i) => Some(*i as f64),
            Label::Float(f) => Some(*f),
            Label::Text(_) => None,
        }
    }

    /// Canonical form used to match raw cell values against this label.
    pub fn key(&self) -> String {
        match self {
            Label::Bool(b) => b.to_string(),
            Label::Integer(i) => i.to_string(),
            Label::Float(f) => normalize_value(&f.to_string()),
            Label::Text(s) => normalize_value(s),
        }
    }

    /// Parse a threshold token (`>N` / `<N`) if this label is one.
    pub fn threshold(&self) -> Option<Threshold> {
        let Label::Text(text) = self else {
            return None;
        };
        let caps = THRESHOLD_PATTERN.captures(text)?;
        let bound = caps[2].parse().ok()?;
        let direction = if &caps[1] == ">" {
            ThresholdDirection::Above
        } else {
            ThresholdDirection::Below
        };
        Some(Threshold { direction, bound })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Bool(true) => f.write_str("True"),
            Label::Bool(false) => f.write_str("False"),
            Label::Integer(i) => write!(f, "{}", i),
            Label::Float(v) => write!(f, "{}", v),
            Label::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

/// Reduce a raw value to its matching form.
///
/// Integral numbers lose their fractional part (`"5.0"` becomes `"5"`) and
/// boolean words are lowercased; everything else is trimmed.
pub fn normalize_value(raw: &str) -> String {
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return trimmed.to_ascii_lowercase();
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
            format!("{}", v as i64)
        }
        _ => trimmed.to_string(),
    }
}

/// Sort labels into the canonical order: non-string labels first, compared
/// numerically, then strings compared lexicographically. The sort is stable.
pub fn sort_labels(labels: &mut [Label]) {
    labels.sort_by(compare_labels);
}

fn compare_labels(a: &Label, b: &Label) -> Ordering {
    match (a, b) {
        (Label::Text(x), Label::Text(y)) => x.cmp(y),
        (Label::Text(_), _) => Ordering::Greater,
        (_, Label::Text(_)) => Ordering::Less,
        _ => {
            let x = a.numeric_value().unwrap_or(f64::NAN);
            let y = b.numeric_value().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

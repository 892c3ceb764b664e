//! Raw value lookup for enumerated columns.

use std::collections::HashMap;

use crate::schema::{normalize_value, Label, Threshold, ThresholdDirection};

/// Resolves raw cell values to codes of one enumerated column.
///
/// Lookup order: exact match on the normalized value, then the first `>N`
/// token, then the first `<N` token. Later threshold tokens of the same
/// direction are ignored.
#[derive(Debug, Clone)]
pub struct EnumMatcher {
    keys: HashMap<String, usize>,
    above: Option<(Threshold, usize)>,
    below: Option<(Threshold, usize)>,
}

impl EnumMatcher {
    /// Build a matcher for sorted labels; codes are label positions.
    pub fn new(labels: &[Label]) -> Self {
        let mut keys = HashMap::with_capacity(labels.len());
        let mut above = None;
        let mut below = None;

        for (code, label) in labels.iter().enumerate() {
            keys.insert(label.key(), code);

            match label.threshold() {
                Some(t) if t.direction == ThresholdDirection::Above && above.is_none() => {
                    above = Some((t, code));
                }
                Some(t) if t.direction == ThresholdDirection::Below && below.is_none() => {
                    below = Some((t, code));
                }
                _ => {}
            }
        }

        Self { keys, above, below }
    }

    /// Code for a raw value, or `None` when nothing matches.
    pub fn code_for(&self, raw: &str) -> Option<usize> {
        let key = normalize_value(raw);
        if let Some(&code) = self.keys.get(&key) {
            return Some(code);
        }

        let value: f64 = key.parse().ok().filter(|v: &f64| v.is_finite())?;
        [self.above, self.below]
            .into_iter()
            .flatten()
            .find(|(threshold, _)| threshold.admits(value))
            .map(|(_, code)| code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sort_labels;

    fn matcher(tokens: &[&str]) -> EnumMatcher {
        let mut labels: Vec<Label> = tokens.iter().copied().map(Label::from).collect();
        sort_labels(&mut labels);
        EnumMatcher::new(&labels)
    }

    #[test]
    fn test_exact_and_threshold_matches() {
        // sorted: "18-65", "<18", ">65"
        let m = matcher(&["<18", "18-65", ">65"]);
        assert_eq!(m.code_for("18-65"), Some(0));
        assert_eq!(m.code_for("<18"), Some(1));
        assert_eq!(m.code_for("70"), Some(2));
        assert_eq!(m.code_for("12"), Some(1));
        assert_eq!(m.code_for("40"), None);
        assert_eq!(m.code_for("unknown"), None);
    }

    #[test]
    fn test_numeric_normalization() {
        let m = EnumMatcher::new(&[Label::Integer(0), Label::Integer(5)]);
        assert_eq!(m.code_for("5"), Some(1));
        assert_eq!(m.code_for("5.0"), Some(1));
        assert_eq!(m.code_for(" 0 "), Some(0));
    }

    #[test]
    fn test_first_threshold_wins() {
        // sorted: ">50", ">60"; only ">50" is used for range matching
        let m = matcher(&[">60", ">50"]);
        assert_eq!(m.code_for("70"), Some(0));
        assert_eq!(m.code_for(">60"), Some(1));
    }

    #[test]
    fn test_boolean_labels_match_any_case() {
        let m = EnumMatcher::new(&[Label::Bool(false), Label::Bool(true)]);
        assert_eq!(m.code_for("True"), Some(1));
        assert_eq!(m.code_for("false"), Some(0));
    }
}

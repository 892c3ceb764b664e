//! Feature schema loaded from YAML.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::warn;

use super::label::Label;
use crate::error::{CohortGraphError, Result};

/// Section of the features file describing patient-level features.
pub const DEFAULT_SECTION: &str = "patient";

/// A name-lookup search used to resolve a feature to biomedical identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameLookup {
    pub search_term: String,
    pub limit: usize,
}

/// Declared description of one feature.
///
/// Either enumerated (`enum`) or an integer range (`type: integer` with
/// `minimum` and `maximum`). Other keys in the YAML are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchemaEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,

    /// Ontology categories added to every node resolved for this feature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_lookup: Vec<NameLookup>,
}

impl FeatureSchemaEntry {
    /// An enumerated feature.
    pub fn enumerated<L: Into<Label>>(labels: impl IntoIterator<Item = L>) -> Self {
        Self {
            labels: Some(labels.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// An integer feature with inclusive bounds.
    pub fn integer(minimum: i64, maximum: i64) -> Self {
        Self {
            value_type: Some("integer".to_string()),
            minimum: Some(minimum),
            maximum: Some(maximum),
            ..Self::default()
        }
    }

    /// Add a name-lookup search.
    pub fn with_lookup(mut self, search_term: impl Into<String>, limit: usize) -> Self {
        self.name_lookup.push(NameLookup {
            search_term: search_term.into(),
            limit,
        });
        self
    }

    /// Add hard-coded categories.
    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn is_integer_type(&self) -> bool {
        self.value_type.as_deref() == Some("integer")
    }

    /// Read one entry from its YAML value.
    ///
    /// Only the keys the resolver reads are converted. Bounds are read for
    /// integer types only, and a scalar `categories` counts as one category.
    pub fn from_yaml(value: &Value) -> std::result::Result<Self, String> {
        let Value::Mapping(map) = value else {
            return Err("entry is not a mapping".to_string());
        };

        let value_type = map.get("type").and_then(Value::as_str).map(str::to_string);
        let is_integer = value_type.as_deref() == Some("integer");

        let labels = match map.get("enum") {
            None | Some(Value::Null) => None,
            Some(Value::Sequence(items)) => Some(
                items
                    .iter()
                    .map(|item| {
                        serde_yaml::from_value::<Label>(item.clone())
                            .map_err(|_| format!("unsupported enum value {:?}", item))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err("'enum' is not a list".to_string()),
        };

        let bound = |key: &str| -> std::result::Result<Option<i64>, String> {
            match map.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(_) if !is_integer => Ok(None),
                Some(v) => v
                    .as_i64()
                    .map(Some)
                    .ok_or_else(|| format!("'{}' is not an integer", key)),
            }
        };
        let minimum = bound("minimum")?;
        let maximum = bound("maximum")?;

        let categories = match map.get("categories") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(category)) => vec![category.clone()],
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| "'categories' holds a non-string value".to_string())?,
            Some(_) => return Err("'categories' is not a string or list".to_string()),
        };

        let name_lookup = match map.get("name_lookup") {
            None | Some(Value::Null) => Vec::new(),
            Some(v) => serde_yaml::from_value(v.clone())
                .map_err(|e| format!("invalid 'name_lookup': {}", e))?,
        };

        Ok(Self {
            value_type,
            labels,
            minimum,
            maximum,
            categories,
            name_lookup,
        })
    }
}

/// Ordered mapping of feature name to its schema entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    features: IndexMap<String, FeatureSchemaEntry>,
}

impl FeatureSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the [`DEFAULT_SECTION`] of a features YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CohortGraphError::io(path, e))?;
        Self::from_yaml_section(&text, DEFAULT_SECTION)
    }

    /// Parse one top-level section of a features YAML document.
    ///
    /// Entries that cannot be read are logged and left out; the rest of the
    /// section still loads.
    pub fn from_yaml_section(yaml: &str, section: &str) -> Result<Self> {
        let mut document: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
        let body = document.remove(section).ok_or_else(|| {
            CohortGraphError::Config(format!("features file has no '{}' section", section))
        })?;
        let entries: IndexMap<String, Value> = serde_yaml::from_value(body)?;

        let mut schema = Self::new();
        for (name, value) in entries {
            match FeatureSchemaEntry::from_yaml(&value) {
                Ok(entry) => schema.insert(name, entry),
                Err(reason) => warn!(feature = %name, reason = %reason, "Skipping feature schema entry"),
            }
        }
        Ok(schema)
    }

    /// Add or replace a feature, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, entry: FeatureSchemaEntry) {
        self.features.insert(name.into(), entry);
    }

    pub fn with_feature(mut self, name: impl Into<String>, entry: FeatureSchemaEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSchemaEntry> {
        self.features.get(name)
    }

    /// Features in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureSchemaEntry)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURES: &str = r#"
patient:
  AgeStudyStart:
    type: string
    enum: ["0-2", "3-17", "18-34", "35-50", "51-69", "70-89"]
    categories: ["biolink:PhenotypicFeature"]
    name_lookup:
      - search_term: age
        limit: 1
  TotalEDVisits:
    type: integer
    minimum: 0
    maximum: 2
    name_lookup:
      - search_term: emergency department visit
        limit: 2
  Sex:
    type: string
    enum: [Male, Female]
visit:
  VisitType:
    enum: [inpatient, outpatient]
"#;

    #[test]
    fn test_load_patient_section_in_order() {
        let schema = FeatureSchema::from_yaml_section(FEATURES, DEFAULT_SECTION).unwrap();
        let names: Vec<&str> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["AgeStudyStart", "TotalEDVisits", "Sex"]);

        let visits = schema.get("TotalEDVisits").unwrap();
        assert!(visits.is_integer_type());
        assert_eq!(visits.minimum, Some(0));
        assert_eq!(visits.maximum, Some(2));
        assert_eq!(visits.name_lookup[0].limit, 2);

        let age = schema.get("AgeStudyStart").unwrap();
        assert_eq!(age.categories, vec!["biolink:PhenotypicFeature"]);
        assert_eq!(age.labels.as_ref().unwrap().len(), 6);
        assert!(schema.get("Sex").unwrap().name_lookup.is_empty());
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let err = FeatureSchema::from_yaml_section(FEATURES, "encounter").unwrap_err();
        assert!(matches!(err, CohortGraphError::Config(_)));
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let yaml = r#"
patient:
  AsthmaDx:
    enum: ["no", "yes"]
    name_lookup:
      - search_term: asthma
        limit: 1
  PM25:
    type: number
    minimum: 0.5
    maximum: 40.5
    name_lookup:
      - search_term: particulate matter
        limit: 1
  Ozone:
    type: integer
    minimum: 0.5
    maximum: 3
  Race:
    enum: [White, null, Asian]
  Sex:
    enum: [Male, Female]
    categories: biolink:PhenotypicFeature
"#;
        let schema = FeatureSchema::from_yaml_section(yaml, DEFAULT_SECTION).unwrap();
        let names: Vec<&str> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["AsthmaDx", "PM25", "Sex"]);

        let pm25 = schema.get("PM25").unwrap();
        assert!(!pm25.is_integer_type());
        assert_eq!(pm25.minimum, None);
        assert_eq!(schema.get("Sex").unwrap().categories, vec!["biolink:PhenotypicFeature"]);
    }

    #[test]
    fn test_float_bounded_feature_does_not_hide_others() {
        let yaml = r#"
patient:
  AsthmaDx:
    enum: ["no", "yes"]
    name_lookup:
      - search_term: asthma
        limit: 1
  PM25:
    type: number
    minimum: 0.5
    maximum: 40.5
    name_lookup:
      - search_term: particulate matter
        limit: 1
"#;
        let schema = FeatureSchema::from_yaml_section(yaml, DEFAULT_SECTION).unwrap();
        let headers = vec!["AsthmaDx".to_string(), "PM25".to_string()];
        let columns = crate::schema::resolve_columns(&headers, &schema).unwrap();

        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "AsthmaDx");
    }

    #[test]
    fn test_builder_helpers() {
        let schema = FeatureSchema::new()
            .with_feature("a", FeatureSchemaEntry::enumerated(["no", "yes"]).with_lookup("a", 1))
            .with_feature("b", FeatureSchemaEntry::integer(0, 5));
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("a").unwrap().name_lookup.len(), 1);
    }
}

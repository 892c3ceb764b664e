//! Identity resolver trait and result types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::NameLookup;

/// A normalized node returned for a search term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub name: String,
    #[serde(default)]
    pub equivalent_identifiers: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_content: Option<f64>,
}

impl ResolvedNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_categories<S: Into<String>>(mut self, categories: impl IntoIterator<Item = S>) -> Self {
        self.categories.extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_equivalents<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.equivalent_identifiers.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Canonical identifier to node, in resolver order.
pub type ResolvedNodes = IndexMap<String, ResolvedNode>;

/// Trait for identity resolution services.
///
/// Implementations never fail past this boundary: any error degrades to an
/// empty result and is logged by the implementation.
pub trait IdentityResolver: Send + Sync {
    /// Resolve a search term to at most `limit` name matches, normalized.
    fn resolve(&self, search_term: &str, limit: usize) -> ResolvedNodes;

    /// Name of this resolver (for logging).
    fn name(&self) -> &str;
}

/// Resolve every lookup of a feature and merge the results; later lookups
/// overwrite earlier ones on identifier collision.
pub fn merge_resolved(resolver: &dyn IdentityResolver, lookups: &[NameLookup]) -> ResolvedNodes {
    let mut merged = ResolvedNodes::new();
    for lookup in lookups {
        merged.extend(resolver.resolve(&lookup.search_term, lookup.limit));
    }
    merged
}

//! In-memory resolver with fixed answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::resolver::{IdentityResolver, ResolvedNode, ResolvedNodes};

/// Resolver that answers from a fixed term table. Unknown terms resolve to
/// nothing. `limit` truncates the configured answer.
#[derive(Debug, Default)]
pub struct StaticResolver {
    answers: HashMap<String, ResolvedNodes>,
    calls: AtomicUsize,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the answer for `term`.
    pub fn with_node(mut self, term: impl Into<String>, curie: impl Into<String>, node: ResolvedNode) -> Self {
        self.answers
            .entry(term.into())
            .or_default()
            .insert(curie.into(), node);
        self
    }

    /// Number of `resolve` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl IdentityResolver for StaticResolver {
    fn resolve(&self, search_term: &str, limit: usize) -> ResolvedNodes {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.answers
            .get(search_term)
            .map(|nodes| {
                nodes
                    .iter()
                    .take(limit)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::merge_resolved;
    use crate::schema::NameLookup;

    #[test]
    fn test_limit_and_unknown_terms() {
        let resolver = StaticResolver::new()
            .with_node("asthma", "MONDO:0004979", ResolvedNode::new("asthma"))
            .with_node("asthma", "HP:0002099", ResolvedNode::new("Asthma"));

        assert_eq!(resolver.resolve("asthma", 1).len(), 1);
        assert_eq!(resolver.resolve("asthma", 5).len(), 2);
        assert!(resolver.resolve("obesity", 5).is_empty());
        assert_eq!(resolver.calls(), 3);
    }

    #[test]
    fn test_merge_later_lookup_overwrites() {
        let resolver = StaticResolver::new()
            .with_node("a", "X:1", ResolvedNode::new("first"))
            .with_node("b", "X:1", ResolvedNode::new("second"))
            .with_node("b", "X:2", ResolvedNode::new("other"));

        let lookups = vec![
            NameLookup { search_term: "a".into(), limit: 1 },
            NameLookup { search_term: "b".into(), limit: 2 },
        ];
        let merged = merge_resolved(&resolver, &lookups);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["X:1"].name, "second");
    }
}

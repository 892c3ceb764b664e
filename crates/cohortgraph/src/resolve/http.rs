//! HTTP identity resolver: name lookup, then identifier normalization.

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use super::resolver::{IdentityResolver, ResolvedNode, ResolvedNodes};
use crate::error::{CohortGraphError, Result};

/// Default name-resolution lookup endpoint.
pub const DEFAULT_NAME_RESOLVER_URL: &str = "https://name-resolution-sri.renci.org/lookup";

/// Default node-normalization endpoint.
pub const DEFAULT_NODE_NORM_URL: &str =
    "https://nodenormalization-sri.renci.org/get_normalized_nodes";

/// Configuration for [`HttpResolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub name_resolver_url: String,
    pub node_norm_url: String,
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            name_resolver_url: DEFAULT_NAME_RESOLVER_URL.to_string(),
            node_norm_url: DEFAULT_NODE_NORM_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ResolverConfig {
    /// Defaults, overridden by `NAME_RESOLVER` and `NODE_NORM` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("NAME_RESOLVER") {
            config.name_resolver_url = url;
        }
        if let Ok(url) = std::env::var("NODE_NORM") {
            config.node_norm_url = url;
        }
        config
    }
}

/// A name-resolution match. Only the CURIE is used.
#[derive(Debug, Deserialize)]
struct NameMatch {
    curie: String,
}

#[derive(Debug, Deserialize)]
struct NodeIdentifier {
    identifier: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NormalizedNode {
    id: NodeIdentifier,
    #[serde(default)]
    equivalent_identifiers: Vec<NodeIdentifier>,
    #[serde(default, rename = "type")]
    types: Vec<String>,
    #[serde(default)]
    information_content: Option<f64>,
}

/// Resolver backed by the name-resolution and node-normalization services.
pub struct HttpResolver {
    client: Client,
    config: ResolverConfig,
}

impl HttpResolver {
    /// Create a resolver with default endpoints.
    pub fn new() -> Result<Self> {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a resolver with custom configuration.
    pub fn with_config(config: ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CohortGraphError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Look up CURIEs matching a search term.
    fn lookup_curies(&self, search_term: &str, limit: usize) -> Result<Vec<String>> {
        let matches: Vec<NameMatch> = self
            .client
            .post(&self.config.name_resolver_url)
            .query(&[("string", search_term.to_string()), ("limit", limit.to_string())])
            .send()?
            .error_for_status()?
            .json()?;

        Ok(matches.into_iter().map(|m| m.curie).collect())
    }

    /// Normalize CURIEs, keyed by preferred identifier.
    fn normalize(&self, curies: &[String]) -> Result<ResolvedNodes> {
        let response: IndexMap<String, Option<NormalizedNode>> = self
            .client
            .post(&self.config.node_norm_url)
            .json(&json!({ "curies": curies }))
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response
            .into_values()
            .flatten()
            .map(|node| {
                let resolved = ResolvedNode {
                    name: node.id.label.unwrap_or_default(),
                    equivalent_identifiers: node
                        .equivalent_identifiers
                        .into_iter()
                        .map(|eq| eq.identifier)
                        .collect(),
                    categories: node.types,
                    information_content: node.information_content,
                };
                (node.id.identifier, resolved)
            })
            .collect())
    }

    /// Fallible resolution; `resolve` degrades errors to an empty result.
    pub fn try_resolve(&self, search_term: &str, limit: usize) -> Result<ResolvedNodes> {
        let curies = self.lookup_curies(search_term, limit)?;
        if curies.is_empty() {
            warn!(search_term, "No identifiers found");
            return Ok(ResolvedNodes::new());
        }
        debug!(search_term, found = curies.len(), "Name lookup matched");
        self.normalize(&curies)
    }
}

impl IdentityResolver for HttpResolver {
    fn resolve(&self, search_term: &str, limit: usize) -> ResolvedNodes {
        match self.try_resolve(search_term, limit) {
            Ok(nodes) => nodes,
            Err(CohortGraphError::Http(e)) if e.is_decode() => {
                error!(search_term, error = %e, "Failed to parse identity service response");
                ResolvedNodes::new()
            }
            Err(e) => {
                warn!(search_term, error = %e, "Failed to resolve identifiers");
                ResolvedNodes::new()
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

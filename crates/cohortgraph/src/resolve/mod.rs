//! Resolution of feature search terms to normalized biomedical identifiers.
//!
//! The engine only sees the [`IdentityResolver`] trait. Two implementations
//! are provided:
//!
//! - [`HttpResolver`] - name-resolution lookup followed by identifier
//!   normalization over HTTP (blocking)
//! - [`StaticResolver`] - fixed in-memory answers for tests and offline runs
//!
//! # Example
//!
//! ```no_run
//! use cohortgraph::resolve::{HttpResolver, IdentityResolver, ResolverConfig};
//!
//! let resolver = HttpResolver::with_config(ResolverConfig::from_env()).unwrap();
//! for (curie, node) in resolver.resolve("asthma", 1) {
//!     println!("{curie}: {}", node.name);
//! }
//! ```

mod fixed;
mod http;
mod resolver;

pub use fixed::StaticResolver;
pub use http::{HttpResolver, ResolverConfig, DEFAULT_NAME_RESOLVER_URL, DEFAULT_NODE_NORM_URL};
pub use resolver::{merge_resolved, IdentityResolver, ResolvedNode, ResolvedNodes};

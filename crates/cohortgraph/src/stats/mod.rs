//! Pairwise association statistics.
//!
//! A [`ContingencyTable`] is built for each pair of encoded columns and
//! tested with [`associate`], which runs a chi-squared test of independence
//! and, for complete 2×2 tables, Fisher's exact test and log-odds statistics.

mod association;
mod chi_squared;
mod contingency;
mod fisher;
mod special;

pub use association::{associate, AssociationResult, OddsStatistics, Predicate, ODDS_RATIO_THRESHOLD};
pub use chi_squared::{chi_squared_test, ChiSquared, TABLE_EPSILON};
pub use contingency::{ContingencyCell, ContingencyTable, MarginalSummary};
pub use fisher::{fisher_exact, FisherExact};
pub use special::{chi_squared_survival, ln_gamma, regularized_gamma_q};

//! factor-prune - multicollinearity pruning of candidate regression factors
//!
//! This library builds a graph of strongly correlated factors from association
//! tables (Spearman, Cramér's V, eta squared) and greedily removes the least
//! established factors until no strong correlation is left, once per analysis
//! context.

pub mod cli;
pub mod correlation_graph;
pub mod csv_output;
pub mod error;
pub mod json_output;
pub mod selection;
pub mod tables;
pub mod thresholds;

pub use error::{Result, SelectionError};

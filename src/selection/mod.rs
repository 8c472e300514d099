// Factor selection over a strong-correlation graph
//
// The graph builder records which factors are strongly associated. This module
// decides which of them to drop before modelling:
//
// - weights: how established each factor is in prior studies
// - pruner: greedy removal of the least established entangled factor
// - escalation: who decides when weight and degree cannot
// - config: thresholds, weights, analysis contexts and recorded decisions
// - report: one pruning run per analysis context

mod config;
mod escalation;
mod pruner;
mod report;
mod weights;

pub use config::{AnalysisContext, SelectionConfig};
pub use escalation::{
    FirstByName, PromptResolver, RecordedDecision, RecordedDecisions, RejectTies, Tie,
    TieResolver,
};
pub use pruner::{prune, PruningResult, Removal, TieDecision};
pub use report::{run_context, ContextReport};
pub use weights::{PriorityWeights, Weight};

// Per-context pruning run and its human-readable report
//
// One source graph is shared by every analysis context. Each run derives its
// own filtered graph and its own copy of the weights, so contexts never see
// each other's removals.

use crate::correlation_graph::StrongCorrelationGraph;
use crate::error::Result;
use crate::selection::config::AnalysisContext;
use crate::selection::escalation::TieResolver;
use crate::selection::pruner::{prune, PruningResult};
use crate::selection::weights::PriorityWeights;
use serde::Serialize;

/// Pruning outcome for one analysis context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextReport {
    /// Context name
    pub context: String,

    /// Vertices of the filtered graph before pruning
    pub vertices: usize,

    /// Strong correlations in the filtered graph before pruning
    pub edges: usize,

    pub result: PruningResult,
}

impl ContextReport {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("=== Context: {} ===\n", self.context));
        report.push_str(&format!(
            "Factors considered: {} ({} strong correlations)\n",
            self.vertices, self.edges
        ));

        if self.result.removed().is_empty() {
            report.push_str("\nNo strongly correlated factors removed\n");
        } else {
            report.push_str(&format!(
                "\nRemoved ({}):\n",
                self.result.removed().len()
            ));
            for removal in self.result.removed() {
                report.push_str(&format!(
                    "  - {} (degree {})\n",
                    removal.factor, removal.degree
                ));
            }
        }

        report.push_str(&format!("\nKept ({}):\n", self.result.kept().len()));
        for factor in self.result.kept() {
            report.push_str(&format!("  - {}\n", factor));
        }

        if !self.result.reinstated().is_empty() {
            report.push_str(&format!(
                "\nReinstated after reconciliation: {}\n",
                self.result.reinstated().join(", ")
            ));
        }

        if !self.result.decisions().is_empty() {
            report.push_str("\nEscalated ties:\n");
            for decision in self.result.decisions() {
                report.push_str(&format!(
                    "  - [{}] degree {} -> removed {}\n",
                    decision.tie.candidates.join(", "),
                    decision.tie.degree,
                    decision.removed
                ));
            }
        }

        report
    }
}

/// Filter `graph` to `context` and prune it with a private copy of `weights`
pub fn run_context<R>(
    graph: &StrongCorrelationGraph,
    context: &AnalysisContext,
    weights: &PriorityWeights,
    resolver: &mut R,
) -> Result<ContextReport>
where
    R: TieResolver + ?Sized,
{
    let filtered = graph.restrict_to(&context.factors);
    let vertices = filtered.vertex_count();
    let edges = filtered.edge_count();

    let missing = context
        .factors
        .iter()
        .filter(|f| !graph.contains(f))
        .count();
    if missing > 0 {
        tracing::debug!(
            context = %context.name,
            missing,
            "allow-listed factors absent from the association tables"
        );
    }

    tracing::info!(context = %context.name, vertices, edges, "pruning context");
    let result = prune(filtered, weights.clone(), resolver)?;

    Ok(ContextReport {
        context: context.name.clone(),
        vertices,
        edges,
        result,
    })
}

// Greedy multicollinearity pruning
//
// Repeatedly removes the least established factor that is still strongly
// correlated with something, until no strong correlation is left:
//
//   1. candidate  = minimum (weight, name) among weighted factors
//   2. tie group  = candidate + neighbours with exactly the same weight
//   3. narrow     = members of the tie group with the highest current degree
//   4. escalate   = ask the TieResolver when more than one member remains
//
// Afterwards a reconciliation pass reinstates removed factors none of whose
// original partners survived.

use crate::correlation_graph::StrongCorrelationGraph;
use crate::error::{Result, SelectionError};
use crate::selection::escalation::{Tie, TieResolver};
use crate::selection::weights::{PriorityWeights, Weight};
use serde::Serialize;
use std::collections::BTreeSet;

/// A factor eliminated by the pruner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub factor: String,
    /// Degree in the working graph at the moment of removal
    pub degree: usize,
}

/// A tie that had to be escalated, with the answer that was applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TieDecision {
    pub tie: Tie,
    pub removed: String,
}

/// Outcome of one pruning run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruningResult {
    /// Removed factors in elimination order
    removed: Vec<Removal>,
    /// Factors retained for modelling
    kept: BTreeSet<String>,
    /// Removed factors moved back to `kept` by reconciliation, in elimination order
    reinstated: Vec<String>,
    /// Escalated ties in the order they were asked
    decisions: Vec<TieDecision>,
}

impl PruningResult {
    pub fn removed(&self) -> &[Removal] {
        &self.removed
    }

    /// Removed factor names in elimination order
    pub fn removed_names(&self) -> Vec<&str> {
        self.removed.iter().map(|r| r.factor.as_str()).collect()
    }

    /// Degree of each removed factor at removal time, parallel to [`Self::removed_names`]
    pub fn removed_degrees(&self) -> Vec<usize> {
        self.removed.iter().map(|r| r.degree).collect()
    }

    pub fn kept(&self) -> &BTreeSet<String> {
        &self.kept
    }

    pub fn reinstated(&self) -> &[String] {
        &self.reinstated
    }

    pub fn decisions(&self) -> &[TieDecision] {
        &self.decisions
    }
}

/// Prune `graph` until no strong correlation remains
///
/// Both `graph` and `weights` are consumed; callers running several analysis
/// contexts pass each run its own copies.
///
/// Graph vertices without a weight are treated as never used before
/// (`Weight::Count(0)`).
///
/// # Errors
///
/// - whatever the resolver returns for an escalated tie
/// - `InvalidTieChoice` if the resolver names a factor outside the tie
///
/// # Example
/// ```
/// use factor_prune::correlation_graph::StrongCorrelationGraph;
/// use factor_prune::selection::{prune, FirstByName, PriorityWeights};
///
/// # fn main() -> factor_prune::Result<()> {
/// let graph = StrongCorrelationGraph::from_adjacency([
///     ("sloc", vec!["team_size"]),
///     ("project_age", vec![]),
/// ]);
/// let weights = PriorityWeights::from_counts([("sloc", 1), ("team_size", 3), ("project_age", 2)]);
///
/// let result = prune(graph, weights, &mut FirstByName)?;
/// assert_eq!(result.removed_names(), vec!["sloc"]);
/// assert!(result.kept().contains("team_size"));
/// # Ok(())
/// # }
/// ```
pub fn prune<R>(
    graph: StrongCorrelationGraph,
    weights: PriorityWeights,
    resolver: &mut R,
) -> Result<PruningResult>
where
    R: TieResolver + ?Sized,
{
    let original = graph.clone();
    let mut graph = graph;
    let mut weights = weights;

    let dropped = weights.retain_factors(&graph);
    if !dropped.is_empty() {
        tracing::debug!(count = dropped.len(), factors = ?dropped, "dropped weights of factors outside the graph");
    }
    let unweighted: Vec<String> = graph
        .factors()
        .filter(|f| !weights.contains(f))
        .cloned()
        .collect();
    for factor in unweighted {
        tracing::warn!("No prior-usage weight for '{}', treating it as 0", factor);
        weights.insert(factor, Weight::Count(0));
    }

    let mut removed = Vec::new();
    let mut decisions = Vec::new();

    let kept: BTreeSet<String> = loop {
        match graph.max_degree() {
            None | Some((_, 0)) => break graph.factors().cloned().collect(),
            Some(_) => {}
        }

        let Some((candidate, weight)) = weights.least_established() else {
            let entangled = graph
                .factors()
                .filter(|f| graph.degree(f) > 0)
                .cloned()
                .collect();
            return Err(SelectionError::WeightsExhausted(entangled));
        };
        let candidate = candidate.to_string();

        let neighbours = match graph.neighbors(&candidate) {
            Some(n) if !n.is_empty() => n,
            _ => {
                // Nothing to decide for this factor; it ends up kept
                weights.remove(&candidate);
                continue;
            }
        };

        let mut tie_group = vec![candidate.clone()];
        tie_group.extend(
            neighbours
                .iter()
                .filter(|n| weights.get(n) == Some(weight))
                .cloned(),
        );

        let choice = if tie_group.len() == 1 {
            candidate
        } else {
            let max_degree = tie_group
                .iter()
                .map(|f| graph.degree(f))
                .max()
                .unwrap_or(0);
            let mut densest: Vec<String> = tie_group
                .into_iter()
                .filter(|f| graph.degree(f) == max_degree)
                .collect();

            if densest.len() == 1 {
                densest.remove(0)
            } else {
                let tie = Tie::new(densest, max_degree);
                tracing::info!(candidates = ?tie.candidates, degree = tie.degree, "escalating tie");
                let choice = resolver.resolve_tie(&tie)?;
                if !tie.contains(&choice) {
                    return Err(SelectionError::InvalidTieChoice {
                        choice,
                        candidates: tie.candidates,
                    });
                }
                decisions.push(TieDecision {
                    tie,
                    removed: choice.clone(),
                });
                choice
            }
        };

        let degree = graph.degree(&choice);
        graph.remove_vertex(&choice);
        weights.remove(&choice);
        tracing::debug!(factor = %choice, degree, "removed factor");
        removed.push(Removal {
            factor: choice,
            degree,
        });
    };

    let (removed, kept, reinstated) = reconcile(&original, removed, kept);

    tracing::info!(
        removed = removed.len(),
        kept = kept.len(),
        reinstated = reinstated.len(),
        escalations = decisions.len(),
        "pruning finished"
    );

    Ok(PruningResult {
        removed,
        kept,
        reinstated,
        decisions,
    })
}

/// Move back removed factors whose original partners were all removed too
///
/// Removals are visited in elimination order over an owned snapshot, and a
/// reinstated factor counts as kept for the removals checked after it.
fn reconcile(
    original: &StrongCorrelationGraph,
    removed: Vec<Removal>,
    mut kept: BTreeSet<String>,
) -> (Vec<Removal>, BTreeSet<String>, Vec<String>) {
    let mut still_removed = Vec::with_capacity(removed.len());
    let mut reinstated = Vec::new();

    for removal in removed {
        let shares_partner = original
            .neighbors(&removal.factor)
            .is_some_and(|partners| partners.iter().any(|p| kept.contains(p)));

        if shares_partner {
            still_removed.push(removal);
        } else {
            tracing::debug!(factor = %removal.factor, "reinstating factor with no surviving partner");
            kept.insert(removal.factor.clone());
            reinstated.push(removal.factor);
        }
    }

    (still_removed, kept, reinstated)
}

//! Strong-correlation graph construction from association tables
//!
//! Each factor becomes a vertex; an undirected edge joins two factors whose
//! association exceeds the threshold of the statistic that measured them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐ ┌──────────────────────┐ ┌──────────────────────┐
//! │ continuous table     │ │ categorical table    │ │ cross table          │
//! │ |rho| > 0.7          │ │ + degrees of freedom │ │ |eta²| > 0.14        │
//! │                      │ │ |V| > 0.5 / df norm  │ │ lazy column vertices │
//! └──────────┬───────────┘ └──────────┬───────────┘ └──────────┬───────────┘
//!            │ pass 1                 │ pass 2                 │ pass 3
//!            └────────────────────────┼────────────────────────┘
//!                                     ▼
//!                  StrongCorrelationGraph (cumulative, symmetric)
//!                                     │
//!                                     │ restrict_to(context factors)
//!                                     ▼
//!                  one filtered graph per analysis context
//! ```
//!
//! Passes only ever add edges, so their order does not change the result.
//!
//! # Example
//!
//! ```
//! use factor_prune::correlation_graph::StrongCorrelationGraph;
//!
//! let graph = StrongCorrelationGraph::from_adjacency([
//!     ("sloc", vec!["team_size"]),
//!     ("team_size", vec![]),
//!     ("project_age", vec![]),
//! ]);
//!
//! assert_eq!(graph.vertex_count(), 3);
//! assert_eq!(graph.edge_count(), 1);
//! assert!(graph.neighbors("team_size").unwrap().contains("sloc"));
//!
//! let submission = graph.restrict_to(["sloc", "project_age"]);
//! assert_eq!(submission.degree("sloc"), 0);
//! ```

use crate::error::{Result, SelectionError};
use crate::tables::{AssociationInputs, AssociationTable, CrossTable, DegreesOfFreedom};
use crate::thresholds::{DegenerateDfPolicy, ThresholdConfig};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Undirected graph of strongly correlated factors
///
/// # Invariants
///
/// - No vertex lists itself as a neighbour
/// - `b ∈ neighbors(a)` iff `a ∈ neighbors(b)`
///
/// Vertices and neighbour sets are ordered by name, so every traversal is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrongCorrelationGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl StrongCorrelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from the three association tables
    ///
    /// # Errors
    ///
    /// - `MissingDegreesOfFreedom` if a categorical factor has no df entry
    /// - `DegenerateDegreesOfFreedom` if a categorical pair has df <= 1 and the
    ///   policy is [`DegenerateDfPolicy::Error`]
    /// - `InvalidConfig` if the thresholds fail validation
    pub fn build(inputs: &AssociationInputs, thresholds: &ThresholdConfig) -> Result<Self> {
        thresholds.validate().map_err(SelectionError::InvalidConfig)?;

        let mut graph = Self::new();
        let continuous = graph.add_continuous_edges(&inputs.continuous, thresholds.continuous);
        let categorical = graph.add_categorical_edges(
            &inputs.categorical,
            &inputs.degrees_of_freedom,
            thresholds,
        )?;
        let cross = graph.add_cross_edges(&inputs.cross, thresholds.cross);

        tracing::info!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            continuous,
            categorical,
            cross,
            "built strong-correlation graph"
        );

        Ok(graph)
    }

    /// Build a graph from `(factor, neighbours)` pairs
    ///
    /// Every edge is recorded in both directions and self-pairs are ignored, so
    /// the input does not need to be symmetric.
    pub fn from_adjacency<I, S, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, N)>,
        S: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let mut graph = Self::new();
        for (factor, neighbours) in entries {
            let factor = factor.into();
            graph.add_vertex(factor.clone());
            for neighbour in neighbours {
                graph.add_edge(&factor, neighbour.into());
            }
        }
        graph
    }

    /// Continuous pass: |rho(i, j)| > threshold
    ///
    /// Returns the number of ordered pairs that passed.
    fn add_continuous_edges(&mut self, table: &AssociationTable, threshold: f64) -> usize {
        let mut strong = 0;
        for a in table.factors() {
            self.add_vertex(a.clone());
            for b in table.factors() {
                if a == b {
                    continue;
                }
                if exceeds(table.get(a, b), threshold) {
                    self.add_edge(a, b.clone());
                    strong += 1;
                }
            }
        }
        tracing::debug!(strong, threshold, "continuous pass");
        strong
    }

    /// Categorical pass: |V(i, j)| > categorical / sqrt((df_i - 1)(df_j - 1))
    fn add_categorical_edges(
        &mut self,
        table: &AssociationTable,
        dof: &DegreesOfFreedom,
        thresholds: &ThresholdConfig,
    ) -> Result<usize> {
        let factors = table.factors();
        let df: Vec<u32> = factors
            .iter()
            .map(|f| {
                dof.get(f)
                    .ok_or_else(|| SelectionError::MissingDegreesOfFreedom(f.clone()))
            })
            .collect::<Result<_>>()?;

        let mut strong = 0;
        for (i, a) in factors.iter().enumerate() {
            self.add_vertex(a.clone());
            for (j, b) in factors.iter().enumerate() {
                if i == j {
                    continue;
                }

                let Some(threshold) = thresholds.categorical_threshold(df[i], df[j]) else {
                    match thresholds.degenerate_df {
                        DegenerateDfPolicy::Skip => {
                            if i < j {
                                tracing::warn!(
                                    "Skipping categorical pair ({}, {}): df {} and {} leave the threshold undefined",
                                    a, b, df[i], df[j]
                                );
                            }
                            continue;
                        }
                        DegenerateDfPolicy::Error => {
                            return Err(SelectionError::DegenerateDegreesOfFreedom {
                                factor_a: a.clone(),
                                factor_b: b.clone(),
                                df_a: df[i],
                                df_b: df[j],
                            });
                        }
                    }
                };

                if exceeds(table.get(a, b), threshold) {
                    self.add_edge(a, b.clone());
                    strong += 1;
                }
            }
        }
        tracing::debug!(strong, "categorical pass");
        Ok(strong)
    }

    /// Cross pass: |eta²(row, column)| > threshold
    ///
    /// Column factors may not appear in any other table; they get vertices here.
    fn add_cross_edges(&mut self, table: &CrossTable, threshold: f64) -> usize {
        for column in table.columns() {
            self.add_vertex(column.clone());
        }

        let mut strong = 0;
        for row in table.rows() {
            self.add_vertex(row.clone());
            for column in table.columns() {
                if row == column {
                    continue;
                }
                if exceeds(table.get(row, column), threshold) {
                    self.add_edge(row, column.clone());
                    strong += 1;
                }
            }
        }
        tracing::debug!(strong, threshold, "cross pass");
        strong
    }

    /// Add a vertex with no neighbours (no-op if already present)
    pub fn add_vertex(&mut self, factor: String) {
        self.adjacency.entry(factor).or_default();
    }

    /// Record an undirected edge; self-pairs are ignored
    pub fn add_edge(&mut self, a: &str, b: String) {
        if a == b {
            self.add_vertex(b);
            return;
        }
        self.adjacency
            .entry(b.clone())
            .or_default()
            .insert(a.to_string());
        self.adjacency.entry(a.to_string()).or_default().insert(b);
    }

    /// Remove a vertex and every edge touching it
    ///
    /// Returns the neighbour set the vertex had, `None` if it was absent.
    pub fn remove_vertex(&mut self, factor: &str) -> Option<BTreeSet<String>> {
        let neighbours = self.adjacency.remove(factor)?;
        for neighbour in &neighbours {
            if let Some(set) = self.adjacency.get_mut(neighbour) {
                set.remove(factor);
            }
        }
        Some(neighbours)
    }

    /// Domain filter: a copy containing only the allowed factors
    ///
    /// Factors outside the allow-list lose their vertex and disappear from every
    /// neighbour set. Allowed names that are not in the graph are ignored.
    pub fn restrict_to<I, S>(&self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = allowed
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        let adjacency: BTreeMap<String, BTreeSet<String>> = self
            .adjacency
            .iter()
            .filter(|(factor, _)| allowed.contains(*factor))
            .map(|(factor, neighbours)| {
                let kept = neighbours
                    .iter()
                    .filter(|n| allowed.contains(*n))
                    .cloned()
                    .collect();
                (factor.clone(), kept)
            })
            .collect();

        tracing::debug!(
            before = self.vertex_count(),
            after = adjacency.len(),
            "restricted graph to analysis context"
        );

        Self { adjacency }
    }

    pub fn contains(&self, factor: &str) -> bool {
        self.adjacency.contains_key(factor)
    }

    /// Neighbour set of a factor
    pub fn neighbors(&self, factor: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(factor)
    }

    /// Current degree of a factor (0 if absent)
    pub fn degree(&self, factor: &str) -> usize {
        self.adjacency.get(factor).map_or(0, BTreeSet::len)
    }

    /// All factor names in order
    pub fn factors(&self) -> impl Iterator<Item = &String> {
        self.adjacency.keys()
    }

    /// Vertex with the most neighbours, first by name on ties
    pub fn max_degree(&self) -> Option<(&str, usize)> {
        self.adjacency
            .iter()
            .fold(None, |best: Option<(&str, usize)>, (factor, neighbours)| {
                match best {
                    Some((_, d)) if d >= neighbours.len() => best,
                    _ => Some((factor.as_str(), neighbours.len())),
                }
            })
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Check the symmetry and no-self-loop invariants
    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().all(|(factor, neighbours)| {
            !neighbours.contains(factor)
                && neighbours.iter().all(|n| {
                    self.adjacency
                        .get(n)
                        .is_some_and(|back| back.contains(factor))
                })
        })
    }
}

fn exceeds(value: Option<f64>, threshold: f64) -> bool {
    value.is_some_and(|v| v.abs() > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        continuous: AssociationTable,
        categorical: AssociationTable,
        dof: DegreesOfFreedom,
        cross: CrossTable,
    ) -> AssociationInputs {
        AssociationInputs {
            continuous,
            categorical,
            degrees_of_freedom: dof,
            cross,
        }
    }

    fn empty_square(kind: &str) -> AssociationTable {
        AssociationTable::from_matrix(kind, &[], vec![]).unwrap()
    }

    fn empty_cross() -> CrossTable {
        CrossTable::new(vec![], vec![], vec![]).unwrap()
    }

    #[test]
    fn test_empty_inputs() {
        let graph = StrongCorrelationGraph::build(
            &inputs(
                empty_square("continuous"),
                empty_square("categorical"),
                DegreesOfFreedom::new(),
                empty_cross(),
            ),
            &ThresholdConfig::default(),
        )
        .unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.max_degree(), None);
    }

    #[test]
    fn test_continuous_pass() {
        let continuous = AssociationTable::from_matrix(
            "continuous",
            &["a", "b", "c"],
            vec![
                vec![1.0, -0.75, 0.7],
                vec![-0.75, 1.0, 0.1],
                vec![0.7, 0.1, 1.0],
            ],
        )
        .unwrap();

        let graph = StrongCorrelationGraph::build(
            &inputs(
                continuous,
                empty_square("categorical"),
                DegreesOfFreedom::new(),
                empty_cross(),
            ),
            &ThresholdConfig::default(),
        )
        .unwrap();

        // Negative associations count, and 0.7 is not strictly above 0.7
        assert_eq!(graph.vertex_count(), 3);
        assert!(graph.neighbors("a").unwrap().contains("b"));
        assert!(graph.neighbors("b").unwrap().contains("a"));
        assert_eq!(graph.degree("c"), 0);
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_categorical_pass_df_normalised() {
        let categorical = AssociationTable::from_matrix(
            "categorical",
            &["x", "y", "z"],
            vec![
                vec![1.0, 0.3, 0.3],
                vec![0.3, 1.0, 0.1],
                vec![0.3, 0.1, 1.0],
            ],
        )
        .unwrap();
        // x-y: threshold 0.5 → 0.3 is weak; x-z: threshold 0.5/√(1*4) = 0.25 → strong
        let dof: DegreesOfFreedom = [("x", 2), ("y", 2), ("z", 5)].into_iter().collect();

        let graph = StrongCorrelationGraph::build(
            &inputs(empty_square("continuous"), categorical, dof, empty_cross()),
            &ThresholdConfig::default(),
        )
        .unwrap();

        assert!(!graph.neighbors("x").unwrap().contains("y"));
        assert!(graph.neighbors("x").unwrap().contains("z"));
        assert_eq!(graph.degree("y"), 0);
    }

    #[test]
    fn test_categorical_missing_df_is_error() {
        let categorical = AssociationTable::from_matrix(
            "categorical",
            &["x", "y"],
            vec![vec![1.0, 0.9], vec![0.9, 1.0]],
        )
        .unwrap();
        let dof: DegreesOfFreedom = [("x", 2)].into_iter().collect();

        let err = StrongCorrelationGraph::build(
            &inputs(empty_square("continuous"), categorical, dof, empty_cross()),
            &ThresholdConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, SelectionError::MissingDegreesOfFreedom("y".to_string()));
    }

    #[test]
    fn test_degenerate_df_skip_and_error() {
        let categorical = AssociationTable::from_matrix(
            "categorical",
            &["x", "y"],
            vec![vec![1.0, 0.99], vec![0.99, 1.0]],
        )
        .unwrap();
        let dof: DegreesOfFreedom = [("x", 1), ("y", 3)].into_iter().collect();
        let tables = inputs(empty_square("continuous"), categorical, dof, empty_cross());

        let graph = StrongCorrelationGraph::build(&tables, &ThresholdConfig::default()).unwrap();
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 0);

        let strict = ThresholdConfig {
            degenerate_df: DegenerateDfPolicy::Error,
            ..ThresholdConfig::default()
        };
        let err = StrongCorrelationGraph::build(&tables, &strict).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::DegenerateDegreesOfFreedom { df_a: 1, df_b: 3, .. }
        ));
    }

    #[test]
    fn test_cross_pass_creates_column_vertices() {
        let cross = CrossTable::new(
            vec!["bug_fix".to_string(), "ci_exists".to_string()],
            vec!["sloc".to_string(), "num_comments".to_string()],
            vec![vec![0.02, 0.2], vec![0.14, 0.01]],
        )
        .unwrap();

        let graph = StrongCorrelationGraph::build(
            &inputs(
                empty_square("continuous"),
                empty_square("categorical"),
                DegreesOfFreedom::new(),
                cross,
            ),
            &ThresholdConfig::default(),
        )
        .unwrap();

        assert_eq!(graph.vertex_count(), 4);
        assert!(graph.neighbors("num_comments").unwrap().contains("bug_fix"));
        assert!(graph.neighbors("bug_fix").unwrap().contains("num_comments"));
        // 0.14 is not strictly above 0.14
        assert_eq!(graph.degree("ci_exists"), 0);
        assert_eq!(graph.degree("sloc"), 0);
    }

    #[test]
    fn test_passes_are_cumulative() {
        let continuous = AssociationTable::from_matrix(
            "continuous",
            &["sloc", "team_size"],
            vec![vec![1.0, 0.9], vec![0.9, 1.0]],
        )
        .unwrap();
        let cross = CrossTable::new(
            vec!["bug_fix".to_string()],
            vec!["sloc".to_string(), "team_size".to_string()],
            vec![vec![0.5, 0.0]],
        )
        .unwrap();

        let graph = StrongCorrelationGraph::build(
            &inputs(
                continuous,
                empty_square("categorical"),
                DegreesOfFreedom::new(),
                cross,
            ),
            &ThresholdConfig::default(),
        )
        .unwrap();

        let sloc = graph.neighbors("sloc").unwrap();
        assert!(sloc.contains("team_size"));
        assert!(sloc.contains("bug_fix"));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_asymmetric_table_still_symmetric_graph() {
        let continuous = AssociationTable::from_matrix(
            "continuous",
            &["a", "b"],
            vec![vec![1.0, 0.9], vec![0.2, 1.0]],
        )
        .unwrap();
        let graph = StrongCorrelationGraph::build(
            &inputs(
                continuous,
                empty_square("categorical"),
                DegreesOfFreedom::new(),
                empty_cross(),
            ),
            &ThresholdConfig::default(),
        )
        .unwrap();
        assert!(graph.is_symmetric());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_from_adjacency_ignores_self_pairs() {
        let graph = StrongCorrelationGraph::from_adjacency([("a", vec!["a", "b"])]);
        assert!(!graph.neighbors("a").unwrap().contains("a"));
        assert!(graph.neighbors("b").unwrap().contains("a"));
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_remove_vertex_detaches_neighbours() {
        let mut graph =
            StrongCorrelationGraph::from_adjacency([("a", vec!["b", "c"]), ("b", vec!["c"])]);
        let removed = graph.remove_vertex("a").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!graph.contains("a"));
        assert_eq!(graph.degree("b"), 1);
        assert_eq!(graph.degree("c"), 1);
        assert!(graph.remove_vertex("a").is_none());
    }

    #[test]
    fn test_restrict_to_keeps_source_intact() {
        let graph = StrongCorrelationGraph::from_adjacency([
            ("a", vec!["b", "c"]),
            ("b", vec!["c"]),
            ("d", vec![]),
        ]);

        let first = graph.restrict_to(["a", "b", "missing"]);
        let second = graph.restrict_to(vec!["c".to_string(), "d".to_string()]);

        assert_eq!(first.vertex_count(), 2);
        assert_eq!(first.neighbors("a").unwrap().len(), 1);
        assert!(first.is_symmetric());

        assert_eq!(second.vertex_count(), 2);
        assert_eq!(second.edge_count(), 0);

        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_max_degree_ties_by_name() {
        let graph = StrongCorrelationGraph::from_adjacency([("b", vec!["c"]), ("a", vec!["d"])]);
        assert_eq!(graph.max_degree(), Some(("a", 1)));
    }
}

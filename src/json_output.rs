//! JSON output format for factor selection results
//!
//! `--format json`: one entry per analysis context, in run order.

use crate::selection::ContextReport;
use serde::{Deserialize, Serialize};

/// A removed factor with its degree at removal time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRemoval {
    pub factor: String,
    pub degree: usize,
}

/// An escalated tie and the factor removed to break it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEscalation {
    /// Tied factors, sorted by name
    pub candidates: Vec<String>,
    /// Degree shared by the candidates
    pub degree: usize,
    pub removed: String,
}

/// Pruning outcome for one analysis context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonContextResult {
    /// Context name (e.g., "submission", "close")
    pub name: String,
    /// Factors in the filtered graph
    pub vertices: usize,
    /// Strong correlations in the filtered graph
    pub edges: usize,
    /// Removed factors in elimination order
    pub removed: Vec<JsonRemoval>,
    /// Retained factors, sorted by name
    pub kept: Vec<String>,
    /// Removed factors moved back to `kept` by reconciliation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reinstated: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub escalations: Vec<JsonEscalation>,
}

impl From<&ContextReport> for JsonContextResult {
    fn from(report: &ContextReport) -> Self {
        let result = &report.result;
        Self {
            name: report.context.clone(),
            vertices: report.vertices,
            edges: report.edges,
            removed: result
                .removed()
                .iter()
                .map(|r| JsonRemoval {
                    factor: r.factor.clone(),
                    degree: r.degree,
                })
                .collect(),
            kept: result.kept().iter().cloned().collect(),
            reinstated: result.reinstated().to_vec(),
            escalations: result
                .decisions()
                .iter()
                .map(|d| JsonEscalation {
                    candidates: d.tie.candidates.clone(),
                    degree: d.tie.degree,
                    removed: d.removed.clone(),
                })
                .collect(),
        }
    }
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub contexts: Vec<JsonContextResult>,
}

impl JsonOutput {
    /// Create a new JSON output structure
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "factor-prune-json-v1".to_string(),
            contexts: Vec::new(),
        }
    }

    /// Add a context result to the output
    pub fn add_context(&mut self, report: &ContextReport) {
        self.contexts.push(JsonContextResult::from(report));
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation_graph::StrongCorrelationGraph;
    use crate::selection::{run_context, AnalysisContext, FirstByName, PriorityWeights};

    fn report() -> ContextReport {
        let graph = StrongCorrelationGraph::from_adjacency([
            ("sloc", vec!["team_size"]),
            ("bug_fix", vec!["ci_exists"]),
        ]);
        let weights = PriorityWeights::from_counts([
            ("sloc", 1),
            ("team_size", 3),
            ("bug_fix", 2),
            ("ci_exists", 2),
        ]);
        let context = AnalysisContext {
            name: "submission".to_string(),
            description: String::new(),
            factors: vec![
                "sloc".to_string(),
                "team_size".to_string(),
                "bug_fix".to_string(),
                "ci_exists".to_string(),
            ],
        };
        run_context(&graph, &context, &weights, &mut FirstByName).unwrap()
    }

    #[test]
    fn test_json_output_creation() {
        let output = JsonOutput::new();
        assert_eq!(output.format, "factor-prune-json-v1");
        assert!(output.contexts.is_empty());
    }

    #[test]
    fn test_context_result_from_report() {
        let result = JsonContextResult::from(&report());
        assert_eq!(result.name, "submission");
        assert_eq!(result.vertices, 4);
        assert_eq!(result.edges, 2);
        assert_eq!(
            result.removed,
            vec![
                JsonRemoval {
                    factor: "sloc".to_string(),
                    degree: 1
                },
                JsonRemoval {
                    factor: "bug_fix".to_string(),
                    degree: 1
                },
            ]
        );
        assert_eq!(result.kept, vec!["ci_exists", "team_size"]);
        assert_eq!(result.escalations.len(), 1);
        assert_eq!(result.escalations[0].candidates, vec!["bug_fix", "ci_exists"]);
    }

    #[test]
    fn test_json_serialization() {
        let mut output = JsonOutput::new();
        output.add_context(&report());

        let json = output.to_json().unwrap();
        assert!(json.contains("\"format\": \"factor-prune-json-v1\""));
        assert!(json.contains("\"name\": \"submission\""));
        assert!(json.contains("\"factor\": \"sloc\""));

        let parsed: JsonOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.contexts.len(), 1);
    }

    #[test]
    fn test_empty_lists_omitted() {
        let result = JsonContextResult {
            name: "close".to_string(),
            vertices: 0,
            edges: 0,
            removed: vec![],
            kept: vec![],
            reinstated: vec![],
            escalations: vec![],
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("reinstated"));
        assert!(!json.contains("escalations"));
        assert!(json.contains("\"removed\":[]"));
    }
}

// Factor selection configuration loaded from TOML
//
// Thresholds, prior-usage weights, analysis contexts and recorded tie
// decisions live in one file so a study can be re-run without recompiling.

use crate::error::SelectionError;
use crate::selection::escalation::RecordedDecision;
use crate::selection::weights::PriorityWeights;
use crate::thresholds::ThresholdConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// One factor universe the pruning runs against (e.g. submission time)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisContext {
    /// Unique context name (e.g., "submission", "close")
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Allow-list of factors observable in this context
    pub factors: Vec<String>,
}

/// Complete factor selection configuration
///
/// # Example TOML
/// ```toml
/// [thresholds]
/// continuous = 0.7
/// degenerate_df = "skip"
///
/// [weights]
/// core_member = 7
/// same_user = "always-keep"
///
/// [[context]]
/// name = "submission"
/// factors = ["core_member", "sloc"]
///
/// [[decision]]
/// candidates = ["churn_addition_open", "churn_deletion_open"]
/// remove = "churn_deletion_open"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub weights: PriorityWeights,

    #[serde(default, rename = "context")]
    pub contexts: Vec<AnalysisContext>,

    #[serde(default, rename = "decision")]
    pub decisions: Vec<RecordedDecision>,
}

impl SelectionConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, has invalid TOML syntax, or fails
    /// [`SelectionConfig::validate`].
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse TOML factor selection config")?;
        config.validate().map_err(SelectionError::InvalidConfig)?;
        Ok(config)
    }

    /// The pull request study configuration (submission and close contexts)
    ///
    /// Uses the embedded factors-default.toml.
    pub fn default_study() -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../../factors-default.toml");
        Self::from_toml_str(DEFAULT_TOML).context("Failed to parse embedded factors-default.toml")
    }

    /// Find a context by name
    pub fn context(&self, name: &str) -> Option<&AnalysisContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Recorded decisions that apply to `context`
    pub fn decisions_for<'a>(
        &'a self,
        context: &'a str,
    ) -> impl Iterator<Item = &'a RecordedDecision> + 'a {
        self.decisions.iter().filter(move |d| d.applies_to(context))
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.thresholds.validate()?;

        let mut names = HashSet::new();
        for context in &self.contexts {
            if context.name.trim().is_empty() {
                return Err("context name must not be empty".to_string());
            }
            if !names.insert(context.name.as_str()) {
                return Err(format!("duplicate context '{}'", context.name));
            }
        }

        let mut recorded = HashSet::new();
        for decision in &self.decisions {
            let candidates: BTreeSet<&str> =
                decision.candidates.iter().map(String::as_str).collect();
            if !recorded.insert((decision.context.as_deref(), candidates)) {
                return Err(format!(
                    "duplicate decision for candidates {:?} in the same scope",
                    decision.candidates
                ));
            }
            if decision.candidates.len() < 2 {
                return Err(format!(
                    "decision removing '{}' needs at least two candidates",
                    decision.remove
                ));
            }
            if !decision.candidates.contains(&decision.remove) {
                return Err(format!(
                    "decision removes '{}', which is not among its candidates {:?}",
                    decision.remove, decision.candidates
                ));
            }
            if let Some(ctx) = &decision.context {
                if !names.contains(ctx.as_str()) {
                    return Err(format!("decision refers to unknown context '{}'", ctx));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::weights::Weight;
    use crate::thresholds::DegenerateDfPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[weights]
sloc = 1
team_size = 3

[[context]]
name = "submission"
factors = ["sloc", "team_size"]
"#;

    #[test]
    fn test_minimal_config_uses_default_thresholds() {
        let config = SelectionConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert_eq!(config.weights.get("team_size"), Some(Weight::Count(3)));
        assert_eq!(config.contexts.len(), 1);
        assert!(config.decisions.is_empty());
        assert!(config.context("submission").is_some());
        assert!(config.context("close").is_none());
    }

    #[test]
    fn test_default_study() {
        let config = SelectionConfig::default_study().unwrap();

        let submission = config.context("submission").unwrap();
        let close = config.context("close").unwrap();
        assert_eq!(submission.factors.len(), 29);
        assert_eq!(close.factors.len(), 43);

        assert_eq!(config.weights.get("core_member"), Some(Weight::Count(7)));
        assert_eq!(config.weights.get("same_user"), Some(Weight::AlwaysKeep));
        assert_eq!(config.weights.get("has_comments"), Some(Weight::AlwaysKeep));
        assert_eq!(config.weights.len(), 55);

        // Every factor of every context has a weight
        for context in &config.contexts {
            for factor in &context.factors {
                assert!(config.weights.contains(factor), "no weight for {}", factor);
            }
        }
    }

    #[test]
    fn test_partial_thresholds() {
        let config = SelectionConfig::from_toml_str(
            r#"
[thresholds]
cross = 0.06
degenerate_df = "error"
"#,
        )
        .unwrap();
        assert_eq!(config.thresholds.cross, 0.06);
        assert_eq!(config.thresholds.continuous, 0.7);
        assert_eq!(config.thresholds.degenerate_df, DegenerateDfPolicy::Error);
    }

    #[test]
    fn test_duplicate_context_error() {
        let result = SelectionConfig::from_toml_str(
            r#"
[[context]]
name = "close"
factors = []

[[context]]
name = "close"
factors = ["sloc"]
"#,
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate context"));
    }

    #[test]
    fn test_decision_must_name_candidate() {
        let result = SelectionConfig::from_toml_str(
            r#"
[[decision]]
candidates = ["a", "b"]
remove = "c"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_decision_in_same_scope() {
        let err = SelectionConfig::from_toml_str(
            r#"
[[decision]]
candidates = ["a", "b"]
remove = "a"

[[decision]]
candidates = ["b", "a"]
remove = "b"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate decision"));
    }

    #[test]
    fn test_scoped_and_global_decision_may_share_candidates() {
        let config = SelectionConfig::from_toml_str(
            r#"
[[context]]
name = "close"
factors = []

[[decision]]
context = "close"
candidates = ["a", "b"]
remove = "a"

[[decision]]
candidates = ["a", "b"]
remove = "b"
"#,
        )
        .unwrap();
        assert_eq!(config.decisions_for("close").count(), 2);
    }

    #[test]
    fn test_decision_unknown_context() {
        let result = SelectionConfig::from_toml_str(
            r#"
[[decision]]
context = "merge"
candidates = ["a", "b"]
remove = "a"
"#,
        );
        assert!(result.unwrap_err().to_string().contains("unknown context"));
    }

    #[test]
    fn test_decisions_for_context() {
        let config = SelectionConfig::from_toml_str(
            r#"
[[context]]
name = "submission"
factors = []

[[context]]
name = "close"
factors = []

[[decision]]
candidates = ["a", "b"]
remove = "a"

[[decision]]
context = "close"
candidates = ["c", "d"]
remove = "d"
"#,
        )
        .unwrap();
        assert_eq!(config.decisions_for("submission").count(), 1);
        assert_eq!(config.decisions_for("close").count(), 2);
    }

    #[test]
    fn test_from_toml_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", MINIMAL)?;
        file.flush()?;

        let config = SelectionConfig::from_toml(file.path())?;
        assert_eq!(config.contexts[0].name, "submission");
        Ok(())
    }

    #[test]
    fn test_from_toml_missing_file() {
        let err = SelectionConfig::from_toml("/nonexistent/factors.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

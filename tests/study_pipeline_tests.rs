// Pipeline tests against the fixture study tables
//
// tests/fixtures/study holds a small but complete set of association tables in
// the layout the statistics stage writes. Strong correlations in it:
//
//   sloc - team_size                      (Spearman 0.82)
//   src_churn_open - churn_addition_open  (Spearman 0.91)
//   core_member - first_pr                (Cramér's V 0.62, df 2/2)
//   core_member - same_user               (Cramér's V 0.71, df 2/2)
//   first_pr - num_commits_open           (eta squared 0.20)

use factor_prune::correlation_graph::StrongCorrelationGraph;
use factor_prune::selection::{run_context, RejectTies, SelectionConfig};
use factor_prune::tables::AssociationInputs;
use factor_prune::thresholds::ThresholdConfig;
use std::path::PathBuf;

fn study_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/study")
}

fn study_graph() -> StrongCorrelationGraph {
    let inputs = AssociationInputs::from_dir(study_dir()).unwrap();
    StrongCorrelationGraph::build(&inputs, &ThresholdConfig::default()).unwrap()
}

#[test]
fn test_fixture_graph() {
    let graph = study_graph();

    assert_eq!(graph.vertex_count(), 11);
    assert_eq!(graph.edge_count(), 5);
    assert!(graph.is_symmetric());
    assert!(graph.neighbors("sloc").unwrap().contains("team_size"));
    assert!(graph.neighbors("first_pr").unwrap().contains("num_commits_open"));
    assert_eq!(graph.degree("core_member"), 2);
    assert_eq!(graph.degree("project_age"), 0);
}

#[test]
fn test_stricter_thresholds_drop_edges() {
    let inputs = AssociationInputs::from_dir(study_dir()).unwrap();
    let thresholds = ThresholdConfig {
        continuous: 0.85,
        categorical: 0.65,
        cross: 0.25,
        ..ThresholdConfig::default()
    };
    let graph = StrongCorrelationGraph::build(&inputs, &thresholds).unwrap();

    // Only src_churn_open - churn_addition_open (0.91) and core_member - same_user (0.71)
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.degree("sloc"), 0);
}

/// Submission time: same_user is not observable yet
#[test]
fn test_submission_context() {
    let config = SelectionConfig::default_study().unwrap();
    let graph = study_graph();
    let context = config.context("submission").unwrap();

    let report = run_context(&graph, context, &config.weights, &mut RejectTies).unwrap();

    assert_eq!(report.vertices, 10);
    assert_eq!(report.edges, 4);
    assert_eq!(
        report.result.removed_names(),
        vec!["first_pr", "sloc", "churn_addition_open"]
    );
    assert_eq!(report.result.removed_degrees(), vec![2, 1, 1]);
    assert!(report.result.reinstated().is_empty());
    assert!(report.result.kept().contains("core_member"));
    assert!(!report.result.kept().contains("same_user"));
}

/// Close time: same_user is protected, which costs core_member
#[test]
fn test_close_context() {
    let config = SelectionConfig::default_study().unwrap();
    let graph = study_graph();
    let context = config.context("close").unwrap();

    let report = run_context(&graph, context, &config.weights, &mut RejectTies).unwrap();

    assert_eq!(report.vertices, 8);
    assert_eq!(report.edges, 3);
    // first_pr was removed against core_member, which was later removed too, so
    // reconciliation brings first_pr back
    assert_eq!(report.result.removed_names(), vec!["sloc", "core_member"]);
    assert_eq!(report.result.reinstated(), &["first_pr".to_string()]);
    let kept: Vec<&str> = report.result.kept().iter().map(String::as_str).collect();
    assert_eq!(
        kept,
        vec!["bug_fix", "ci_exists", "first_pr", "project_age", "same_user", "team_size"]
    );
}

#[test]
fn test_contexts_share_one_graph() {
    let config = SelectionConfig::default_study().unwrap();
    let graph = study_graph();
    let before = graph.clone();

    for context in &config.contexts {
        run_context(&graph, context, &config.weights, &mut RejectTies).unwrap();
    }

    assert_eq!(graph, before);
}

//! Escalation of ties the pruner cannot break on its own
//!
//! When several correlated factors share the lowest weight and the highest
//! degree, the pruner asks a [`TieResolver`] which one to remove. The call is
//! synchronous: pruning waits for the answer.

use crate::error::{Result, SelectionError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};

/// A set of factors with equal weight and equal degree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tie {
    /// Tied factors, sorted by name
    pub candidates: Vec<String>,
    /// Degree shared by every candidate
    pub degree: usize,
}

impl Tie {
    pub fn new(mut candidates: Vec<String>, degree: usize) -> Self {
        candidates.sort();
        candidates.dedup();
        Self { candidates, degree }
    }

    pub fn contains(&self, factor: &str) -> bool {
        self.candidates.iter().any(|c| c == factor)
    }

    /// Question shown to a human decision maker
    pub fn prompt(&self) -> String {
        format!(
            "Please select one to remove - same degree factors: {}, degree: {}",
            self.candidates.join(","),
            self.degree
        )
    }
}

/// Decides which tied factor to remove
pub trait TieResolver {
    /// Return the name of the factor to remove; it must be one of `tie.candidates`
    fn resolve_tie(&mut self, tie: &Tie) -> Result<String>;
}

impl<F> TieResolver for F
where
    F: FnMut(&Tie) -> Result<String>,
{
    fn resolve_tie(&mut self, tie: &Tie) -> Result<String> {
        self(tie)
    }
}

/// Removes the lexicographically first candidate
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstByName;

impl TieResolver for FirstByName {
    fn resolve_tie(&mut self, tie: &Tie) -> Result<String> {
        tie.candidates
            .first()
            .cloned()
            .ok_or_else(|| SelectionError::ResolverFailed("tie has no candidates".to_string()))
    }
}

/// Fails on every tie; for runs where nobody can answer
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectTies;

impl TieResolver for RejectTies {
    fn resolve_tie(&mut self, tie: &Tie) -> Result<String> {
        Err(SelectionError::AmbiguousTie {
            candidates: tie.candidates.clone(),
            degree: tie.degree,
        })
    }
}

/// Asks a human through a line-oriented reader/writer pair
///
/// Unknown names are rejected and the question is asked again. End of input is
/// an error.
///
/// # Example
/// ```
/// use factor_prune::selection::{PromptResolver, Tie, TieResolver};
///
/// let mut out: Vec<u8> = Vec::new();
/// let mut resolver = PromptResolver::new("typo\nsloc\n".as_bytes(), &mut out);
/// let tie = Tie::new(vec!["team_size".into(), "sloc".into()], 2);
/// assert_eq!(resolver.resolve_tie(&tie).unwrap(), "sloc");
/// ```
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptResolver<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompt on stderr, read answers from stdin
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> TieResolver for PromptResolver<R, W> {
    fn resolve_tie(&mut self, tie: &Tie) -> Result<String> {
        let io_err = |e: std::io::Error| SelectionError::ResolverFailed(e.to_string());

        loop {
            writeln!(self.output, "{}", tie.prompt()).map_err(io_err)?;
            self.output.flush().map_err(io_err)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(io_err)? == 0 {
                return Err(SelectionError::AmbiguousTie {
                    candidates: tie.candidates.clone(),
                    degree: tie.degree,
                });
            }

            let answer = line.trim();
            if tie.contains(answer) {
                return Ok(answer.to_string());
            }
            writeln!(self.output, "'{}' is not one of the tied factors", answer).map_err(io_err)?;
        }
    }
}

/// A tie decision written down in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedDecision {
    /// Analysis context the decision belongs to; `None` applies to every context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// The tied factors, in any order
    pub candidates: Vec<String>,
    /// Which of them to remove
    pub remove: String,
}

impl RecordedDecision {
    pub fn applies_to(&self, context: &str) -> bool {
        self.context.as_deref().map_or(true, |c| c == context)
    }
}

/// Replays recorded decisions, delegating unknown ties to a fallback resolver
pub struct RecordedDecisions {
    decisions: BTreeMap<BTreeSet<String>, String>,
    fallback: Box<dyn TieResolver>,
}

impl RecordedDecisions {
    pub fn new<'a, I>(decisions: I, fallback: Box<dyn TieResolver>) -> Self
    where
        I: IntoIterator<Item = &'a RecordedDecision>,
    {
        let mut map: BTreeMap<BTreeSet<String>, String> = BTreeMap::new();
        let mut scoped = BTreeSet::new();
        // A context-scoped entry overrides a global one for the same candidates
        for decision in decisions {
            let key: BTreeSet<String> = decision.candidates.iter().cloned().collect();
            if decision.context.is_some() {
                scoped.insert(key.clone());
                map.insert(key, decision.remove.clone());
            } else if !scoped.contains(&key) {
                map.insert(key, decision.remove.clone());
            }
        }
        Self {
            decisions: map,
            fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl TieResolver for RecordedDecisions {
    fn resolve_tie(&mut self, tie: &Tie) -> Result<String> {
        let key: BTreeSet<String> = tie.candidates.iter().cloned().collect();
        match self.decisions.get(&key) {
            Some(choice) => {
                tracing::info!(choice = %choice, candidates = ?tie.candidates, "replaying recorded tie decision");
                Ok(choice.clone())
            }
            None => self.fallback.resolve_tie(tie),
        }
    }
}

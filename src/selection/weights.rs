use crate::correlation_graph::StrongCorrelationGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prior-usage weight of a factor
///
/// Lower weights are removed first. `AlwaysKeep` orders above every count, so a
/// protected factor is only ever removed once nothing else is left to decide.
///
/// In TOML a weight is either an integer or the string `"always-keep"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWeight", into = "RawWeight")]
pub enum Weight {
    /// Number of earlier studies that used the factor
    Count(u32),
    AlwaysKeep,
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Count(n) => write!(f, "{}", n),
            Weight::AlwaysKeep => f.write_str("always-keep"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawWeight {
    Count(u32),
    Keyword(String),
}

impl TryFrom<RawWeight> for Weight {
    type Error = String;

    fn try_from(raw: RawWeight) -> Result<Self, Self::Error> {
        match raw {
            RawWeight::Count(n) => Ok(Weight::Count(n)),
            RawWeight::Keyword(k) => match k.as_str() {
                "always-keep" | "always_keep" => Ok(Weight::AlwaysKeep),
                other => Err(format!(
                    "invalid weight '{}': expected a non-negative integer or \"always-keep\"",
                    other
                )),
            },
        }
    }
}

impl From<Weight> for RawWeight {
    fn from(weight: Weight) -> Self {
        match weight {
            Weight::Count(n) => RawWeight::Count(n),
            Weight::AlwaysKeep => RawWeight::Keyword("always-keep".to_string()),
        }
    }
}

/// Factor → prior-usage weight
///
/// Each pruning run owns its own copy; the pruner consumes entries as factors
/// are decided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityWeights {
    weights: BTreeMap<String, Weight>,
}

impl PriorityWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from plain usage counts
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        counts
            .into_iter()
            .map(|(factor, n)| (factor, Weight::Count(n)))
            .collect()
    }

    pub fn insert(&mut self, factor: impl Into<String>, weight: Weight) -> Option<Weight> {
        self.weights.insert(factor.into(), weight)
    }

    pub fn get(&self, factor: &str) -> Option<Weight> {
        self.weights.get(factor).copied()
    }

    pub fn remove(&mut self, factor: &str) -> Option<Weight> {
        self.weights.remove(factor)
    }

    pub fn contains(&self, factor: &str) -> bool {
        self.weights.contains_key(factor)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Drop weights of factors that are not vertices of `graph`
    ///
    /// Returns the dropped factor names.
    pub fn retain_factors(&mut self, graph: &StrongCorrelationGraph) -> Vec<String> {
        let dropped: Vec<String> = self
            .weights
            .keys()
            .filter(|f| !graph.contains(f))
            .cloned()
            .collect();
        for factor in &dropped {
            self.weights.remove(factor);
        }
        dropped
    }

    /// Least established factor: minimum weight, then minimum name
    pub fn least_established(&self) -> Option<(&str, Weight)> {
        self.weights
            .iter()
            .min_by(|(a_name, a_weight), (b_name, b_weight)| {
                a_weight.cmp(b_weight).then_with(|| a_name.cmp(b_name))
            })
            .map(|(name, weight)| (name.as_str(), *weight))
    }
}

impl<S: Into<String>> FromIterator<(S, Weight)> for PriorityWeights {
    fn from_iter<I: IntoIterator<Item = (S, Weight)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

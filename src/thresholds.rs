//! Strong-correlation thresholds for the three association statistics
//!
//! | statistic                       | strong when                                   |
//! |---------------------------------|-----------------------------------------------|
//! | Spearman (continuous pairs)     | \|rho\| > `continuous`                         |
//! | Cramér's V (categorical pairs)  | \|V\| > `categorical` / sqrt((df_i-1)(df_j-1)) |
//! | eta squared (cross pairs)       | \|eta²\| > `cross`                             |
//!
//! The categorical threshold is Cohen's large effect size for Cramér's V,
//! normalised by the degrees of freedom of both factors.

use serde::{Deserialize, Serialize};

/// What to do when a categorical pair has df <= 1 on either side
///
/// The normalised threshold divides by `sqrt((df_i - 1)(df_j - 1))`, which is zero
/// (or imaginary) for such pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegenerateDfPolicy {
    /// Treat the pair as not strongly correlated and log a warning
    #[default]
    Skip,
    /// Abort graph construction with `SelectionError::DegenerateDegreesOfFreedom`
    Error,
}

/// Thresholds used by the graph builder
///
/// # Example
/// ```
/// use factor_prune::thresholds::ThresholdConfig;
///
/// let config = ThresholdConfig::default();
/// assert_eq!(config.continuous, 0.7);
/// assert_eq!(config.categorical_threshold(2, 2), Some(0.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Absolute Spearman coefficient above which two continuous factors are strongly correlated
    pub continuous: f64,

    /// Cramér's V effect size before df normalisation
    pub categorical: f64,

    /// Eta squared above which a categorical and a continuous factor are strongly correlated
    ///
    /// 0.14 is the conventional "large" effect for eta squared.
    pub cross: f64,

    /// Handling of categorical pairs whose normalised threshold is undefined
    pub degenerate_df: DegenerateDfPolicy,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            continuous: 0.7,
            categorical: 0.5,
            cross: 0.14,
            degenerate_df: DegenerateDfPolicy::Skip,
        }
    }
}

impl ThresholdConfig {
    /// Normalised Cramér's V threshold for a pair, `None` when df <= 1 on either side
    pub fn categorical_threshold(&self, df_a: u32, df_b: u32) -> Option<f64> {
        if df_a <= 1 || df_b <= 1 {
            return None;
        }
        let denom = (f64::from(df_a - 1) * f64::from(df_b - 1)).sqrt();
        Some(self.categorical / denom)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("continuous", self.continuous),
            ("categorical", self.categorical),
            ("cross", self.cross),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "{} threshold must be a non-negative number, got {}",
                    name, value
                ));
            }
        }

        if self.continuous > 1.0 {
            return Err(format!(
                "continuous threshold must be in [0, 1], got {}",
                self.continuous
            ));
        }

        Ok(())
    }
}

//! CLI argument parsing for factor-prune

use crate::tables::AssociationInputs;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Output format for pruning results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Who decides ties that weight and degree cannot break
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TieMode {
    /// Ask on the terminal (default)
    Prompt,
    /// Remove the alphabetically first candidate
    FirstByName,
    /// Stop with an error
    Fail,
}

#[derive(Parser, Debug)]
#[command(name = "factor-prune")]
#[command(version)]
#[command(
    about = "Remove strongly correlated factors before regression modelling",
    long_about = None
)]
pub struct Cli {
    /// Directory holding the four association tables under their default names
    #[arg(short = 't', long = "tables", value_name = "DIR")]
    pub tables: Option<PathBuf>,

    /// Spearman table for continuous factors (overrides --tables)
    #[arg(long = "continuous", value_name = "CSV")]
    pub continuous: Option<PathBuf>,

    /// Cramér's V table for categorical factors (overrides --tables)
    #[arg(long = "categorical", value_name = "CSV")]
    pub categorical: Option<PathBuf>,

    /// Degrees of freedom of categorical factors, `df` column (overrides --tables)
    #[arg(long = "dof", value_name = "CSV")]
    pub dof: Option<PathBuf>,

    /// Eta squared table, categorical rows by continuous columns (overrides --tables)
    #[arg(long = "cross", value_name = "CSV")]
    pub cross: Option<PathBuf>,

    /// Factor selection config (thresholds, weights, contexts); defaults to the built-in study
    #[arg(short = 'c', long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Only run the named analysis context (repeatable)
    #[arg(long = "context", value_name = "NAME")]
    pub contexts: Vec<String>,

    /// Tie handling when no recorded decision matches
    #[arg(long = "ties", value_enum, default_value = "prompt")]
    pub ties: TieMode,

    /// Output format (text, json or csv)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Resolve one table path from its override flag or the tables directory
    fn table_path(&self, explicit: &Option<PathBuf>, file: &str, flag: &str) -> Result<PathBuf> {
        match (explicit, &self.tables) {
            (Some(path), _) => Ok(path.clone()),
            (None, Some(dir)) => Ok(dir.join(file)),
            (None, None) => anyhow::bail!(
                "No {} table given. Use --tables DIR or --{} FILE.",
                flag,
                flag
            ),
        }
    }

    /// Load the four association tables named on the command line
    pub fn load_inputs(&self) -> Result<AssociationInputs> {
        let continuous =
            self.table_path(&self.continuous, AssociationInputs::CONTINUOUS_FILE, "continuous")?;
        let categorical = self.table_path(
            &self.categorical,
            AssociationInputs::CATEGORICAL_FILE,
            "categorical",
        )?;
        let dof = self.table_path(&self.dof, AssociationInputs::DOF_FILE, "dof")?;
        let cross = self.table_path(&self.cross, AssociationInputs::CROSS_FILE, "cross")?;

        AssociationInputs::from_paths(&continuous, &categorical, &dof, &cross)
            .context("Failed to load association tables")
    }

    /// Config file path, if one was given
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

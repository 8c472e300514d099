//! CSV output format for factor selection results
//!
//! One row per factor and context: `context,status,factor,degree`. Status is
//! `removed`, `kept` or `reinstated`; degree is only filled for removals.

use crate::selection::ContextReport;

/// CSV record for one factor in one context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFactorRow {
    pub context: String,
    pub status: FactorStatus,
    pub factor: String,
    pub degree: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorStatus {
    Removed,
    Kept,
    Reinstated,
}

impl FactorStatus {
    fn as_str(self) -> &'static str {
        match self {
            FactorStatus::Removed => "removed",
            FactorStatus::Kept => "kept",
            FactorStatus::Reinstated => "reinstated",
        }
    }
}

/// CSV output formatter
#[derive(Debug, Default)]
pub struct CsvOutput {
    rows: Vec<CsvFactorRow>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every factor of a context
    ///
    /// Removed factors come first in elimination order, then kept factors by
    /// name. Reinstated factors are listed under `reinstated` rather than `kept`.
    pub fn add_context(&mut self, report: &ContextReport) {
        let result = &report.result;

        for removal in result.removed() {
            self.rows.push(CsvFactorRow {
                context: report.context.clone(),
                status: FactorStatus::Removed,
                factor: removal.factor.clone(),
                degree: Some(removal.degree),
            });
        }

        for factor in result.kept() {
            let status = if result.reinstated().contains(factor) {
                FactorStatus::Reinstated
            } else {
                FactorStatus::Kept
            };
            self.rows.push(CsvFactorRow {
                context: report.context.clone(),
                status,
                factor: factor.clone(),
                degree: None,
            });
        }
    }

    pub fn rows(&self) -> &[CsvFactorRow] {
        &self.rows
    }

    fn header() -> &'static str {
        "context,status,factor,degree"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_row(row: &CsvFactorRow) -> String {
        [
            Self::escape_field(&row.context),
            row.status.as_str().to_string(),
            Self::escape_field(&row.factor),
            row.degree.map(|d| d.to_string()).unwrap_or_default(),
        ]
        .join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(Self::header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }

        output
    }
}

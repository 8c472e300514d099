//! Association tables produced by the statistics stage
//!
//! Three shapes are consumed:
//! - [`AssociationTable`]: square, labelled on both axes (Spearman or Cramér's V)
//! - [`CrossTable`]: categorical rows against continuous columns (eta squared)
//! - [`DegreesOfFreedom`]: categorical factor → df
//!
//! The CSV reader understands the layout written by `DataFrame.to_csv()` with an
//! index column: the first header cell is blank (or an index name), the first cell
//! of every row is the row label. Missing cells (`NA`, `NaN`, empty) are kept as
//! `f64::NAN`, which never exceeds a threshold.

use crate::error::SelectionError;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Labelled numeric matrix with independent row and column label sets
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTable {
    rows: Vec<String>,
    columns: Vec<String>,
    /// Row-major cell values, `rows.len() * columns.len()`
    values: Vec<f64>,
    row_index: HashMap<String, usize>,
    column_index: HashMap<String, usize>,
}

impl CrossTable {
    /// Build a table from labels and row-major values
    pub fn new(
        rows: Vec<String>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> std::result::Result<Self, SelectionError> {
        if values.len() != rows.len() {
            return Err(malformed(
                "cross",
                format!("{} row labels but {} rows of values", rows.len(), values.len()),
            ));
        }
        let mut flat = Vec::with_capacity(rows.len() * columns.len());
        for (label, row) in rows.iter().zip(values) {
            if row.len() != columns.len() {
                return Err(malformed(
                    "cross",
                    format!(
                        "row '{}' has {} cells, expected {}",
                        label,
                        row.len(),
                        columns.len()
                    ),
                ));
            }
            flat.extend(row);
        }

        let row_index = index_labels("cross", "row", &rows)?;
        let column_index = index_labels("cross", "column", &columns)?;

        Ok(Self {
            rows,
            columns,
            values: flat,
            row_index,
            column_index,
        })
    }

    /// Row labels in file order
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Column labels in file order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cell value for (row, column), `None` if either label is unknown
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = *self.row_index.get(row)?;
        let c = *self.column_index.get(column)?;
        Some(self.values[r * self.columns.len() + c])
    }

    /// Parse from CSV text with an index column
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let (rows, columns, values) = parse_labelled_csv(content)?;
        Ok(Self::new(rows, columns, values)?)
    }

    /// Load from a CSV file with an index column
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_csv_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Square association table (same factor set on both axes)
///
/// Row order may differ from column order; lookups go through the label index.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationTable {
    inner: CrossTable,
}

impl AssociationTable {
    /// Build a square table, rejecting mismatched row and column label sets
    pub fn new(
        kind: &str,
        rows: Vec<String>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> std::result::Result<Self, SelectionError> {
        let row_set: BTreeSet<&String> = rows.iter().collect();
        let column_set: BTreeSet<&String> = columns.iter().collect();
        if row_set != column_set {
            let missing: Vec<&String> = column_set.symmetric_difference(&row_set).copied().collect();
            return Err(malformed(
                kind,
                format!("row and column labels differ: {:?}", missing),
            ));
        }
        let inner = CrossTable::new(rows, columns, values).map_err(|e| match e {
            SelectionError::MalformedTable { reason, .. } => malformed(kind, reason),
            other => other,
        })?;
        Ok(Self { inner })
    }

    /// Build from a factor list and a full matrix in the same order
    pub fn from_matrix(
        kind: &str,
        factors: &[&str],
        values: Vec<Vec<f64>>,
    ) -> std::result::Result<Self, SelectionError> {
        let labels: Vec<String> = factors.iter().map(|f| f.to_string()).collect();
        Self::new(kind, labels.clone(), labels, values)
    }

    /// Factor labels in column order
    pub fn factors(&self) -> &[String] {
        self.inner.columns()
    }

    /// Association between two factors, `None` if either is unknown
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.inner.get(a, b)
    }

    /// Parse from CSV text with an index column
    pub fn from_csv_str(kind: &str, content: &str) -> Result<Self> {
        let (rows, columns, values) = parse_labelled_csv(content)?;
        Ok(Self::new(kind, rows, columns, values)?)
    }

    /// Load from a CSV file with an index column
    pub fn from_file<P: AsRef<Path>>(kind: &str, path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_csv_str(kind, &content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Degrees of freedom of each categorical factor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegreesOfFreedom {
    values: BTreeMap<String, u32>,
}

impl DegreesOfFreedom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, factor: impl Into<String>, df: u32) {
        self.values.insert(factor.into(), df);
    }

    pub fn get(&self, factor: &str) -> Option<u32> {
        self.values.get(factor).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse from CSV text: index column plus a column named `df`
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let (rows, columns, values) = parse_labelled_csv(content)?;
        let df_col = columns
            .iter()
            .position(|c| c == "df")
            .ok_or_else(|| malformed("degrees-of-freedom", "no 'df' column".to_string()))?;

        let mut table = Self::new();
        for (factor, row) in rows.into_iter().zip(values) {
            let raw = row[df_col];
            if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 {
                return Err(malformed(
                    "degrees-of-freedom",
                    format!("df for '{}' is not a non-negative integer: {}", factor, raw),
                )
                .into());
            }
            table.insert(factor, raw as u32);
        }
        Ok(table)
    }

    /// Load from a CSV file: index column plus a column named `df`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_csv_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for DegreesOfFreedom {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// The four inputs of graph construction, as one bundle
#[derive(Debug, Clone)]
pub struct AssociationInputs {
    pub continuous: AssociationTable,
    pub categorical: AssociationTable,
    pub degrees_of_freedom: DegreesOfFreedom,
    pub cross: CrossTable,
}

impl AssociationInputs {
    pub const CONTINUOUS_FILE: &'static str = "continuous_correlation.csv";
    pub const CATEGORICAL_FILE: &'static str = "categorical_correlation.csv";
    pub const DOF_FILE: &'static str = "categorical_correlation_df.csv";
    pub const CROSS_FILE: &'static str = "cross_correlation.csv";

    /// Load the four tables from a directory using the statistics stage file names
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Self::from_paths(
            &dir.join(Self::CONTINUOUS_FILE),
            &dir.join(Self::CATEGORICAL_FILE),
            &dir.join(Self::DOF_FILE),
            &dir.join(Self::CROSS_FILE),
        )
    }

    /// Load the four tables from explicit paths
    pub fn from_paths(
        continuous: &Path,
        categorical: &Path,
        dof: &Path,
        cross: &Path,
    ) -> Result<Self> {
        Ok(Self {
            continuous: AssociationTable::from_file("continuous", continuous)?,
            categorical: AssociationTable::from_file("categorical", categorical)?,
            degrees_of_freedom: DegreesOfFreedom::from_file(dof)?,
            cross: CrossTable::from_file(cross)?,
        })
    }
}

fn malformed(table: &str, reason: String) -> SelectionError {
    SelectionError::MalformedTable {
        table: table.to_string(),
        reason,
    }
}

fn index_labels(
    table: &str,
    axis: &str,
    labels: &[String],
) -> std::result::Result<HashMap<String, usize>, SelectionError> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            return Err(malformed(
                table,
                format!("duplicate {} label '{}'", axis, label),
            ));
        }
    }
    Ok(index)
}

type LabelledRows = (Vec<String>, Vec<String>, Vec<Vec<f64>>);

/// Split a labelled CSV document into (row labels, column labels, values)
fn parse_labelled_csv(content: &str) -> Result<LabelledRows> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());

    let header = lines.next().context("CSV is empty")?;
    let mut header_fields = split_record(header)?;
    if header_fields.is_empty() {
        anyhow::bail!("CSV header has no fields");
    }
    // Index column header is ignored
    header_fields.remove(0);
    let columns = header_fields;

    let mut rows = Vec::new();
    let mut values = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let mut fields = split_record(line)?;
        if fields.len() != columns.len() + 1 {
            anyhow::bail!(
                "line {}: expected {} fields, found {}",
                line_no + 2,
                columns.len() + 1,
                fields.len()
            );
        }
        let label = fields.remove(0);
        let cells = fields
            .iter()
            .map(|f| parse_cell(f))
            .collect::<Result<Vec<f64>>>()
            .with_context(|| format!("line {}: row '{}'", line_no + 2, label))?;
        rows.push(label);
        values.push(cells);
    }

    Ok((rows, columns, values))
}

fn parse_cell(field: &str) -> Result<f64> {
    let field = field.trim();
    match field {
        "" | "NA" | "NaN" | "nan" | "null" => Ok(f64::NAN),
        _ => field
            .parse::<f64>()
            .with_context(|| format!("invalid numeric cell '{}'", field)),
    }
}

/// Split one CSV record, honouring double-quoted fields with `""` escapes
fn split_record(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_quotes {
        anyhow::bail!("unterminated quoted field in '{}'", line);
    }
    fields.push(current);
    Ok(fields)
}

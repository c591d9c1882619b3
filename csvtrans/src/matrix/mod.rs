//! Column matrix: a declarative row transformer loaded from JSON.
//!
//! A matrix lists the output columns in order. Each column takes its value
//! from one input column, several joined input columns, or a constant, then
//! runs a chain of [`Operation`]s over it.
//!
//! ```rust
//! use csvtrans::{run, ColumnMatrix};
//!
//! let matrix = ColumnMatrix::from_json(r#"{
//!     "columns": [
//!         {"name": "code", "source": "Code", "operations": [{"type": "uppercase"}], "required": true},
//!         {"name": "label", "source": "Label", "operations": [{"type": "trim"}]}
//!     ]
//! }"#).unwrap();
//!
//! let mut output = Vec::new();
//! run("Label,Code\n  Red ,r\nBlue,\n".as_bytes(), &mut output, matrix.into_transformer().unwrap()).unwrap();
//! assert_eq!(String::from_utf8(output).unwrap(), "code,label\nR,Red\n");
//! ```

pub mod executor;
pub mod operations;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::error::{MatrixError, MatrixResult};

pub use executor::MatrixExecutor;
pub use operations::{operations_description, Operation};

/// A complete column matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMatrix {
    /// Version of the matrix format
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Whether input row 0 is a header naming the columns
    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// Output columns, in output order
    pub columns: Vec<ColumnTransform>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_has_header() -> bool {
    true
}

/// Reference to an input column, by header name or zero-based position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "#{}", i),
            ColumnRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

/// Transformation rule for a single output column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransform {
    /// Output column name (written in the header row)
    pub name: String,

    /// Source column (mutually exclusive with sources and constant)
    #[serde(default)]
    pub source: Option<ColumnRef>,

    /// Source columns to join (mutually exclusive with source and constant)
    #[serde(default)]
    pub sources: Option<Vec<ColumnRef>>,

    /// Separator for joining multiple sources (default: " ")
    #[serde(default = "default_concat_separator")]
    pub concat_separator: String,

    /// Constant value (mutually exclusive with source/sources)
    #[serde(default)]
    pub constant: Option<String>,

    /// Ordered list of operations to apply
    #[serde(default)]
    pub operations: Vec<Operation>,

    /// Value used when the column comes out empty
    #[serde(default)]
    pub default: Option<String>,

    /// Skip the row when this column comes out empty
    #[serde(default)]
    pub required: bool,
}

fn default_concat_separator() -> String {
    " ".to_string()
}

impl ColumnMatrix {
    /// Create an empty matrix
    pub fn new() -> Self {
        Self {
            version: default_version(),
            description: String::new(),
            has_header: default_has_header(),
            columns: Vec::new(),
        }
    }

    /// Parse a matrix from JSON string
    pub fn from_json(json: &str) -> MatrixResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a matrix from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> MatrixResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> MatrixResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add an output column
    pub fn with_column(mut self, column: ColumnTransform) -> Self {
        self.columns.push(column);
        self
    }

    /// Input is headerless: sources must be positions
    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }

    /// All source columns referenced in the matrix, deduplicated
    pub fn source_columns(&self) -> Vec<ColumnRef> {
        let mut columns: Vec<ColumnRef> = Vec::new();
        for column in self.columns.iter().flat_map(|c| c.get_sources()) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Output column names, in order
    pub fn target_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Check the matrix is usable before any row is read.
    pub fn validate(&self) -> MatrixResult<()> {
        if self.columns.is_empty() {
            return Err(MatrixError::InvalidMatrix("no output columns".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(MatrixError::InvalidMatrix("column with empty name".to_string()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(MatrixError::InvalidMatrix(format!(
                    "duplicate output column '{}'",
                    column.name
                )));
            }

            let origins = [
                column.source.is_some(),
                column.sources.is_some(),
                column.constant.is_some(),
            ];
            if origins.iter().filter(|set| **set).count() > 1 {
                return Err(MatrixError::InvalidMatrix(format!(
                    "column '{}' sets more than one of source, sources and constant",
                    column.name
                )));
            }

            if !self.has_header {
                if let Some(named) = column
                    .get_sources()
                    .into_iter()
                    .find(|r| matches!(r, ColumnRef::Name(_)))
                {
                    return Err(MatrixError::InvalidMatrix(format!(
                        "column '{}' reads '{}' by name but the input has no header",
                        column.name, named
                    )));
                }
            }

            for op in &column.operations {
                if let Operation::Replace { pattern, .. } = op {
                    regex::Regex::new(pattern).map_err(|source| MatrixError::InvalidPattern {
                        column: column.name.clone(),
                        source,
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Compile into a row transformer, see [`MatrixExecutor`].
    pub fn into_transformer(self) -> MatrixResult<impl crate::RowTransformer> {
        Ok(MatrixExecutor::compile(self)?.into_transformer())
    }
}

impl Default for ColumnMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTransform {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            sources: None,
            concat_separator: default_concat_separator(),
            constant: None,
            operations: Vec::new(),
            default: None,
            required: false,
        }
    }

    /// Create a column from a source column
    pub fn from_source(name: &str, source: impl Into<ColumnRef>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::empty(name)
        }
    }

    /// Create a column from multiple source columns (joined)
    pub fn from_sources(name: &str, sources: Vec<ColumnRef>, separator: &str) -> Self {
        Self {
            sources: Some(sources),
            concat_separator: separator.to_string(),
            ..Self::empty(name)
        }
    }

    /// Create a column with a constant value
    pub fn from_constant(name: &str, value: &str) -> Self {
        Self {
            constant: Some(value.to_string()),
            ..Self::empty(name)
        }
    }

    /// Add an operation to the chain
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// All source columns referenced by this column
    pub fn get_sources(&self) -> Vec<ColumnRef> {
        let mut result = Vec::new();
        if let Some(ref s) = self.source {
            result.push(s.clone());
        }
        if let Some(ref ss) = self.sources {
            result.extend(ss.iter().cloned());
        }
        result
    }
}

/// Example matrix for documentation and the `example-matrix` command
pub fn example_matrix() -> ColumnMatrix {
    let mut role_mapping = HashMap::new();
    role_mapping.insert("CA".to_string(), "Composer".to_string());
    role_mapping.insert("A".to_string(), "Author".to_string());
    role_mapping.insert("AR".to_string(), "Arranger".to_string());

    ColumnMatrix {
        version: "1.0".to_string(),
        description: "Normalize a works catalog export".to_string(),
        has_header: true,
        columns: vec![
            ColumnTransform::from_source("iswc", "Code ISWC")
                .with_operation(Operation::Trim)
                .with_operation(Operation::Replace {
                    pattern: "[-. ]".to_string(),
                    value: String::new(),
                })
                .with_operation(Operation::EnsurePrefix {
                    value: "T".to_string(),
                })
                .required(),
            ColumnTransform::from_source("title", "Titre")
                .with_operation(Operation::Trim)
                .required(),
            ColumnTransform::from_source("role", "Role")
                .with_operation(Operation::Trim)
                .with_operation(Operation::Map {
                    mapping: role_mapping,
                    case_insensitive: true,
                    default_unmapped: None,
                })
                .with_default("Composer"),
            ColumnTransform::from_source("ipi", "IPI")
                .with_operation(Operation::DigitsOnly)
                .with_operation(Operation::PadStart {
                    length: 11,
                    char: "0".to_string(),
                }),
            ColumnTransform::from_source("year", "Date")
                .with_operation(Operation::ExtractYear),
            ColumnTransform::from_constant("source", "catalog"),
        ],
    }
}

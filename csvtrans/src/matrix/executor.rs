//! Matrix executor
//!
//! Compiles a [`ColumnMatrix`] once (patterns, column positions) and fills one
//! output row per input row through the buffer-reuse adapter. Every output
//! position is rewritten on every row, so no value carries over between rows.

use log::debug;
use regex::Regex;

use super::operations::Operation;
use super::{ColumnMatrix, ColumnRef, ColumnTransform};
use crate::error::{BoxError, MatrixError, MatrixResult};
use crate::pipeline::RowTransformer;
use crate::reuse::{reusable, BufferRow};

/// Where a column's starting value comes from
#[derive(Debug)]
enum Origin {
    Single(ColumnRef),
    Joined(Vec<ColumnRef>, String),
    Constant(String),
    Empty,
}

/// An operation ready to run; `replace` patterns are compiled up front
#[derive(Debug)]
enum Step {
    Op(Operation),
    Replace(Regex, String),
}

#[derive(Debug)]
struct CompiledColumn {
    name: String,
    origin: Origin,
    steps: Vec<Step>,
    default: Option<String>,
    required: bool,
    /// Input positions of the origin columns, filled by resolution
    positions: Vec<usize>,
}

/// A compiled column matrix
#[derive(Debug)]
pub struct MatrixExecutor {
    columns: Vec<CompiledColumn>,
    has_header: bool,
}

impl MatrixExecutor {
    /// Validate and compile a matrix.
    pub fn compile(matrix: ColumnMatrix) -> MatrixResult<Self> {
        matrix.validate()?;

        let columns = matrix
            .columns
            .into_iter()
            .map(CompiledColumn::compile)
            .collect::<MatrixResult<Vec<_>>>()?;

        let mut executor = Self {
            columns,
            has_header: matrix.has_header,
        };
        if !executor.has_header {
            executor.resolve(&[])?;
        }
        Ok(executor)
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Output column names, in order
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Map every source reference to an input position.
    fn resolve(&mut self, header: &[String]) -> MatrixResult<()> {
        let mut missing = Vec::new();

        for column in &mut self.columns {
            let refs: &[ColumnRef] = match &column.origin {
                Origin::Single(r) => std::slice::from_ref(r),
                Origin::Joined(refs, _) => refs,
                Origin::Constant(_) | Origin::Empty => &[],
            };

            column.positions.clear();
            for r in refs {
                match r {
                    ColumnRef::Index(i) => column.positions.push(*i),
                    ColumnRef::Name(name) => match header.iter().position(|h| h.trim() == name) {
                        Some(i) => column.positions.push(i),
                        None if !missing.contains(name) => missing.push(name.clone()),
                        None => {}
                    },
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MatrixError::MissingColumns(missing))
        }
    }

    /// Fill `buffer` for row `index`.
    ///
    /// With a header, row 0 resolves column names and produces the output
    /// header. Rows whose required columns come out empty are skipped.
    pub fn fill(&mut self, index: usize, row: &[String], buffer: &mut [String]) -> Result<BufferRow, BoxError> {
        if self.has_header && index == 0 {
            self.resolve(row)?;
            for (slot, column) in buffer.iter_mut().zip(&self.columns) {
                slot.clone_from(&column.name);
            }
            return Ok(BufferRow::Buffer);
        }

        let mut missing = Vec::new();
        for (slot, column) in buffer.iter_mut().zip(&self.columns) {
            *slot = column.evaluate(row)?;
            if column.required && slot.is_empty() {
                missing.push(column.name.as_str());
            }
        }

        if !missing.is_empty() {
            debug!("Skipping row {}: missing required {}", index, missing.join(", "));
            return Ok(BufferRow::Skip);
        }

        Ok(BufferRow::Buffer)
    }

    /// Wrap the executor in a transformer that reuses one output buffer.
    pub fn into_transformer(mut self) -> impl RowTransformer {
        let width = self.width();
        reusable(width, move |index, row, buffer| self.fill(index, &row, buffer))
    }
}

impl CompiledColumn {
    fn compile(transform: ColumnTransform) -> MatrixResult<Self> {
        let origin = if let Some(source) = transform.source {
            Origin::Single(source)
        } else if let Some(sources) = transform.sources {
            Origin::Joined(sources, transform.concat_separator)
        } else if let Some(constant) = transform.constant {
            Origin::Constant(constant)
        } else {
            Origin::Empty
        };

        let steps = transform
            .operations
            .into_iter()
            .map(|op| match op {
                Operation::Replace { pattern, value } => Regex::new(&pattern)
                    .map(|re| Step::Replace(re, value))
                    .map_err(|source| MatrixError::InvalidPattern {
                        column: transform.name.clone(),
                        source,
                    }),
                op => Ok(Step::Op(op)),
            })
            .collect::<MatrixResult<Vec<_>>>()?;

        Ok(Self {
            name: transform.name,
            origin,
            steps,
            default: transform.default,
            required: transform.required,
            positions: Vec::new(),
        })
    }

    fn evaluate(&self, row: &[String]) -> Result<String, regex::Error> {
        // Get initial value from source column(s) or constant
        let value = match &self.origin {
            Origin::Single(_) => self
                .positions
                .first()
                .and_then(|&i| row.get(i))
                .cloned()
                .unwrap_or_default(),
            Origin::Joined(_, separator) => self
                .positions
                .iter()
                .filter_map(|&i| row.get(i))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(separator),
            Origin::Constant(c) => c.clone(),
            Origin::Empty => String::new(),
        };

        let value = if value.trim().is_empty() {
            match &self.default {
                Some(default) => default.clone(),
                None => return Ok(String::new()),
            }
        } else {
            value
        };

        let value = self.steps.iter().try_fold(value, |v, step| match step {
            Step::Op(op) => op.apply(&v),
            Step::Replace(re, replacement) => Ok(Operation::apply_replace(&v, re, replacement)),
        })?;

        // Empty after operations: fall back to the default again
        if value.trim().is_empty() {
            Ok(self.default.clone().unwrap_or_default())
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::example_matrix;
    use crate::pipeline::run;

    fn run_matrix(matrix: ColumnMatrix, input: &str) -> crate::Result<String> {
        let mut out = Vec::new();
        run(input.as_bytes(), &mut out, matrix.into_transformer().unwrap())?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_execute_example() {
        let input = "Titre,Code ISWC,Role,IPI,Date\n\
                     \"  Ma Chanson  \",T-123.456.789-0,ca,123-456-789,15/03/2024\n\
                     Another Song,9876543210,x,987654321,\n";

        let out = run_matrix(example_matrix(), input).unwrap();
        assert_eq!(
            out,
            "iswc,title,role,ipi,year,source\n\
             T1234567890,Ma Chanson,Composer,00123456789,2024,catalog\n\
             T9876543210,Another Song,Composer,00987654321,,catalog\n"
        );
    }

    #[test]
    fn test_missing_required_skips_row() {
        let matrix = ColumnMatrix::new()
            .with_column(ColumnTransform::from_source("id", "ID").required())
            .with_column(ColumnTransform::from_source("name", "Name"));

        let out = run_matrix(matrix, "ID,Name\n1,a\n,b\n3,c\n").unwrap();
        assert_eq!(out, "id,name\n1,a\n3,c\n");
    }

    #[test]
    fn test_missing_header_column_fails_at_row_zero() {
        let matrix = ColumnMatrix::new().with_column(ColumnTransform::from_source("t", "Title"));

        let err = run_matrix(matrix, "Name\nx\n").unwrap_err();
        assert_eq!(err.row_index(), Some(0));
        assert!(err.to_string().contains("Title"));
    }

    #[test]
    fn test_headerless_positions() {
        let matrix = ColumnMatrix::new()
            .without_header()
            .with_column(ColumnTransform::from_source("b", 1usize).with_operation(Operation::Uppercase))
            .with_column(ColumnTransform::from_source("a", 0usize))
            .with_column(ColumnTransform::from_source("far", 9usize).with_default("none"));

        let out = run_matrix(matrix, "x,y\nz,w\n").unwrap();
        assert_eq!(out, "Y,x,none\nW,z,none\n");
    }

    #[test]
    fn test_constant_and_joined_sources() {
        let matrix = ColumnMatrix::new()
            .with_column(ColumnTransform::from_sources(
                "title",
                vec!["Prefix".into(), "Main".into()],
                " ",
            ))
            .with_column(ColumnTransform::from_constant("language", "French"));

        let out = run_matrix(matrix, "Main,Prefix\nJourney,The Amazing\nSolo Title,\n").unwrap();
        assert_eq!(
            out,
            "title,language\nThe Amazing Journey,French\nSolo Title,French\n"
        );
    }

    #[test]
    fn test_default_after_operations() {
        let matrix = ColumnMatrix::new().with_column(
            ColumnTransform::from_source("digits", "Raw")
                .with_operation(Operation::DigitsOnly)
                .with_default("0"),
        );

        let out = run_matrix(matrix, "Raw\nabc\n12a\n").unwrap();
        assert_eq!(out, "digits\n0\n12\n");
    }

    #[test]
    fn test_empty_value_skips_operations() {
        let matrix = ColumnMatrix::new()
            .with_column(
                ColumnTransform::from_source("iswc", "ISWC")
                    .with_operation(Operation::EnsurePrefix { value: "T".to_string() }),
            )
            .with_column(ColumnTransform::from_source("other", "Other"));

        let out = run_matrix(matrix, "ISWC,Other\n,x\n123,y\n").unwrap();
        assert_eq!(out, "iswc,other\n,x\nT123,y\n");
    }

    #[test]
    fn test_compile_rejects_invalid_matrix() {
        assert!(MatrixExecutor::compile(ColumnMatrix::new()).is_err());
    }

    #[test]
    fn test_header_names() {
        let executor = MatrixExecutor::compile(example_matrix()).unwrap();
        assert_eq!(executor.width(), 6);
        assert_eq!(executor.header()[0], "iswc");
    }
}

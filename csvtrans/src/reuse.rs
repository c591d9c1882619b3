//! Buffer-reuse adapter.
//!
//! [`reusable`] turns a closure that fills a caller-owned output buffer into a
//! [`RowTransformer`]. One buffer of the declared width is allocated up front
//! and lent to the closure on every row, so the pipeline writes each output
//! row without allocating a new record.
//!
//! # Stale fields
//!
//! The buffer keeps whatever the previous row left in it. The closure must
//! overwrite every position on every call, otherwise values from an earlier
//! row are written again:
//!
//! ```rust
//! use csvtrans::{run, reusable, BufferRow};
//!
//! let mut output = Vec::new();
//! run("a,1\nb,2\n".as_bytes(), &mut output, reusable(2, |i, row, buf| {
//!     buf[0] = row[0].clone();
//!     if i == 0 {
//!         buf[1] = row[1].clone();
//!     }
//!     Ok(BufferRow::Buffer)
//! }))
//! .unwrap();
//!
//! // Row 1 never set position 1, so it repeats row 0's value.
//! assert_eq!(String::from_utf8(output).unwrap(), "a,1\nb,1\n");
//! ```
//!
//! Rows handed to the pipeline borrow the buffer, so they cannot be held
//! across calls; copy one with `into_owned` to keep it.

use std::borrow::Cow;

use crate::error::BoxError;
use crate::pipeline::{Record, RowOutput, RowTransformer};

/// Result of filling the shared buffer for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferRow {
    /// Write the shared buffer as it now stands.
    Buffer,
    /// Write this freshly built record instead of the buffer.
    Owned(Record),
    /// Write nothing for this row.
    Skip,
}

/// Transformer that lends a single reused buffer to its fill closure.
pub struct ReusableTransformer<F> {
    buffer: Vec<String>,
    fill: F,
}

/// Build a transformer whose output rows are `columns` wide and live in one
/// reused buffer.
pub fn reusable<F>(columns: usize, fill: F) -> ReusableTransformer<F>
where
    F: FnMut(usize, Record, &mut [String]) -> Result<BufferRow, BoxError>,
{
    ReusableTransformer {
        buffer: vec![String::new(); columns],
        fill,
    }
}

impl<F> ReusableTransformer<F> {
    /// Width of the shared buffer.
    pub fn columns(&self) -> usize {
        self.buffer.len()
    }
}

impl<F> RowTransformer for ReusableTransformer<F>
where
    F: FnMut(usize, Record, &mut [String]) -> Result<BufferRow, BoxError>,
{
    fn transform(&mut self, index: usize, row: Record) -> Result<RowOutput<'_>, BoxError> {
        let output = match (self.fill)(index, row, &mut self.buffer)? {
            BufferRow::Buffer => Some(Cow::Borrowed(self.buffer.as_slice())),
            BufferRow::Owned(record) => Some(Cow::Owned(record)),
            BufferRow::Skip => None,
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::run;

    fn run_str<T: RowTransformer>(input: &str, transformer: T) -> String {
        let mut out = Vec::new();
        run(input.as_bytes(), &mut out, transformer).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_buffer_is_allocated_once_with_width() {
        let t = reusable(3, |_, _, _| Ok(BufferRow::Skip));
        assert_eq!(t.columns(), 3);
    }

    #[test]
    fn test_swap_columns_through_buffer() {
        let out = run_str(
            "a,b\n1,2\n",
            reusable(2, |_, row, buf| {
                buf[0] = row[1].clone();
                buf[1] = row[0].clone();
                Ok(BufferRow::Buffer)
            }),
        );
        assert_eq!(out, "b,a\n2,1\n");
    }

    #[test]
    fn test_unwritten_field_leaks_previous_row() {
        let out = run_str(
            "x,1\ny,\n",
            reusable(2, |_, row, buf| {
                buf[0] = row[0].clone();
                if !row[1].is_empty() {
                    buf[1] = row[1].clone();
                }
                Ok(BufferRow::Buffer)
            }),
        );
        assert_eq!(out, "x,1\ny,1\n");
    }

    #[test]
    fn test_owned_and_skip_results() {
        let out = run_str(
            "h\na\nb\n",
            reusable(1, |i, row, buf| {
                Ok(match i {
                    0 => BufferRow::Skip,
                    1 => BufferRow::Owned(vec![row[0].clone(), "extra".to_string()]),
                    _ => {
                        buf[0] = row[0].to_uppercase();
                        BufferRow::Buffer
                    }
                })
            }),
        );
        assert_eq!(out, "a,extra\nB\n");
    }

    #[test]
    fn test_fill_error_aborts() {
        let mut out = Vec::new();
        let err = run(
            "1\nnope\n".as_bytes(),
            &mut out,
            reusable(1, |_, row, buf| {
                let n: u32 = row[0].parse()?;
                buf[0] = (n + 1).to_string();
                Ok(BufferRow::Buffer)
            }),
        )
        .unwrap_err();
        assert_eq!(err.row_index(), Some(1));
        assert_eq!(String::from_utf8(out).unwrap(), "2\n");
    }
}

//! Streaming row pipeline.
//!
//! Reads one CSV record at a time, hands it to a [`RowTransformer`] together
//! with its zero-based index, and writes whatever the transformer returns.
//! Memory use stays bounded by a single record regardless of input size.
//!
//! # Example
//!
//! ```rust
//! use csvtrans::{run, from_fn, BoxError, Record};
//!
//! let input = "1,2,3\n4,5,6\n";
//! let mut output = Vec::new();
//!
//! run(input.as_bytes(), &mut output, from_fn(|_, mut row: Record| {
//!     for field in row.iter_mut() {
//!         let n: i64 = field.parse()?;
//!         *field = (n * 2).to_string();
//!     }
//!     Ok::<_, BoxError>(Some(row))
//! }))
//! .unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "2,4,6\n8,10,12\n");
//! ```

use std::borrow::Cow;
use std::io;

use log::debug;

use crate::error::{BoxError, Error, Result};

/// One row's ordered text fields.
pub type Record = Vec<String>;

/// What a transformer produces for a row: `None` skips the row.
pub type RowOutput<'a> = Option<Cow<'a, [String]>>;

/// Per-row transformation driven by [`run`].
///
/// `transform` receives the row index and owns the input record. Returning
/// `Ok(None)` skips the row, `Ok(Some(row))` writes it (an empty row is still
/// written), and `Err` aborts the whole run.
///
/// The returned row may borrow from the transformer itself, which is how
/// [`crate::reuse::ReusableTransformer`] hands out its shared buffer.
pub trait RowTransformer {
    fn transform(&mut self, index: usize, row: Record) -> std::result::Result<RowOutput<'_>, BoxError>;
}

impl<T: RowTransformer + ?Sized> RowTransformer for &mut T {
    fn transform(&mut self, index: usize, row: Record) -> std::result::Result<RowOutput<'_>, BoxError> {
        (**self).transform(index, row)
    }
}

impl<T: RowTransformer + ?Sized> RowTransformer for Box<T> {
    fn transform(&mut self, index: usize, row: Record) -> std::result::Result<RowOutput<'_>, BoxError> {
        (**self).transform(index, row)
    }
}

/// Transformer backed by a closure, see [`from_fn`].
pub struct FnTransformer<F> {
    f: F,
}

/// Wrap a closure returning an owned row (or `None` to skip) as a transformer.
pub fn from_fn<F>(f: F) -> FnTransformer<F>
where
    F: FnMut(usize, Record) -> std::result::Result<Option<Record>, BoxError>,
{
    FnTransformer { f }
}

impl<F> RowTransformer for FnTransformer<F>
where
    F: FnMut(usize, Record) -> std::result::Result<Option<Record>, BoxError>,
{
    fn transform(&mut self, index: usize, row: Record) -> std::result::Result<RowOutput<'_>, BoxError> {
        Ok((self.f)(index, row)?.map(Cow::Owned))
    }
}

/// Transformer that passes every row through unchanged.
pub fn identity() -> impl RowTransformer {
    from_fn(|_, row| Ok(Some(row)))
}

/// Row counts for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records read from the input.
    pub rows_read: usize,
    /// Records written to the output.
    pub rows_written: usize,
    /// Records the transformer chose to skip.
    pub rows_skipped: usize,
}

impl RunSummary {
    /// One-line description of the counts for logging.
    pub fn summary(&self) -> String {
        format!(
            "Read {} rows, wrote {}, skipped {}",
            self.rows_read, self.rows_written, self.rows_skipped
        )
    }
}

/// Stream `input` through `transformer` into `output`.
///
/// Stops at the first read, transform or write failure and reports the
/// failing row index. Rows written before the failure stay in `output`.
/// The writer is flushed once when the input is exhausted.
pub fn run<R, W, T>(input: R, output: W, mut transformer: T) -> Result<RunSummary>
where
    R: io::Read,
    W: io::Write,
    T: RowTransformer,
{
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input);
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(output);

    let mut record = csv::StringRecord::new();
    let mut summary = RunSummary::default();
    let mut index = 0;

    debug!("Starting row pipeline");

    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(source) => return Err(Error::Read { index, source }),
        }
        summary.rows_read += 1;

        let row: Record = record.iter().map(str::to_owned).collect();
        let transformed = transformer
            .transform(index, row)
            .map_err(|source| Error::Transform { index, source })?;

        match transformed {
            Some(out) => {
                writer
                    .write_record(out.iter())
                    .map_err(|source| Error::Write { index, source })?;
                summary.rows_written += 1;
            }
            None => {
                debug!("Skipping row {}", index);
                summary.rows_skipped += 1;
            }
        }

        index += 1;
    }

    // Early returns above leave flushing to the writer's drop.
    writer.flush().map_err(Error::Flush)?;

    debug!("{}", summary.summary());
    Ok(summary)
}

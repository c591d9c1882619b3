//! File runner: binds the row pipeline to an input path and an output path.

use std::fs::{self, File};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::pipeline::{run, RowTransformer, RunSummary};

/// Transform the CSV file at `input` into `output`.
///
/// The paths must differ: identical paths fail before any file is touched,
/// and two spellings of one existing file are rejected before the output is
/// truncated. An existing output file is replaced. Both files are closed on
/// every return path; a failed run leaves the rows written so far in place.
pub fn run_files<P, Q, T>(input: P, output: Q, transformer: T) -> Result<RunSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    T: RowTransformer,
{
    let (input, output) = (input.as_ref(), output.as_ref());

    if input == output {
        return Err(Error::SamePath {
            path: input.to_path_buf(),
        });
    }

    let reader = File::open(input).map_err(|source| Error::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;

    if let (Ok(a), Ok(b)) = (fs::canonicalize(input), fs::canonicalize(output)) {
        if a == b {
            return Err(Error::SamePath { path: a });
        }
    }

    let writer = File::create(output).map_err(|source| Error::OpenOutput {
        path: output.to_path_buf(),
        source,
    })?;

    debug!("Transforming {} into {}", input.display(), output.display());
    run(reader, writer, transformer)
}

//! # csvtrans - streaming row-by-row CSV transformation
//!
//! csvtrans reads a CSV stream one record at a time, passes each record and
//! its zero-based index to a transformer, and writes the result to an output
//! stream. Only the record in flight is held in memory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  io::Read   │────▶│ csv reader  │────▶│ transformer │────▶│ csv writer  │
//! │ (file/mem)  │     │ (row i)     │     │ (i, record) │     │ (io::Write) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csvtrans::{run_files, from_fn};
//!
//! // Drop the header row, keep the first two columns of every other row.
//! run_files("in.csv", "out.csv", from_fn(|i, row| {
//!     Ok(if i == 0 { None } else { Some(row.into_iter().take(2).collect()) })
//! }))
//! .unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types with phase and row index
//! - [`pipeline`] - Read-transform-write loop and the transformer trait
//! - [`reuse`] - Transformer adapter that reuses one output buffer
//! - [`files`] - File runner with same-path protection
//! - [`matrix`] - Declarative column matrix transformer
//! - [`config`] - Environment settings for the binary
//! - [`logs`] - Stderr logging setup for the binary

// Core modules
pub mod error;
pub mod pipeline;
pub mod reuse;
pub mod files;

// Declarative transforms
pub mod matrix;

// Binary support
pub mod config;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{BoxError, ConfigError, Error, MatrixError, Phase, Result};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{from_fn, identity, run, FnTransformer, Record, RowOutput, RowTransformer, RunSummary};

pub use reuse::{reusable, BufferRow, ReusableTransformer};

pub use files::run_files;

// =============================================================================
// Re-exports - Column matrix
// =============================================================================

pub use matrix::{
    example_matrix,
    operations_description,
    ColumnMatrix,
    ColumnRef,
    ColumnTransform,
    MatrixExecutor,
    Operation,
};

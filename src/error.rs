//! Error types for the mutation engine

use std::path::PathBuf;
use thiserror::Error;

use crate::location::LocationIndex;

/// Errors that can occur while scanning, mutating, or running trials
#[derive(Debug, Error)]
pub enum MutationError {
    /// Subject source path does not exist
    #[error("source file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Failed to read a source file
    #[error("failed to read '{}': {error}", path.display())]
    ReadError { path: PathBuf, error: String },

    /// Failed to write a source file or sandbox copy
    #[error("failed to write '{}': {error}", path.display())]
    WriteError { path: PathBuf, error: String },

    /// Failed to parse a source file as Rust
    #[error("failed to parse '{}' as Rust: {error}", path.display())]
    ParseError { path: PathBuf, error: String },

    /// The targeted location was never reached during a mutation walk
    #[error("mutation target not found in tree: {target:?}")]
    TargetNotFound { target: LocationIndex },

    /// Bad caller-supplied settings (unknown category code, empty command, ...)
    #[error("configuration error: {message}")]
    ConfigError { message: String },

    /// The unmutated test suite did not pass, so no mutant can be judged
    #[error("clean trial failed with exit code {code:?}: the baseline test suite must pass")]
    BaselineFailed { code: Option<i32> },

    /// Raised after a completed run when survivors exceed the caller's threshold
    #[error("surviving mutants exceeded threshold: {survivors} survived, threshold {threshold}")]
    SurvivorThreshold { survivors: usize, threshold: usize },
}

/// Result type for mutation operations
pub type Result<T> = std::result::Result<T, MutationError>;

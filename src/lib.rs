//! Mutation testing engine for Rust source
//!
//! Scans a parsed source file for mutable sites (operators, comparisons,
//! conditionals, literal indices, singleton constants, slice bounds),
//! substitutes one operator at one site per trial, runs the project's test
//! commands against each mutant, and classifies the outcome. Survivors
//! are the interesting ones: mutations the test suite failed to notice.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use mutor::{Genome, RunMode, TargetFilter, TestCommand, TrialConfig, TrialRunner};
//!
//! # fn main() -> mutor::Result<()> {
//! let mut genomes = vec![Genome::load(Path::new("src/lib.rs"))?];
//! let runner = TrialRunner::new(TrialConfig {
//!     project_dir: PathBuf::from("."),
//!     test_commands: vec![TestCommand::parse("cargo test --quiet")?],
//!     mode: RunMode::from_code("s"),
//!     timeout_factor: 2.0,
//!     min_timeout: mutor::DEFAULT_MIN_TIMEOUT,
//!     seed: 42,
//!     sample_size: Some(10),
//!     filter: TargetFilter::default(),
//!     workers: 1,
//! })?;
//! let summary = runner.run(&mut genomes)?;
//! println!("{} survivors", summary.survivors().len());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod genome;
pub mod location;
pub mod report;
pub mod runner;
pub mod walker;

// Re-export main types at crate root
pub use catalog::{
    compatible_operator_sets, operators_for, MutationOp, NodeKind, OperatorCategory,
};
pub use config::Config;
pub use error::{MutationError, Result};
pub use filters::{sample_targets, CoverageMap, TargetFilter};
pub use genome::{Fingerprint, Genome, Mutant};
pub use location::LocationIndex;
pub use report::RunReport;
pub use runner::{
    ResultsSummary, RunMode, TestCommand, TrialConfig, TrialResult, TrialRunner, TrialStatus,
    DEFAULT_MIN_TIMEOUT,
};
pub use walker::{apply_mutation, discover_locations, MutationWalker};

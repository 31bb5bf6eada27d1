//! CLI for the mutation trial engine

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use mutor::{
    report, Config, CoverageMap, Genome, MutationError, RunMode, RunReport, TargetFilter,
    TestCommand, TrialConfig, TrialRunner,
};

#[derive(Parser)]
#[command(name = "mutor")]
#[command(author, version, about = "Syntax-tree mutation testing for Rust", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run mutation trials against the project's test commands
    Run {
        /// Source file or directory to mutate (defaults to <project>/src)
        #[arg(short, long)]
        src: Option<PathBuf>,

        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Test command, repeatable; each runs in order per trial
        #[arg(short, long = "testcmd")]
        testcmds: Vec<String>,

        /// Run mode: f (full), s, d, or sd
        #[arg(short, long)]
        mode: Option<String>,

        /// Seed for the sampling draw
        #[arg(long)]
        rseed: Option<u64>,

        /// Maximum number of locations to mutate
        #[arg(short = 'n', long)]
        sample: Option<usize>,

        /// Multiplier applied to the clean-trial timeout basis
        #[arg(long)]
        timeout_factor: Option<f64>,

        /// Floor for the clean-trial timeout basis, in seconds
        #[arg(long)]
        min_timeout: Option<f64>,

        /// Config file path (defaults to <project>/mutor.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail (exit 2) when more than this many mutants survive
        #[arg(long)]
        threshold: Option<usize>,

        /// Category codes to include, repeatable
        #[arg(long = "include")]
        include: Vec<String>,

        /// Category codes to exclude, repeatable
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// JSON coverage file mapping source paths to executed lines
        #[arg(long)]
        coverage: Option<PathBuf>,

        /// Worker count; above one, trials run in isolated project copies
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// List mutable locations without running any trials
    Scan {
        /// Source file or directory to scan (defaults to <project>/src)
        #[arg(short, long)]
        src: Option<PathBuf>,

        /// Project directory (defaults to current directory)
        #[arg(short, long)]
        project: Option<PathBuf>,
    },

    /// Show the operator catalog
    Categories,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            src,
            project,
            testcmds,
            mode,
            rseed,
            sample,
            timeout_factor,
            min_timeout,
            config,
            threshold,
            include,
            exclude,
            coverage,
            workers,
        } => run_trials(RunArgs {
            src,
            project,
            testcmds,
            mode,
            rseed,
            sample,
            timeout_factor,
            min_timeout,
            config,
            threshold,
            include,
            exclude,
            coverage,
            workers,
        }),

        Commands::Scan { src, project } => scan_locations(src, project),

        Commands::Categories => {
            report::print_categories();
            ExitCode::SUCCESS
        }
    }
}

struct RunArgs {
    src: Option<PathBuf>,
    project: Option<PathBuf>,
    testcmds: Vec<String>,
    mode: Option<String>,
    rseed: Option<u64>,
    sample: Option<usize>,
    timeout_factor: Option<f64>,
    min_timeout: Option<f64>,
    config: Option<PathBuf>,
    threshold: Option<usize>,
    include: Vec<String>,
    exclude: Vec<String>,
    coverage: Option<PathBuf>,
    workers: Option<usize>,
}

fn run_trials(args: RunArgs) -> ExitCode {
    match try_run_trials(args) {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn try_run_trials(args: RunArgs) -> mutor::Result<ExitCode> {
    let project_dir = args.project.unwrap_or_else(|| PathBuf::from("."));
    let file_config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::find(&project_dir)?,
    };

    // CLI flags win over mutor.yaml values
    let raw_commands = if !args.testcmds.is_empty() {
        args.testcmds
    } else {
        file_config
            .testcmds
            .unwrap_or_else(|| vec!["cargo test".to_string()])
    };
    let test_commands = raw_commands
        .iter()
        .map(|raw| TestCommand::parse(raw))
        .collect::<mutor::Result<Vec<_>>>()?;

    let mode_code = args
        .mode
        .or(file_config.mode)
        .unwrap_or_else(|| "f".to_string());
    let seed = args
        .rseed
        .or(file_config.rseed)
        .unwrap_or_else(rand::random);
    let sample_size = args.sample.or(file_config.sample);
    let timeout_factor = args
        .timeout_factor
        .or(file_config.timeout_factor)
        .unwrap_or(2.0);
    let min_timeout = match args.min_timeout {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
        Some(secs) => {
            return Err(MutationError::ConfigError {
                message: format!("minimum timeout must be non-negative, got {}", secs),
            })
        }
        None => mutor::DEFAULT_MIN_TIMEOUT,
    };
    let threshold = args.threshold.or(file_config.threshold);
    let workers = args.workers.or(file_config.workers).unwrap_or(1);
    let include = if !args.include.is_empty() {
        args.include
    } else {
        file_config.include.unwrap_or_default()
    };
    let exclude = if !args.exclude.is_empty() {
        args.exclude
    } else {
        file_config.exclude.unwrap_or_default()
    };

    let coverage = args.coverage.as_deref().map(load_coverage).transpose()?;

    let mut genomes = load_genomes(args.src.as_deref(), &project_dir)?;
    let runner = TrialRunner::new(TrialConfig {
        project_dir,
        test_commands,
        mode: RunMode::from_code(&mode_code),
        timeout_factor,
        min_timeout,
        seed,
        sample_size,
        filter: TargetFilter {
            include,
            exclude,
            coverage,
        },
        workers,
    })?;

    let summary = runner.run(&mut genomes)?;
    RunReport::new(&summary).print();

    match summary.check_survivor_threshold(threshold) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!();
            eprintln!("{}: {}", "Failed".red().bold(), e);
            Ok(ExitCode::from(2))
        }
    }
}

fn scan_locations(src: Option<PathBuf>, project: Option<PathBuf>) -> ExitCode {
    let project_dir = project.unwrap_or_else(|| PathBuf::from("."));
    match try_scan(src.as_deref(), &project_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn try_scan(src: Option<&Path>, project_dir: &Path) -> mutor::Result<()> {
    let mut genomes = load_genomes(src, project_dir)?;
    let mut total = 0;
    for genome in &mut genomes {
        let path = genome.path().to_path_buf();
        for location in genome.locations()? {
            println!(
                "{}:{} {} {} ({})",
                path.display(),
                location.position(),
                location.kind.code().bold(),
                location.op,
                location.kind
            );
            total += 1;
        }
    }
    println!();
    println!("{} mutable locations", total);
    Ok(())
}

/// Load one genome per Rust source file under the subject path.
fn load_genomes(src: Option<&Path>, project_dir: &Path) -> mutor::Result<Vec<Genome>> {
    let default_src = project_dir.join("src");
    let root = src.unwrap_or(&default_src);
    if !root.exists() {
        return Err(MutationError::NotFound {
            path: root.to_path_buf(),
        });
    }
    let mut files = Vec::new();
    collect_source_files(root, &mut files)?;
    files.sort();
    files.iter().map(|path| Genome::load(path)).collect()
}

fn collect_source_files(root: &Path, out: &mut Vec<PathBuf>) -> mutor::Result<()> {
    if root.is_file() {
        out.push(root.to_path_buf());
        return Ok(());
    }
    let read_error = |e: std::io::Error| MutationError::ReadError {
        path: root.to_path_buf(),
        error: e.to_string(),
    };
    for entry in fs::read_dir(root).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        if path.is_dir() {
            if entry.file_name() == "target" || entry.file_name() == ".git" {
                continue;
            }
            collect_source_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}

/// Coverage file format: JSON object mapping source paths to arrays of
/// executed line numbers.
fn load_coverage(path: &Path) -> mutor::Result<CoverageMap> {
    let content = fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
        message: format!("failed to read coverage file '{}': {}", path.display(), e),
    })?;
    let parsed: std::collections::HashMap<PathBuf, BTreeSet<usize>> =
        serde_json::from_str(&content).map_err(|e| MutationError::ConfigError {
            message: format!("failed to parse coverage file '{}': {}", path.display(), e),
        })?;
    Ok(parsed)
}

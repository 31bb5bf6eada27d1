//! Trial orchestrator
//!
//! Drives one mutation run: two clean baseline trials to establish a
//! timeout basis, target selection (filters + seeded sample), then one
//! subprocess trial per candidate mutation with scoped overwrite/restore of
//! the subject file. Classification is a pure function of the subprocess
//! outcome; early exit is governed by a `RunMode`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::catalog::{category_for_op, operators_for, MutationOp};
use crate::error::{MutationError, Result};
use crate::filters::{sample_targets, TargetFilter};
use crate::genome::{Fingerprint, Genome, Mutant};
use crate::location::LocationIndex;

/// Poll interval while waiting on a bounded subprocess.
const WAIT_POLL: Duration = Duration::from_millis(25);

/// Default floor for the clean-trial timeout basis, so near-instant
/// suites still get a usable deadline.
pub const DEFAULT_MIN_TIMEOUT: Duration = Duration::from_millis(250);

/// One executable test command, parsed from a whitespace-separated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TestCommand {
    pub fn parse(raw: &str) -> Result<TestCommand> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| MutationError::ConfigError {
            message: "empty test command".to_string(),
        })?;
        Ok(TestCommand {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for TestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Early-exit policy: four independent switches selected by a mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMode {
    pub break_on_survival: bool,
    pub break_on_detection: bool,
    pub break_on_error: bool,
    pub break_on_unknown: bool,
}

impl RunMode {
    /// `f` runs the full candidate list, `s` stops at the first survivor,
    /// `d` at the first detection, `sd` at either. Every mode stops on
    /// ERROR and UNKNOWN; an unrecognized code falls back to `f`.
    pub fn from_code(code: &str) -> RunMode {
        let base = RunMode {
            break_on_survival: false,
            break_on_detection: false,
            break_on_error: true,
            break_on_unknown: true,
        };
        match code {
            "f" => base,
            "s" => RunMode {
                break_on_survival: true,
                ..base
            },
            "d" => RunMode {
                break_on_detection: true,
                ..base
            },
            "sd" | "ds" => RunMode {
                break_on_survival: true,
                break_on_detection: true,
                ..base
            },
            other => {
                warn!(mode = other, "unrecognized run mode, running full mode");
                base
            }
        }
    }

    pub fn should_break(&self, status: TrialStatus) -> bool {
        match status {
            TrialStatus::Survived => self.break_on_survival,
            TrialStatus::Detected => self.break_on_detection,
            TrialStatus::Error => self.break_on_error,
            TrialStatus::Unknown => self.break_on_unknown,
            // a timeout is a probable catch, never a reason to stop
            TrialStatus::Timeout => false,
        }
    }
}

/// How a bounded subprocess finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Normal exit; `None` means killed by a signal.
    Exited(Option<i32>),
    /// Deadline fired and the process was killed.
    TimedOut,
}

/// Judgment for one mutant trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrialStatus {
    /// Tests passed despite the mutation, a gap in the suite
    Survived,
    /// Tests failed and caught the mutant
    Detected,
    /// Infrastructure failure, not a judgment about the mutant
    Error,
    /// Deadline exceeded; probably caught, recorded distinctly
    Timeout,
    /// Anything unclassifiable, e.g. death by signal
    Unknown,
}

impl TrialStatus {
    /// Pure classification of a subprocess outcome. Exit codes 2, 3 and 4
    /// are reserved harness-level codes for infrastructure failure,
    /// timeout-by-harness and unknown; every other non-zero exit is a
    /// detection.
    pub fn classify(outcome: ProcessOutcome) -> TrialStatus {
        match outcome {
            ProcessOutcome::TimedOut => TrialStatus::Timeout,
            ProcessOutcome::Exited(Some(0)) => TrialStatus::Survived,
            ProcessOutcome::Exited(Some(2)) => TrialStatus::Error,
            ProcessOutcome::Exited(Some(3)) => TrialStatus::Timeout,
            ProcessOutcome::Exited(Some(4)) => TrialStatus::Unknown,
            ProcessOutcome::Exited(Some(_)) => TrialStatus::Detected,
            ProcessOutcome::Exited(None) => TrialStatus::Unknown,
        }
    }

    pub fn exit_status(&self) -> i32 {
        match self {
            TrialStatus::Survived => 0,
            TrialStatus::Detected => 1,
            TrialStatus::Error => 2,
            TrialStatus::Timeout => 3,
            TrialStatus::Unknown => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrialStatus::Survived => "SURVIVED",
            TrialStatus::Detected => "DETECTED",
            TrialStatus::Error => "ERROR",
            TrialStatus::Timeout => "TIMEOUT",
            TrialStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one mutant trial.
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub mutant: Mutant,
    pub status: TrialStatus,
    pub duration: Duration,
}

/// Everything one run produced, handed to the reporting layer.
#[derive(Debug)]
pub struct ResultsSummary {
    pub results: Vec<TrialResult>,
    /// Mutable sites discovered across all subject files.
    pub locations_identified: usize,
    /// Distinct sites a trial was actually attempted for; lower than
    /// `locations_identified` after filtering, sampling, or early exit.
    pub locations_mutated: usize,
    pub clean_runtimes: (Duration, Duration),
    pub trial_timeout: Duration,
    pub total_runtime: Duration,
}

impl ResultsSummary {
    pub fn count(&self, status: TrialStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn survivors(&self) -> Vec<&TrialResult> {
        self.results
            .iter()
            .filter(|r| r.status == TrialStatus::Survived)
            .collect()
    }

    /// Detected plus timed-out trials.
    pub fn caught(&self) -> usize {
        self.count(TrialStatus::Detected) + self.count(TrialStatus::Timeout)
    }

    /// Fraction of judged trials (survived/detected/timeout) that were
    /// caught. `None` when nothing was judged.
    pub fn detection_score(&self) -> Option<f64> {
        let judged = self.caught() + self.count(TrialStatus::Survived);
        (judged > 0).then(|| self.caught() as f64 / judged as f64)
    }

    /// Per-category `(total, caught)` tallies keyed by category code.
    pub fn category_breakdown(&self) -> std::collections::BTreeMap<&'static str, (usize, usize)> {
        let mut breakdown = std::collections::BTreeMap::new();
        for result in &self.results {
            let entry = breakdown
                .entry(category_for_op(result.mutant.target.op))
                .or_insert((0, 0));
            entry.0 += 1;
            if matches!(result.status, TrialStatus::Detected | TrialStatus::Timeout) {
                entry.1 += 1;
            }
        }
        breakdown
    }

    /// Post-run policy check, evaluated after completion or early exit.
    pub fn check_survivor_threshold(&self, threshold: Option<usize>) -> Result<()> {
        let Some(threshold) = threshold else {
            return Ok(());
        };
        let survivors = self.count(TrialStatus::Survived);
        if survivors > threshold {
            return Err(MutationError::SurvivorThreshold {
                survivors,
                threshold,
            });
        }
        Ok(())
    }
}

/// Scoped overwrite of a subject file. Snapshots the original bytes before
/// writing the replacement text and restores them on drop, so the file is
/// back in place on every exit path, panics included.
pub struct SourceGuard {
    path: PathBuf,
    original: Vec<u8>,
}

impl SourceGuard {
    pub fn overwrite(path: &Path, replacement: &str) -> Result<SourceGuard> {
        let original = fs::read(path).map_err(|e| MutationError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        fs::write(path, replacement).map_err(|e| MutationError::WriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(SourceGuard {
            path: path.to_path_buf(),
            original,
        })
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::write(&self.path, &self.original) {
            error!(
                path = %self.path.display(),
                error = %e,
                "failed to restore original source"
            );
        }
    }
}

/// Run one command with an optional deadline, discarding its output.
fn run_command(
    command: &TestCommand,
    dir: &Path,
    timeout: Option<Duration>,
) -> Result<ProcessOutcome> {
    let spawn_error = |e: std::io::Error| MutationError::ConfigError {
        message: format!("failed to run '{}': {}", command, e),
    };
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(spawn_error)?;

    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        if let Some(status) = child.try_wait().map_err(spawn_error)? {
            return Ok(ProcessOutcome::Exited(status.code()));
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ProcessOutcome::TimedOut);
            }
        }
        thread::sleep(WAIT_POLL);
    }
}

/// Run the command set in order, stopping at the first non-clean outcome.
fn run_commands(
    commands: &[TestCommand],
    dir: &Path,
    timeout: Option<Duration>,
) -> Result<ProcessOutcome> {
    for command in commands {
        let outcome = run_command(command, dir, timeout)?;
        if outcome != ProcessOutcome::Exited(Some(0)) {
            return Ok(outcome);
        }
    }
    Ok(ProcessOutcome::Exited(Some(0)))
}

/// Caller-supplied settings for one run.
#[derive(Debug, Clone)]
pub struct TrialConfig {
    pub project_dir: PathBuf,
    pub test_commands: Vec<TestCommand>,
    pub mode: RunMode,
    pub timeout_factor: f64,
    /// Floor for the clean-trial timeout basis.
    pub min_timeout: Duration,
    pub seed: u64,
    pub sample_size: Option<usize>,
    pub filter: TargetFilter,
    /// Worker count; values above one run each trial in an isolated copy
    /// of the project tree.
    pub workers: usize,
}

/// Owns all mutable run-scoped state: the seeded generator, clean-trial
/// timing, and the result accumulator live here for exactly one run.
pub struct TrialRunner {
    config: TrialConfig,
}

impl TrialRunner {
    pub fn new(config: TrialConfig) -> Result<TrialRunner> {
        if config.test_commands.is_empty() {
            return Err(MutationError::ConfigError {
                message: "at least one test command is required".to_string(),
            });
        }
        if !config.timeout_factor.is_finite() || config.timeout_factor <= 0.0 {
            return Err(MutationError::ConfigError {
                message: format!("timeout factor must be positive, got {}", config.timeout_factor),
            });
        }
        config.filter.validate()?;
        Ok(TrialRunner { config })
    }

    pub fn run(&self, genomes: &mut [Genome]) -> Result<ResultsSummary> {
        let run_start = Instant::now();

        let clean_1 = self.clean_trial()?;
        let clean_2 = self.clean_trial()?;
        let basis = clean_1.max(clean_2).max(self.config.min_timeout);
        let timeout = basis.mul_f64(self.config.timeout_factor);
        info!(
            clean_1 = ?clean_1,
            clean_2 = ?clean_2,
            timeout = ?timeout,
            "baseline established"
        );

        let (locations_identified, candidates) = self.select_candidates(genomes)?;
        info!(
            locations = locations_identified,
            candidates = candidates.len(),
            "target selection complete"
        );

        let results = if self.config.workers > 1 {
            self.run_parallel(genomes, &candidates, timeout)?
        } else {
            self.run_sequential(genomes, &candidates, timeout)
        };

        let locations_mutated = results
            .iter()
            .map(|r| (r.mutant.source_file.clone(), r.mutant.target))
            .collect::<BTreeSet<_>>()
            .len();

        Ok(ResultsSummary {
            results,
            locations_identified,
            locations_mutated,
            clean_runtimes: (clean_1, clean_2),
            trial_timeout: timeout,
            total_runtime: run_start.elapsed(),
        })
    }

    fn clean_trial(&self) -> Result<Duration> {
        let start = Instant::now();
        let outcome = run_commands(
            &self.config.test_commands,
            &self.config.project_dir,
            None,
        )?;
        match outcome {
            ProcessOutcome::Exited(Some(0)) => Ok(start.elapsed()),
            ProcessOutcome::Exited(code) => Err(MutationError::BaselineFailed { code }),
            ProcessOutcome::TimedOut => Err(MutationError::BaselineFailed { code: None }),
        }
    }

    /// Filter, sample, and pick one replacement operator per sampled
    /// location. The draw uses the run's seeded generator, so equal seeds
    /// give identical candidate lists, and one trial per location keeps
    /// `results.len()` equal to the mutated-location count.
    fn select_candidates(
        &self,
        genomes: &mut [Genome],
    ) -> Result<(usize, Vec<(usize, LocationIndex, MutationOp)>)> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut locations_identified = 0;
        let mut candidates = Vec::new();
        for (genome_idx, genome) in genomes.iter_mut().enumerate() {
            let discovered = genome.locations()?.clone();
            locations_identified += discovered.len();
            let filtered = self.config.filter.apply(genome.path(), &discovered);
            let sampled = sample_targets(filtered, self.config.sample_size, &mut rng);
            for location in sampled {
                let ops: Vec<MutationOp> = operators_for(&location).into_iter().collect();
                if let Some(op) = ops.choose(&mut rng) {
                    candidates.push((genome_idx, location, *op));
                }
            }
        }
        Ok((locations_identified, candidates))
    }

    fn run_sequential(
        &self,
        genomes: &mut [Genome],
        candidates: &[(usize, LocationIndex, MutationOp)],
        timeout: Duration,
    ) -> Vec<TrialResult> {
        let mut results = Vec::new();
        for (genome_idx, location, op) in candidates {
            let genome = &mut genomes[*genome_idx];
            let result = match genome.mutate(location, *op) {
                Ok(mutant) => {
                    debug!(mutation = %mutant.description(), "running trial");
                    self.run_trial_in_place(&mutant, timeout)
                }
                Err(e) => {
                    warn!(error = %e, "could not build mutant, recording trial error");
                    failed_trial(genome.path(), location, *op)
                }
            };
            let stop = self.config.mode.should_break(result.status);
            results.push(result);
            if stop {
                info!("early exit triggered, stopping trial loop");
                break;
            }
        }
        results
    }

    fn run_trial_in_place(&self, mutant: &Mutant, timeout: Duration) -> TrialResult {
        let start = Instant::now();
        let outcome = SourceGuard::overwrite(&mutant.source_file, &mutant.mutated_source)
            .and_then(|_guard| {
                run_commands(
                    &self.config.test_commands,
                    &self.config.project_dir,
                    Some(timeout),
                )
            });
        finish_trial(mutant, outcome, start)
    }

    /// Parallel mode: every trial gets an isolated copy of the project
    /// tree, so no two workers share a mutable file. Results are put back
    /// in candidate order and cut at the first early-exit hit, matching
    /// what a sequential run would have kept.
    fn run_parallel(
        &self,
        genomes: &mut [Genome],
        candidates: &[(usize, LocationIndex, MutationOp)],
        timeout: Duration,
    ) -> Result<Vec<TrialResult>> {
        let mut jobs: Vec<(usize, Mutant)> = Vec::new();
        let mut indexed: Vec<(usize, TrialResult)> = Vec::new();
        for (candidate_idx, (genome_idx, location, op)) in candidates.iter().enumerate() {
            let genome = &mut genomes[*genome_idx];
            match genome.mutate(location, *op) {
                Ok(mutant) => jobs.push((candidate_idx, mutant)),
                Err(e) => {
                    warn!(error = %e, "could not build mutant, recording trial error");
                    indexed.push((candidate_idx, failed_trial(genome.path(), location, *op)));
                }
            }
        }

        let worker_count = self.config.workers.min(jobs.len().max(1));
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<(usize, TrialResult)>();
        let config = &self.config;
        let jobs_ref = &jobs;
        let next_ref = &next;
        let stop_ref = &stop;

        thread::scope(|scope| {
            for _ in 0..worker_count {
                let tx = tx.clone();
                scope.spawn(move || loop {
                    if stop_ref.load(Ordering::SeqCst) {
                        break;
                    }
                    let slot = next_ref.fetch_add(1, Ordering::SeqCst);
                    if slot >= jobs_ref.len() {
                        break;
                    }
                    let (candidate_idx, mutant) = &jobs_ref[slot];
                    let result = run_trial_in_sandbox(
                        mutant,
                        &config.project_dir,
                        &config.test_commands,
                        timeout,
                    );
                    if config.mode.should_break(result.status) {
                        stop_ref.store(true, Ordering::SeqCst);
                    }
                    if tx.send((*candidate_idx, result)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);
            for pair in rx {
                indexed.push(pair);
            }
        });

        indexed.sort_by_key(|(candidate_idx, _)| *candidate_idx);
        let mut results: Vec<TrialResult> =
            indexed.into_iter().map(|(_, result)| result).collect();
        if let Some(first_break) = results
            .iter()
            .position(|r| self.config.mode.should_break(r.status))
        {
            results.truncate(first_break + 1);
        }
        Ok(results)
    }
}

fn finish_trial(
    mutant: &Mutant,
    outcome: Result<ProcessOutcome>,
    start: Instant,
) -> TrialResult {
    let status = match outcome {
        Ok(outcome) => TrialStatus::classify(outcome),
        Err(e) => {
            warn!(error = %e, "trial infrastructure failure");
            TrialStatus::Error
        }
    };
    TrialResult {
        mutant: mutant.clone(),
        status,
        duration: start.elapsed(),
    }
}

/// Trial record for a mutant that could not even be constructed.
fn failed_trial(path: &Path, target: &LocationIndex, op: MutationOp) -> TrialResult {
    TrialResult {
        mutant: Mutant {
            source_file: path.to_path_buf(),
            target: *target,
            op,
            mutated_source: String::new(),
            fingerprint: Fingerprint {
                size: 0,
                modified: SystemTime::UNIX_EPOCH,
            },
        },
        status: TrialStatus::Error,
        duration: Duration::ZERO,
    }
}

fn run_trial_in_sandbox(
    mutant: &Mutant,
    project_dir: &Path,
    commands: &[TestCommand],
    timeout: Duration,
) -> TrialResult {
    let start = Instant::now();
    let outcome = execute_in_sandbox(mutant, project_dir, commands, timeout);
    finish_trial(mutant, outcome, start)
}

fn execute_in_sandbox(
    mutant: &Mutant,
    project_dir: &Path,
    commands: &[TestCommand],
    timeout: Duration,
) -> Result<ProcessOutcome> {
    let sandbox = tempfile::tempdir().map_err(|e| MutationError::ConfigError {
        message: format!("failed to create sandbox directory: {}", e),
    })?;
    copy_project(project_dir, sandbox.path())?;

    let relative = mutant
        .source_file
        .strip_prefix(project_dir)
        .map_err(|_| MutationError::ConfigError {
            message: format!(
                "subject file '{}' is outside the project directory",
                mutant.source_file.display()
            ),
        })?;
    let sandbox_source = sandbox.path().join(relative);
    fs::write(&sandbox_source, &mutant.mutated_source).map_err(|e| {
        MutationError::WriteError {
            path: sandbox_source.clone(),
            error: e.to_string(),
        }
    })?;

    run_commands(commands, sandbox.path(), Some(timeout))
}

/// Recursive project copy, skipping build output and version control.
fn copy_project(src: &Path, dst: &Path) -> Result<()> {
    let read_error = |e: std::io::Error| MutationError::ReadError {
        path: src.to_path_buf(),
        error: e.to_string(),
    };
    for entry in fs::read_dir(src).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let name = entry.file_name();
        let path = entry.path();
        if path.is_dir() {
            if name == "target" || name == ".git" {
                continue;
            }
            let child = dst.join(&name);
            fs::create_dir_all(&child).map_err(|e| MutationError::WriteError {
                path: child.clone(),
                error: e.to_string(),
            })?;
            copy_project(&path, &child)?;
        } else {
            let target = dst.join(&name);
            fs::copy(&path, &target).map_err(|e| MutationError::WriteError {
                path: target.clone(),
                error: e.to_string(),
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_parses_program_and_args() {
        let command = TestCommand::parse("cargo test --quiet").unwrap();
        assert_eq!(command.program, "cargo");
        assert_eq!(command.args, vec!["test".to_string(), "--quiet".to_string()]);
        assert_eq!(command.to_string(), "cargo test --quiet");
    }

    #[test]
    fn empty_test_command_is_rejected() {
        assert!(TestCommand::parse("   ").is_err());
    }

    #[test]
    fn run_mode_codes_map_to_switches() {
        let f = RunMode::from_code("f");
        assert!(!f.break_on_survival && !f.break_on_detection);
        assert!(f.break_on_error && f.break_on_unknown);

        assert!(RunMode::from_code("s").break_on_survival);
        assert!(RunMode::from_code("d").break_on_detection);

        let sd = RunMode::from_code("sd");
        assert!(sd.break_on_survival && sd.break_on_detection);

        // unrecognized codes fall back to the full-run policy
        assert_eq!(RunMode::from_code("bogus"), f);
    }

    #[test]
    fn timeouts_never_trigger_early_exit() {
        let sd = RunMode::from_code("sd");
        assert!(!sd.should_break(TrialStatus::Timeout));
        assert!(sd.should_break(TrialStatus::Survived));
        assert!(sd.should_break(TrialStatus::Error));
    }

    #[test]
    fn classification_covers_the_outcome_space() {
        use ProcessOutcome::*;
        assert_eq!(TrialStatus::classify(Exited(Some(0))), TrialStatus::Survived);
        assert_eq!(TrialStatus::classify(Exited(Some(1))), TrialStatus::Detected);
        assert_eq!(TrialStatus::classify(Exited(Some(2))), TrialStatus::Error);
        assert_eq!(TrialStatus::classify(Exited(Some(3))), TrialStatus::Timeout);
        assert_eq!(TrialStatus::classify(Exited(Some(4))), TrialStatus::Unknown);
        // cargo's test harness exits 101 on failure
        assert_eq!(TrialStatus::classify(Exited(Some(101))), TrialStatus::Detected);
        assert_eq!(TrialStatus::classify(Exited(None)), TrialStatus::Unknown);
        assert_eq!(TrialStatus::classify(TimedOut), TrialStatus::Timeout);
    }

    #[test]
    fn source_guard_restores_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subject.rs");
        fs::write(&path, "original").unwrap();
        {
            let _guard = SourceGuard::overwrite(&path, "mutated").unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "mutated");
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn run_command_enforces_the_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let command = TestCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
        };
        let start = Instant::now();
        let outcome =
            run_command(&command, dir.path(), Some(Duration::from_millis(100))).unwrap();
        assert_eq!(outcome, ProcessOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn run_commands_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let fail = TestCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 7".to_string()],
        };
        let marker = dir.path().join("ran");
        let second = TestCommand {
            program: "touch".to_string(),
            args: vec![marker.display().to_string()],
        };
        let outcome = run_commands(&[fail, second], dir.path(), None).unwrap();
        assert_eq!(outcome, ProcessOutcome::Exited(Some(7)));
        assert!(!marker.exists());
    }

    #[test]
    fn runner_rejects_empty_command_set() {
        let config = TrialConfig {
            project_dir: PathBuf::from("."),
            test_commands: vec![],
            mode: RunMode::from_code("f"),
            timeout_factor: 2.0,
            min_timeout: DEFAULT_MIN_TIMEOUT,
            seed: 0,
            sample_size: None,
            filter: TargetFilter::default(),
            workers: 1,
        };
        assert!(TrialRunner::new(config).is_err());
    }

    #[test]
    fn runner_rejects_bad_timeout_factor() {
        let config = TrialConfig {
            project_dir: PathBuf::from("."),
            test_commands: vec![TestCommand::parse("true").unwrap()],
            mode: RunMode::from_code("f"),
            timeout_factor: 0.0,
            min_timeout: DEFAULT_MIN_TIMEOUT,
            seed: 0,
            sample_size: None,
            filter: TargetFilter::default(),
            workers: 1,
        };
        assert!(TrialRunner::new(config).is_err());
    }

    fn summary_with(statuses: &[TrialStatus]) -> ResultsSummary {
        let results = statuses
            .iter()
            .map(|status| TrialResult {
                mutant: Mutant {
                    source_file: PathBuf::from("s.rs"),
                    target: LocationIndex {
                        kind: NodeKind::BinOp,
                        line: 1,
                        column: 0,
                        end_line: 1,
                        end_column: 5,
                        op: MutationOp::Add,
                    },
                    op: MutationOp::Sub,
                    mutated_source: String::new(),
                    fingerprint: Fingerprint {
                        size: 0,
                        modified: SystemTime::UNIX_EPOCH,
                    },
                },
                status: *status,
                duration: Duration::ZERO,
            })
            .collect();
        ResultsSummary {
            results,
            locations_identified: statuses.len(),
            locations_mutated: statuses.len(),
            clean_runtimes: (Duration::ZERO, Duration::ZERO),
            trial_timeout: Duration::from_secs(1),
            total_runtime: Duration::ZERO,
        }
    }

    #[test]
    fn summary_counts_and_score() {
        let summary = summary_with(&[
            TrialStatus::Detected,
            TrialStatus::Detected,
            TrialStatus::Survived,
            TrialStatus::Timeout,
            TrialStatus::Error,
        ]);
        assert_eq!(summary.count(TrialStatus::Detected), 2);
        assert_eq!(summary.caught(), 3);
        assert_eq!(summary.survivors().len(), 1);
        // errors are not judgments, score is caught / (caught + survived)
        assert_eq!(summary.detection_score(), Some(0.75));
    }

    #[test]
    fn survivor_threshold_is_a_post_run_signal() {
        let summary = summary_with(&[TrialStatus::Survived, TrialStatus::Survived]);
        assert!(summary.check_survivor_threshold(None).is_ok());
        assert!(summary.check_survivor_threshold(Some(2)).is_ok());
        assert!(matches!(
            summary.check_survivor_threshold(Some(1)),
            Err(MutationError::SurvivorThreshold {
                survivors: 2,
                threshold: 1
            })
        ));
    }

    #[test]
    fn empty_summary_has_no_score() {
        let summary = summary_with(&[]);
        assert_eq!(summary.detection_score(), None);
        assert!(summary.category_breakdown().is_empty());
    }
}

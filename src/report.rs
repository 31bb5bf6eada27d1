//! Report rendering for mutation runs
//!
//! Formats a `ResultsSummary` for the terminal: per-trial lines, status
//! totals, a per-category breakdown, the detection score, and the list of
//! surviving mutants.

use colored::Colorize;

use crate::catalog::compatible_operator_sets;
use crate::runner::{ResultsSummary, TrialStatus};

/// Terminal report over one run's summary.
#[derive(Debug)]
pub struct RunReport<'a> {
    summary: &'a ResultsSummary,
}

impl<'a> RunReport<'a> {
    pub fn new(summary: &'a ResultsSummary) -> Self {
        RunReport { summary }
    }

    /// Print the full report to stdout.
    pub fn print(&self) {
        println!();
        println!("{}", "Mutation Trial Report".bold());
        println!("{}", "=".repeat(60));
        println!();

        for result in &self.summary.results {
            let status = match result.status {
                TrialStatus::Detected => "[DETECTED]".green().bold(),
                TrialStatus::Survived => "[SURVIVED]".red().bold(),
                TrialStatus::Timeout => "[TIMEOUT]".yellow().bold(),
                TrialStatus::Error => "[ERROR]".yellow().bold(),
                TrialStatus::Unknown => "[UNKNOWN]".yellow().bold(),
            };
            println!(
                "{} {} {}",
                status,
                result.mutant.description(),
                format!("({:.2}s)", result.duration.as_secs_f64()).dimmed()
            );
        }

        println!();
        println!("{}", "Summary".bold());
        println!("{}", "-".repeat(40));
        println!(
            "Locations identified: {}",
            self.summary.locations_identified
        );
        println!("Locations mutated:    {}", self.summary.locations_mutated);
        println!("Trials run:           {}", self.summary.results.len());
        println!(
            "Detected:             {} {}",
            self.summary.count(TrialStatus::Detected),
            "(good - tests caught the mutant)".dimmed()
        );
        println!(
            "Survived:             {} {}",
            self.summary.count(TrialStatus::Survived),
            "(bad - tests missed the mutant)".dimmed()
        );
        if self.summary.count(TrialStatus::Timeout) > 0 {
            println!(
                "Timeouts:             {}",
                self.summary.count(TrialStatus::Timeout)
            );
        }
        if self.summary.count(TrialStatus::Error) > 0 {
            println!(
                "Errors:               {}",
                self.summary.count(TrialStatus::Error)
            );
        }
        if self.summary.count(TrialStatus::Unknown) > 0 {
            println!(
                "Unknown:              {}",
                self.summary.count(TrialStatus::Unknown)
            );
        }
        println!(
            "Clean trial times:    {:.2}s / {:.2}s (timeout {:.2}s)",
            self.summary.clean_runtimes.0.as_secs_f64(),
            self.summary.clean_runtimes.1.as_secs_f64(),
            self.summary.trial_timeout.as_secs_f64()
        );
        println!(
            "Total runtime:        {:.2}s",
            self.summary.total_runtime.as_secs_f64()
        );

        let breakdown = self.summary.category_breakdown();
        if !breakdown.is_empty() {
            println!();
            println!("{}", "By category".bold());
            println!("{}", "-".repeat(40));
            for (code, (total, caught)) in &breakdown {
                println!(
                    "  {:<4} {} {:>3} / {:<3} caught",
                    code,
                    category_name(code).dimmed(),
                    caught,
                    total
                );
            }
        }

        println!();
        match self.summary.detection_score() {
            Some(score) => {
                let percent = score * 100.0;
                let rendered = format!("{:.1}%", percent);
                let colored = if percent >= 90.0 {
                    rendered.green().bold()
                } else if percent >= 70.0 {
                    rendered.yellow().bold()
                } else {
                    rendered.red().bold()
                };
                println!("Detection score:      {}", colored);
            }
            None => println!("Detection score:      {}", "n/a (no judged trials)".dimmed()),
        }

        let survivors = self.summary.survivors();
        if !survivors.is_empty() {
            println!();
            println!(
                "{}",
                "Surviving mutants (improve your tests!)".red().bold()
            );
            println!("{}", "-".repeat(40));
            for result in survivors {
                println!("  {}", result.mutant.description().yellow());
            }
        }
    }
}

fn category_name(code: &str) -> &'static str {
    compatible_operator_sets()
        .iter()
        .find(|category| category.code == code)
        .map(|category| category.name)
        .unwrap_or("")
}

/// Print the static operator catalog, one category per block.
pub fn print_categories() {
    println!();
    println!("{}", "Mutation Categories".bold());
    println!("{}", "=".repeat(60));
    for category in compatible_operator_sets() {
        println!();
        println!("{} ({})", category.name.bold(), category.code);
        println!("  {}", category.desc.dimmed());
        let operators: Vec<String> = category
            .operators
            .iter()
            .map(|op| op.symbol().to_string())
            .collect();
        println!("  operators: {}", operators.join("  "));
    }
}

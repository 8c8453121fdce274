//! Terminal output for the CLI.
//!
//! All user-facing printing goes through [`OutputFormatter`] so the library
//! modules stay silent and styling lives in one place.

use crate::batch::{BatchReport, FileOutcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Consistent, colored CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a green check-marked line.
    ///
    /// ```no_run
    /// use clipsort::output::OutputFormatter;
    /// OutputFormatter::success("Processing complete");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints a red line to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates the progress bar shown while clips are processed.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints one line per placed clip.
    pub fn placements(report: &BatchReport) {
        for outcome in &report.outcomes {
            let (verb, placement) = match outcome {
                FileOutcome::Moved(p) => ("moved to", p),
                FileOutcome::Copied(p) => ("copied to", p),
                FileOutcome::Planned(p) => ("would go to", p),
                FileOutcome::Failed { .. } => continue,
            };
            let name = placement
                .source
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            println!(
                " - {} {} {}",
                name,
                verb.dimmed(),
                placement.destination.display()
            );
        }
    }

    /// Prints the error log, one `- name: reason` line each.
    pub fn error_report(errors: &[(String, String)]) {
        if errors.is_empty() {
            return;
        }
        Self::header("ERRORS");
        for (name, reason) in errors {
            eprintln!("{} {}: {}", "-".red(), name, reason);
        }
    }

    /// Prints placed clips per category with a total row.
    ///
    /// ```no_run
    /// use clipsort::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// counts.insert("A-roll".to_string(), 12);
    /// counts.insert("B-roll".to_string(), 5);
    /// OutputFormatter::summary_table(&counts, 17);
    /// ```
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let width = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Clips".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &categories {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(**count),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "clip" } else { "clips" }
}

//! Output formatting and styling module.
//!
//! Centralizes all terminal output: colored status lines, progress bars for
//! batch moves, and the per-category summary table printed after a run.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the commit id of a run with the undo hint.
    pub fn commit_line(commit_id: &str) {
        println!(
            "Commit id: {}  (revert with 'filify undo-commit {}')",
            commit_id.bold(),
            commit_id
        );
    }

    /// Creates a progress bar for a batch of file moves.
    ///
    /// Length starts unknown; the organizer sets it once the directory scan
    /// has counted the candidates.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a summary table of files per category.
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        // Sort categories for consistent output
        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            let file_word = if **count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word,
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_category_len
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

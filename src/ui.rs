// UI module for consistent terminal output with progress bars and styling
//
// Log lines go through env_logger; this module owns everything else that
// reaches the terminal.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use console::{Term, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::orchestrator::ExplodeSummary;

/// Spinner style similar to uv/pnpm
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Check if stderr is a TTY (for interactive output)
fn is_tty() -> bool {
    Term::stderr().is_term()
}

/// Progress bar for one pipeline phase with `total` work items.
///
/// Hidden when stderr is not a terminal, so piped runs only show log lines.
pub fn phase_bar(label: &str, total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if !is_tty() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let bar_style = ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg} [{bar:25.cyan/dim}] {pos}/{len} ({elapsed})")
        .map(|s| s.tick_chars(SPINNER_CHARS).progress_chars("━━╺"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(bar_style);
    pb.set_message(label.to_string());

    if is_tty() {
        pb.enable_steady_tick(Duration::from_millis(80));
    }

    pb
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red(), message);
}

/// Print a dimmed/secondary message
pub fn dim(message: &str) {
    println!("{}", style(message).dim());
}

/// Print the end-of-run report.
pub fn summary(summary: &ExplodeSummary) {
    success(&format!(
        "Exploded {} artifact(s) from {} namespace(s)",
        summary.downloads, summary.namespaces
    ));
    dim(&format!(
        "  {} class file(s), {} bytecode listing(s)",
        summary.class_files, summary.dumps
    ));

    if summary.dropped > 0 {
        warning(&format!(
            "{} artifact(s) dropped: file type could not be resolved",
            summary.dropped
        ));
    }
    if summary.extraction_failures > 0 {
        warning(&format!(
            "{} archive(s) failed to extract",
            summary.extraction_failures
        ));
    }
    if summary.disassembly_failures > 0 {
        warning(&format!(
            "{} class file(s) failed to disassemble",
            summary.disassembly_failures
        ));
    }
}

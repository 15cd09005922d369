use indicatif::{ProgressBar, ProgressStyle};
use media_sweep_core::{ProgressReporter, ScanProgress};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Resolution of the session-driven scan bar, which only sees a fraction.
pub const FRACTION_STEPS: u64 = 1000;

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: bar over the counted entries
/// - Export phase: bar over the export selection
/// - Delete phase: spinner (one atomic request)
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.slot();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.slot().take() {
            pb.finish_and_clear();
        }
    }
}

pub fn bar_style(label: &str) -> ProgressStyle {
    let template = format!(
        "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} {{msg}}",
        label
    );
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars(TICK_CHARS)
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Bar for a scan observed through a session's progress fraction.
pub fn fraction_bar() -> ProgressBar {
    let pb = ProgressBar::new(FRACTION_STEPS);
    pb.set_style(
        ProgressStyle::with_template("  {spinner:.cyan} Scanning [{bar:30.cyan/dim}] {percent}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, total_items: usize) {
        let pb = ProgressBar::new(total_items as u64);
        pb.set_style(bar_style("Scanning"));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_progress(&self, progress: &ScanProgress) {
        if let Some(pb) = self.slot().as_ref() {
            pb.set_position(progress.visited() as u64);
        }
    }

    fn on_scan_complete(&self, unique_items: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} unique assets in {:.2}s",
            unique_items, duration_secs
        );
    }

    fn on_export_start(&self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        // No steady tick: a video export may be waiting on a stdin prompt.
        pb.set_style(bar_style("Exporting"));
        self.set_bar(pb);
    }

    fn on_export_item(&self, done: usize, _total: usize, file_name: &str) {
        if let Some(pb) = self.slot().as_ref() {
            pb.set_position(done as u64);
            pb.set_message(file_name.to_string());
        }
    }

    fn on_export_complete(&self, saved: usize, failed: usize, cancelled: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Export complete: {} saved, {} failed, {} cancelled",
            saved, failed, cancelled
        );
    }

    fn on_delete_start(&self, count: usize) {
        self.set_bar(spinner(&format!("Deleting {} assets...", count)));
    }

    fn on_delete_complete(&self, count: usize, success: bool) {
        self.finish_bar();
        if success {
            eprintln!("  \x1b[32m✓\x1b[0m Deleted {} assets", count);
        } else {
            eprintln!("  \x1b[31m✗\x1b[0m Delete of {} assets was rejected", count);
        }
    }
}

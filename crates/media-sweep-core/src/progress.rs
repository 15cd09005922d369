/// Trait for reporting scan and sweep progress.
///
/// The CLI implements it with indicatif bars, the session forwards scan
/// progress to its owner's context. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _total_items: usize) {}
    fn on_scan_progress(&self, _progress: &ScanProgress) {}
    fn on_scan_complete(&self, _unique_items: usize, _duration_secs: f64) {}
    fn on_export_start(&self, _total: usize) {}
    fn on_export_item(&self, _done: usize, _total: usize, _file_name: &str) {}
    fn on_export_complete(&self, _saved: usize, _failed: usize, _cancelled: usize) {}
    fn on_delete_start(&self, _count: usize) {}
    fn on_delete_complete(&self, _count: usize, _success: bool) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Fraction of visited items over the counted total.
///
/// Every visited item adds `1/total`, duplicates included, so the fraction
/// only grows. `finish` pins it to exactly 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanProgress {
    visited: usize,
    total: usize,
    fraction: f64,
}

impl ScanProgress {
    pub fn start(total: usize) -> Self {
        Self {
            visited: 0,
            total,
            fraction: 0.0,
        }
    }

    pub fn tick(&mut self) -> f64 {
        self.visited += 1;
        if self.total > 0 {
            self.fraction = (self.fraction + 1.0 / self.total as f64).min(1.0);
        }
        self.fraction
    }

    pub fn finish(&mut self) {
        self.fraction = 1.0;
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_sum_to_one() {
        let mut progress = ScanProgress::start(7);
        let mut last = 0.0;
        for _ in 0..7 {
            let now = progress.tick();
            assert!(now > last);
            last = now;
        }
        assert!((progress.fraction() - 1.0).abs() < 1e-9);
        assert_eq!(progress.visited(), 7);

        progress.finish();
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn test_extra_ticks_never_pass_one() {
        let mut progress = ScanProgress::start(2);
        for _ in 0..5 {
            progress.tick();
        }
        assert_eq!(progress.fraction(), 1.0);
        assert_eq!(progress.visited(), 5);
    }

    #[test]
    fn test_empty_scan_finishes_at_one() {
        let mut progress = ScanProgress::start(0);
        assert_eq!(progress.tick(), 0.0);
        progress.finish();
        assert_eq!(progress.fraction(), 1.0);
    }
}

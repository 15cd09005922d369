use crate::config::ScanConfig;
use crate::error::Error;
use crate::library::MediaStore;
use crate::progress::{ProgressReporter, ScanProgress};
use crate::scanner::{self, Accumulator, RankedInventory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct ScanEngine {
    store: Arc<dyn MediaStore>,
    config: ScanConfig,
}

#[derive(Debug)]
pub struct ScanResult {
    pub inventory: RankedInventory,
    pub stats: ScanStats,
}

#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub collections: usize,
    pub visited: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub ranked: usize,
    pub total_bytes: u64,
    pub count_duration: Duration,
    pub scan_duration: Duration,
}

impl ScanEngine {
    pub fn new(store: Arc<dyn MediaStore>, config: ScanConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the full inventory pipeline:
    /// 1. Resolve collections and count every entry (progress denominator)
    /// 2. Enumerate, dedupe and tick progress per visited entry
    /// 3. Rank by size and keep the top `max_results`
    ///
    /// Any store failure aborts the scan; no partial inventory is returned.
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<ScanResult, Error> {
        let store = self.store.as_ref();
        let options = &self.config.fetch_options;

        // Phase 1: Count
        info!("Counting library items ({:?})...", self.config.traversal);
        let count_start = Instant::now();
        let collections = scanner::resolve_collections(store, &self.config.traversal)
            .map_err(Error::enumeration)?;
        let total = scanner::count_assets(store, &collections, options)
            .map_err(Error::enumeration)?;
        let count_duration = count_start.elapsed();
        debug!(
            "Count completed in {:.2}s: {} entries in {} collections",
            count_duration.as_secs_f64(),
            total,
            collections.len(),
        );

        // Phase 2: Enumerate + dedupe
        info!("Scanning {} entries...", total);
        let scan_start = Instant::now();
        reporter.on_scan_start(total);
        let mut progress = ScanProgress::start(total);
        let mut accumulator = Accumulator::with_capacity(total);

        for entry in scanner::enumerate(store, &collections, options) {
            let (asset, size) = entry.map_err(Error::enumeration)?;
            accumulator.push(asset, size);
            progress.tick();
            reporter.on_scan_progress(&progress);
        }
        progress.finish();
        reporter.on_scan_progress(&progress);

        let scan_duration = scan_start.elapsed();
        let stats = ScanStats {
            collections: collections.len(),
            visited: accumulator.visited(),
            unique: accumulator.len(),
            duplicates: accumulator.duplicates(),
            ranked: 0,
            total_bytes: accumulator.total_bytes(),
            count_duration,
            scan_duration,
        };
        debug!(
            "Scan completed in {:.2}s: {} visited, {} unique, {} duplicates skipped",
            scan_duration.as_secs_f64(),
            stats.visited,
            stats.unique,
            stats.duplicates,
        );

        // Phase 3: Rank
        let inventory = scanner::rank(accumulator.into_entries(), self.config.max_results);
        reporter.on_scan_complete(stats.unique, scan_duration.as_secs_f64());
        info!(
            "Ranked top {} of {} assets ({} bytes scanned)",
            inventory.len(),
            stats.unique,
            stats.total_bytes
        );

        Ok(ScanResult {
            stats: ScanStats {
                ranked: inventory.len(),
                ..stats
            },
            inventory,
        })
    }
}

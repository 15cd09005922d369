//! Owner-side state for an interactive front end.
//!
//! Scans and sweeps run on worker threads and post [`SessionEvent`]s back over
//! a channel. Nothing visible changes until the owner applies those events
//! with [`Session::process_events`] or [`Session::run_until_idle`], so every
//! read of progress, inventory and selections happens on the owner's thread.

use crate::actions::{self, DestinationPicker, Exporter, ProcessOutcome, SweepPlan};
use crate::config::{AppConfig, ScanConfig};
use crate::engine::{ScanEngine, ScanResult, ScanStats};
use crate::error::Error;
use crate::library::models::AssetId;
use crate::library::MediaStore;
use crate::progress::{ProgressReporter, ScanProgress, SilentReporter};
use crate::scanner::RankedInventory;
use crate::selection::SelectionSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub type ScanCompletion = Box<dyn FnOnce(Result<ScanStats, Error>)>;
pub type ProcessCompletion = Box<dyn FnOnce(Result<ProcessOutcome, Error>)>;

/// Messages from worker threads to the owner.
#[derive(Debug)]
pub enum SessionEvent {
    ScanProgress(f64),
    ScanFinished(Result<ScanResult, Error>),
    ProcessFinished(ProcessOutcome),
}

/// Forwards scan progress from the worker to the owner's channel.
struct ChannelReporter {
    sender: Sender<SessionEvent>,
}

impl ProgressReporter for ChannelReporter {
    fn on_scan_progress(&self, progress: &ScanProgress) {
        // The owner may already be gone; nothing left to update then.
        let _ = self
            .sender
            .send(SessionEvent::ScanProgress(progress.fraction()));
    }
}

pub struct Session {
    store: Arc<dyn MediaStore>,
    scan_config: ScanConfig,
    exporter: Arc<Exporter>,
    reporter: Arc<dyn ProgressReporter>,
    sender: Sender<SessionEvent>,
    receiver: Receiver<SessionEvent>,
    worker: Option<JoinHandle<()>>,
    busy: bool,
    progress: f64,
    scan_complete: bool,
    inventory: RankedInventory,
    last_stats: Option<ScanStats>,
    export_selection: SelectionSet,
    delete_selection: SelectionSet,
    on_scan: Option<ScanCompletion>,
    on_process: Option<ProcessCompletion>,
}

impl Session {
    pub fn new(store: Arc<dyn MediaStore>, scan_config: ScanConfig, exporter: Exporter) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            store,
            scan_config,
            exporter: Arc::new(exporter),
            reporter: Arc::new(SilentReporter),
            sender,
            receiver,
            worker: None,
            busy: false,
            progress: 0.0,
            scan_complete: false,
            inventory: RankedInventory::default(),
            last_stats: None,
            export_selection: SelectionSet::new(),
            delete_selection: SelectionSet::new(),
            on_scan: None,
            on_process: None,
        }
    }

    pub fn from_config(
        store: Arc<dyn MediaStore>,
        config: &AppConfig,
        picker: Option<Box<dyn DestinationPicker>>,
    ) -> Self {
        Self::new(
            store,
            ScanConfig::from(config),
            Exporter::from_config(config, picker),
        )
    }

    /// Reporter for the export and delete phases of a sweep. Scan progress
    /// is always published through [`Session::progress`].
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_scan_complete(&self) -> bool {
        self.scan_complete
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn inventory(&self) -> &RankedInventory {
        &self.inventory
    }

    pub fn last_scan_stats(&self) -> Option<&ScanStats> {
        self.last_stats.as_ref()
    }

    pub fn export_selection(&self) -> &SelectionSet {
        &self.export_selection
    }

    pub fn delete_selection(&self) -> &SelectionSet {
        &self.delete_selection
    }

    /// Start a scan on a worker thread. `completion` runs on the owner's
    /// thread once the result has been applied.
    pub fn start_scan(
        &mut self,
        completion: impl FnOnce(Result<ScanStats, Error>) + 'static,
    ) -> Result<(), Error> {
        if self.busy {
            warn!("Scan requested while another operation is running");
            return Err(Error::Busy);
        }

        self.progress = 0.0;
        self.scan_complete = false;

        let engine = ScanEngine::new(Arc::clone(&self.store), self.scan_config.clone());
        let sender = self.sender.clone();
        let handle = thread::Builder::new()
            .name("media-sweep-scan".to_string())
            .spawn(move || {
                let reporter = ChannelReporter {
                    sender: sender.clone(),
                };
                let result = engine.scan(&reporter);
                let _ = sender.send(SessionEvent::ScanFinished(result));
            })?;

        info!("Scan started");
        self.begin(handle);
        self.on_scan = Some(Box::new(completion));
        Ok(())
    }

    /// Export then delete the current selections on a worker thread.
    pub fn process_selections(
        &mut self,
        completion: impl FnOnce(Result<ProcessOutcome, Error>) + 'static,
    ) -> Result<(), Error> {
        if self.busy {
            warn!("Sweep requested while another operation is running");
            return Err(Error::Busy);
        }

        let plan = self.snapshot_plan();
        debug!(
            "Sweep plan: {} to export, {} to delete",
            plan.export.len(),
            plan.delete.len()
        );

        let store = Arc::clone(&self.store);
        let exporter = Arc::clone(&self.exporter);
        let reporter = Arc::clone(&self.reporter);
        let sender = self.sender.clone();
        let handle = thread::Builder::new()
            .name("media-sweep-process".to_string())
            .spawn(move || {
                let outcome =
                    actions::process(store.as_ref(), &exporter, &plan, reporter.as_ref());
                let _ = sender.send(SessionEvent::ProcessFinished(outcome));
            })?;

        self.begin(handle);
        self.on_process = Some(Box::new(completion));
        Ok(())
    }

    pub fn toggle_export_selection(&mut self, id: AssetId) -> Result<bool, Error> {
        self.ensure_listed(id)?;
        Ok(self.export_selection.toggle(id))
    }

    pub fn toggle_delete_selection(&mut self, id: AssetId) -> Result<bool, Error> {
        self.ensure_listed(id)?;
        Ok(self.delete_selection.toggle(id))
    }

    /// Bytes the delete selection would free, counting every resource.
    pub fn total_pending_size(&self) -> u64 {
        self.delete_selection
            .iter()
            .filter_map(|id| self.inventory.get(id))
            .map(|ranked| ranked.asset.total_size())
            .sum()
    }

    pub fn pending_export_size(&self) -> u64 {
        self.export_selection
            .iter()
            .filter_map(|id| self.inventory.get(id))
            .map(|ranked| ranked.size_bytes)
            .sum()
    }

    /// Encoded thumbnail for a listed asset, or `None` when the store has no
    /// preview for it.
    pub fn thumbnail(&self, id: AssetId, edge: u32) -> Result<Option<Vec<u8>>, Error> {
        let ranked = self.inventory.get(id).ok_or(Error::AssetNotFound(id))?;
        self.store.fetch_thumbnail(&ranked.asset, edge)
    }

    /// Apply every event already posted. Returns how many were applied.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait up to `timeout` for worker events and apply whatever arrived.
    /// Returns whether an operation is still running.
    pub fn pump(&mut self, timeout: Duration) -> Result<bool, Error> {
        if !self.busy {
            self.process_events();
            return Ok(false);
        }

        match self.receiver.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                self.process_events();
            }
            Err(RecvTimeoutError::Timeout) => {
                let finished = self
                    .worker
                    .as_ref()
                    .map_or(true, |worker| worker.is_finished());
                if finished {
                    // The terminal event may have landed right before the check.
                    self.process_events();
                    if self.busy {
                        return Err(self.worker_lost());
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => return Err(self.worker_lost()),
        }
        Ok(self.busy)
    }

    /// Block until the running operation's terminal event has been applied.
    pub fn run_until_idle(&mut self) -> Result<(), Error> {
        while self.pump(IDLE_POLL_INTERVAL)? {}
        Ok(())
    }

    fn begin(&mut self, handle: JoinHandle<()>) {
        self.busy = true;
        self.worker = Some(handle);
    }

    fn finish_worker(&mut self) {
        self.busy = false;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Worker thread panicked after reporting its result");
            }
        }
    }

    fn worker_lost(&mut self) -> Error {
        error!("Worker thread exited without reporting a result");
        self.busy = false;
        self.worker = None;
        if let Some(completion) = self.on_scan.take() {
            completion(Err(Error::WorkerLost));
        }
        if let Some(completion) = self.on_process.take() {
            completion(Err(Error::WorkerLost));
        }
        Error::WorkerLost
    }

    fn ensure_listed(&self, id: AssetId) -> Result<(), Error> {
        if self.inventory.contains(id) {
            Ok(())
        } else {
            Err(Error::AssetNotFound(id))
        }
    }

    fn snapshot_plan(&self) -> SweepPlan {
        SweepPlan {
            export: self
                .export_selection
                .iter()
                .filter_map(|id| self.inventory.get(id))
                .map(|ranked| ranked.asset.clone())
                .collect(),
            delete: self.delete_selection.to_vec(),
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ScanProgress(fraction) => self.progress = fraction,
            SessionEvent::ScanFinished(result) => {
                self.finish_worker();
                let outcome = result.map(|ScanResult { inventory, stats }| {
                    self.publish_inventory(inventory, stats.clone());
                    stats
                });
                if let Err(e) = &outcome {
                    error!("Scan failed: {}", e);
                }
                if let Some(completion) = self.on_scan.take() {
                    completion(outcome);
                }
            }
            SessionEvent::ProcessFinished(outcome) => {
                self.finish_worker();
                let deleted = outcome.delete.deleted_ids();
                if !deleted.is_empty() {
                    let removed = self.inventory.remove_ids(deleted);
                    self.export_selection.retain(|id| !deleted.contains(&id));
                    self.delete_selection.retain(|id| !deleted.contains(&id));
                    info!("Removed {} deleted assets from the inventory", removed);
                }
                if let Some(completion) = self.on_process.take() {
                    completion(Ok(outcome));
                }
            }
        }
    }

    fn publish_inventory(&mut self, inventory: RankedInventory, stats: ScanStats) {
        self.inventory = inventory;
        let inventory = &self.inventory;
        self.export_selection.retain(|id| inventory.contains(id));
        self.delete_selection.retain(|id| inventory.contains(id));
        self.progress = 1.0;
        self.scan_complete = true;
        self.last_stats = Some(stats);
        info!("Published {} ranked assets", self.inventory.len());
    }
}

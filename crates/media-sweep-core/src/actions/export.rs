use crate::config::{AppConfig, VideoExportMode};
use crate::error::Error;
use crate::library::models::{Asset, AssetId, MediaKind};
use crate::library::MediaStore;
use crate::progress::ProgressReporter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Terminal state of one export.
#[derive(Debug)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Failed(Error),
    /// The user declined to pick a destination. Not an error.
    Cancelled,
}

impl ExportOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExportOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct ExportItem {
    pub id: AssetId,
    pub kind: MediaKind,
    pub file_name: String,
    pub outcome: ExportOutcome,
}

/// Every export outcome of one sweep, in selection order.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub items: Vec<ExportItem>,
}

impl ExportReport {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when nothing failed. Cancellations don't count as failures.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, ExportOutcome::Saved(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(ExportOutcome::is_failure)
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, ExportOutcome::Cancelled))
    }

    pub fn failures(&self) -> impl Iterator<Item = (AssetId, &Error)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ExportOutcome::Failed(e) => Some((item.id, e)),
            _ => None,
        })
    }

    pub fn first_failure(&self) -> Option<(AssetId, &Error)> {
        self.failures().next()
    }

    pub fn outcome_for(&self, id: AssetId) -> Option<&ExportOutcome> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.outcome)
    }

    fn count(&self, predicate: impl Fn(&ExportOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| predicate(&item.outcome)).count()
    }
}

/// How one kind of asset leaves the library.
pub trait ExportStrategy: Send + Sync {
    fn export(&self, store: &dyn MediaStore, asset: &Asset) -> ExportOutcome;
}

/// Asks the user where a file should go.
pub trait DestinationPicker: Send + Sync {
    /// `None` means the user cancelled.
    fn pick_destination(&self, suggested_name: &str, extension: &str) -> Option<PathBuf>;
}

/// Writes the full-quality image into a directory as `<asset-id>.<ext>`.
pub struct ImageExport {
    output_dir: PathBuf,
}

impl ImageExport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn try_export(&self, store: &dyn MediaStore, asset: &Asset) -> Result<PathBuf, Error> {
        fs::create_dir_all(&self.output_dir)?;
        let data = store
            .fetch_high_quality_data(asset)?
            .ok_or(Error::NoData(asset.id))?;
        let path = self
            .output_dir
            .join(format!("{}.{}", asset.id, asset.extension()));
        fs::write(&path, data)?;
        Ok(path)
    }
}

impl ExportStrategy for ImageExport {
    fn export(&self, store: &dyn MediaStore, asset: &Asset) -> ExportOutcome {
        match self.try_export(store, asset) {
            Ok(path) => ExportOutcome::Saved(path),
            Err(e) => ExportOutcome::Failed(e),
        }
    }
}

/// Lets the user choose each video's destination.
pub struct PickerVideoExport {
    picker: Box<dyn DestinationPicker>,
}

impl PickerVideoExport {
    pub fn new(picker: Box<dyn DestinationPicker>) -> Self {
        Self { picker }
    }
}

impl ExportStrategy for PickerVideoExport {
    fn export(&self, store: &dyn MediaStore, asset: &Asset) -> ExportOutcome {
        let extension = asset.extension();
        let suggested = format!("{}.{}", Uuid::new_v4(), extension);
        match self.picker.pick_destination(&suggested, &extension) {
            None => ExportOutcome::Cancelled,
            Some(destination) => write_to(store, asset, destination),
        }
    }
}

/// Writes videos into a directory under generated names.
pub struct DirectoryVideoExport {
    output_dir: PathBuf,
}

impl DirectoryVideoExport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ExportStrategy for DirectoryVideoExport {
    fn export(&self, store: &dyn MediaStore, asset: &Asset) -> ExportOutcome {
        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            return ExportOutcome::Failed(e.into());
        }
        let destination = self
            .output_dir
            .join(format!("{}.{}", Uuid::new_v4(), asset.extension()));
        write_to(store, asset, destination)
    }
}

/// For hosts that can't export this kind at all.
pub struct UnsupportedExport;

impl ExportStrategy for UnsupportedExport {
    fn export(&self, _store: &dyn MediaStore, asset: &Asset) -> ExportOutcome {
        ExportOutcome::Failed(Error::ExportUnsupported { kind: asset.kind })
    }
}

fn write_to(store: &dyn MediaStore, asset: &Asset, destination: PathBuf) -> ExportOutcome {
    match store.write_resource(asset, &destination) {
        Ok(()) => ExportOutcome::Saved(destination),
        Err(e) => ExportOutcome::Failed(e),
    }
}

/// One export strategy per media kind.
pub struct Exporter {
    image: Box<dyn ExportStrategy>,
    video: Box<dyn ExportStrategy>,
}

impl Exporter {
    pub fn new(image: Box<dyn ExportStrategy>, video: Box<dyn ExportStrategy>) -> Self {
        Self { image, video }
    }

    /// Images always go to `export_dir`. Videos follow `video_export`; the
    /// prompt mode falls back to unsupported when the host has no picker.
    pub fn from_config(config: &AppConfig, picker: Option<Box<dyn DestinationPicker>>) -> Self {
        let export_dir = Path::new(&config.export_dir);
        let video: Box<dyn ExportStrategy> = match (config.video_export, picker) {
            (VideoExportMode::Prompt, Some(picker)) => Box::new(PickerVideoExport::new(picker)),
            (VideoExportMode::Prompt, None) | (VideoExportMode::Unsupported, _) => {
                Box::new(UnsupportedExport)
            }
            (VideoExportMode::Directory, _) => Box::new(DirectoryVideoExport::new(export_dir)),
        };
        Self::new(Box::new(ImageExport::new(export_dir)), video)
    }

    pub fn strategy_for(&self, kind: MediaKind) -> &dyn ExportStrategy {
        match kind {
            MediaKind::Image => self.image.as_ref(),
            MediaKind::Video => self.video.as_ref(),
        }
    }

    /// Export each asset in turn. A failed item is recorded and the next one
    /// still runs.
    pub fn export_all(
        &self,
        store: &dyn MediaStore,
        assets: &[Asset],
        reporter: &dyn ProgressReporter,
    ) -> ExportReport {
        let mut report = ExportReport::default();
        if assets.is_empty() {
            return report;
        }

        info!("Exporting {} assets...", assets.len());
        reporter.on_export_start(assets.len());

        for (done, asset) in assets.iter().enumerate() {
            let outcome = self.strategy_for(asset.kind).export(store, asset);
            match &outcome {
                ExportOutcome::Saved(path) => info!("Saved asset at {}", path.display()),
                ExportOutcome::Failed(e) => error!("Failed to save asset {}: {}", asset.id, e),
                ExportOutcome::Cancelled => debug!("Export of {} cancelled", asset.id),
            }
            report.items.push(ExportItem {
                id: asset.id,
                kind: asset.kind,
                file_name: asset.file_name().to_string(),
                outcome,
            });
            reporter.on_export_item(done + 1, assets.len(), asset.file_name());
        }

        reporter.on_export_complete(report.saved(), report.failed(), report.cancelled());
        report
    }
}

//! Export-then-delete processing of the user's selections.
//!
//! Export runs first and never aborts the delete phase: a photo that failed
//! to export may still be deleted if the user selected it for both.

pub mod delete;
pub mod export;

pub use delete::{delete_batch, DeleteOutcome};
pub use export::{
    DestinationPicker, DirectoryVideoExport, ExportItem, ExportOutcome, ExportReport,
    ExportStrategy, Exporter, ImageExport, PickerVideoExport, UnsupportedExport,
};

use crate::library::models::{Asset, AssetId};
use crate::library::MediaStore;
use crate::progress::ProgressReporter;

/// Snapshot of the two selections at the moment processing starts.
#[derive(Debug, Clone, Default)]
pub struct SweepPlan {
    pub export: Vec<Asset>,
    pub delete: Vec<AssetId>,
}

impl SweepPlan {
    pub fn is_empty(&self) -> bool {
        self.export.is_empty() && self.delete.is_empty()
    }
}

#[derive(Debug)]
pub struct ProcessOutcome {
    pub export: ExportReport,
    pub delete: DeleteOutcome,
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        self.export.is_success() && !self.delete.is_failure()
    }
}

pub fn process(
    store: &dyn MediaStore,
    exporter: &Exporter,
    plan: &SweepPlan,
    reporter: &dyn ProgressReporter,
) -> ProcessOutcome {
    let export = exporter.export_all(store, &plan.export, reporter);
    let delete = delete_batch(store, &plan.delete, reporter);
    ProcessOutcome { export, delete }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::memory::{image, video, MemoryLibrary};
    use crate::SilentReporter;
    use tempfile::tempdir;

    #[test]
    fn test_export_failure_does_not_block_delete() {
        let dir = tempdir().unwrap();
        let store = MemoryLibrary::new()
            .with_album("A", vec![image(1, "a.jpg", 10), video(2, "b.mov", 20)]);
        let exporter = Exporter::new(
            Box::new(ImageExport::new(dir.path())),
            Box::new(UnsupportedExport),
        );
        let plan = SweepPlan {
            export: vec![video(2, "b.mov", 20)],
            delete: vec![AssetId::new(1), AssetId::new(2)],
        };

        let outcome = process(&store, &exporter, &plan, &SilentReporter);
        assert_eq!(outcome.export.failed(), 1);
        assert_eq!(outcome.delete.deleted_ids().len(), 2);
        assert!(!outcome.is_success());
        assert!(store.is_deleted(AssetId::new(2)));
    }

    #[test]
    fn test_empty_plan_does_nothing() {
        let store = MemoryLibrary::new();
        let exporter = Exporter::new(Box::new(UnsupportedExport), Box::new(UnsupportedExport));

        let outcome = process(&store, &exporter, &SweepPlan::default(), &SilentReporter);
        assert!(outcome.export.is_empty());
        assert!(matches!(outcome.delete, DeleteOutcome::Skipped));
        assert!(outcome.is_success());
        assert!(store.delete_calls().is_empty());
    }
}

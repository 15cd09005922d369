use crate::error::Error;
use crate::library::models::AssetId;
use crate::library::MediaStore;
use crate::progress::ProgressReporter;
use tracing::{error, info};

#[derive(Debug)]
pub enum DeleteOutcome {
    /// Nothing was selected for deletion.
    Skipped,
    Deleted(Vec<AssetId>),
    /// The store rejected the batch. Every asset is still in the library.
    Failed(Error),
}

impl DeleteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DeleteOutcome::Failed(_))
    }

    pub fn deleted_ids(&self) -> &[AssetId] {
        match self {
            DeleteOutcome::Deleted(ids) => ids,
            _ => &[],
        }
    }
}

/// Submit `ids` as one atomic request.
pub fn delete_batch(
    store: &dyn MediaStore,
    ids: &[AssetId],
    reporter: &dyn ProgressReporter,
) -> DeleteOutcome {
    if ids.is_empty() {
        return DeleteOutcome::Skipped;
    }

    info!("Deleting {} assets in one batch...", ids.len());
    reporter.on_delete_start(ids.len());

    match store.batch_delete(ids) {
        Ok(()) => {
            info!("Deleted {} assets", ids.len());
            reporter.on_delete_complete(ids.len(), true);
            DeleteOutcome::Deleted(ids.to_vec())
        }
        Err(e) => {
            error!("Failed to delete assets: {}", e);
            reporter.on_delete_complete(ids.len(), false);
            DeleteOutcome::Failed(Error::DeleteBatch(Box::new(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::memory::{image, MemoryLibrary};
    use crate::SilentReporter;

    #[test]
    fn test_empty_selection_never_reaches_store() {
        let store = MemoryLibrary::new();
        let outcome = delete_batch(&store, &[], &SilentReporter);
        assert!(matches!(outcome, DeleteOutcome::Skipped));
        assert!(store.delete_calls().is_empty());
    }

    #[test]
    fn test_single_request_for_whole_selection() {
        let store = MemoryLibrary::new()
            .with_album("A", vec![image(1, "a.jpg", 1), image(2, "b.jpg", 1)]);
        let ids = [AssetId::new(1), AssetId::new(2)];

        let outcome = delete_batch(&store, &ids, &SilentReporter);
        assert_eq!(outcome.deleted_ids(), &ids);
        assert_eq!(store.delete_calls(), vec![ids.to_vec()]);
        assert!(store.is_deleted(AssetId::new(2)));
    }

    #[test]
    fn test_rejected_batch_is_wrapped() {
        let store = MemoryLibrary::new().with_album("A", vec![image(1, "a.jpg", 1)]);
        store.set_fail_delete(true);

        let outcome = delete_batch(&store, &[AssetId::new(1)], &SilentReporter);
        match outcome {
            DeleteOutcome::Failed(Error::DeleteBatch(source)) => {
                assert!(matches!(*source, Error::Io(_)))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!store.is_deleted(AssetId::new(1)));
    }
}

pub mod fs;
#[cfg(test)]
pub(crate) mod memory;
pub mod models;

use crate::error::Error;
use models::{Asset, AssetId, Collection, CollectionKind};
use std::path::Path;

/// Controls which assets a collection fetch includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub include_hidden: bool,
    pub include_bursts: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            include_hidden: true,
            include_bursts: true,
        }
    }
}

/// The backing media library.
///
/// Collections may overlap, so the same asset can come back from several
/// `fetch_assets` calls. Callers dedupe on [`AssetId`].
pub trait MediaStore: Send + Sync {
    fn list_collections(&self, kind: CollectionKind) -> Result<Vec<Collection>, Error>;

    fn fetch_assets(
        &self,
        collection: &Collection,
        options: &FetchOptions,
    ) -> Result<Vec<Asset>, Error>;

    /// Number of assets `fetch_assets` would return for `collection`.
    fn asset_count(&self, collection: &Collection, options: &FetchOptions) -> Result<usize, Error> {
        Ok(self.fetch_assets(collection, options)?.len())
    }

    /// Declared byte size used for ranking. First resource wins.
    fn resource_size(&self, asset: &Asset) -> u64 {
        asset.primary_size()
    }

    /// Encoded thumbnail whose longest edge is at most `target_size`.
    fn fetch_thumbnail(&self, asset: &Asset, target_size: u32) -> Result<Option<Vec<u8>>, Error>;

    /// Full-quality bytes of an image asset's primary resource.
    fn fetch_high_quality_data(&self, asset: &Asset) -> Result<Option<Vec<u8>>, Error>;

    /// Write the primary resource to `destination`.
    fn write_resource(&self, asset: &Asset, destination: &Path) -> Result<(), Error>;

    /// Remove every asset in `ids`, or none of them.
    fn batch_delete(&self, ids: &[AssetId]) -> Result<(), Error>;
}

//! In-memory library with failure injection, for pipeline tests.

use super::models::{Asset, AssetId, AssetResource, Collection, CollectionKind, MediaKind};
use super::{FetchOptions, MediaStore};
use crate::error::Error;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    albums: Vec<(Collection, Vec<Asset>)>,
    data: HashMap<AssetId, Vec<u8>>,
    deleted: HashSet<AssetId>,
    delete_calls: Vec<Vec<AssetId>>,
    fail_delete: bool,
    unavailable: bool,
}

#[derive(Default)]
pub struct MemoryLibrary {
    state: Mutex<State>,
}

pub fn image(raw_id: u64, name: &str, size: u64) -> Asset {
    Asset::new(
        AssetId::new(raw_id),
        MediaKind::Image,
        vec![AssetResource::new(name, size)],
    )
}

pub fn video(raw_id: u64, name: &str, size: u64) -> Asset {
    Asset::new(
        AssetId::new(raw_id),
        MediaKind::Video,
        vec![AssetResource::new(name, size)],
    )
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an album; image assets get their name as payload bytes.
    pub fn with_album(self, title: &str, assets: Vec<Asset>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for asset in &assets {
                state
                    .data
                    .entry(asset.id)
                    .or_insert_with(|| asset.file_name().as_bytes().to_vec());
            }
            state.albums.push((
                Collection {
                    id: title.to_lowercase(),
                    title: title.to_string(),
                    kind: CollectionKind::Album,
                },
                assets,
            ));
        }
        self
    }

    pub fn without_data(self, id: AssetId) -> Self {
        self.state.lock().unwrap().data.remove(&id);
        self
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn delete_calls(&self) -> Vec<Vec<AssetId>> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn is_deleted(&self, id: AssetId) -> bool {
        self.state.lock().unwrap().deleted.contains(&id)
    }
}

impl MediaStore for MemoryLibrary {
    fn list_collections(&self, kind: CollectionKind) -> Result<Vec<Collection>, Error> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(Error::LibraryUnavailable("permission denied".to_string()));
        }
        Ok(match kind {
            CollectionKind::Album => state.albums.iter().map(|(c, _)| c.clone()).collect(),
            CollectionKind::SmartAlbum(smart) => vec![Collection {
                id: format!("smart:{:?}", smart),
                title: smart.title().to_string(),
                kind,
            }],
        })
    }

    fn fetch_assets(
        &self,
        collection: &Collection,
        options: &FetchOptions,
    ) -> Result<Vec<Asset>, Error> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(Error::LibraryUnavailable("permission denied".to_string()));
        }
        let visible = |asset: &&Asset| {
            !state.deleted.contains(&asset.id)
                && (options.include_hidden || !asset.hidden)
                && (options.include_bursts || !asset.burst)
        };
        Ok(match collection.kind {
            CollectionKind::Album => state
                .albums
                .iter()
                .filter(|(c, _)| c.id == collection.id)
                .flat_map(|(_, assets)| assets.iter())
                .filter(visible)
                .cloned()
                .collect(),
            CollectionKind::SmartAlbum(smart) => state
                .albums
                .iter()
                .flat_map(|(_, assets)| assets.iter())
                .filter(visible)
                .filter(|asset| smart.matches(asset))
                .cloned()
                .collect(),
        })
    }

    fn fetch_thumbnail(&self, asset: &Asset, _target_size: u32) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.state.lock().unwrap().data.get(&asset.id).cloned())
    }

    fn fetch_high_quality_data(&self, asset: &Asset) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.state.lock().unwrap().data.get(&asset.id).cloned())
    }

    fn write_resource(&self, asset: &Asset, destination: &Path) -> Result<(), Error> {
        let data = self
            .state
            .lock()
            .unwrap()
            .data
            .get(&asset.id)
            .cloned()
            .ok_or(Error::NoData(asset.id))?;
        fs::write(destination, data)?;
        Ok(())
    }

    fn batch_delete(&self, ids: &[AssetId]) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(ids.to_vec());
        if state.fail_delete {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "user declined the change",
            )));
        }
        state.deleted.extend(ids.iter().copied());
        Ok(())
    }
}

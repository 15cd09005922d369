use crate::config::TraversalMode;
use crate::error::Error;
use crate::library::models::{Asset, Collection, CollectionKind};
use crate::library::{FetchOptions, MediaStore};
use rayon::prelude::*;
use std::slice;
use std::vec;
use tracing::debug;

/// Collections a scan walks for the given traversal mode.
pub fn resolve_collections(
    store: &dyn MediaStore,
    mode: &TraversalMode,
) -> Result<Vec<Collection>, Error> {
    let kind = match mode {
        TraversalMode::Albums => CollectionKind::Album,
        TraversalMode::SmartAlbum(smart) => CollectionKind::SmartAlbum(*smart),
    };
    store.list_collections(kind)
}

/// Counting pre-pass: total raw entries across every collection, duplicates
/// included. Collections are counted in parallel.
pub fn count_assets(
    store: &dyn MediaStore,
    collections: &[Collection],
    options: &FetchOptions,
) -> Result<usize, Error> {
    let total = collections
        .par_iter()
        .map(|collection| store.asset_count(collection, options))
        .try_reduce(|| 0, |a, b| Ok(a + b))?;
    debug!("{} entries across {} collections", total, collections.len());
    Ok(total)
}

/// Lazy traversal yielding `(asset, declared size)` for every leaf of every
/// collection. Assets shared by several collections come out once per
/// collection.
pub struct Enumerator<'a> {
    store: &'a dyn MediaStore,
    collections: slice::Iter<'a, Collection>,
    options: &'a FetchOptions,
    current: vec::IntoIter<Asset>,
}

pub fn enumerate<'a>(
    store: &'a dyn MediaStore,
    collections: &'a [Collection],
    options: &'a FetchOptions,
) -> Enumerator<'a> {
    Enumerator {
        store,
        collections: collections.iter(),
        options,
        current: Vec::new().into_iter(),
    }
}

impl<'a> Iterator for Enumerator<'a> {
    type Item = Result<(Asset, u64), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(asset) = self.current.next() {
                let size = self.store.resource_size(&asset);
                return Some(Ok((asset, size)));
            }

            let collection = self.collections.next()?;
            match self.store.fetch_assets(collection, self.options) {
                Ok(assets) => {
                    debug!("Collection '{}': {} assets", collection.title, assets.len());
                    self.current = assets.into_iter();
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

use crate::library::models::{Asset, AssetId, MediaKind};
use ahash::AHashSet;

/// One row of the ranked inventory.
#[derive(Debug, Clone)]
pub struct RankedAsset {
    pub asset: Asset,
    pub size_bytes: u64,
}

impl RankedAsset {
    pub fn id(&self) -> AssetId {
        self.asset.id
    }

    pub fn kind(&self) -> MediaKind {
        self.asset.kind
    }

    pub fn file_name(&self) -> &str {
        self.asset.file_name()
    }
}

/// Sort descending by size and keep the first `limit`. Equal sizes keep their
/// arrival order.
pub fn rank(mut entries: Vec<(Asset, u64)>, limit: usize) -> RankedInventory {
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(limit);
    RankedInventory {
        items: entries
            .into_iter()
            .map(|(asset, size_bytes)| RankedAsset { asset, size_bytes })
            .collect(),
    }
}

/// The largest assets of the last scan, biggest first.
#[derive(Debug, Clone, Default)]
pub struct RankedInventory {
    items: Vec<RankedAsset>,
}

impl RankedInventory {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedAsset> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[RankedAsset] {
        &self.items
    }

    pub fn get(&self, id: AssetId) -> Option<&RankedAsset> {
        self.items.iter().find(|item| item.asset.id == id)
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.get(id).is_some()
    }

    /// 1-based rank lookup.
    pub fn by_rank(&self, rank: usize) -> Option<&RankedAsset> {
        rank.checked_sub(1).and_then(|index| self.items.get(index))
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.items.iter().map(|item| item.asset.id).collect()
    }

    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|item| item.size_bytes).sum()
    }

    /// Drop the given identities; returns how many rows were removed.
    pub fn remove_ids(&mut self, ids: &[AssetId]) -> usize {
        let doomed: AHashSet<AssetId> = ids.iter().copied().collect();
        let before = self.items.len();
        self.items.retain(|item| !doomed.contains(&item.asset.id));
        before - self.items.len()
    }
}

impl<'a> IntoIterator for &'a RankedInventory {
    type Item = &'a RankedAsset;
    type IntoIter = std::slice::Iter<'a, RankedAsset>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

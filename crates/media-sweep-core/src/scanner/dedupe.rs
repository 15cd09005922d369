use crate::library::models::{Asset, AssetId};
use ahash::AHashSet;

/// Collects `(asset, size)` pairs, keeping the first occurrence of each
/// identity. Enumeration routinely reports an asset once per collection it
/// belongs to.
#[derive(Debug, Default)]
pub struct Accumulator {
    seen: AHashSet<AssetId>,
    entries: Vec<(Asset, u64)>,
    visited: usize,
    duplicates: usize,
    empty: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: AHashSet::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Returns true if the pair was kept.
    pub fn push(&mut self, asset: Asset, size: u64) -> bool {
        self.visited += 1;
        if asset.resources.is_empty() {
            self.empty += 1;
            return false;
        }
        if !self.seen.insert(asset.id) {
            self.duplicates += 1;
            return false;
        }
        self.entries.push((asset, size));
        true
    }

    /// Raw entries seen, kept or not.
    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Assets skipped because they carry no resource.
    pub fn empty(&self) -> usize {
        self.empty
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|(_, size)| *size).sum()
    }

    /// Kept entries in arrival order.
    pub fn into_entries(self) -> Vec<(Asset, u64)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::memory::image;
    use crate::library::models::MediaKind;

    #[test]
    fn test_asset_in_two_collections_kept_once() {
        let mut acc = Accumulator::new();
        assert!(acc.push(image(1, "a.jpg", 500), 500));
        assert!(acc.push(image(2, "b.jpg", 200), 200));
        assert!(!acc.push(image(2, "b.jpg", 200), 200));
        assert!(acc.push(image(3, "c.jpg", 800), 800));

        assert_eq!(acc.visited(), 4);
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.duplicates(), 1);
        assert_eq!(acc.total_bytes(), 1500);

        let ids: Vec<u64> = acc.into_entries().iter().map(|(a, _)| a.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_asset_without_resources_is_visited_not_kept() {
        let mut acc = Accumulator::with_capacity(2);
        assert!(!acc.push(Asset::new(AssetId::new(9), MediaKind::Image, Vec::new()), 0));
        assert_eq!(acc.visited(), 1);
        assert_eq!(acc.empty(), 1);
        assert!(acc.is_empty());

        // A later copy with resources still gets in.
        assert!(acc.push(image(9, "late.jpg", 10), 10));
    }
}

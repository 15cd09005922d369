use crate::library::models::AssetId;

/// Identities the user marked for one action, in the order they were marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<AssetId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now
    /// selected.
    pub fn toggle(&mut self, id: AssetId) -> bool {
        match self.ids.iter().position(|existing| *existing == id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        }
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.ids.contains(&id)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(AssetId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<AssetId> {
        self.ids.clone()
    }
}

pub mod dedupe;
pub mod enumerate;
pub mod rank;

pub use dedupe::Accumulator;
pub use enumerate::{count_assets, enumerate, resolve_collections, Enumerator};
pub use rank::{rank, RankedAsset, RankedInventory};

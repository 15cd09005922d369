pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod progress;
pub mod scanner;
pub mod selection;
pub mod session;

pub use actions::{
    DeleteOutcome, DestinationPicker, ExportOutcome, ExportReport, Exporter, ProcessOutcome,
};
pub use config::AppConfig;
pub use engine::{ScanEngine, ScanResult, ScanStats};
pub use error::Error;
pub use library::fs::FsLibrary;
pub use library::models::{Asset, AssetId, MediaKind};
pub use library::MediaStore;
pub use progress::{ProgressReporter, ScanProgress, SilentReporter};
pub use scanner::{RankedAsset, RankedInventory};
pub use session::Session;

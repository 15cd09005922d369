use crate::library::models::{AssetId, MediaKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The library could not be enumerated. Fatal to the scan that hit it.
    #[error("Enumeration failed: {0}")]
    Enumeration(#[source] Box<Error>),

    #[error("Library unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("Asset {0} not found in library")]
    AssetNotFound(AssetId),

    #[error("No data available for asset {0}")]
    NoData(AssetId),

    #[error("Export of {kind} assets is not supported on this host")]
    ExportUnsupported { kind: MediaKind },

    /// The whole delete batch was rejected; nothing was removed.
    #[error("Delete batch failed: {0}")]
    DeleteBatch(#[source] Box<Error>),

    #[error("A scan or sweep is already in progress")]
    Busy,

    #[error("Background worker exited without reporting a result")]
    WorkerLost,

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn enumeration(source: Error) -> Self {
        match source {
            already @ Error::Enumeration(_) => already,
            other => Error::Enumeration(Box::new(other)),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use twox_hash::XxHash64;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "heif", "gif", "tif", "tiff", "bmp", "webp", "dng", "raw",
];
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "avi", "3gp", "mkv", "webm"];

/// Stable identity of one logical media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(u64);

impl AssetId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Identity of the asset whose primary resource lives at `canonical_path`.
    pub fn from_path(canonical_path: &Path) -> Self {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(canonical_path.to_string_lossy().as_bytes());
        Self(hasher.finish())
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Extension used when the original filename doesn't carry one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// One binary payload of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResource {
    pub original_filename: String,
    pub size_bytes: u64,
}

impl AssetResource {
    pub fn new(original_filename: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            original_filename: original_filename.into(),
            size_bytes,
        }
    }
}

/// A logical media item. The primary resource comes first in `resources`.
///
/// Equality and hashing only look at `id`.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    pub kind: MediaKind,
    pub resources: Vec<AssetResource>,
    pub hidden: bool,
    pub burst: bool,
}

impl Asset {
    pub fn new(id: AssetId, kind: MediaKind, resources: Vec<AssetResource>) -> Self {
        Self {
            id,
            kind,
            resources,
            hidden: false,
            burst: false,
        }
    }

    pub fn primary_resource(&self) -> Option<&AssetResource> {
        self.resources.first()
    }

    /// Size of the primary resource (first-resource-wins).
    pub fn primary_size(&self) -> u64 {
        self.primary_resource().map(|r| r.size_bytes).unwrap_or(0)
    }

    pub fn total_size(&self) -> u64 {
        self.resources.iter().map(|r| r.size_bytes).sum()
    }

    pub fn file_name(&self) -> &str {
        self.primary_resource()
            .map(|r| r.original_filename.as_str())
            .unwrap_or("")
    }

    /// Lowercased extension of the primary resource, or the kind's default.
    pub fn extension(&self) -> String {
        Path::new(self.file_name())
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| self.kind.default_extension().to_string())
    }

    /// An image carrying a paired video resource.
    pub fn is_live_photo(&self) -> bool {
        self.kind == MediaKind::Image
            && self
                .resources
                .iter()
                .skip(1)
                .any(|r| MediaKind::from_path(Path::new(&r.original_filename)) == Some(MediaKind::Video))
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Virtual collections computed over the whole library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartAlbum {
    Videos,
    LivePhotos,
    Bursts,
}

impl SmartAlbum {
    pub fn title(&self) -> &'static str {
        match self {
            SmartAlbum::Videos => "Videos",
            SmartAlbum::LivePhotos => "Live Photos",
            SmartAlbum::Bursts => "Bursts",
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        match self {
            SmartAlbum::Videos => asset.kind == MediaKind::Video,
            SmartAlbum::LivePhotos => asset.is_live_photo(),
            SmartAlbum::Bursts => asset.burst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Album,
    SmartAlbum(SmartAlbum),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub kind: CollectionKind,
}

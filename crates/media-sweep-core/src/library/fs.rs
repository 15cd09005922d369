use super::models::{Asset, AssetId, AssetResource, Collection, CollectionKind, MediaKind};
use super::{FetchOptions, MediaStore};
use crate::error::Error;
use ahash::AHashSet;
use dashmap::DashMap;
use glob::Pattern;
use image::{ImageError, ImageFormat};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::{DirEntry, WalkDir};

const SIDECAR_EXTENSIONS: &[&str] = &["aae", "xmp"];
const STAGING_PREFIX: &str = ".media-sweep-staging-";
const SMART_ALBUM_PREFIX: &str = "smart:";
const BURST_MARKER: &str = "_BURST";

/// Where an asset's bytes live on disk.
#[derive(Debug, Clone)]
struct IndexedAsset {
    /// Canonical resource paths, primary first.
    resources: Vec<PathBuf>,
    /// Album entries (usually symlinks) that resolved to this asset.
    links: Vec<PathBuf>,
}

#[derive(Debug)]
struct FoundFile {
    canonical: PathBuf,
    kind: Option<MediaKind>,
    size: u64,
}

#[derive(Debug, Default)]
struct FileGroup {
    files: Vec<FoundFile>,
    links: Vec<PathBuf>,
}

/// A media library laid out on disk.
///
/// Each visible subdirectory of the root is an album. Album entries may be
/// symlinks to originals elsewhere; identity follows the canonical path, so an
/// original shared by several albums is one asset. Files sharing a directory
/// and a stem form a single asset (a live photo's paired video, sidecars).
pub struct FsLibrary {
    root: PathBuf,
    ignore_patterns: Vec<Pattern>,
    index: DashMap<AssetId, IndexedAsset>,
    /// Staging directories a committed delete could not remove.
    leftovers: Mutex<Vec<PathBuf>>,
}

impl FsLibrary {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, Error> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|e| {
            Error::LibraryUnavailable(format!("{}: {}", root.display(), e))
        })?;
        if !canonical.is_dir() {
            return Err(Error::LibraryUnavailable(format!(
                "{} is not a directory",
                canonical.display()
            )));
        }
        debug!("Opened library at {}", canonical.display());

        Ok(Self {
            root: canonical,
            ignore_patterns: Vec::new(),
            index: DashMap::new(),
            leftovers: Mutex::new(Vec::new()),
        })
    }

    pub fn with_ignore_patterns(mut self, ignore_globs: &[String]) -> Self {
        self.ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of assets seen by fetches so far.
    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    /// Staging directories still on disk after a committed delete. Every
    /// later delete retries them first.
    pub fn leftover_staging(&self) -> Vec<PathBuf> {
        self.leftovers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn purge_leftovers(&self) {
        let mut leftovers = self.leftovers.lock().unwrap_or_else(PoisonError::into_inner);
        leftovers.retain(|dir| match fs::remove_dir_all(dir) {
            Ok(()) => {
                info!("Removed leftover staging directory {}", dir.display());
                false
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Staging directory {} still not removable: {}", dir.display(), e);
                true
            }
        });
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    fn resolve(&self, id: AssetId) -> Result<IndexedAsset, Error> {
        self.index
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::AssetNotFound(id))
    }

    fn primary_path(&self, asset: &Asset) -> Result<PathBuf, Error> {
        self.resolve(asset.id)?
            .resources
            .into_iter()
            .next()
            .ok_or(Error::NoData(asset.id))
    }

    fn walk_assets(&self, dir: &Path, options: &FetchOptions) -> Result<Vec<Asset>, Error> {
        let mut groups: BTreeMap<(PathBuf, String), FileGroup> = BTreeMap::new();

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.keep_entry(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::Other,
                        format!("Error reading album {}: {}", dir.display(), err),
                    )));
                }
                Err(err) => {
                    error!("Error reading entry in {}: {}", dir.display(), err);
                    continue;
                }
            };
            self.collect_file(entry.path(), &mut groups);
        }

        let mut assets = Vec::with_capacity(groups.len());
        for ((_, stem), group) in groups {
            if let Some(asset) = self.build_asset(&stem, group) {
                if asset.hidden && !options.include_hidden {
                    continue;
                }
                if asset.burst && !options.include_bursts {
                    continue;
                }
                assets.push(asset);
            }
        }
        Ok(assets)
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_dir() && is_dot_name(entry.file_name()) {
            return false;
        }
        !self.is_ignored(entry.path())
    }

    fn collect_file(&self, path: &Path, groups: &mut BTreeMap<(PathBuf, String), FileGroup>) {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Skipping {}: {}", path.display(), err);
                return;
            }
        };
        if !metadata.is_file() {
            return;
        }

        let kind = MediaKind::from_path(path);
        if kind.is_none() && !is_sidecar(path) {
            return;
        }

        let canonical = match fs::canonicalize(path) {
            Ok(p) => p,
            Err(err) => {
                warn!("Error canonicalizing {}: {}", path.display(), err);
                return;
            }
        };
        let parent = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = canonical
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let group = groups.entry((parent, stem)).or_default();
        if canonical != path {
            group.links.push(path.to_path_buf());
        }
        if group.files.iter().all(|f| f.canonical != canonical) {
            group.files.push(FoundFile {
                canonical,
                kind,
                size: metadata.len(),
            });
        }
    }

    fn build_asset(&self, stem: &str, mut group: FileGroup) -> Option<Asset> {
        let primary_index = group
            .files
            .iter()
            .position(|f| f.kind == Some(MediaKind::Image))
            .or_else(|| {
                group
                    .files
                    .iter()
                    .position(|f| f.kind == Some(MediaKind::Video))
            })?;
        let primary = group.files.remove(primary_index);
        let kind = primary.kind?;

        let mut files = vec![primary];
        files.append(&mut group.files);

        let id = AssetId::from_path(&files[0].canonical);
        let resources = files
            .iter()
            .map(|f| AssetResource::new(file_name_of(&f.canonical), f.size))
            .collect();

        let mut asset = Asset::new(id, kind, resources);
        asset.hidden = stem.starts_with('.');
        asset.burst = stem.to_ascii_uppercase().contains(BURST_MARKER);

        let paths: Vec<PathBuf> = files.into_iter().map(|f| f.canonical).collect();
        let mut indexed = self.index.entry(id).or_insert_with(|| IndexedAsset {
            resources: Vec::new(),
            links: Vec::new(),
        });
        for path in paths {
            if !indexed.resources.contains(&path) {
                indexed.resources.push(path);
            }
        }
        for link in group.links {
            if !indexed.links.contains(&link) {
                indexed.links.push(link);
            }
        }

        Some(asset)
    }
}

impl MediaStore for FsLibrary {
    fn list_collections(&self, kind: CollectionKind) -> Result<Vec<Collection>, Error> {
        // Listing starts every scan; the index is rebuilt by the fetches that
        // follow so files removed behind our back drop out of it.
        self.index.clear();
        match kind {
            CollectionKind::Album => {
                let entries = fs::read_dir(&self.root).map_err(|e| {
                    Error::LibraryUnavailable(format!("{}: {}", self.root.display(), e))
                })?;

                let mut albums = Vec::new();
                for entry in entries {
                    let entry = entry?;
                    let path = entry.path();
                    if !path.is_dir() || is_dot_name(&entry.file_name()) || self.is_ignored(&path)
                    {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy().into_owned();
                    albums.push(Collection {
                        id: name.clone(),
                        title: name,
                        kind: CollectionKind::Album,
                    });
                }
                albums.sort_by(|a, b| a.id.cmp(&b.id));
                debug!("Found {} albums under {}", albums.len(), self.root.display());
                Ok(albums)
            }
            CollectionKind::SmartAlbum(smart) => Ok(vec![Collection {
                id: format!("{}{:?}", SMART_ALBUM_PREFIX, smart).to_lowercase(),
                title: smart.title().to_string(),
                kind,
            }]),
        }
    }

    fn fetch_assets(
        &self,
        collection: &Collection,
        options: &FetchOptions,
    ) -> Result<Vec<Asset>, Error> {
        match collection.kind {
            CollectionKind::Album => self.walk_assets(&self.root.join(&collection.id), options),
            CollectionKind::SmartAlbum(smart) => Ok(self
                .walk_assets(&self.root, options)?
                .into_iter()
                .filter(|asset| smart.matches(asset))
                .collect()),
        }
    }

    fn fetch_thumbnail(&self, asset: &Asset, target_size: u32) -> Result<Option<Vec<u8>>, Error> {
        if asset.kind == MediaKind::Video {
            return Ok(None);
        }
        let path = self.primary_path(asset)?;
        let image = match image::open(&path) {
            Ok(image) => image,
            Err(ImageError::Unsupported(_)) | Err(ImageError::Decoding(_)) => {
                debug!("No thumbnail for {}: unsupported image", path.display());
                return Ok(None);
            }
            Err(ImageError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let edge = target_size.max(1);
        let thumbnail = image.thumbnail(edge, edge);
        let mut buffer = Cursor::new(Vec::new());
        thumbnail.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(Some(buffer.into_inner()))
    }

    fn fetch_high_quality_data(&self, asset: &Asset) -> Result<Option<Vec<u8>>, Error> {
        let path = self.primary_path(asset)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_resource(&self, asset: &Asset, destination: &Path) -> Result<(), Error> {
        let path = self.primary_path(asset)?;
        let bytes = fs::copy(&path, destination)?;
        debug!(
            "Copied {} ({} bytes) to {}",
            path.display(),
            bytes,
            destination.display()
        );
        Ok(())
    }

    fn batch_delete(&self, ids: &[AssetId]) -> Result<(), Error> {
        let mut seen = AHashSet::new();
        let mut plan = Vec::new();
        for id in ids {
            if seen.insert(*id) {
                plan.push((*id, self.resolve(*id)?));
            }
        }
        if plan.is_empty() {
            return Ok(());
        }

        self.purge_leftovers();

        let mut staging = Staging::new();
        for resource in plan.iter().flat_map(|(_, indexed)| indexed.resources.iter()) {
            if let Err(e) = staging.stage(resource) {
                error!("Failed to stage '{}' for deletion: {}", resource.display(), e);
                staging.roll_back();
                return Err(Error::Io(io::Error::new(
                    e.kind(),
                    format!("failed to stage {}: {}", resource.display(), e),
                )));
            }
        }

        // Commit point: everything is staged.
        let staged = staging.moved.len();
        let leftovers = staging.finish();
        if !leftovers.is_empty() {
            self.leftovers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(leftovers);
        }

        for (id, indexed) in &plan {
            for link in &indexed.links {
                match fs::remove_file(link) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to remove album entry {}: {}", link.display(), e),
                }
            }
            self.index.remove(id);
        }

        info!("Deleted {} assets ({} files)", plan.len(), staged);
        Ok(())
    }
}

/// Files moved aside for one delete batch. Each file is renamed into a
/// staging directory beside it, so a move never crosses a filesystem.
struct Staging {
    batch: Uuid,
    /// Parent directory and the staging directory created in it.
    dirs: Vec<(PathBuf, PathBuf)>,
    /// Original and staged path of every moved file, in move order.
    moved: Vec<(PathBuf, PathBuf)>,
}

impl Staging {
    fn new() -> Self {
        Self {
            batch: Uuid::new_v4(),
            dirs: Vec::new(),
            moved: Vec::new(),
        }
    }

    fn dir_for(&mut self, resource: &Path) -> io::Result<PathBuf> {
        let parent = resource.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no parent directory", resource.display()),
            )
        })?;
        if let Some((_, dir)) = self.dirs.iter().find(|(p, _)| p == parent) {
            return Ok(dir.clone());
        }
        let dir = parent.join(format!("{}{}", STAGING_PREFIX, self.batch));
        fs::create_dir(&dir)?;
        self.dirs.push((parent.to_path_buf(), dir.clone()));
        Ok(dir)
    }

    /// Move one resource aside. A resource that is already gone counts as
    /// staged.
    fn stage(&mut self, resource: &Path) -> io::Result<()> {
        let dir = self.dir_for(resource)?;
        let target = dir.join(format!("{}-{}", self.moved.len(), file_name_of(resource)));
        match fs::rename(resource, &target) {
            Ok(()) => {
                self.moved.push((resource.to_path_buf(), target));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} already gone, nothing to stage", resource.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Put every moved file back. Staging directories are only removed when
    /// the rollback was complete.
    fn roll_back(self) -> bool {
        if !roll_back_moves(&self.moved) {
            for (_, dir) in &self.dirs {
                error!("Rollback incomplete, staged files left in {}", dir.display());
            }
            return false;
        }
        for (_, dir) in &self.dirs {
            if let Err(e) = fs::remove_dir_all(dir) {
                warn!("Failed to remove staging directory {}: {}", dir.display(), e);
            }
        }
        true
    }

    /// Remove the staging directories, returning the ones still on disk.
    fn finish(self) -> Vec<PathBuf> {
        let mut leftovers = Vec::new();
        for (_, dir) in self.dirs {
            match fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    error!(
                        "Deleted files remain in staging directory {}: {}",
                        dir.display(),
                        e
                    );
                    leftovers.push(dir);
                }
            }
        }
        leftovers
    }
}

/// Move staged files back. Returns false if any file could not be restored.
fn roll_back_moves(moved: &[(PathBuf, PathBuf)]) -> bool {
    let mut clean = true;
    for (original, staged) in moved.iter().rev() {
        if let Err(e) = fs::rename(staged, original) {
            error!(
                "Failed to restore '{}' from '{}': {}",
                original.display(),
                staged.display(),
                e
            );
            clean = false;
        }
    }
    clean
}

fn is_dot_name(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SIDECAR_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}

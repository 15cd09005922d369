use media_sweep_core::config::{ScanConfig, VideoExportMode};
use media_sweep_core::library::models::CollectionKind;
use media_sweep_core::library::FetchOptions;
use media_sweep_core::{
    AppConfig, AssetId, DeleteOutcome, Error, FsLibrary, MediaStore, ScanEngine, Session,
    SilentReporter,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write_bytes(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![7u8; len]).unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
        .save(path)
        .unwrap();
}

#[test]
fn test_scan_ranks_files_across_albums() {
    let dir = tempdir().unwrap();
    write_bytes(&dir.path().join("Trip/IMG_0001.jpg"), 500);
    write_bytes(&dir.path().join("Trip/IMG_0002.jpg"), 200);
    write_bytes(&dir.path().join("Pets/MVI_0003.mov"), 800);
    write_bytes(&dir.path().join("Pets/IMG_0004.png"), 50);

    let library = FsLibrary::open(dir.path()).unwrap();
    let engine = ScanEngine::new(
        Arc::new(library),
        ScanConfig {
            max_results: 3,
            ..ScanConfig::default()
        },
    );
    let result = engine.scan(&SilentReporter).unwrap();

    let names: Vec<_> = result.inventory.iter().map(|r| r.file_name()).collect();
    assert_eq!(names, vec!["MVI_0003.mov", "IMG_0001.jpg", "IMG_0002.jpg"]);
    assert_eq!(result.stats.collections, 2);
    assert_eq!(result.stats.unique, 4);
}

#[cfg(unix)]
#[test]
fn test_symlinked_original_is_one_asset() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let original = dir.path().join(".originals/IMG_0100.jpg");
    write_bytes(&original, 4096);
    for album in ["Favorites", "Summer"] {
        fs::create_dir_all(dir.path().join(album)).unwrap();
        symlink(&original, dir.path().join(album).join("IMG_0100.jpg")).unwrap();
    }

    let library = Arc::new(FsLibrary::open(dir.path()).unwrap());
    let result = ScanEngine::new(library.clone(), ScanConfig::default())
        .scan(&SilentReporter)
        .unwrap();
    assert_eq!(result.stats.visited, 2);
    assert_eq!(result.stats.unique, 1);
    assert_eq!(result.inventory.total_size(), 4096);

    let id = result.inventory.ids()[0];
    library.batch_delete(&[id]).unwrap();
    assert!(!original.exists());
    assert!(fs::symlink_metadata(dir.path().join("Favorites/IMG_0100.jpg")).is_err());
    assert!(fs::symlink_metadata(dir.path().join("Summer/IMG_0100.jpg")).is_err());
}

/// Originals on another mount (tmpfs when available) must be deleted in
/// place rather than moved under the library root.
#[cfg(unix)]
#[test]
fn test_delete_original_outside_root() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let elsewhere = tempfile::Builder::new()
        .prefix("originals")
        .tempdir_in("/dev/shm")
        .or_else(|_| tempdir())
        .unwrap();
    let original = elsewhere.path().join("IMG_0200.jpg");
    write_bytes(&original, 2048);
    write_bytes(&elsewhere.path().join("IMG_0201.jpg"), 16);
    fs::create_dir_all(dir.path().join("Shared")).unwrap();
    symlink(&original, dir.path().join("Shared/IMG_0200.jpg")).unwrap();

    let library = Arc::new(FsLibrary::open(dir.path()).unwrap());
    let result = ScanEngine::new(library.clone(), ScanConfig::default())
        .scan(&SilentReporter)
        .unwrap();
    assert_eq!(result.inventory.len(), 1);

    library.batch_delete(&result.inventory.ids()).unwrap();

    assert!(!original.exists());
    assert!(fs::symlink_metadata(dir.path().join("Shared/IMG_0200.jpg")).is_err());
    assert!(library.leftover_staging().is_empty());
    let beside: Vec<_> = fs::read_dir(elsewhere.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(beside, vec!["IMG_0201.jpg"]);
    let at_root: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(at_root, vec!["Shared"]);
}

#[test]
fn test_batch_delete_removes_every_resource() {
    let dir = tempdir().unwrap();
    write_bytes(&dir.path().join("Live/IMG_0001.HEIC"), 300);
    write_bytes(&dir.path().join("Live/IMG_0001.MOV"), 900);
    write_bytes(&dir.path().join("Live/IMG_0002.HEIC"), 100);

    let library = FsLibrary::open(dir.path()).unwrap();
    let album = &library.list_collections(CollectionKind::Album).unwrap()[0];
    let assets = library
        .fetch_assets(album, &FetchOptions::default())
        .unwrap();
    let live = assets
        .iter()
        .find(|a| a.file_name() == "IMG_0001.HEIC")
        .unwrap();

    library.batch_delete(&[live.id, live.id]).unwrap();

    assert!(!dir.path().join("Live/IMG_0001.HEIC").exists());
    assert!(!dir.path().join("Live/IMG_0001.MOV").exists());
    assert!(dir.path().join("Live/IMG_0002.HEIC").exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["Live"]);
}

#[test]
fn test_unknown_id_rejects_whole_batch() {
    let dir = tempdir().unwrap();
    write_bytes(&dir.path().join("Trip/IMG_0001.jpg"), 10);

    let library = FsLibrary::open(dir.path()).unwrap();
    let album = &library.list_collections(CollectionKind::Album).unwrap()[0];
    let asset = library
        .fetch_assets(album, &FetchOptions::default())
        .unwrap()
        .remove(0);

    let err = library
        .batch_delete(&[asset.id, AssetId::new(0xdead)])
        .unwrap_err();
    assert!(matches!(err, Error::AssetNotFound(_)));
    assert!(dir.path().join("Trip/IMG_0001.jpg").exists());
}

#[test]
fn test_thumbnail_is_bounded_png() {
    let dir = tempdir().unwrap();
    write_png(&dir.path().join("Trip/wide.png"), 400, 200);
    write_bytes(&dir.path().join("Trip/broken.jpg"), 64);
    write_bytes(&dir.path().join("Trip/clip.mp4"), 64);

    let library = FsLibrary::open(dir.path()).unwrap();
    let album = &library.list_collections(CollectionKind::Album).unwrap()[0];
    let assets = library
        .fetch_assets(album, &FetchOptions::default())
        .unwrap();
    let by_name = |name: &str| assets.iter().find(|a| a.file_name() == name).unwrap();

    let bytes = library
        .fetch_thumbnail(by_name("wide.png"), 80)
        .unwrap()
        .unwrap();
    let thumb = image::load_from_memory(&bytes).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (80, 40));

    assert!(library
        .fetch_thumbnail(by_name("broken.jpg"), 80)
        .unwrap()
        .is_none());
    assert!(library
        .fetch_thumbnail(by_name("clip.mp4"), 80)
        .unwrap()
        .is_none());
}

#[test]
fn test_session_sweep_on_disk() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("library");
    let out = dir.path().join("exported");
    write_bytes(&root.join("Camera/IMG_0001.jpg"), 100);
    write_bytes(&root.join("Camera/IMG_0002.jpg"), 300);
    write_bytes(&root.join("Camera/MVI_0003.mp4"), 200);

    let config = AppConfig {
        library_root: root.to_string_lossy().into_owned(),
        export_dir: out.to_string_lossy().into_owned(),
        video_export: VideoExportMode::Directory,
        ..AppConfig::default()
    };
    let library = FsLibrary::open(&config.library_root).unwrap();
    let mut session = Session::from_config(Arc::new(library), &config, None);

    session.start_scan(|result| assert!(result.is_ok())).unwrap();
    session.run_until_idle().unwrap();
    assert_eq!(session.progress(), 1.0);

    let ids = session.inventory().ids();
    let (largest, video, smallest) = (ids[0], ids[1], ids[2]);
    session.toggle_export_selection(largest).unwrap();
    session.toggle_export_selection(video).unwrap();
    session.toggle_delete_selection(smallest).unwrap();
    assert_eq!(session.total_pending_size(), 100);
    assert_eq!(session.pending_export_size(), 500);

    session
        .process_selections(|result| {
            let outcome = result.unwrap();
            assert_eq!(outcome.export.saved(), 2);
            assert!(matches!(outcome.delete, DeleteOutcome::Deleted(_)));
        })
        .unwrap();
    session.run_until_idle().unwrap();

    assert!(out.join(format!("{}.jpg", largest)).exists());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
    assert!(!root.join("Camera/IMG_0001.jpg").exists());
    assert_eq!(session.inventory().len(), 2);
    assert!(session.delete_selection().is_empty());
}

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;
#[cfg(not(target_arch = "wasm32"))]
use image::{ImageFormat, RgbaImage};
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::progress::PersistentProgress;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC TYPES
// ═══════════════════════════════════════════════════════════════════════

pub const SAVE_VERSION: u32 = 1;
pub const SAVE_FILE_NAME: &str = "sanctuary.json";
pub const BROWSER_SAVE_KEY: &str = "sanctuary_save";

/// Where the progress record lives.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// JSON file on disk, written via temp file + rename.
    #[cfg(not(target_arch = "wasm32"))]
    File(PathBuf),
    /// `localStorage` entry in the browser.
    #[cfg(target_arch = "wasm32")]
    Browser { key: String },
    /// Process-local cell. Shared between clones so tests can inspect it.
    Memory(Arc<Mutex<Option<String>>>),
}

impl StorageBackend {
    pub fn memory() -> Self {
        StorageBackend::Memory(Arc::new(Mutex::new(None)))
    }

    /// The backend the game uses on this platform.
    pub fn platform_default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            StorageBackend::File(saves_directory().join(SAVE_FILE_NAME))
        }
        #[cfg(target_arch = "wasm32")]
        {
            StorageBackend::Browser {
                key: BROWSER_SAVE_KEY.to_string(),
            }
        }
    }

    /// Raw stored text. `Ok(None)` means nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, String> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            StorageBackend::File(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                fs::read_to_string(path)
                    .map(Some)
                    .map_err(|e| format!("Read failed for {}: {}", path.display(), e))
            }
            #[cfg(target_arch = "wasm32")]
            StorageBackend::Browser { key } => local_storage()?
                .get_item(key)
                .map_err(|_| format!("localStorage read failed for {}", key)),
            StorageBackend::Memory(cell) => cell
                .lock()
                .map(|slot| slot.clone())
                .map_err(|_| "Memory store poisoned".to_string()),
        }
    }

    fn write(&self, text: &str) -> Result<(), String> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            StorageBackend::File(path) => {
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir)
                        .map_err(|e| format!("Could not create saves directory: {}", e))?;
                }
                // Write to a temp file first, then rename for atomicity
                let tmp_path = path.with_extension("json.tmp");
                fs::write(&tmp_path, text)
                    .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
                fs::rename(&tmp_path, path).map_err(|e| format!("Rename failed: {}", e))
            }
            #[cfg(target_arch = "wasm32")]
            StorageBackend::Browser { key } => local_storage()?
                .set_item(key, text)
                .map_err(|_| format!("localStorage write failed for {} (quota?)", key)),
            StorageBackend::Memory(cell) => {
                let mut slot = cell.lock().map_err(|_| "Memory store poisoned".to_string())?;
                *slot = Some(text.to_string());
                Ok(())
            }
        }
    }
}

/// The active progress backend.
#[derive(Resource, Debug, Clone)]
pub struct SaveStorage(pub StorageBackend);

impl Default for SaveStorage {
    fn default() -> Self {
        SaveStorage(StorageBackend::platform_default())
    }
}

/// Whether this session's progress came from storage.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadOrigin {
    Saved,
    #[default]
    Fresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    saved_at: u64,
    progress: PersistentProgress,
}

// ═══════════════════════════════════════════════════════════════════════
// PLATFORM HELPERS
// ═══════════════════════════════════════════════════════════════════════

#[cfg(not(target_arch = "wasm32"))]
fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

#[cfg(not(target_arch = "wasm32"))]
fn photo_path(dir: &Path, id: u32) -> PathBuf {
    dir.join(format!("photo_{}.png", id))
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, String> {
    web_sys::window()
        .ok_or_else(|| "No browser window".to_string())?
        .local_storage()
        .map_err(|_| "localStorage unavailable".to_string())?
        .ok_or_else(|| "localStorage disabled".to_string())
}

// ═══════════════════════════════════════════════════════════════════════
// LOAD / SAVE
// ═══════════════════════════════════════════════════════════════════════

/// Read the progress record. Absent and malformed records both yield the
/// defaults; the caller only learns whether a save was used.
pub fn load_progress(storage: &StorageBackend) -> (PersistentProgress, LoadOrigin) {
    let text = match storage.read() {
        Ok(Some(text)) => text,
        Ok(None) => {
            info!("No saved progress found, starting fresh.");
            return (PersistentProgress::default(), LoadOrigin::Fresh);
        }
        Err(e) => {
            warn!("{}. Starting fresh.", e);
            return (PersistentProgress::default(), LoadOrigin::Fresh);
        }
    };

    match serde_json::from_str::<SaveFile>(&text) {
        Ok(file) => {
            if file.version != SAVE_VERSION {
                warn!(
                    "Save has version {} but current version is {}. Attempting to load anyway.",
                    file.version, SAVE_VERSION
                );
            }
            let mut progress = file.progress;
            progress.clamp_all();
            info!("Loaded progress saved at {}.", file.saved_at);
            (progress, LoadOrigin::Saved)
        }
        Err(e) => {
            warn!("Saved progress is unreadable ({}). Starting fresh.", e);
            (PersistentProgress::default(), LoadOrigin::Fresh)
        }
    }
}

pub fn save_progress(storage: &StorageBackend, progress: &PersistentProgress) -> Result<(), String> {
    let file = SaveFile {
        version: SAVE_VERSION,
        saved_at: unix_timestamp(),
        progress: progress.clone(),
    };
    let json =
        serde_json::to_string_pretty(&file).map_err(|e| format!("Serialization failed: {}", e))?;
    storage.write(&json)
}

// ═══════════════════════════════════════════════════════════════════════
// PHOTO STORE
// ═══════════════════════════════════════════════════════════════════════

/// Raw RGBA8 pixels for one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPayload {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Photo pixels, kept apart from the small progress record.
#[derive(Resource, Debug, Clone)]
pub enum PhotoStore {
    #[cfg(not(target_arch = "wasm32"))]
    Directory(PathBuf),
    Memory(Arc<Mutex<HashMap<u32, PhotoPayload>>>),
}

impl Default for PhotoStore {
    fn default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            PhotoStore::Directory(saves_directory().join("photos"))
        }
        #[cfg(target_arch = "wasm32")]
        {
            PhotoStore::memory()
        }
    }
}

impl PhotoStore {
    pub fn memory() -> Self {
        PhotoStore::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    pub fn put(&self, id: u32, photo: &PhotoPayload) -> Result<(), String> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            PhotoStore::Directory(dir) => {
                fs::create_dir_all(dir)
                    .map_err(|e| format!("Could not create photo directory: {}", e))?;
                let frame = RgbaImage::from_raw(photo.width, photo.height, photo.rgba.clone())
                    .ok_or_else(|| format!("Photo {} pixels do not fill {}x{}", id, photo.width, photo.height))?;
                let path = photo_path(dir, id);
                let tmp_path = path.with_extension("png.tmp");
                frame
                    .save_with_format(&tmp_path, ImageFormat::Png)
                    .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
                fs::rename(&tmp_path, &path).map_err(|e| format!("Rename failed: {}", e))
            }
            PhotoStore::Memory(map) => {
                let mut map = map.lock().map_err(|_| "Photo store poisoned".to_string())?;
                map.insert(id, photo.clone());
                Ok(())
            }
        }
    }

    pub fn get(&self, id: u32) -> Result<PhotoPayload, String> {
        match self {
            #[cfg(not(target_arch = "wasm32"))]
            PhotoStore::Directory(dir) => {
                let path = photo_path(dir, id);
                let frame = image::open(&path)
                    .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?
                    .to_rgba8();
                Ok(PhotoPayload {
                    width: frame.width(),
                    height: frame.height(),
                    rgba: frame.into_raw(),
                })
            }
            PhotoStore::Memory(map) => map
                .lock()
                .map_err(|_| "Photo store poisoned".to_string())?
                .get(&id)
                .cloned()
                .ok_or_else(|| format!("Photo {} not found", id)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SaveStorage>()
            .init_resource::<PhotoStore>()
            .init_resource::<LoadOrigin>()
            .add_event::<SaveRequestEvent>()
            .add_event::<QuitToMenuEvent>()
            .add_systems(Startup, load_on_startup)
            // Saving is allowed from every state; requests only come from
            // explicit user actions.
            .add_systems(Last, (save_on_quit, handle_save_request).chain());
    }
}

/// Runs once, before the first frame. Replaces whatever progress resource
/// the app was built with.
pub fn load_on_startup(mut commands: Commands, storage: Res<SaveStorage>) {
    let (mut progress, origin) = load_progress(&storage.0);
    progress.refresh_plant_day(unix_timestamp());
    commands.insert_resource(progress);
    commands.insert_resource(origin);
}

fn save_on_quit(mut quit: EventReader<QuitToMenuEvent>, mut save: EventWriter<SaveRequestEvent>) {
    if quit.read().count() > 0 {
        save.send(SaveRequestEvent);
    }
}

/// Coalesces every request of the frame into one write. Failures are
/// logged and dropped.
pub fn handle_save_request(
    mut events: EventReader<SaveRequestEvent>,
    storage: Res<SaveStorage>,
    progress: Res<PersistentProgress>,
) {
    if events.read().count() == 0 {
        return;
    }
    match save_progress(&storage.0, &progress) {
        Ok(()) => info!("Progress saved."),
        Err(e) => warn!("Save FAILED: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let storage = StorageBackend::memory();
        let mut progress = PersistentProgress::default();
        progress.water_plant(100);
        progress.make_wish("a long walk", 100).unwrap();
        save_progress(&storage, &progress).unwrap();

        let (loaded, origin) = load_progress(&storage);
        assert_eq!(origin, LoadOrigin::Saved);
        assert_eq!(loaded, progress);
    }

    #[test]
    fn test_absent_save_gives_defaults() {
        let (loaded, origin) = load_progress(&StorageBackend::memory());
        assert_eq!(origin, LoadOrigin::Fresh);
        assert_eq!(loaded, PersistentProgress::default());
    }

    #[test]
    fn test_malformed_save_gives_defaults() {
        let storage = StorageBackend::memory();
        storage.write("{ not json").unwrap();
        let (loaded, origin) = load_progress(&storage);
        assert_eq!(origin, LoadOrigin::Fresh);
        assert_eq!(loaded, PersistentProgress::default());
    }

    #[test]
    fn test_out_of_range_save_is_clamped_on_load() {
        let storage = StorageBackend::memory();
        storage
            .write(r#"{"version":1,"saved_at":0,"progress":{"plant":{"health":400.0}}}"#)
            .unwrap();
        let (loaded, origin) = load_progress(&storage);
        assert_eq!(origin, LoadOrigin::Saved);
        assert_eq!(loaded.plant.health, 100.0);
        assert_eq!(loaded.plant.growth, 0.3);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("sanctuary_save_test_{}", std::process::id()));
        let storage = StorageBackend::File(dir.join(SAVE_FILE_NAME));
        let mut progress = PersistentProgress::default();
        progress.tea_cups = 3;
        save_progress(&storage, &progress).unwrap();
        assert!(!dir.join("sanctuary.json.tmp").exists());

        let (loaded, _) = load_progress(&storage);
        assert_eq!(loaded.tea_cups, 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_photo_store_round_trip() {
        let store = PhotoStore::memory();
        let photo = PhotoPayload {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 255],
        };
        store.put(7, &photo).unwrap();
        assert_eq!(store.get(7).unwrap(), photo);
        assert!(store.get(8).is_err());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_photo_directory_writes_png() {
        let dir = std::env::temp_dir().join(format!("sanctuary_photo_test_{}", std::process::id()));
        let store = PhotoStore::Directory(dir.clone());
        let photo = PhotoPayload {
            width: 2,
            height: 2,
            rgba: vec![
                255, 0, 0, 255, 0, 255, 0, 255, //
                0, 0, 255, 255, 10, 20, 30, 128,
            ],
        };
        store.put(3, &photo).unwrap();
        assert!(dir.join("photo_3.png").exists());
        assert!(!dir.join("photo_3.png.tmp").exists());
        assert_eq!(image::image_dimensions(dir.join("photo_3.png")).unwrap(), (2, 2));
        assert_eq!(store.get(3).unwrap(), photo);
        assert!(store.get(4).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_photo_with_short_pixels_is_rejected() {
        let dir = std::env::temp_dir().join(format!("sanctuary_photo_short_{}", std::process::id()));
        let store = PhotoStore::Directory(dir.clone());
        let photo = PhotoPayload {
            width: 2,
            height: 2,
            rgba: vec![0; 15],
        };
        assert!(store.put(1, &photo).is_err());
        assert!(!dir.join("photo_1.png").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}

//! Startup content and background task plumbing.
//!
//! Content documents (letters, plant baseline) are read off the main thread
//! while the game sits in `GameState::Loading`. With an `AssetServer` they
//! come through its default source (the `assets` folder, or HTTP in the
//! browser); without one, straight from disk. Any read or parse failure
//! falls back to the built-in defaults; the player never sees it.

use std::path::Path;

use bevy::asset::io::{AssetSourceId, Reader};
use bevy::prelude::*;
use bevy::tasks::futures_lite::future;
use bevy::tasks::{block_on, IoTaskPool, Task, TaskPool};
use bevy::utils::{ConditionalSend, ConditionalSendFuture};
use serde::Deserialize;

use crate::progress::{Letter, PersistentProgress};
use crate::save::LoadOrigin;
use crate::shared::*;

pub const ASSET_ROOT: &str = "assets";
pub const LETTERS_PATH: &str = "data/letters.json";
pub const PLANT_DATA_PATH: &str = "data/plant-data.json";

// ═══════════════════════════════════════════════════════════════════════
// TASK SLOT
// ═══════════════════════════════════════════════════════════════════════

/// At most one in-flight background task. Dropping the slot, cancelling it,
/// or starting a new task all cancel the previous one, so a stale result
/// can never arrive.
pub struct TaskSlot<T> {
    task: Option<Task<T>>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self { task: None }
    }
}

impl<T: ConditionalSend + 'static> TaskSlot<T> {
    pub fn start(&mut self, work: impl ConditionalSendFuture<Output = T> + 'static) {
        let pool = IoTaskPool::get_or_init(TaskPool::new);
        self.task = Some(pool.spawn(work));
    }

    /// Returns true if a task was actually running.
    pub fn cancel(&mut self) -> bool {
        self.task.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Non-blocking check. Yields the result once, then the slot is empty.
    pub fn poll(&mut self) -> Option<T> {
        let task = self.task.as_mut()?;
        let output = block_on(future::poll_once(task))?;
        self.task = None;
        Some(output)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CONTENT
// ═══════════════════════════════════════════════════════════════════════

/// Starting plant values for a brand-new sanctuary.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlantBaseline {
    pub health: Option<f32>,
    pub growth: Option<f32>,
    pub hydration: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedContent {
    pub letters: Vec<Letter>,
    pub plant: Option<PlantBaseline>,
}

#[derive(Resource, Default)]
pub struct ContentLoad {
    slot: TaskSlot<LoadedContent>,
    started: bool,
}

/// Set once a `FatalErrorEvent` has been seen; loading never completes.
#[derive(Resource, Debug, Clone, Default)]
pub struct StartupFailure(pub Option<String>);

pub fn default_letters() -> Vec<Letter> {
    let letter = |id: &str, title: &str, content: &str| Letter {
        id: id.to_string(),
        title: title.to_string(),
        author: "Sanctuary".to_string(),
        date: String::new(),
        content: content.to_string(),
    };
    vec![
        letter(
            "welcome",
            "Welcome to Our Sanctuary",
            "This little place was built just for you. The bonsai grows with care, \
             the screen keeps our memories, and the star listens to every wish.",
        ),
        letter(
            "week",
            "A Week of Calm",
            "Come back whenever the day gets loud. The tea is always warm here \
             and the lanterns never go out.",
        ),
        letter(
            "month",
            "Our First Month",
            "Water the plant, write a letter, take a photo. Every small visit \
             makes this space a little more ours.",
        ),
        letter(
            "sky",
            "Up on the Deck",
            "Take the elevator at the end of the terrace. The view of the stars \
             is worth the ride.",
        ),
    ]
}

/// Parse the letters document. An empty list counts as a failure.
pub fn parse_letters(text: &str) -> Result<Vec<Letter>, String> {
    let letters: Vec<Letter> =
        serde_json::from_str(text).map_err(|e| format!("Letters parse failed: {}", e))?;
    if letters.is_empty() {
        return Err("Letters document is empty".into());
    }
    Ok(letters)
}

pub fn parse_plant_baseline(text: &str) -> Result<PlantBaseline, String> {
    serde_json::from_str(text).map_err(|e| format!("Plant data parse failed: {}", e))
}

async fn read_asset(server: &AssetServer, path: &str) -> Result<String, String> {
    let source = server
        .get_source(AssetSourceId::Default)
        .map_err(|e| format!("No asset source for {}: {}", path, e))?;
    let mut reader = source
        .reader()
        .read(Path::new(path))
        .await
        .map_err(|e| format!("Could not read {}: {}", path, e))?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| format!("Could not read {}: {}", path, e))?;
    String::from_utf8(bytes).map_err(|e| format!("{} is not UTF-8: {}", path, e))
}

#[cfg(not(target_arch = "wasm32"))]
fn read_file(path: &str) -> Result<String, String> {
    let full = Path::new(ASSET_ROOT).join(path);
    std::fs::read_to_string(&full).map_err(|e| format!("Could not read {}: {}", full.display(), e))
}

#[cfg(target_arch = "wasm32")]
fn read_file(path: &str) -> Result<String, String> {
    Err(format!("{} needs the asset server in the browser build", path))
}

async fn read_document(server: Option<&AssetServer>, path: &str) -> Result<String, String> {
    match server {
        Some(server) => read_asset(server, path).await,
        None => read_file(path),
    }
}

pub async fn read_content(server: Option<AssetServer>) -> LoadedContent {
    let server = server.as_ref();
    let letters = match read_document(server, LETTERS_PATH).await.and_then(|t| parse_letters(&t)) {
        Ok(letters) => letters,
        Err(e) => {
            info!("{}. Using the built-in letters.", e);
            default_letters()
        }
    };
    let plant = match read_document(server, PLANT_DATA_PATH)
        .await
        .and_then(|t| parse_plant_baseline(&t))
    {
        Ok(plant) => Some(plant),
        Err(e) => {
            info!("{}. Using the default plant.", e);
            None
        }
    };
    LoadedContent { letters, plant }
}

/// Merge loaded content into the session's progress. Letters already in the
/// save win; the baseline only seeds a brand-new plant.
pub fn apply_content(content: LoadedContent, origin: LoadOrigin, progress: &mut PersistentProgress) {
    if progress.letters_received.is_empty() {
        progress.letters_received = content.letters;
    }
    if origin == LoadOrigin::Fresh {
        if let Some(baseline) = content.plant {
            if let Some(health) = baseline.health {
                progress.plant.health = health;
            }
            if let Some(growth) = baseline.growth {
                progress.plant.growth = growth;
            }
            if let Some(hydration) = baseline.hydration {
                progress.plant.hydration = hydration;
            }
            progress.clamp_all();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ContentLoad>()
            .init_resource::<StartupFailure>()
            .add_event::<FatalErrorEvent>();
        app.add_systems(
            Update,
            (record_fatal_error, start_content_load, finish_content_load)
                .chain()
                .run_if(in_state(GameState::Loading)),
        );
    }
}

fn record_fatal_error(mut events: EventReader<FatalErrorEvent>, mut failure: ResMut<StartupFailure>) {
    for event in events.read() {
        if failure.0.is_none() {
            failure.0 = Some(event.message.clone());
        }
    }
}

fn start_content_load(mut load: ResMut<ContentLoad>, asset_server: Option<Res<AssetServer>>) {
    if load.started {
        return;
    }
    load.started = true;
    let server = asset_server.map(|server| server.clone());
    load.slot.start(read_content(server));
}

fn finish_content_load(
    mut load: ResMut<ContentLoad>,
    failure: Res<StartupFailure>,
    origin: Res<LoadOrigin>,
    mut progress: ResMut<PersistentProgress>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if failure.0.is_some() {
        load.slot.cancel();
        return;
    }
    let Some(content) = load.slot.poll() else {
        return;
    };
    info!("Loaded {} letters.", content.letters.len());
    apply_content(content, *origin, &mut progress);
    next_state.set(GameState::MainMenu);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_for<T: Send + 'static>(slot: &mut TaskSlot<T>) -> Option<T> {
        for _ in 0..2000 {
            if let Some(value) = slot.poll() {
                return Some(value);
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        None
    }

    #[test]
    fn test_task_slot_yields_once() {
        let mut slot = TaskSlot::default();
        slot.start(async { 41 + 1 });
        assert_eq!(wait_for(&mut slot), Some(42));
        assert!(!slot.is_running());
        assert_eq!(slot.poll(), None);
    }

    #[test]
    fn test_cancelled_task_never_delivers() {
        let mut slot: TaskSlot<u32> = TaskSlot::default();
        slot.start(future::pending::<u32>());
        assert!(slot.is_running());
        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert_eq!(slot.poll(), None);
    }

    #[test]
    fn test_restart_replaces_previous_task() {
        let mut slot = TaskSlot::default();
        slot.start(future::pending::<&'static str>());
        slot.start(async { "second" });
        assert_eq!(wait_for(&mut slot), Some("second"));
    }

    #[test]
    fn test_content_read_through_asset_server() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()));
        let server = app.world().resource::<AssetServer>().clone();

        let content = block_on(read_content(Some(server)));
        assert_eq!(content.letters.len(), 4);
        assert_eq!(content.letters[0].id, "welcome");
        assert_eq!(content.plant.and_then(|p| p.health), Some(85.0));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_content_read_from_disk_without_asset_server() {
        let content = block_on(read_content(None));
        assert_eq!(content.letters.len(), 4);
        assert!(content.plant.is_some());
    }

    #[test]
    fn test_empty_letters_document_rejected() {
        assert!(parse_letters("[]").is_err());
        assert!(parse_letters("not json").is_err());
        let parsed = parse_letters(r#"[{"id":"a","title":"Hi","content":"Hello"}]"#).unwrap();
        assert_eq!(parsed[0].author, "");
    }

    #[test]
    fn test_saved_letters_override_content() {
        let mut progress = PersistentProgress::default();
        progress.letters_received = vec![default_letters()[0].clone()];
        let content = LoadedContent {
            letters: default_letters(),
            plant: None,
        };
        apply_content(content, LoadOrigin::Saved, &mut progress);
        assert_eq!(progress.letters_received.len(), 1);
    }

    #[test]
    fn test_plant_baseline_only_for_fresh_sanctuary() {
        let baseline = PlantBaseline {
            health: Some(50.0),
            growth: Some(2.0),
            hydration: None,
        };
        let content = LoadedContent {
            letters: default_letters(),
            plant: Some(baseline),
        };

        let mut saved = PersistentProgress::default();
        apply_content(content.clone(), LoadOrigin::Saved, &mut saved);
        assert_eq!(saved.plant.health, 85.0);

        let mut fresh = PersistentProgress::default();
        apply_content(content, LoadOrigin::Fresh, &mut fresh);
        assert_eq!(fresh.plant.health, 50.0);
        assert_eq!(fresh.plant.growth, 1.0);
        assert_eq!(fresh.letters_received.len(), 4);
    }
}

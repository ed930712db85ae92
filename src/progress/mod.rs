//! The one record that survives a session.
//!
//! Every mutation goes through a method on `PersistentProgress` that clamps
//! or validates before writing. Nothing here touches storage; flushing is
//! the save domain's job and only happens on an explicit `SaveRequestEvent`.

pub mod achievements;

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::*;

pub use achievements::{announce_achievements, check_achievements, AchievementDef, ACHIEVEMENTS};

pub const MAX_LETTER_CHARS: usize = 2000;
pub const MAX_WISH_CHARS: usize = 280;
pub const MAX_DIARY_CHARS: usize = 2000;

pub const WATER_HEALTH_GAIN: f32 = 12.0;
pub const WATER_GROWTH_GAIN: f32 = 0.04;
pub const WATER_HYDRATION_GAIN: f32 = 25.0;
pub const FERTILIZE_GROWTH_GAIN: f32 = 0.05;

/// Hydration points lost per hour of play.
pub const HYDRATION_DRAIN_PER_HOUR: f32 = 4.0;
/// Health points lost per hour of play while the soil is bone dry.
pub const DRY_HEALTH_DRAIN_PER_HOUR: f32 = 0.5;

const SECONDS_PER_DAY: u64 = 86_400;

// ═══════════════════════════════════════════════════════════════════════
// RECORD TYPES
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantState {
    pub health: f32,
    pub growth: f32,
    pub hydration: f32,
    pub day: u32,
    pub water_count: u32,
    /// Unix seconds of the last watering.
    pub last_watered: Option<u64>,
    /// Unix seconds the plant was first seen. Day one starts here.
    pub planted_at: u64,
}

impl Default for PlantState {
    fn default() -> Self {
        Self {
            health: 85.0,
            growth: 0.3,
            hydration: 60.0,
            day: 1,
            water_count: 0,
            last_watered: None,
            planted_at: 0,
        }
    }
}

impl PlantState {
    fn clamp(&mut self) {
        self.health = self.health.clamp(0.0, 100.0);
        self.growth = self.growth.clamp(0.0, 1.0);
        self.hydration = self.hydration.clamp(0.0, 100.0);
        self.day = self.day.max(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    pub text: String,
    pub made_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub text: String,
    pub written_at: u64,
}

/// Photo metadata. The pixels live in the photo store under `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMeta {
    pub id: u32,
    pub taken_at: u64,
    pub width: u32,
    pub height: u32,
}

/// Why free-text input was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRejected {
    Empty,
    TooLong { max: usize },
}

impl std::fmt::Display for EntryRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryRejected::Empty => write!(f, "Please write something first."),
            EntryRejected::TooLong { max } => write!(f, "That is too long (max {} characters).", max),
        }
    }
}

fn validate_text(text: &str, max: usize) -> Result<String, EntryRejected> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EntryRejected::Empty);
    }
    if trimmed.chars().count() > max {
        return Err(EntryRejected::TooLong { max });
    }
    Ok(trimmed.to_string())
}

// ═══════════════════════════════════════════════════════════════════════
// PERSISTENT PROGRESS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentProgress {
    pub plant: PlantState,
    pub letters_received: Vec<Letter>,
    pub letters_sent: Vec<Letter>,
    pub wishes: Vec<Wish>,
    pub diary: Vec<DiaryEntry>,
    pub achievements: BTreeSet<String>,
    pub settings: Settings,
    pub photos: Vec<PhotoMeta>,
    pub next_photo_id: u32,
    pub tea_cups: u32,
    pub meditations: u32,
    pub play_time_seconds: f64,
}

impl Default for PersistentProgress {
    fn default() -> Self {
        Self {
            plant: PlantState::default(),
            letters_received: Vec::new(),
            letters_sent: Vec::new(),
            wishes: Vec::new(),
            diary: Vec::new(),
            achievements: BTreeSet::new(),
            settings: Settings::default(),
            photos: Vec::new(),
            next_photo_id: 1,
            tea_cups: 0,
            meditations: 0,
            play_time_seconds: 0.0,
        }
    }
}

impl PersistentProgress {
    /// Bring a freshly deserialized record back into range. Hand-edited or
    /// older saves may carry anything.
    pub fn clamp_all(&mut self) {
        self.plant.clamp();
        self.settings.clamp();
        if !self.play_time_seconds.is_finite() || self.play_time_seconds < 0.0 {
            self.play_time_seconds = 0.0;
        }
        let max_id = self.photos.iter().map(|p| p.id).max().unwrap_or(0);
        self.next_photo_id = self.next_photo_id.max(max_id + 1);
    }

    pub fn water_plant(&mut self, now: u64) {
        let plant = &mut self.plant;
        plant.health += WATER_HEALTH_GAIN;
        plant.growth += WATER_GROWTH_GAIN;
        plant.hydration += WATER_HYDRATION_GAIN;
        plant.water_count += 1;
        plant.last_watered = Some(now);
        plant.clamp();
    }

    pub fn fertilize(&mut self) {
        self.plant.growth += FERTILIZE_GROWTH_GAIN;
        self.plant.clamp();
    }

    /// Day count at `now` since the plant was first seen, starting at 1.
    pub fn plant_day_at(&self, now: u64) -> u32 {
        let days = now.saturating_sub(self.plant.planted_at) / SECONDS_PER_DAY;
        (days as u32).saturating_add(1)
    }

    pub fn refresh_plant_day(&mut self, now: u64) {
        if self.plant.planted_at == 0 {
            self.plant.planted_at = now;
        }
        self.plant.day = self.plant_day_at(now);
        self.plant.clamp();
    }

    /// Accumulate play time and let the soil dry out. Not saved until the
    /// next explicit save.
    pub fn tick_play_time(&mut self, delta_secs: f32) {
        if delta_secs <= 0.0 {
            return;
        }
        self.play_time_seconds += delta_secs as f64;
        let hours = delta_secs / 3600.0;
        self.plant.hydration -= HYDRATION_DRAIN_PER_HOUR * hours;
        if self.plant.hydration <= 0.0 {
            self.plant.health -= DRY_HEALTH_DRAIN_PER_HOUR * hours;
        }
        self.plant.clamp();
    }

    pub fn send_letter(
        &mut self,
        title: &str,
        content: &str,
        now: u64,
    ) -> Result<Letter, EntryRejected> {
        let content = validate_text(content, MAX_LETTER_CHARS)?;
        let title = match title.trim() {
            "" => "Untitled".to_string(),
            t => t.chars().take(80).collect(),
        };
        let letter = Letter {
            id: format!("sent_{}_{}", now, self.letters_sent.len()),
            title,
            author: "Me".into(),
            date: now.to_string(),
            content,
        };
        self.letters_sent.push(letter.clone());
        Ok(letter)
    }

    pub fn make_wish(&mut self, text: &str, now: u64) -> Result<Wish, EntryRejected> {
        let wish = Wish {
            text: validate_text(text, MAX_WISH_CHARS)?,
            made_at: now,
        };
        self.wishes.push(wish.clone());
        Ok(wish)
    }

    pub fn write_diary(&mut self, text: &str, now: u64) -> Result<DiaryEntry, EntryRejected> {
        let entry = DiaryEntry {
            text: validate_text(text, MAX_DIARY_CHARS)?,
            written_at: now,
        };
        self.diary.push(entry.clone());
        Ok(entry)
    }

    /// Reserve the next photo id and record its metadata.
    pub fn add_photo(&mut self, width: u32, height: u32, now: u64) -> PhotoMeta {
        let meta = PhotoMeta {
            id: self.next_photo_id,
            taken_at: now,
            width,
            height,
        };
        self.next_photo_id += 1;
        self.photos.push(meta.clone());
        meta
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.achievements.contains(achievement_id)
    }

    /// Returns true only on the first unlock.
    pub fn unlock_achievement(&mut self, achievement_id: &str) -> bool {
        self.achievements.insert(achievement_id.to_string())
    }

    /// Stable digest of the whole record. Equal fingerprints mean the
    /// serialized forms are identical.
    pub fn fingerprint(&self) -> u64 {
        let encoded = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        encoded.hash(&mut hasher);
        hasher.finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct ProgressPlugin;

impl Plugin for ProgressPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PersistentProgress>();
        app.add_systems(
            Update,
            (
                tick_play_time,
                advance_plant_day,
                check_achievements,
                announce_achievements,
            )
                .chain()
                .in_set(FrameSet::Dispatch)
                .run_if(in_state(GameState::Playing).or(in_state(GameState::Modal))),
        );
    }
}

fn tick_play_time(clock: Res<FrameClock>, mut progress: ResMut<PersistentProgress>) {
    if clock.delta <= 0.0 {
        return;
    }
    progress.tick_play_time(clock.delta);
}

/// Rolls the plant day over while the session is running.
fn advance_plant_day(mut progress: ResMut<PersistentProgress>) {
    let now = unix_timestamp();
    if progress.plant.planted_at != 0 && progress.plant_day_at(now) == progress.plant.day {
        return;
    }
    progress.refresh_plant_day(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_day_advances_during_session() {
        let mut app = App::new();
        let mut progress = PersistentProgress::default();
        progress.plant.planted_at = unix_timestamp() - 2 * SECONDS_PER_DAY - 10;
        progress.plant.day = 1;
        app.insert_resource(progress);
        app.add_systems(Update, advance_plant_day);

        app.update();
        assert_eq!(app.world().resource::<PersistentProgress>().plant.day, 3);
    }

    #[test]
    fn test_water_plant_clamps_health() {
        let mut progress = PersistentProgress::default();
        progress.plant.health = 95.0;
        progress.water_plant(10);
        assert_eq!(progress.plant.health, 100.0);
        assert_eq!(progress.plant.last_watered, Some(10));
        assert_eq!(progress.plant.water_count, 1);
    }

    #[test]
    fn test_growth_never_exceeds_one() {
        let mut progress = PersistentProgress::default();
        for _ in 0..40 {
            progress.fertilize();
            progress.water_plant(0);
        }
        assert_eq!(progress.plant.growth, 1.0);
        assert_eq!(progress.plant.hydration, 100.0);
    }

    #[test]
    fn test_dry_soil_hurts_health() {
        let mut progress = PersistentProgress::default();
        progress.plant.hydration = 1.0;
        // Two hours: hydration hits zero within the first step.
        progress.tick_play_time(3600.0);
        assert_eq!(progress.plant.hydration, 0.0);
        let before = progress.plant.health;
        progress.tick_play_time(3600.0);
        assert!((progress.plant.health - (before - DRY_HEALTH_DRAIN_PER_HOUR)).abs() < 1e-4);
        assert!((progress.play_time_seconds - 7200.0).abs() < 1e-6);
    }

    #[test]
    fn test_plant_day_counts_from_first_sight() {
        let mut progress = PersistentProgress::default();
        progress.refresh_plant_day(1_000_000);
        assert_eq!(progress.plant.day, 1);
        progress.refresh_plant_day(1_000_000 + 3 * SECONDS_PER_DAY + 5);
        assert_eq!(progress.plant.day, 4);
    }

    #[test]
    fn test_text_entries_validated() {
        let mut progress = PersistentProgress::default();
        assert_eq!(progress.make_wish("   ", 0).unwrap_err(), EntryRejected::Empty);
        let long = "x".repeat(MAX_WISH_CHARS + 1);
        assert_eq!(
            progress.make_wish(&long, 0).unwrap_err(),
            EntryRejected::TooLong { max: MAX_WISH_CHARS }
        );
        assert!(progress.wishes.is_empty());

        assert_eq!(progress.make_wish("  a quiet garden ", 5).unwrap().text, "a quiet garden");
        assert!(progress.write_diary("today was calm", 6).is_ok());
        let letter = progress.send_letter("", "hello", 7).unwrap();
        assert_eq!(letter.title, "Untitled");
        assert_eq!(progress.letters_sent.len(), 1);
    }

    #[test]
    fn test_photo_ids_are_unique() {
        let mut progress = PersistentProgress::default();
        let a = progress.add_photo(640, 480, 1);
        let b = progress.add_photo(640, 480, 2);
        assert_ne!(a.id, b.id);

        let mut reloaded = progress.clone();
        reloaded.next_photo_id = 0;
        reloaded.clamp_all();
        assert_eq!(reloaded.next_photo_id, b.id + 1);
    }

    #[test]
    fn test_clamp_all_repairs_out_of_range_save() {
        let mut progress = PersistentProgress::default();
        progress.plant.health = 250.0;
        progress.plant.growth = -3.0;
        progress.plant.day = 0;
        progress.settings.look_sensitivity = 5.0;
        progress.play_time_seconds = f64::NAN;
        progress.clamp_all();
        assert_eq!(progress.plant.health, 100.0);
        assert_eq!(progress.plant.growth, 0.0);
        assert_eq!(progress.plant.day, 1);
        assert_eq!(progress.settings.look_sensitivity, MAX_LOOK_SENSITIVITY);
        assert_eq!(progress.play_time_seconds, 0.0);
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let mut progress = PersistentProgress::default();
        let before = progress.fingerprint();
        assert_eq!(before, progress.clone().fingerprint());
        progress.tea_cups += 1;
        assert_ne!(before, progress.fingerprint());
    }
}

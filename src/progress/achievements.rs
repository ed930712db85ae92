//! Achievements for Sanctuary.
//!
//! Conditions are evaluated against `PersistentProgress` only, so the check
//! can run after any mutation without a dedicated stats resource.

use bevy::prelude::*;

use super::PersistentProgress;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// ACHIEVEMENT DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════

pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_water",
        name: "Green Thumb",
        description: "Water the bonsai for the first time",
    },
    AchievementDef {
        id: "devoted_gardener",
        name: "Devoted Gardener",
        description: "Water the bonsai 10 times",
    },
    AchievementDef {
        id: "full_bloom",
        name: "Full Bloom",
        description: "Grow the bonsai to full size",
    },
    AchievementDef {
        id: "first_letter",
        name: "Pen Pal",
        description: "Send your first letter",
    },
    AchievementDef {
        id: "wishmaker",
        name: "Wishmaker",
        description: "Make a wish on the star",
    },
    AchievementDef {
        id: "dear_diary",
        name: "Dear Diary",
        description: "Write a diary entry",
    },
    AchievementDef {
        id: "photographer",
        name: "Photographer",
        description: "Capture 5 photos",
    },
    AchievementDef {
        id: "tea_ceremony",
        name: "Tea Ceremony",
        description: "Pour 3 cups of tea",
    },
    AchievementDef {
        id: "inner_peace",
        name: "Inner Peace",
        description: "Meditate in the zen garden",
    },
    AchievementDef {
        id: "long_stay",
        name: "Long Stay",
        description: "Spend an hour in the sanctuary",
    },
];

/// Returns `true` if the achievement with the given id has been earned.
fn evaluate_condition(id: &str, progress: &PersistentProgress) -> bool {
    match id {
        "first_water" => progress.plant.water_count >= 1,
        "devoted_gardener" => progress.plant.water_count >= 10,
        "full_bloom" => progress.plant.growth >= 1.0,
        "first_letter" => !progress.letters_sent.is_empty(),
        "wishmaker" => !progress.wishes.is_empty(),
        "dear_diary" => !progress.diary.is_empty(),
        "photographer" => progress.photos.len() >= 5,
        "tea_ceremony" => progress.tea_cups >= 3,
        "inner_peace" => progress.meditations >= 1,
        "long_stay" => progress.play_time_seconds >= 3600.0,
        _ => false,
    }
}

/// Unlock every newly earned achievement. Returns the definitions that
/// changed state, in table order.
pub fn unlock_earned(progress: &mut PersistentProgress) -> Vec<&'static AchievementDef> {
    let earned: Vec<&'static AchievementDef> = ACHIEVEMENTS
        .iter()
        .filter(|def| !progress.is_unlocked(def.id) && evaluate_condition(def.id, progress))
        .collect();
    for def in &earned {
        progress.unlock_achievement(def.id);
    }
    earned
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEM: check_achievements
// ═══════════════════════════════════════════════════════════════════════

/// Runs after the dispatcher and only when the record was touched. Play time
/// ticks every frame that has a delta, so during play this evaluates the
/// table every frame; a frozen clock skips it.
pub fn check_achievements(
    mut progress: ResMut<PersistentProgress>,
    mut events: EventWriter<AchievementUnlockedEvent>,
) {
    if !progress.is_changed() {
        return;
    }
    // Bypass change detection so a no-op check does not re-trigger itself.
    let newly = unlock_earned(progress.bypass_change_detection());
    if newly.is_empty() {
        return;
    }
    progress.set_changed();

    for def in newly {
        info!("[Achievements] Unlocked: \"{}\" ({})", def.name, def.description);
        events.send(AchievementUnlockedEvent {
            achievement_id: def.id.to_string(),
            name: def.name.to_string(),
        });
    }
}

/// Toast and chime for every unlock.
pub fn announce_achievements(
    mut events: EventReader<AchievementUnlockedEvent>,
    mut toasts: EventWriter<ToastEvent>,
    mut sfx: EventWriter<PlaySfxEvent>,
) {
    for event in events.read() {
        toasts.send(ToastEvent::new(format!("Achievement: {}!", event.name)));
        sfx.send(PlaySfxEvent {
            sfx_id: "success".into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_definition_has_a_condition() {
        // A fully saturated record earns everything in the table.
        let mut progress = PersistentProgress::default();
        progress.plant.water_count = 100;
        progress.plant.growth = 1.0;
        progress.tea_cups = 10;
        progress.meditations = 10;
        progress.play_time_seconds = 10_000.0;
        progress.send_letter("Hi", "hello", 0).unwrap();
        progress.make_wish("stars", 0).unwrap();
        progress.write_diary("calm", 0).unwrap();
        for _ in 0..5 {
            progress.add_photo(1, 1, 0);
        }
        let unlocked = unlock_earned(&mut progress);
        assert_eq!(unlocked.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn test_unlock_fires_once() {
        let mut progress = PersistentProgress::default();
        progress.water_plant(0);
        let first = unlock_earned(&mut progress);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "first_water");
        assert!(unlock_earned(&mut progress).is_empty());
        assert!(progress.is_unlocked("first_water"));
    }
}

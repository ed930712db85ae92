use bevy::audio::Volume;
use bevy::prelude::*;

use crate::input::InputState;
use crate::progress::PersistentProgress;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MUSIC STATE: tracks the currently playing music entity
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Default)]
pub struct MusicState {
    pub current_track: Option<Entity>,
}

const MUSIC_PATH: &str = "audio/music/sanctuary.ogg";

// ═══════════════════════════════════════════════════════════════════════
// SFX PATH MAPPING
// ═══════════════════════════════════════════════════════════════════════

/// Maps SFX IDs (sent by other domains) to audio file paths.
fn sfx_path(sfx_id: &str) -> Option<&'static str> {
    match sfx_id {
        "click" => Some("audio/sfx/click.ogg"),
        "water" => Some("audio/sfx/water.ogg"),
        "paper" => Some("audio/sfx/paper.ogg"),
        "success" => Some("audio/sfx/success.ogg"),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Listen for PlaySfxEvent and spawn one-shot audio sources that auto-despawn.
pub fn handle_play_sfx(
    mut events: EventReader<PlaySfxEvent>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    progress: Res<PersistentProgress>,
) {
    let volume = progress.settings.master_volume * progress.settings.sfx_volume;
    for event in events.read() {
        let Some(path) = sfx_path(&event.sfx_id) else {
            debug!("No sound for '{}'", event.sfx_id);
            continue;
        };
        commands.spawn((
            AudioPlayer::new(asset_server.load(path)),
            PlaybackSettings::DESPAWN.with_volume(Volume::new(volume)),
        ));
    }
}

/// Start the music loop if silent, stop it otherwise.
pub fn handle_toggle_music(
    mut events: EventReader<ToggleMusicEvent>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    progress: Res<PersistentProgress>,
    mut music_state: ResMut<MusicState>,
    mut toasts: EventWriter<ToastEvent>,
) {
    for _ in events.read() {
        if let Some(entity) = music_state.current_track.take() {
            commands.entity(entity).despawn_recursive();
            toasts.send(ToastEvent::new("Music off"));
            continue;
        }
        let volume = progress.settings.master_volume * progress.settings.music_volume;
        let entity = commands
            .spawn((
                AudioPlayer::new(asset_server.load(MUSIC_PATH)),
                PlaybackSettings::LOOP.with_volume(Volume::new(volume)),
            ))
            .id();
        music_state.current_track = Some(entity);
        toasts.send(ToastEvent::new("Music on"));
    }
}

pub fn music_hotkey(
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    mut toggle: EventWriter<ToggleMusicEvent>,
) {
    if input.just_pressed(bindings.toggle_music) {
        toggle.send(ToggleMusicEvent);
    }
}

mod audio;
mod fatal;
mod hud;
mod main_menu;
mod menu_kit;
mod modals;
mod pause_menu;
mod photo;
mod toast;

use bevy::prelude::*;
use crate::shared::*;

pub use modals::{GalleryView, TextEntry};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<audio::MusicState>()
            .init_resource::<TextEntry>()
            .init_resource::<GalleryView>()
            .init_resource::<modals::ModalSession>();

        // ─── FATAL + LOADING ───
        app.add_systems(Startup, (fatal::check_render_surface, toast::spawn_toast_container));
        app.add_systems(Update, fatal::show_fatal_error);
        app.add_systems(OnEnter(GameState::Loading), fatal::spawn_loading_screen);
        app.add_systems(OnExit(GameState::Loading), fatal::despawn_loading_screen);

        // ─── TOASTS + AUDIO: every state ───
        app.add_systems(
            Update,
            (
                toast::handle_toast_events,
                toast::update_toasts,
                audio::handle_play_sfx,
                audio::handle_toggle_music,
            ),
        );

        // ─── MAIN MENU ───
        app.add_systems(OnEnter(GameState::MainMenu), main_menu::spawn_main_menu);
        app.add_systems(OnExit(GameState::MainMenu), main_menu::despawn_main_menu);
        app.add_systems(
            Update,
            (
                main_menu::main_menu_navigation,
                menu_kit::update_menu_visuals,
            )
                .chain()
                .run_if(in_state(GameState::MainMenu)),
        );

        // ─── HUD: visible during Playing state ───
        app.add_systems(OnEnter(GameState::Playing), hud::spawn_hud);
        app.add_systems(OnExit(GameState::Playing), hud::despawn_hud);
        app.add_systems(
            Update,
            (
                hud::update_focus_hint,
                hud::update_counters,
                audio::music_hotkey,
                photo::photo_hotkey,
                photo::request_capture,
            )
                .after(FrameSet::Dispatch)
                .run_if(in_state(GameState::Playing)),
        );

        // ─── PAUSE MENU ───
        app.add_systems(OnEnter(GameState::Paused), pause_menu::spawn_pause_menu);
        app.add_systems(OnExit(GameState::Paused), pause_menu::despawn_pause_menu);
        app.add_systems(
            Update,
            (
                pause_menu::pause_menu_navigation,
                menu_kit::update_menu_visuals,
            )
                .chain()
                .run_if(in_state(GameState::Paused)),
        );

        // ─── MODALS ───
        app.add_systems(OnEnter(GameState::Modal), modals::spawn_modal);
        app.add_systems(OnExit(GameState::Modal), modals::close_modal);
        app.add_systems(
            Update,
            (
                modals::modal_input,
                modals::poll_gallery_load,
                modals::refresh_modal_text,
            )
                .chain()
                .run_if(in_state(GameState::Modal)),
        );
        // Reads key events every frame so a hotkey that opened the modal is
        // never typed into it.
        app.add_systems(
            Update,
            (modals::read_text_entry.before(modals::modal_input), modals::cancel_on_quit),
        );
    }
}

//! Modal panels opened from the world: plant care, letters, memory gallery,
//! wishing star and diary. One panel at a time, closed with Escape.

use bevy::input::keyboard::{Key, KeyboardInput};
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use super::menu_kit;
use crate::data::TaskSlot;
use crate::input::InputState;
use crate::progress::{
    PersistentProgress, MAX_DIARY_CHARS, MAX_LETTER_CHARS, MAX_WISH_CHARS,
};
use crate::save::{PhotoPayload, PhotoStore};
use crate::shared::*;

const MAX_TITLE_CHARS: usize = 80;

// ═══════════════════════════════════════════════════════════════════════
// TEXT ENTRY
// ═══════════════════════════════════════════════════════════════════════

/// Single-line free text typed into the open modal.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct TextEntry {
    pub buffer: String,
    pub max: usize,
    pub active: bool,
}

impl TextEntry {
    pub fn begin(&mut self, max: usize) {
        self.buffer.clear();
        self.max = max;
        self.active = true;
    }

    pub fn end(&mut self) {
        self.buffer.clear();
        self.active = false;
    }

    /// Apply one logical key. Enter and Escape are left to the modal.
    pub fn apply(&mut self, key: &Key) {
        if !self.active {
            return;
        }
        match key {
            Key::Backspace => {
                self.buffer.pop();
            }
            Key::Space => self.push(' '),
            Key::Character(chars) => {
                for c in chars.chars().filter(|c| !c.is_control()) {
                    self.push(c);
                }
            }
            _ => {}
        }
    }

    fn push(&mut self, c: char) {
        if self.buffer.chars().count() < self.max {
            self.buffer.push(c);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MODAL SESSION + GALLERY
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStage {
    Title,
    Body,
}

/// Per-opening state of the modal panel. Reset every time a modal opens.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct ModalSession {
    pub letter_index: usize,
    pub composing: Option<ComposeStage>,
    pub draft_title: String,
    /// Feedback line under the body (validation errors, load failures).
    pub status: String,
}

#[derive(Resource, Default)]
pub struct GalleryView {
    pub index: usize,
    pub load: TaskSlot<Result<PhotoPayload, String>>,
    pub image: Option<Handle<Image>>,
}

impl GalleryView {
    /// Kick off a background read of the photo at the current index.
    pub fn request(&mut self, progress: &PersistentProgress, store: &PhotoStore) {
        self.image = None;
        let Some(meta) = progress.photos.get(self.index) else {
            self.load.cancel();
            return;
        };
        let id = meta.id;
        let store = store.clone();
        self.load.start(async move { store.get(id) });
    }
}

/// Move through a list of `len` items, wrapping at both ends.
pub fn step_index(current: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct ModalRoot;

#[derive(Component)]
pub struct ModalBodyText;

#[derive(Component)]
pub struct GalleryImage;

fn modal_title(modal: ActiveModal) -> &'static str {
    match modal {
        ActiveModal::PlantCare => "Plant Care",
        ActiveModal::Letters => "Letters",
        ActiveModal::Gallery => "Memories",
        ActiveModal::Wish => "Make a Wish",
        ActiveModal::Diary => "Diary",
    }
}

fn modal_footer(modal: ActiveModal) -> &'static str {
    match modal {
        ActiveModal::PlantCare => "1 water | 2 fertilize | Esc close",
        ActiveModal::Letters => "Left/Right browse | C write a letter | Esc close",
        ActiveModal::Gallery => "Left/Right browse | Esc close",
        ActiveModal::Wish | ActiveModal::Diary => "Type, then Enter | Esc close",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// OPEN / CLOSE
// ═══════════════════════════════════════════════════════════════════════

#[allow(clippy::too_many_arguments)]
pub fn spawn_modal(
    mut commands: Commands,
    modal: Res<ActiveModal>,
    progress: Res<PersistentProgress>,
    store: Res<PhotoStore>,
    mut session: ResMut<ModalSession>,
    mut entry: ResMut<TextEntry>,
    mut gallery: ResMut<GalleryView>,
) {
    *session = ModalSession::default();
    entry.end();
    match *modal {
        ActiveModal::Wish => entry.begin(MAX_WISH_CHARS),
        ActiveModal::Diary => entry.begin(MAX_DIARY_CHARS),
        ActiveModal::Gallery => {
            gallery.index = gallery.index.min(progress.photos.len().saturating_sub(1));
            gallery.request(&progress, &store);
        }
        ActiveModal::PlantCare | ActiveModal::Letters => {}
    }

    let is_gallery = *modal == ActiveModal::Gallery;
    menu_kit::spawn_overlay(&mut commands, ModalRoot).with_children(|parent| {
        parent.spawn(menu_kit::panel_node(620.0)).with_children(|panel| {
            menu_kit::spawn_menu_title(panel, modal_title(*modal), 32.0);
            panel.spawn((
                GalleryImage,
                ImageNode::default(),
                Node {
                    width: Val::Px(480.0),
                    height: Val::Px(270.0),
                    display: if is_gallery { Display::Flex } else { Display::None },
                    ..default()
                },
            ));
            panel.spawn((
                ModalBodyText,
                Text::new(""),
                TextFont {
                    font_size: 17.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                Node {
                    max_width: Val::Px(560.0),
                    ..default()
                },
            ));
            menu_kit::spawn_menu_footer(panel, modal_footer(*modal));
        });
    });
    info!("Opened {:?} modal", *modal);
}

pub fn close_modal(
    mut commands: Commands,
    query: Query<Entity, With<ModalRoot>>,
    mut entry: ResMut<TextEntry>,
    mut gallery: ResMut<GalleryView>,
) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
    entry.end();
    if gallery.load.cancel() {
        debug!("Gallery load cancelled");
    }
    gallery.image = None;
}

/// Leaving the session drops any background work still in flight.
pub fn cancel_on_quit(mut events: EventReader<QuitToMenuEvent>, mut gallery: ResMut<GalleryView>) {
    if events.read().count() > 0 {
        gallery.load.cancel();
        gallery.image = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT
// ═══════════════════════════════════════════════════════════════════════

pub fn read_text_entry(mut events: EventReader<KeyboardInput>, mut entry: ResMut<TextEntry>) {
    for event in events.read() {
        if event.state == ButtonState::Pressed {
            entry.apply(&event.logical_key);
        }
    }
}

/// What pressing Enter did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Keep the modal open, showing this status.
    Stay(String),
    /// Stay open but the record changed; save and announce.
    Saved { toast: String, sfx: &'static str },
    /// Saved and the modal closes. `wish` carries the text for the firework.
    Close {
        toast: String,
        wish: Option<String>,
    },
}

/// Handle Enter for the text-bearing modals. Pure so it can be tested.
pub fn submit_entry(
    modal: ActiveModal,
    session: &mut ModalSession,
    entry: &mut TextEntry,
    progress: &mut PersistentProgress,
    now: u64,
) -> SubmitOutcome {
    match modal {
        ActiveModal::Wish => match progress.make_wish(&entry.buffer, now) {
            Ok(wish) => {
                entry.end();
                SubmitOutcome::Close {
                    toast: "Your wish drifts up to the stars.".into(),
                    wish: Some(wish.text),
                }
            }
            Err(rejected) => SubmitOutcome::Stay(rejected.to_string()),
        },
        ActiveModal::Diary => match progress.write_diary(&entry.buffer, now) {
            Ok(_) => {
                entry.end();
                SubmitOutcome::Close {
                    toast: "Diary entry saved.".into(),
                    wish: None,
                }
            }
            Err(rejected) => SubmitOutcome::Stay(rejected.to_string()),
        },
        ActiveModal::Letters => match session.composing {
            Some(ComposeStage::Title) => {
                session.draft_title = entry.buffer.clone();
                session.composing = Some(ComposeStage::Body);
                entry.begin(MAX_LETTER_CHARS);
                SubmitOutcome::Stay(String::new())
            }
            Some(ComposeStage::Body) => {
                match progress.send_letter(&session.draft_title, &entry.buffer, now) {
                    Ok(letter) => {
                        entry.end();
                        session.composing = None;
                        session.draft_title.clear();
                        SubmitOutcome::Saved {
                            toast: format!("Letter \"{}\" sent.", letter.title),
                            sfx: "paper",
                        }
                    }
                    Err(rejected) => SubmitOutcome::Stay(rejected.to_string()),
                }
            }
            None => SubmitOutcome::Stay(String::new()),
        },
        ActiveModal::PlantCare | ActiveModal::Gallery => SubmitOutcome::Stay(String::new()),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn modal_input(
    input: Res<InputState>,
    modal: Res<ActiveModal>,
    store: Res<PhotoStore>,
    mut session: ResMut<ModalSession>,
    mut entry: ResMut<TextEntry>,
    mut gallery: ResMut<GalleryView>,
    mut progress: ResMut<PersistentProgress>,
    mut next_state: ResMut<NextState<GameState>>,
    mut toasts: EventWriter<ToastEvent>,
    mut sfx: EventWriter<PlaySfxEvent>,
    mut saves: EventWriter<SaveRequestEvent>,
    mut wishes: EventWriter<WishMadeEvent>,
) {
    if input.just_pressed(KeyCode::Escape) {
        if session.composing.take().is_some() {
            entry.end();
            session.status = "Letter discarded.".into();
        } else {
            next_state.set(GameState::Playing);
        }
        return;
    }

    let now = unix_timestamp();

    if input.just_pressed(KeyCode::Enter) {
        match submit_entry(*modal, &mut session, &mut entry, &mut progress, now) {
            SubmitOutcome::Stay(status) => session.status = status,
            SubmitOutcome::Saved { toast, sfx: id } => {
                session.status.clear();
                toasts.send(ToastEvent::new(toast));
                sfx.send(PlaySfxEvent { sfx_id: id.into() });
                saves.send(SaveRequestEvent);
            }
            SubmitOutcome::Close { toast, wish } => {
                toasts.send(ToastEvent::new(toast));
                sfx.send(PlaySfxEvent {
                    sfx_id: "success".into(),
                });
                saves.send(SaveRequestEvent);
                if let Some(text) = wish {
                    wishes.send(WishMadeEvent { text });
                }
                next_state.set(GameState::Playing);
            }
        }
        return;
    }

    match *modal {
        ActiveModal::PlantCare => {
            if input.just_pressed(KeyCode::Digit1) {
                progress.water_plant(now);
                toasts.send(ToastEvent::new("You water the plant."));
                sfx.send(PlaySfxEvent {
                    sfx_id: "water".into(),
                });
                saves.send(SaveRequestEvent);
            } else if input.just_pressed(KeyCode::Digit2) {
                progress.fertilize();
                toasts.send(ToastEvent::new("You feed the soil."));
                saves.send(SaveRequestEvent);
            }
        }
        ActiveModal::Letters if session.composing.is_none() => {
            let len = progress.letters_received.len() + progress.letters_sent.len();
            if input.just_pressed(KeyCode::ArrowRight) {
                session.letter_index = step_index(session.letter_index, len, true);
            } else if input.just_pressed(KeyCode::ArrowLeft) {
                session.letter_index = step_index(session.letter_index, len, false);
            } else if input.just_pressed(KeyCode::KeyC) {
                session.composing = Some(ComposeStage::Title);
                session.status.clear();
                entry.begin(MAX_TITLE_CHARS);
            }
        }
        ActiveModal::Gallery => {
            let len = progress.photos.len();
            let forward = input.just_pressed(KeyCode::ArrowRight);
            if len > 1 && (forward || input.just_pressed(KeyCode::ArrowLeft)) {
                gallery.index = step_index(gallery.index, len, forward);
                session.status.clear();
                gallery.request(&progress, &store);
            }
        }
        _ => {}
    }
}

// ═══════════════════════════════════════════════════════════════════════
// GALLERY LOAD
// ═══════════════════════════════════════════════════════════════════════

fn photo_image(payload: PhotoPayload) -> Result<Image, String> {
    let expected = payload.width as usize * payload.height as usize * 4;
    if payload.width == 0 || payload.height == 0 || payload.rgba.len() != expected {
        return Err(format!("Bad photo dimensions {}x{}", payload.width, payload.height));
    }
    Ok(Image::new(
        Extent3d {
            width: payload.width,
            height: payload.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        payload.rgba,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    ))
}

pub fn poll_gallery_load(
    mut gallery: ResMut<GalleryView>,
    mut session: ResMut<ModalSession>,
    images: Option<ResMut<Assets<Image>>>,
    mut nodes: Query<&mut ImageNode, With<GalleryImage>>,
) {
    let Some(result) = gallery.load.poll() else {
        return;
    };
    match result.and_then(photo_image) {
        Ok(image) => {
            let Some(mut images) = images else { return };
            let handle = images.add(image);
            if let Ok(mut node) = nodes.get_single_mut() {
                node.image = handle.clone();
            }
            gallery.image = Some(handle);
        }
        Err(e) => {
            warn!("Gallery photo unavailable: {}", e);
            session.status = "This memory could not be loaded.".into();
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// BODY TEXT
// ═══════════════════════════════════════════════════════════════════════

pub fn modal_body(
    modal: ActiveModal,
    session: &ModalSession,
    entry: &TextEntry,
    progress: &PersistentProgress,
    gallery_index: usize,
) -> String {
    let mut body = match modal {
        ActiveModal::PlantCare => {
            let plant = &progress.plant;
            format!(
                "Day {}\nHealth {:.0}/100\nGrowth {:.0}%\nHydration {:.0}/100\nWatered {} times",
                plant.day,
                plant.health,
                plant.growth * 100.0,
                plant.hydration,
                plant.water_count,
            )
        }
        ActiveModal::Letters => match session.composing {
            Some(ComposeStage::Title) => format!("Title: {}_", entry.buffer),
            Some(ComposeStage::Body) => {
                format!("Title: {}\n\n{}_", session.draft_title, entry.buffer)
            }
            None => {
                let all: Vec<_> = progress
                    .letters_received
                    .iter()
                    .chain(progress.letters_sent.iter())
                    .collect();
                match all.get(session.letter_index) {
                    Some(letter) => format!(
                        "{} ({}/{})\nFrom {}, {}\n\n{}",
                        letter.title,
                        session.letter_index + 1,
                        all.len(),
                        letter.author,
                        letter.date,
                        letter.content,
                    ),
                    None => "The letterbox is empty.".to_string(),
                }
            }
        },
        ActiveModal::Gallery => match progress.photos.get(gallery_index) {
            Some(meta) => format!(
                "Photo {}/{}  ({}x{})",
                gallery_index + 1,
                progress.photos.len(),
                meta.width,
                meta.height
            ),
            None => "No memories yet. Press P while exploring to take a photo.".to_string(),
        },
        ActiveModal::Wish => format!(
            "{} wishes made so far.\n\n{}_",
            progress.wishes.len(),
            entry.buffer
        ),
        ActiveModal::Diary => {
            let recent: Vec<&str> = progress
                .diary
                .iter()
                .rev()
                .take(3)
                .map(|d| d.text.as_str())
                .collect();
            format!("{}\n\n{}_", recent.join("\n---\n"), entry.buffer)
        }
    };
    if !session.status.is_empty() {
        body.push_str("\n\n");
        body.push_str(&session.status);
    }
    body
}

pub fn refresh_modal_text(
    modal: Res<ActiveModal>,
    session: Res<ModalSession>,
    entry: Res<TextEntry>,
    progress: Res<PersistentProgress>,
    gallery: Res<GalleryView>,
    mut query: Query<&mut Text, With<ModalBodyText>>,
) {
    let Ok(mut text) = query.get_single_mut() else {
        return;
    };
    let body = modal_body(*modal, &session, &entry, &progress, gallery.index);
    if text.0 != body {
        text.0 = body;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typing(max: usize) -> TextEntry {
        let mut entry = TextEntry::default();
        entry.begin(max);
        entry
    }

    #[test]
    fn test_text_entry_respects_max_and_backspace() {
        let mut entry = typing(3);
        entry.apply(&Key::Character("ab".into()));
        entry.apply(&Key::Space);
        entry.apply(&Key::Character("c".into()));
        assert_eq!(entry.buffer, "ab ");
        entry.apply(&Key::Backspace);
        assert_eq!(entry.buffer, "ab");
    }

    #[test]
    fn test_inactive_entry_ignores_keys() {
        let mut entry = TextEntry::default();
        entry.apply(&Key::Character("x".into()));
        assert!(entry.buffer.is_empty());
    }

    #[test]
    fn test_step_index_wraps() {
        assert_eq!(step_index(2, 3, true), 0);
        assert_eq!(step_index(0, 3, false), 2);
        assert_eq!(step_index(0, 0, true), 0);
    }

    #[test]
    fn test_empty_wish_stays_open() {
        let mut progress = PersistentProgress::default();
        let mut session = ModalSession::default();
        let mut entry = typing(MAX_WISH_CHARS);
        entry.apply(&Key::Space);
        let outcome = submit_entry(ActiveModal::Wish, &mut session, &mut entry, &mut progress, 5);
        assert!(matches!(outcome, SubmitOutcome::Stay(_)));
        assert!(progress.wishes.is_empty());
    }

    #[test]
    fn test_wish_closes_with_firework_text() {
        let mut progress = PersistentProgress::default();
        let mut session = ModalSession::default();
        let mut entry = typing(MAX_WISH_CHARS);
        entry.apply(&Key::Character("rain".into()));
        let outcome = submit_entry(ActiveModal::Wish, &mut session, &mut entry, &mut progress, 5);
        match outcome {
            SubmitOutcome::Close { wish, .. } => assert_eq!(wish.as_deref(), Some("rain")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(progress.wishes.len(), 1);
        assert!(!entry.active);
    }

    #[test]
    fn test_letter_compose_two_stages() {
        let mut progress = PersistentProgress::default();
        let mut session = ModalSession {
            composing: Some(ComposeStage::Title),
            ..default()
        };
        let mut entry = typing(MAX_TITLE_CHARS);
        entry.apply(&Key::Character("Hi".into()));
        submit_entry(ActiveModal::Letters, &mut session, &mut entry, &mut progress, 9);
        assert_eq!(session.composing, Some(ComposeStage::Body));
        assert!(entry.buffer.is_empty());

        entry.apply(&Key::Character("hello there".into()));
        let outcome = submit_entry(ActiveModal::Letters, &mut session, &mut entry, &mut progress, 9);
        assert!(matches!(outcome, SubmitOutcome::Saved { sfx: "paper", .. }));
        assert_eq!(progress.letters_sent.len(), 1);
        assert_eq!(progress.letters_sent[0].title, "Hi");
        assert_eq!(session.composing, None);
    }

    #[test]
    fn test_photo_image_rejects_bad_size() {
        let bad = PhotoPayload {
            width: 2,
            height: 2,
            rgba: vec![0; 10],
        };
        assert!(photo_image(bad).is_err());
    }
}

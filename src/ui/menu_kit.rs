//! Shared menu building blocks: colours, title, buttons, cursor handling.

use bevy::prelude::*;

use crate::input::InputState;

pub const BG_OVERLAY: Color = Color::srgba(0.02, 0.02, 0.08, 0.75);
pub const PANEL_BG: Color = Color::srgba(0.1, 0.08, 0.18, 0.95);
pub const PANEL_BORDER: Color = Color::srgb(0.85, 0.65, 0.75);
pub const TITLE_COLOR: Color = Color::srgb(1.0, 0.85, 0.9);
pub const BUTTON_NORMAL: Color = Color::srgba(1.0, 1.0, 1.0, 0.06);
pub const BUTTON_SELECTED: Color = Color::srgba(1.0, 0.7, 0.8, 0.35);
pub const FOOTER_COLOR: Color = Color::srgb(0.6, 0.6, 0.7);

#[derive(Component)]
pub struct MenuItem {
    pub index: usize,
}

/// Cursor over a vertical list of options.
#[derive(Resource, Debug, Default)]
pub struct MenuCursor {
    pub cursor: usize,
    pub len: usize,
}

impl MenuCursor {
    pub fn new(len: usize) -> Self {
        Self { cursor: 0, len }
    }

    /// Applies Up/Down, mouse hover and Enter/click. Returns the chosen
    /// option when activated.
    pub fn navigate(
        &mut self,
        input: &InputState,
        items: &Query<(&Interaction, &MenuItem), Changed<Interaction>>,
    ) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        if input.just_pressed(KeyCode::ArrowDown) || input.just_pressed(KeyCode::KeyS) {
            self.cursor = (self.cursor + 1).min(self.len - 1);
        }
        if input.just_pressed(KeyCode::ArrowUp) || input.just_pressed(KeyCode::KeyW) {
            self.cursor = self.cursor.saturating_sub(1);
        }
        for (interaction, item) in items.iter() {
            match interaction {
                Interaction::Hovered => self.cursor = item.index,
                Interaction::Pressed => return Some(item.index),
                Interaction::None => {}
            }
        }
        if input.just_pressed(KeyCode::Enter) {
            return Some(self.cursor);
        }
        None
    }
}

pub fn spawn_overlay<'a>(commands: &'a mut Commands, marker: impl Component) -> EntityCommands<'a> {
    commands.spawn((
        marker,
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            flex_direction: FlexDirection::Column,
            ..default()
        },
        BackgroundColor(BG_OVERLAY),
        GlobalZIndex(10),
    ))
}

pub fn panel_node(width: f32) -> impl Bundle {
    (
        Node {
            width: Val::Px(width),
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            padding: UiRect::all(Val::Px(24.0)),
            row_gap: Val::Px(12.0),
            border: UiRect::all(Val::Px(2.0)),
            ..default()
        },
        BackgroundColor(PANEL_BG),
        BorderColor(PANEL_BORDER),
    )
}

pub fn spawn_menu_title(parent: &mut ChildBuilder, title: &str, size: f32) {
    parent.spawn((
        Text::new(title),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(TITLE_COLOR),
    ));
}

pub fn spawn_menu_button(parent: &mut ChildBuilder, index: usize, label: &str) {
    parent
        .spawn((
            MenuItem { index },
            Button,
            Node {
                width: Val::Px(260.0),
                height: Val::Px(44.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(BUTTON_NORMAL),
        ))
        .with_children(|item| {
            item.spawn((
                Text::new(label),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

pub fn spawn_menu_footer(parent: &mut ChildBuilder, text: &str) {
    parent.spawn((
        Text::new(text),
        TextFont {
            font_size: 12.0,
            ..default()
        },
        TextColor(FOOTER_COLOR),
    ));
}

pub fn update_menu_visuals(
    cursor: Option<Res<MenuCursor>>,
    mut query: Query<(&MenuItem, &mut BackgroundColor)>,
) {
    let Some(cursor) = cursor else { return };
    for (item, mut bg) in &mut query {
        bg.0 = if item.index == cursor.cursor {
            BUTTON_SELECTED
        } else {
            BUTTON_NORMAL
        };
    }
}

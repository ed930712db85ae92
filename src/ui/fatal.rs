use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::data::StartupFailure;
use crate::shared::*;

#[derive(Component)]
pub struct LoadingScreenRoot;

#[derive(Component)]
pub struct FatalScreenRoot;

/// No window means nothing can ever be drawn; that is the one failure the
/// player is told about.
pub fn check_render_surface(
    windows: Query<(), With<PrimaryWindow>>,
    mut fatal: EventWriter<FatalErrorEvent>,
) {
    if windows.is_empty() {
        error!("No primary window available; cannot render the sanctuary");
        fatal.send(FatalErrorEvent {
            message: "Sanctuary could not open a window to draw into. Please restart.".into(),
        });
    }
}

pub fn show_fatal_error(
    mut commands: Commands,
    failure: Res<StartupFailure>,
    shown: Query<(), With<FatalScreenRoot>>,
) {
    let Some(message) = failure.0.as_ref() else {
        return;
    };
    if !failure.is_changed() || !shown.is_empty() {
        return;
    }

    commands
        .spawn((
            FatalScreenRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                padding: UiRect::all(Val::Px(40.0)),
                ..default()
            },
            BackgroundColor(Color::srgb(0.05, 0.02, 0.04)),
            GlobalZIndex(100),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(message.clone()),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.8, 0.8)),
                TextLayout::new_with_justify(JustifyText::Center),
            ));
        });
}

pub fn spawn_loading_screen(mut commands: Commands) {
    commands
        .spawn((
            LoadingScreenRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgb(0.05, 0.04, 0.12)),
            GlobalZIndex(20),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Preparing the sanctuary..."),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(Color::srgb(0.85, 0.8, 0.95)),
            ));
        });
}

pub fn despawn_loading_screen(mut commands: Commands, query: Query<Entity, With<LoadingScreenRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

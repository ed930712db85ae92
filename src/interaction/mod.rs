pub mod dispatch;
pub mod focus;
pub mod registry;

use bevy::prelude::*;

use crate::shared::*;

pub use dispatch::{dispatch_interaction, InteractionEffect};
pub use focus::{resolve_focus, FocusState, LookRay};
pub use registry::{ColliderPrimitive, ColliderShape, InteractableDescriptor, InteractableRegistry};

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InteractableRegistry>()
            .init_resource::<FocusState>()
            .init_resource::<ActiveModal>()
            .add_event::<FocusChangedEvent>()
            .add_event::<OpenModalEvent>();

        app.add_systems(
            Update,
            focus::update_focus
                .in_set(FrameSet::Focus)
                .run_if(in_state(GameState::Playing)),
        );
        app.add_systems(
            Update,
            (dispatch::dispatch_on_press, dispatch::modal_hotkeys, dispatch::open_requested_modal)
                .chain()
                .in_set(FrameSet::Dispatch)
                .run_if(in_state(GameState::Playing)),
        );
        app.add_systems(OnExit(GameState::Playing), focus::clear_focus);
    }
}

//! `P` takes a photo of the current view for the memory gallery.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use bevy::render::view::screenshot::{Screenshot, ScreenshotCaptured};

use crate::input::InputState;
use crate::progress::PersistentProgress;
use crate::save::{PhotoPayload, PhotoStore};
use crate::shared::*;

pub fn photo_hotkey(
    input: Res<InputState>,
    bindings: Res<KeyBindings>,
    mut capture: EventWriter<CapturePhotoEvent>,
) {
    if input.just_pressed(bindings.take_photo) {
        capture.send(CapturePhotoEvent);
    }
}

pub fn request_capture(mut commands: Commands, mut events: EventReader<CapturePhotoEvent>) {
    if events.read().count() == 0 {
        return;
    }
    commands
        .spawn(Screenshot::primary_window())
        .observe(store_captured_photo);
}

/// Normalize a captured frame to tightly packed RGBA8.
pub fn rgba_from_capture(
    format: TextureFormat,
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<PhotoPayload, String> {
    let expected = width as usize * height as usize * 4;
    if data.len() != expected {
        return Err(format!(
            "Capture is {} bytes, expected {} for {}x{}",
            data.len(),
            expected,
            width,
            height
        ));
    }
    let rgba = match format {
        TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => data.to_vec(),
        TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb => data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect(),
        other => return Err(format!("Unsupported capture format {:?}", other)),
    };
    Ok(PhotoPayload { width, height, rgba })
}

fn store_captured_photo(
    trigger: Trigger<ScreenshotCaptured>,
    store: Res<PhotoStore>,
    mut progress: ResMut<PersistentProgress>,
    mut toasts: EventWriter<ToastEvent>,
    mut sfx: EventWriter<PlaySfxEvent>,
    mut saves: EventWriter<SaveRequestEvent>,
) {
    let image = &trigger.event().0;
    let size = image.size();
    let payload = match rgba_from_capture(image.texture_descriptor.format, size.x, size.y, &image.data) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Photo capture unusable: {}", e);
            return;
        }
    };

    let id = progress.next_photo_id;
    if let Err(e) = store.put(id, &payload) {
        warn!("Photo {} could not be stored: {}", id, e);
        return;
    }
    progress.add_photo(payload.width, payload.height, unix_timestamp());
    info!("Stored photo {} ({}x{})", id, payload.width, payload.height);

    toasts.send(ToastEvent::new("Photo saved to your memories."));
    sfx.send(PlaySfxEvent {
        sfx_id: "click".into(),
    });
    saves.send(SaveRequestEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_is_swizzled() {
        let payload = rgba_from_capture(TextureFormat::Bgra8UnormSrgb, 1, 1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(payload.rgba, vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_short_capture_rejected() {
        assert!(rgba_from_capture(TextureFormat::Rgba8Unorm, 2, 2, &[0; 15]).is_err());
    }
}

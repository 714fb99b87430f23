use std::path::Path;

use tracing::{debug, error};

use crate::images::{load_color_image, ImageState};
use crate::render::paint::paint_placeholder;
use crate::ui::ui_types::{ImageMessage, ImageTarget, ImageView};
use crate::variant::Resolution;

/// Aspect used for placeholders when there is no image to size from.
const PLACEHOLDER_SIZE: [usize; 2] = [4, 3];

pub fn image_location(resolution: &Resolution, image_dir: &Path) -> Option<String> {
    resolution.variant().map(|v| v.image.locate(image_dir))
}

/// Starts loading `location` on a worker thread unless it is already shown or
/// on its way.
pub fn request_image(
    view: &mut ImageView,
    target: ImageTarget,
    location: Option<String>,
    sender: egui_inbox::UiInboxSender<ImageMessage>,
) {
    let Some(location) = location else {
        view.image = ImageState::Empty;
        return;
    };
    if view.image.location() == Some(location.as_str()) {
        return;
    }

    debug!("loading {:?} image {}", target, location);
    view.image = ImageState::Loading {
        location: location.clone(),
    };

    std::thread::spawn(move || {
        let result = load_color_image(&location);
        if sender
            .send(ImageMessage {
                target,
                location,
                result,
            })
            .is_err()
        {
            error!("image inbox closed");
        }
    });
}

/// Lays the image out at the full available width. The returned flag is
/// false when the image is missing, so callers skip pointer handling.
pub fn show_image(
    ui: &mut egui::Ui,
    view: &mut ImageView,
    sense: egui::Sense,
) -> (egui::Rect, egui::Response, bool) {
    let image_size = match &view.image {
        ImageState::Loaded { size, .. } => *size,
        _ => PLACEHOLDER_SIZE,
    };
    view.surface.set_image_size(image_size);
    if view
        .surface
        .resize(ui.available_width(), ui.ctx().pixels_per_point())
    {
        ui.ctx().request_repaint();
    }

    let (rect, resp) = ui.allocate_exact_size(view.surface.layout_size(), sense);

    let interactive = match &view.image {
        ImageState::Loaded { texture, .. } => {
            egui::Image::from_texture((texture.id(), rect.size())).paint_at(ui, rect);
            true
        }
        ImageState::Loading { .. } => {
            paint_placeholder(ui.painter(), rect, "Loading image...");
            false
        }
        ImageState::Failed { reason, .. } => {
            paint_placeholder(ui.painter(), rect, &format!("Image unavailable: {}", reason));
            false
        }
        ImageState::Empty => {
            paint_placeholder(ui.painter(), rect, "No image");
            false
        }
    };

    (rect, resp, interactive)
}

use tracing::{debug, trace};

use super::{Point, Shape};

/// Smallest and largest UI-scale factor applied to labels and badges.
pub const MIN_UI_SCALE: f32 = 0.6;
pub const MAX_UI_SCALE: f32 = 1.0;

/// The rendering surface the reference image is drawn on.
///
/// Layout space is the logical (point) size pointer events arrive in. The
/// device buffer is the physical pixel grid; a single uniform scale,
/// `pixels_per_point`, maps one to the other and is re-derived on every resize.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    layout: egui::Vec2,
    pixels_per_point: f32,
    /// image height / image width
    aspect: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            layout: egui::Vec2::ZERO,
            pixels_per_point: 1.0,
            aspect: 1.0,
        }
    }
}

impl Surface {
    pub fn new(image_size: [usize; 2]) -> Self {
        let mut out = Self::default();
        out.set_image_size(image_size);
        out
    }

    /// Fixed layout size, for hosts that do not derive it from a container.
    pub fn with_layout(width: f32, height: f32, pixels_per_point: f32) -> Self {
        Self {
            layout: egui::vec2(width, height),
            pixels_per_point,
            aspect: if width > 0.0 { height / width } else { 1.0 },
        }
    }

    pub fn set_image_size(&mut self, image_size: [usize; 2]) {
        let [w, h] = image_size;
        let aspect = if w == 0 || h == 0 {
            1.0
        } else {
            h as f32 / w as f32
        };
        if aspect != self.aspect {
            self.aspect = aspect;
            self.layout.y = (self.layout.x * aspect).floor();
        }
    }

    /// Recomputes layout size from the container width and the image aspect
    /// ratio, then the device scale. Returns true when anything changed, in
    /// which case the caller must redraw.
    pub fn resize(&mut self, container_width: f32, pixels_per_point: f32) -> bool {
        let width = container_width.max(0.0).floor();
        let layout = egui::vec2(width, (width * self.aspect).floor());
        let ppp = if pixels_per_point > 0.0 {
            pixels_per_point
        } else {
            1.0
        };

        if layout == self.layout && ppp == self.pixels_per_point {
            return false;
        }

        debug!(
            "surface resized: layout {:.0}x{:.0} @ {:.2}x (was {:.0}x{:.0} @ {:.2}x)",
            layout.x, layout.y, ppp, self.layout.x, self.layout.y, self.pixels_per_point
        );

        self.layout = layout;
        self.pixels_per_point = ppp;
        true
    }

    pub fn layout_size(&self) -> egui::Vec2 {
        self.layout
    }

    pub fn layout_width(&self) -> f32 {
        self.layout.x
    }

    pub fn layout_height(&self) -> f32 {
        self.layout.y
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    /// Physical pixel buffer size.
    pub fn buffer_size(&self) -> [u32; 2] {
        [
            (self.layout.x * self.pixels_per_point).round() as u32,
            (self.layout.y * self.pixels_per_point).round() as u32,
        ]
    }

    pub fn to_device(&self, pos: egui::Pos2) -> egui::Pos2 {
        (pos.to_vec2() * self.pixels_per_point).to_pos2()
    }

    pub fn from_device(&self, pos: egui::Pos2) -> egui::Pos2 {
        (pos.to_vec2() / self.pixels_per_point).to_pos2()
    }

    /// Aligns a layout rect to the device pixel grid so 1px strokes stay crisp.
    pub fn snap_rect(&self, rect: egui::Rect) -> egui::Rect {
        let snap = |p: egui::Pos2| {
            let d = self.to_device(p);
            self.from_device(egui::pos2(d.x.round(), d.y.round()))
        };
        egui::Rect::from_min_max(snap(rect.min), snap(rect.max))
    }

    pub fn to_layout(&self, shape: &Shape) -> egui::Rect {
        super::to_layout(shape, self.layout.x, self.layout.y)
    }

    /// Pointer position (relative to the surface origin) to percentage space,
    /// clamped to the image.
    pub fn to_percentage(&self, pos: egui::Pos2) -> Point {
        let p = super::to_percentage(pos, self.layout.x, self.layout.y).clamped();
        trace!("pointer ({:.1}, {:.1}) -> ({:.2}%, {:.2}%)", pos.x, pos.y, p.x, p.y);
        p
    }

    /// Responsive scale for text and badges: proportional to the layout width
    /// against `reference_width`, bounded so small surfaces stay legible.
    pub fn ui_scale(&self, reference_width: f32) -> f32 {
        if reference_width <= 0.0 {
            return MAX_UI_SCALE;
        }
        (self.layout.x / reference_width).clamp(MIN_UI_SCALE, MAX_UI_SCALE)
    }

    pub fn is_empty(&self) -> bool {
        self.layout.x <= 0.0 || self.layout.y <= 0.0
    }
}

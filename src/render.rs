//! Visual styles and label placement for the area overlays.
//!
//! Everything here works in layout space relative to the surface origin and is
//! free of egui state; [`paint`] turns it into painter calls.

pub mod paint;

use egui::{Color32, Rect, Stroke, Vec2};

use crate::model::{format_price, Group};

pub const BASE_FONT_SIZE: f32 = 14.0;
pub const BADGE_RADIUS: f32 = 9.0;
const LABEL_PADDING: f32 = 5.0;
const LABEL_GAP: f32 = 4.0;

/// How a rectangle is drawn, keyed by computed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaStyle {
    /// Selector: not selected, not under the pointer.
    Idle,
    Hovered,
    Selected,
    /// Editor: part of a committed group.
    Committed,
    /// Editor: part of the group being authored.
    Draft,
    /// Editor: rectangle being drawn or moved.
    Active,
}

impl AreaStyle {
    pub fn stroke(self) -> Stroke {
        match self {
            AreaStyle::Idle => Stroke::new(1.5, Color32::from_rgb(50, 158, 244)),
            AreaStyle::Hovered => Stroke::new(2.0, Color32::from_rgb(251, 149, 20)),
            AreaStyle::Selected => Stroke::new(2.5, Color32::from_rgb(46, 160, 67)),
            AreaStyle::Committed => Stroke::new(1.5, Color32::from_rgb(50, 158, 244)),
            AreaStyle::Draft => Stroke::new(2.0, Color32::from_rgb(255, 220, 0)),
            AreaStyle::Active => Stroke::new(2.0, Color32::from_rgb(255, 100, 100)),
        }
    }

    pub fn fill(self) -> Color32 {
        match self {
            AreaStyle::Idle => Color32::from_rgba_unmultiplied(50, 158, 244, 30),
            AreaStyle::Hovered => Color32::from_rgba_unmultiplied(251, 149, 20, 60),
            AreaStyle::Selected => Color32::from_rgba_unmultiplied(46, 160, 67, 90),
            AreaStyle::Committed => Color32::from_rgba_unmultiplied(50, 158, 244, 45),
            AreaStyle::Draft => Color32::from_rgba_unmultiplied(255, 220, 0, 50),
            AreaStyle::Active => Color32::from_rgba_unmultiplied(255, 100, 100, 50),
        }
    }

    /// Unselected selector areas carry a numbered badge.
    pub fn shows_badge(self) -> bool {
        matches!(self, AreaStyle::Idle | AreaStyle::Hovered | AreaStyle::Committed)
    }
}

pub fn label_font_size(ui_scale: f32) -> f32 {
    BASE_FONT_SIZE * ui_scale
}

pub fn label_text(group: &Group) -> String {
    format!("{} - {}", group.name, format_price(group.price))
}

/// Widest a label's text may be laid out on a surface `surface_width` wide.
pub fn label_wrap_width(surface_width: f32, ui_scale: f32) -> f32 {
    (surface_width - 2.0 * LABEL_PADDING * ui_scale).max(0.0)
}

/// Box for a label of `text_size` next to `anchor`: above it when there is
/// room, otherwise below, and always inside `surface`. Text larger than the
/// surface gets a box the size of the surface.
pub fn label_layout(anchor: Rect, text_size: Vec2, surface: Vec2, ui_scale: f32) -> Rect {
    let padding = LABEL_PADDING * ui_scale;
    let gap = LABEL_GAP * ui_scale;
    let size = (text_size + Vec2::splat(2.0 * padding)).min(surface.max(Vec2::ZERO));

    let mut y = anchor.min.y - gap - size.y;
    if y < 0.0 {
        y = anchor.max.y + gap;
    }
    let x = anchor.min.x;

    let x = x.clamp(0.0, (surface.x - size.x).max(0.0));
    let y = y.clamp(0.0, (surface.y - size.y).max(0.0));

    Rect::from_min_size(egui::pos2(x, y), size)
}

/// Inset padding between label box and text.
pub fn label_padding(ui_scale: f32) -> f32 {
    LABEL_PADDING * ui_scale
}

/// Centre and radius of the ordinal badge in the top-left corner of `anchor`.
pub fn badge_layout(anchor: Rect, surface: Vec2, ui_scale: f32) -> (egui::Pos2, f32) {
    let radius = BADGE_RADIUS * ui_scale;
    let inset = radius + 2.0 * ui_scale;
    let center = anchor.min + Vec2::splat(inset);

    let clamp = |v: f32, max: f32| v.clamp(radius, (max - radius).max(radius));
    (egui::pos2(clamp(center.x, surface.x), clamp(center.y, surface.y)), radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(egui::pos2(x, y), egui::vec2(w, h))
    }

    #[test]
    fn styles_are_distinct() {
        let all = [AreaStyle::Idle, AreaStyle::Hovered, AreaStyle::Selected];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!((a.stroke(), a.fill()), (b.stroke(), b.fill()));
            }
        }
        assert!(!AreaStyle::Selected.shows_badge());
        assert!(AreaStyle::Idle.shows_badge());
    }

    #[test]
    fn label_goes_above_when_it_fits() {
        let r = label_layout(rect(100., 100., 50., 50.), egui::vec2(60., 10.), egui::vec2(400., 400.), 1.0);
        assert_eq!(r.size(), egui::vec2(70., 20.));
        assert_eq!(r.min, egui::pos2(100., 76.));
    }

    #[test]
    fn label_flips_below_at_top_edge() {
        let r = label_layout(rect(10., 5., 50., 50.), egui::vec2(60., 10.), egui::vec2(400., 400.), 1.0);
        assert_eq!(r.min.y, 59.);
    }

    #[test]
    fn label_never_overflows() {
        let surface = egui::vec2(200., 100.);
        for anchor in [
            rect(190., 0., 10., 100.),
            rect(0., 90., 200., 10.),
            rect(150., 40., 50., 20.),
        ] {
            for text in [egui::vec2(120., 14.), egui::vec2(350., 14.)] {
                let r = label_layout(anchor, text, surface, 0.6);
                assert!(r.min.x >= 0.0 && r.min.y >= 0.0);
                assert!(r.max.x <= surface.x + 1e-4);
                assert!(r.max.y <= surface.y + 1e-4);
            }
        }
    }

    #[test]
    fn long_label_is_wrapped_to_surface() {
        let surface = egui::vec2(150., 200.);
        assert!((label_wrap_width(surface.x, 0.6) - 144.).abs() < 1e-3);
        assert_eq!(label_wrap_width(4.0, 1.0), 0.0);

        let r = label_layout(rect(10., 50., 20., 20.), egui::vec2(210., 10.), surface, 0.6);
        assert_eq!(r.min.x, 0.0);
        assert!(r.max.x <= surface.x);
    }

    #[test]
    fn font_scales_with_surface() {
        assert_eq!(label_font_size(1.0), BASE_FONT_SIZE);
        assert!(label_font_size(0.6) < label_font_size(0.8));
    }

    #[test]
    fn badge_stays_on_surface() {
        let (c, r) = badge_layout(rect(195., 195., 5., 5.), egui::vec2(200., 200.), 1.0);
        assert!(c.x + r <= 200.0 && c.y + r <= 200.0);
        let (c, _) = badge_layout(rect(20., 30., 50., 50.), egui::vec2(200., 200.), 1.0);
        assert_eq!(c, egui::pos2(31., 41.));
    }
}

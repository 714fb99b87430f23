use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, StrokeKind};

use super::{badge_layout, BASE_FONT_SIZE, label_font_size, label_layout, label_padding, label_text, label_wrap_width, AreaStyle};
use crate::editor::AreaEditor;
use crate::geometry::{projection::Surface, Shape};
use crate::model::Group;
use crate::selector::AreaSelector;

/// Shape in screen coordinates, snapped to device pixels.
fn screen_rect(surface: &Surface, origin: Pos2, shape: &Shape) -> Rect {
    surface.snap_rect(surface.to_layout(shape).translate(origin.to_vec2()))
}

fn paint_shape(painter: &Painter, rect: Rect, style: AreaStyle) {
    painter.rect_filled(rect, 0.0, style.fill());
    painter.rect_stroke(rect, 0.0, style.stroke(), StrokeKind::Inside);
}

fn paint_group(painter: &Painter, surface: &Surface, origin: Pos2, group: &Group, style: AreaStyle) {
    for shape in group.valid_shapes() {
        paint_shape(painter, screen_rect(surface, origin, shape), style);
    }
}

fn paint_badge(
    painter: &Painter,
    surface: &Surface,
    origin: Pos2,
    anchor: &Shape,
    ordinal: usize,
    ui_scale: f32,
) {
    let (center, radius) = badge_layout(surface.to_layout(anchor), surface.layout_size(), ui_scale);
    let center = center + origin.to_vec2();

    painter.circle_filled(center, radius, Color32::from_black_alpha(190));
    painter.text(
        center,
        Align2::CENTER_CENTER,
        ordinal.to_string(),
        FontId::proportional(label_font_size(ui_scale) * 0.85),
        Color32::WHITE,
    );
}

fn paint_label(
    painter: &Painter,
    surface: &Surface,
    origin: Pos2,
    anchor: &Shape,
    text: String,
    ui_scale: f32,
) {
    let galley = painter.layout(
        text,
        FontId::proportional(label_font_size(ui_scale)),
        Color32::WHITE,
        label_wrap_width(surface.layout_size().x, ui_scale),
    );
    let rect = label_layout(
        surface.to_layout(anchor),
        galley.size(),
        surface.layout_size(),
        ui_scale,
    )
    .translate(origin.to_vec2());

    painter.rect_filled(rect, 4.0 * ui_scale, Color32::from_black_alpha(200));
    let pad = label_padding(ui_scale);
    painter.galley(rect.min + egui::vec2(pad, pad), galley, Color32::WHITE);
}

/// Grey box standing in for an image that could not be loaded.
pub fn paint_placeholder(painter: &Painter, rect: Rect, message: &str) {
    painter.rect_filled(rect, 0.0, Color32::from_gray(120));
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        message,
        FontId::proportional(BASE_FONT_SIZE),
        Color32::from_gray(230),
    );
}

/// Committed groups with names, then the draft, then whatever is being drawn.
pub fn paint_editor(painter: &Painter, origin: Pos2, surface: &Surface, editor: &AreaEditor, ui_scale: f32) {
    for (i, group) in editor.groups().iter().enumerate() {
        paint_group(painter, surface, origin, group, AreaStyle::Committed);
        if let Some(anchor) = group.first_shape() {
            paint_badge(painter, surface, origin, anchor, i + 1, ui_scale);
        }
    }
    for group in editor.groups() {
        if let Some(anchor) = group.first_shape() {
            paint_label(painter, surface, origin, anchor, label_text(group), ui_scale);
        }
    }

    let moving = editor.moving_index();
    for (i, shape) in editor.draft().shapes().iter().enumerate() {
        if !shape.is_valid() {
            continue;
        }
        let style = if moving == Some(i) {
            AreaStyle::Active
        } else {
            AreaStyle::Draft
        };
        paint_shape(painter, screen_rect(surface, origin, shape), style);
    }

    if let Some(shape) = editor.in_progress_shape() {
        if shape.width > 0.0 && shape.height > 0.0 {
            paint_shape(painter, screen_rect(surface, origin, &shape), AreaStyle::Active);
        }
    }
}

/// Groups in their visual state, badges on unselected ones, and the label of
/// the hovered group on top.
pub fn paint_selector(painter: &Painter, origin: Pos2, surface: &Surface, selector: &AreaSelector, ui_scale: f32) {
    for (i, group) in selector.groups().iter().enumerate() {
        let style = selector.visual_state(i);
        paint_group(painter, surface, origin, group, style);
        if style.shows_badge() {
            if let Some(anchor) = group.first_shape() {
                paint_badge(painter, surface, origin, anchor, i + 1, ui_scale);
            }
        }
    }

    if let Some((_, group)) = selector.hovered() {
        if let Some(anchor) = group.first_shape() {
            paint_label(painter, surface, origin, anchor, label_text(group), ui_scale);
        }
    }
}

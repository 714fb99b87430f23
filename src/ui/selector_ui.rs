use std::time::Instant;

use egui::{Button, RichText};

use crate::model::format_price;
use crate::render::paint::paint_selector;
use crate::ui::{
    canvas,
    ui_types::{App, ImageTarget},
    utils,
};
use crate::variant::Resolution;

impl App {
    pub fn selector_tab(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("selector_panel")
            .resizable(false)
            .default_width(300.)
            .show(ctx, |ui| {
                utils::errors_panel(ui, &mut self.errors);

                self.subject_controls(ui, ImageTarget::Selector);
                ui.separator();

                self.selector_list(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.selector_canvas(ui);
            });
        });
    }

    /// Numbered companion list, matching the badges on the image.
    fn selector_list(&mut self, ui: &mut egui::Ui) {
        let Some(selector) = self.selector.as_mut() else {
            return;
        };

        ui.heading("Areas");
        if !selector.is_ready() {
            ui.label("Choose a gender to see the areas.");
            return;
        }
        if selector.groups().is_empty() {
            ui.label("No areas configured for this subject");
            return;
        }

        let mut toggled = None;
        egui::ScrollArea::vertical()
            .id_salt("selector_entries")
            .max_height(400.)
            .show(ui, |ui| {
                for entry in selector.entries() {
                    let mut checked = entry.selected;
                    let text = format!(
                        "{}. {}  {}",
                        entry.ordinal,
                        entry.group.name,
                        format_price(entry.group.price)
                    );
                    if ui.checkbox(&mut checked, text).changed() {
                        toggled = Some(entry.group.id);
                    }
                }
            });
        if let Some(id) = toggled {
            selector.toggle(id);
        }

        ui.separator();

        let count = self
            .last_selection
            .as_ref()
            .map_or(0, |s| s.groups.len());
        ui.label(format!("{} area{} selected", count, if count == 1 { "" } else { "s" }));

        ui.horizontal(|ui| {
            ui.label(
                RichText::new(format!("Total: {}", format_price(selector.total_price())))
                    .size(18.)
                    .strong(),
            );
            if ui
                .add_enabled(!selector.selected_groups().is_empty(), Button::new("Clear"))
                .clicked()
            {
                selector.clear_selection();
            }
        });
    }

    fn selector_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(selector) = self.selector.as_mut() else {
            ui.label("No subject configured");
            return;
        };
        if matches!(selector.resolution(), Resolution::NeedsGender) {
            ui.label("Choose a gender to see the areas.");
            return;
        }

        let (rect, resp, interactive) =
            canvas::show_image(ui, &mut self.selector_view, egui::Sense::click());
        let now = Instant::now();

        if interactive {
            let surface = &self.selector_view.surface;
            let origin = rect.min;
            let local = |p: egui::Pos2| (p - origin).to_pos2();

            let touch = ui.input(|i| {
                i.any_touches() || i.events.iter().any(|e| matches!(e, egui::Event::Touch { .. }))
            });

            match resp.hover_pos() {
                Some(p) if !touch => selector.pointer_move(local(p), surface),
                None => selector.pointer_leave(),
                _ => {}
            }

            if resp.clicked() {
                if let Some(p) = resp.interact_pointer_pos() {
                    if touch {
                        selector.touch_start(local(p), surface, now);
                    } else {
                        selector.pointer_click(local(p), surface);
                    }
                }
            }

            let ui_scale = surface.ui_scale(self.settings.reference_width);
            paint_selector(&ui.painter_at(rect), origin, surface, selector, ui_scale);
        }

        selector.tick(now);
        if let Some(remaining) = selector.touch_label_remaining(now) {
            ui.ctx().request_repaint_after(remaining);
        }
    }
}

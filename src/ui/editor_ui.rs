use tracing::{debug, error};

use egui::{Button, Color32, RichText};
use egui_extras::{Column, TableBuilder};

use crate::geometry::hit_test_shapes;
use crate::model::format_price;
use crate::render::paint::paint_editor;
use crate::ui::{
    canvas,
    ui_types::{App, ImageTarget, SaveOutcome},
    utils,
};
use crate::variant::Resolution;

impl App {
    pub fn editor_tab(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("editor_panel")
            .resizable(false)
            .default_width(340.)
            .show(ctx, |ui| {
                utils::errors_panel(ui, &mut self.errors);

                self.subject_controls(ui, ImageTarget::Editor);
                ui.separator();

                self.editor_form(ui);
                ui.separator();

                self.editor_groups(ui);
                ui.separator();

                self.editor_save_controls(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.editor_canvas(ui);
            });
        });
    }

    fn editor_canvas(&mut self, ui: &mut egui::Ui) {
        let Some(editor) = self.editor.as_mut() else {
            ui.label("No subject configured");
            return;
        };
        if matches!(editor.resolution(), Resolution::NeedsGender) {
            ui.label("Choose a gender to start drawing.");
            return;
        }

        let (rect, resp, interactive) =
            canvas::show_image(ui, &mut self.editor_view, egui::Sense::click_and_drag());
        if !interactive {
            return;
        }

        let surface = &self.editor_view.surface;
        let origin = rect.min;
        let local = |p: egui::Pos2| (p - origin).to_pos2();

        if resp.drag_started() {
            if let Some(p) = ui.input(|i| i.pointer.press_origin()) {
                editor.pointer_down(local(p), surface);
            }
        }
        if resp.dragged() {
            if let Some(p) = resp.interact_pointer_pos() {
                editor.pointer_moved(local(p), surface);
            }
        }
        if resp.drag_stopped() {
            editor.pointer_up();
        }

        // pointer left the image mid-drag
        if !editor.interaction().is_idle() {
            let outside = ui
                .input(|i| i.pointer.latest_pos())
                .map_or(true, |p| !rect.contains(p));
            if outside || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                editor.cancel_interaction();
            }
        }

        // right click removes a draft area
        if resp.secondary_clicked() {
            if let Some(p) = resp.interact_pointer_pos() {
                let pct = surface.to_percentage(local(p));
                if let Some(index) = hit_test_shapes(pct, editor.draft().shapes()) {
                    debug!("removing draft shape {}", index);
                    editor.remove_draft_shape(index);
                }
            }
        }

        let ui_scale = surface.ui_scale(self.settings.reference_width);
        paint_editor(&ui.painter_at(rect), origin, surface, editor, ui_scale);
    }

    fn editor_form(&mut self, ui: &mut egui::Ui) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let editing = editor.draft().editing();

        if editing.is_some() {
            ui.heading("Edit group");
        } else {
            ui.heading("New group");
            ui.horizontal(|ui| {
                let count = editor.draft().shapes().len();
                ui.label(format!("{} area{} drawn", count, if count == 1 { "" } else { "s" }));
                if ui.add_enabled(count > 0, Button::new("Undo")).clicked() {
                    editor.undo_draft_shape();
                }
                if ui
                    .add_enabled(!editor.draft().is_empty(), Button::new("Discard"))
                    .clicked()
                {
                    editor.discard_draft();
                }
            });
        }

        egui::Grid::new("group_form").num_columns(2).show(ui, |ui| {
            ui.label("Name:");
            ui.text_edit_singleline(&mut editor.form_mut().name);
            ui.end_row();

            ui.label("Price:");
            ui.text_edit_singleline(&mut editor.form_mut().price);
            ui.end_row();
        });

        ui.horizontal(|ui| {
            let label = if editing.is_some() {
                "Update group"
            } else {
                "Add group"
            };
            if ui.button(label).clicked() {
                if let Err(e) = editor.commit_form() {
                    self.errors.push(e.to_string());
                }
            }
            if editing.is_some() && ui.button("Cancel").clicked() {
                editor.cancel_edit();
            }
        });
    }

    fn editor_groups(&mut self, ui: &mut egui::Ui) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };

        ui.heading("Groups");
        if editor.groups().is_empty() {
            ui.label("No groups yet");
            return;
        }

        let mut edit = None;
        let mut delete = None;

        TableBuilder::new(ui)
            .id_salt("editor_groups")
            .striped(true)
            .max_scroll_height(260.)
            .column(Column::exact(24.))
            .column(Column::remainder().at_least(80.))
            .column(Column::auto())
            .column(Column::auto())
            .column(Column::auto())
            .header(20., |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                header.col(|ui| {
                    ui.strong("Name");
                });
                header.col(|ui| {
                    ui.strong("Price");
                });
                header.col(|ui| {
                    ui.strong("Areas");
                });
                header.col(|_| {});
            })
            .body(|mut body| {
                for (i, group) in editor.groups().iter().enumerate() {
                    body.row(22., |mut row| {
                        row.col(|ui| {
                            ui.label((i + 1).to_string());
                        });
                        row.col(|ui| {
                            ui.label(&group.name);
                        });
                        row.col(|ui| {
                            ui.label(format_price(group.price));
                        });
                        row.col(|ui| {
                            ui.label(group.shapes.len().to_string());
                        });
                        row.col(|ui| {
                            if ui.small_button("Edit").clicked() {
                                edit = Some(group.id);
                            }
                            if ui.small_button("Delete").clicked() {
                                delete = Some(group.id);
                            }
                        });
                    });
                }
            });

        if let Some(id) = edit {
            if let Err(e) = editor.edit_group(id) {
                self.errors.push(e.to_string());
            }
        }
        if let Some(id) = delete {
            if let Err(e) = editor.delete_group(id) {
                self.errors.push(e.to_string());
            }
        }
    }

    fn editor_save_controls(&mut self, ui: &mut egui::Ui) {
        let Some(editor) = self.editor.as_ref() else {
            return;
        };
        let saving = editor.is_saving();
        let dirty = editor.is_dirty();

        let mut save = false;
        let mut reload = false;
        ui.horizontal(|ui| {
            let button = Button::new(RichText::new(if saving { "Saving..." } else { "Save" }).size(16.));
            let button = if dirty {
                button.fill(Color32::from_rgb(50, 158, 244))
            } else {
                button
            };
            save = ui.add_enabled(!saving, button).clicked();
            reload = ui.add_enabled(!saving, Button::new("Reload")).clicked();

            if saving {
                ui.spinner();
            } else if dirty {
                ui.label("Unsaved changes");
            }
        });

        if save {
            self.start_save();
        }
        if reload {
            self.reload();
        }
    }

    /// Runs the store round trip on a worker thread, the result comes back
    /// through `save_inbox`.
    fn start_save(&mut self) {
        let (Some(store), Some(editor)) = (self.store.clone(), self.editor.as_mut()) else {
            return;
        };

        let request = match editor.begin_save() {
            Ok(request) => request,
            Err(e) => {
                self.errors.push(e.to_string());
                return;
            }
        };

        let sender = self.save_inbox.sender();
        std::thread::spawn(move || {
            let result = store.replace_groups(&request.subject, request.gender, &request.groups);
            if sender.send(SaveOutcome { request, result }).is_err() {
                error!("save inbox closed");
            }
        });
    }
}

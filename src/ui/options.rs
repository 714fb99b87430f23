use tracing::{error, info};

use crate::appconfig::CONFIG_FILE;
use crate::images::ImageState;
use crate::model::SubjectCategory;
use crate::store::StoreKind;
use crate::ui::{ui_types::App, utils};

impl App {
    pub fn options(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self._options(ui);
            });
        });
    }

    fn _options(&mut self, ui: &mut egui::Ui) {
        utils::errors_panel(ui, &mut self.errors);

        egui::widgets::global_theme_preference_buttons(ui);

        ui.separator();
        self.store_options(ui);

        ui.separator();
        self.area_options(ui);

        ui.separator();
        self.subject_list(ui);

        ui.separator();
        if ui.button("Save settings").clicked() {
            match self.settings.save_to_file(CONFIG_FILE) {
                Ok(()) => info!("settings written to {}", CONFIG_FILE),
                Err(e) => {
                    error!("Failed to save settings: {:#}", e);
                    self.errors.push(format!("Failed to save settings: {:#}", e));
                }
            }
        }
    }

    fn store_options(&mut self, ui: &mut egui::Ui) {
        ui.heading("Record store");

        let store = &mut self.settings.store;
        egui::Grid::new("store_options").num_columns(2).show(ui, |ui| {
            ui.label("Backend:");
            egui::ComboBox::from_id_salt("store_kind")
                .selected_text(format!("{:?}", store.kind))
                .show_ui(ui, |ui| {
                    for kind in [StoreKind::Memory, StoreKind::File, StoreKind::Rest] {
                        ui.selectable_value(&mut store.kind, kind, format!("{:?}", kind));
                    }
                });
            ui.end_row();

            match store.kind {
                StoreKind::Memory => {}
                StoreKind::File => {
                    ui.label("File:");
                    ui.text_edit_singleline(&mut store.path);
                    ui.end_row();
                }
                StoreKind::Rest => {
                    ui.label("URL:");
                    ui.text_edit_singleline(&mut store.url);
                    ui.end_row();

                    ui.label("API key:");
                    ui.add(egui::TextEdit::singleline(&mut store.api_key).password(true));
                    ui.end_row();

                    ui.label("Table:");
                    ui.text_edit_singleline(&mut store.table);
                    ui.end_row();
                }
            }
        });

        if ui.button("Connect").clicked() {
            self.connect_store();
            let subject = self.subject.clone();
            self.open_subject(subject);
        }
    }

    fn area_options(&mut self, ui: &mut egui::Ui) {
        ui.heading("Areas");

        egui::Grid::new("area_options").num_columns(2).show(ui, |ui| {
            ui.label("Image folder:");
            let mut dir = self.settings.image_dir.to_string_lossy().into_owned();
            if ui.text_edit_singleline(&mut dir).changed() {
                self.settings.image_dir = dir.into();
            }
            ui.end_row();

            ui.label("Minimum area size (%):");
            let resp = ui.add(
                egui::DragValue::new(&mut self.settings.min_shape_size)
                    .range(0.1..=20.0)
                    .speed(0.1),
            );
            utils::make_scrollable(ui, resp, &mut self.settings.min_shape_size, 0.5, 0.1);
            ui.end_row();

            ui.label("Touch label (s):");
            let resp = ui.add(
                egui::DragValue::new(&mut self.settings.touch_label_secs)
                    .range(0.5..=10.0)
                    .speed(0.1),
            );
            utils::make_scrollable(ui, resp, &mut self.settings.touch_label_secs, 0.5, 0.5);
            ui.end_row();

            ui.label("Label reference width:");
            let resp = ui.add(
                egui::DragValue::new(&mut self.settings.reference_width)
                    .range(200.0..=2000.0)
                    .speed(10.0),
            );
            utils::make_scrollable(ui, resp, &mut self.settings.reference_width, 50.0, 200.0);
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.editor_view.image = ImageState::Empty;
                self.selector_view.image = ImageState::Empty;
                let subject = self.subject.clone();
                self.open_subject(subject);
            }
            ui.label("Reopens the current subject, unsaved groups are lost.");
        });
    }

    fn subject_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Subjects");
        ui.label(format!("Edit the [[subjects]] tables in {} to change these.", CONFIG_FILE));

        egui::Grid::new("subjects").striped(true).num_columns(3).show(ui, |ui| {
            for subject in &self.settings.subjects {
                ui.label(&subject.name);
                ui.label(subject.key.to_string());
                let category = match &subject.category {
                    SubjectCategory::Explicit { region, gender } => {
                        format!("{} ({})", region.as_str(), gender.as_str())
                    }
                    SubjectCategory::Gendered { region } => {
                        format!("{} (choose gender)", region.as_str())
                    }
                    SubjectCategory::Custom { male, female } => format!(
                        "custom ({} image{})",
                        male.iter().chain(female.iter()).count(),
                        if male.is_some() && female.is_some() { "s" } else { "" }
                    ),
                };
                ui.label(category);
                ui.end_row();
            }
        });
    }
}

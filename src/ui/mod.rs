pub mod canvas;
pub mod editor_ui;
pub mod options;
pub mod selector_ui;
pub mod ui_types;
pub mod utils;

use std::sync::Arc;

use ui_types::*;

use tracing::{debug, error, info, warn};

use crate::appconfig::{AppSettings, CONFIG_FILE};
use crate::editor::{AreaEditor, EditorError};
use crate::images::ImageState;
use crate::model::{Gender, SubjectKey};
use crate::selector::AreaSelector;
use crate::store::{open_store, MemoryStore};

/// New
impl App {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut out: Self = if let Some(storage) = cc.storage {
            eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default()
        } else {
            Default::default()
        };

        out.settings = AppSettings::load_or_default(CONFIG_FILE);
        out.connect_store();

        let subject = out.subject.clone();
        out.open_subject(subject);

        out
    }

    pub fn connect_store(&mut self) {
        match open_store(&self.settings.store) {
            Ok(store) => self.store = Some(store),
            Err(e) => {
                error!("Failed to open record store: {:#}", e);
                self.errors
                    .push(format!("Failed to open record store, using memory: {:#}", e));
                self.store = Some(Arc::new(MemoryStore::default()));
            }
        }
    }
}

/// Subject and variant switching
impl App {
    /// Rebuilds both components for `key`, or the first configured subject.
    pub fn open_subject(&mut self, key: Option<SubjectKey>) {
        let config = key
            .as_ref()
            .and_then(|k| self.settings.subject(k))
            .or_else(|| self.settings.subjects.first())
            .cloned();

        let Some(config) = config else {
            warn!("no subjects configured");
            self.subject = None;
            self.editor = None;
            self.selector = None;
            self.refresh_images();
            return;
        };

        if self.editor.as_ref().is_some_and(|e| e.is_dirty()) {
            warn!("discarding unsaved groups while opening {}", config.key);
            self.errors
                .push(format!("Unsaved groups were discarded when {} was opened", config.name));
        }
        debug!("opening subject {} ({})", config.key, config.name);
        self.subject = Some(config.key.clone());

        self.editor = Some(
            AreaEditor::new(config.clone(), self.gender)
                .with_min_shape_size(self.settings.min_shape_size),
        );

        let (tx, rx) = crossbeam_channel::unbounded();
        self.selector = Some(
            AreaSelector::new(config, self.gender)
                .with_events(tx)
                .with_touch_label_duration(self.settings.touch_label_duration()),
        );
        self.selection_rx = Some(rx);
        self.last_selection = None;

        self.reload();
    }

    /// Loads both datasets and points the canvases at the right images.
    pub fn reload(&mut self) {
        if let Some(store) = self.store.clone() {
            if let Some(editor) = self.editor.as_mut() {
                match editor.load(store.as_ref()) {
                    Ok(()) | Err(EditorError::GenderRequired) => {}
                    Err(e) => {
                        error!("Failed to load areas: {}", e);
                        self.errors.push(format!("Failed to load areas: {}", e));
                    }
                }
            }
            if let Some(selector) = self.selector.as_mut() {
                if let Err(e) = selector.load(store.as_ref()) {
                    error!("Failed to load areas: {}", e);
                    self.errors.push(format!("Failed to load areas: {}", e));
                }
            }
        }
        self.refresh_images();
    }

    pub fn refresh_images(&mut self) {
        let dir = self.settings.image_dir.clone();

        match &self.editor {
            Some(editor) => canvas::request_image(
                &mut self.editor_view,
                ImageTarget::Editor,
                canvas::image_location(editor.resolution(), &dir),
                self.image_inbox.sender(),
            ),
            None => self.editor_view.image = ImageState::Empty,
        }

        match &self.selector {
            Some(selector) => canvas::request_image(
                &mut self.selector_view,
                ImageTarget::Selector,
                canvas::image_location(selector.resolution(), &dir),
                self.image_inbox.sender(),
            ),
            None => self.selector_view.image = ImageState::Empty,
        }
    }

    pub fn set_gender(&mut self, target: ImageTarget, gender: Gender) {
        let Some(store) = self.store.clone() else {
            return;
        };

        let result = match target {
            ImageTarget::Editor => self
                .editor
                .as_mut()
                .map(|e| e.set_gender(gender, store.as_ref()).map_err(|e| e.to_string())),
            ImageTarget::Selector => self
                .selector
                .as_mut()
                .map(|s| s.set_gender(gender, store.as_ref()).map_err(|e| e.to_string())),
        };

        match result {
            Some(Ok(())) => {
                self.gender = Some(gender);
                self.refresh_images();
            }
            Some(Err(e)) => {
                error!("Failed to switch to {:?}: {}", gender, e);
                self.errors.push(format!("Failed to switch gender: {}", e));
            }
            None => {}
        }
    }

    /// Subject combo box, plus the gender toggle when the subject needs one.
    fn subject_controls(&mut self, ui: &mut egui::Ui, target: ImageTarget) {
        let current = self
            .subject
            .as_ref()
            .and_then(|k| self.settings.subject(k))
            .cloned();

        let locked = self.editor.as_ref().is_some_and(|e| e.is_dirty() || e.is_saving());

        let mut chosen = None;
        ui.add_enabled_ui(!locked, |ui| {
            egui::ComboBox::from_id_salt(("subject", target as u8))
                .selected_text(current.as_ref().map_or("None", |s| s.name.as_str()))
                .show_ui(ui, |ui| {
                    for subject in &self.settings.subjects {
                        let selected = current.as_ref().is_some_and(|c| c.key == subject.key);
                        if ui.selectable_label(selected, &subject.name).clicked() && !selected {
                            chosen = Some(subject.key.clone());
                        }
                    }
                });
        })
        .response
        .on_disabled_hover_text("Save or reload the editor's groups before switching subject");
        if let Some(key) = chosen {
            self.open_subject(Some(key));
            return;
        }

        let Some(current) = current else {
            return;
        };
        if !current.requires_gender_choice() {
            return;
        }

        let gender = match target {
            ImageTarget::Editor => self.editor.as_ref().and_then(|e| e.gender()),
            ImageTarget::Selector => self.selector.as_ref().and_then(|s| s.gender()),
        };

        let mut switch = None;
        ui.horizontal(|ui| {
            ui.label("Gender:");
            for g in Gender::ALL {
                if ui.selectable_label(gender == Some(g), g.label()).clicked() && gender != Some(g) {
                    switch = Some(g);
                }
            }
        });
        if let Some(g) = switch {
            self.set_gender(target, g);
        }
    }
}

/// Background results
impl App {
    fn handle_messages(&mut self, ctx: &egui::Context) {
        self.image_inbox.set_ctx(ctx);
        let images: Vec<ImageMessage> = self.image_inbox.read_without_ctx().collect();
        for msg in images {
            let view = match msg.target {
                ImageTarget::Editor => &mut self.editor_view,
                ImageTarget::Selector => &mut self.selector_view,
            };
            // a newer request replaced this one
            if view.image.location() != Some(msg.location.as_str()) {
                debug!("dropping stale image {}", msg.location);
                continue;
            }
            if let Err(e) = &msg.result {
                self.errors.push(format!("Failed to load image: {:#}", e));
            }
            view.image = ImageState::from_result(ctx, msg.location, msg.result);
        }

        self.save_inbox.set_ctx(ctx);
        let saves: Vec<SaveOutcome> = self.save_inbox.read_without_ctx().collect();
        for SaveOutcome { request, result } in saves {
            let Some(editor) = self.editor.as_mut() else {
                continue;
            };
            let subject = request.subject.clone();
            let gender = request.gender;
            match editor.complete_save(request, result) {
                Ok(()) => {
                    info!("saved {}/{:?}", subject, gender);
                    self.refresh_selector_after_save(&subject, gender);
                }
                Err(e) => {
                    error!("Save failed: {}", e);
                    self.errors.push(format!("Save failed: {}", e));
                }
            }
        }

        if let Some(rx) = self.selection_rx.as_ref() {
            while let Ok(selection) = rx.try_recv() {
                debug!(
                    "selection: {} area(s), total {:.2}",
                    selection.groups.len(),
                    selection.total_price
                );
                self.last_selection = Some(selection);
            }
        }
    }

    /// The selector shows what was just written when it looks at the same partition.
    fn refresh_selector_after_save(&mut self, subject: &SubjectKey, gender: Option<Gender>) {
        let (Some(store), Some(selector)) = (self.store.clone(), self.selector.as_mut()) else {
            return;
        };
        let same = &selector.subject().key == subject
            && selector.resolution().variant().map(|v| v.gender) == Some(gender);
        if !same {
            return;
        }
        if let Err(e) = selector.load(store.as_ref()) {
            error!("Failed to reload areas: {}", e);
            self.errors.push(format!("Failed to reload areas: {}", e));
        }
    }
}

impl eframe::App for App {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_messages(ctx);

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.current_tab, Tab::Editor, "Editor");
                ui.selectable_value(&mut self.current_tab, Tab::Selector, "Selector");
                ui.selectable_value(&mut self.current_tab, Tab::Options, "Options");
            });
        });

        match self.current_tab {
            Tab::Editor => self.editor_tab(ctx),
            Tab::Selector => self.selector_tab(ctx),
            Tab::Options => self.options(ctx),
        }

        let editor_redraw = self.editor.as_mut().is_some_and(|e| e.take_redraw());
        let selector_redraw = self.selector.as_mut().is_some_and(|s| s.take_redraw());
        if editor_redraw || selector_redraw {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::projection::Surface;

    fn app() -> App {
        let mut app = App {
            gender: Some(Gender::Female),
            store: Some(Arc::new(MemoryStore::default())),
            ..Default::default()
        };
        app.open_subject(None);
        app
    }

    #[test]
    fn reopening_with_unsaved_groups_is_reported() {
        let mut app = app();
        assert!(app.errors.is_empty());

        let surface = Surface::with_layout(100.0, 100.0, 1.0);
        let editor = app.editor.as_mut().unwrap();
        editor.pointer_down(egui::pos2(10., 10.), &surface);
        editor.pointer_moved(egui::pos2(30., 30.), &surface);
        editor.pointer_up();
        editor.finalize_group("Forehead", 100.0).unwrap();

        let subject = app.subject.clone();
        app.open_subject(subject);
        assert_eq!(app.errors.len(), 1);
        assert!(!app.editor.as_ref().unwrap().is_dirty());

        let subject = app.subject.clone();
        app.open_subject(subject);
        assert_eq!(app.errors.len(), 1);
    }
}

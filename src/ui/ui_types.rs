use std::sync::Arc;

use crate::appconfig::AppSettings;
use crate::editor::{AreaEditor, SaveRequest};
use crate::geometry::projection::Surface;
use crate::images::ImageState;
use crate::model::{Gender, SubjectKey};
use crate::selector::{AreaSelector, SelectionChanged};
use crate::store::{RecordStore, StoreError};

#[derive(serde::Serialize, serde::Deserialize, Default)]
pub struct App {
    #[serde(skip)]
    pub errors: Vec<String>,

    pub current_tab: Tab,

    /// Last subject and gender, restored on startup.
    pub subject: Option<SubjectKey>,
    pub gender: Option<Gender>,

    #[serde(skip)]
    pub settings: AppSettings,

    #[serde(skip)]
    pub store: Option<Arc<dyn RecordStore>>,

    #[serde(skip)]
    pub editor: Option<AreaEditor>,
    #[serde(skip)]
    pub editor_view: ImageView,

    #[serde(skip)]
    pub selector: Option<AreaSelector>,
    #[serde(skip)]
    pub selector_view: ImageView,
    #[serde(skip)]
    pub selection_rx: Option<crossbeam_channel::Receiver<SelectionChanged>>,
    #[serde(skip)]
    pub last_selection: Option<SelectionChanged>,

    #[serde(skip)]
    pub save_inbox: egui_inbox::UiInbox<SaveOutcome>,
    #[serde(skip)]
    pub image_inbox: egui_inbox::UiInbox<ImageMessage>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum Tab {
    Editor,
    Selector,
    Options,
}

impl Default for Tab {
    fn default() -> Self {
        Tab::Selector
    }
}

/// Which canvas an image load is meant for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageTarget {
    Editor,
    Selector,
}

pub struct ImageMessage {
    pub target: ImageTarget,
    pub location: String,
    pub result: anyhow::Result<egui::ColorImage>,
}

pub struct SaveOutcome {
    pub request: SaveRequest,
    pub result: Result<(), StoreError>,
}

/// A reference image and the surface it is laid out on.
#[derive(Default)]
pub struct ImageView {
    pub surface: Surface,
    pub image: ImageState,
}

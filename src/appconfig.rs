use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use serde::{Deserialize, Serialize};

use crate::editor::DEFAULT_MIN_SHAPE_SIZE;
use crate::model::{Region, SubjectCategory, SubjectConfig, SubjectKey};
use crate::store::StoreSettings;

pub const CONFIG_FILE: &str = "area_pricing.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub store: StoreSettings,
    /// Holds `{face,body}_{male,female}.png` and relative custom images.
    pub image_dir: PathBuf,
    pub subjects: Vec<SubjectConfig>,
    pub min_shape_size: f64,
    pub touch_label_secs: f64,
    /// Layout width at which labels render at full size.
    pub reference_width: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            store: StoreSettings::default(),
            image_dir: PathBuf::from("images"),
            subjects: vec![
                SubjectConfig {
                    key: SubjectKey("face".to_string()),
                    name: "Face".to_string(),
                    category: SubjectCategory::Gendered { region: Region::Face },
                },
                SubjectConfig {
                    key: SubjectKey("body".to_string()),
                    name: "Body".to_string(),
                    category: SubjectCategory::Gendered { region: Region::Body },
                },
            ],
            min_shape_size: DEFAULT_MIN_SHAPE_SIZE,
            touch_label_secs: 2.0,
            reference_width: 600.0,
        }
    }
}

impl AppSettings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: AppSettings =
            toml::from_str(&s).with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(
            "loaded settings from {}: {} subject(s), {:?} store",
            path.display(),
            settings.subjects.len(),
            settings.store.kind
        );
        Ok(settings)
    }

    /// Defaults when the file is missing or broken.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("using default settings: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = toml::to_string_pretty(self).context("Failed to serialize AppSettings to TOML")?;
        std::fs::write(path, s)?;
        Ok(())
    }

    pub fn touch_label_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.touch_label_secs.max(0.0))
    }

    pub fn subject(&self, key: &SubjectKey) -> Option<&SubjectConfig> {
        self.subjects.iter().find(|s| &s.key == key)
    }
}

//! Persistence of group datasets, partitioned by `(subject, gender)`.
//!
//! Saves are whole-partition replaces: every prior group under the key is
//! dropped and the current set is written. There is no versioning, so two
//! editors saving the same partition overwrite each other and the last one wins.

pub mod file;
pub mod memory;
pub mod rest;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{Gender, Group, SubjectKey};

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::rest::RestStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record data: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("record store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("{0}")]
    Backend(String),
}

pub trait RecordStore: Send + Sync {
    /// Groups of one partition, in authoring order.
    fn load_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
    ) -> Result<Vec<Group>, StoreError>;

    /// Deletes the partition and reinserts `groups` in order.
    fn replace_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
        groups: &[Group],
    ) -> Result<(), StoreError>;
}

/// Strips shapes that must never be persisted and drops groups left empty.
pub fn persistable_groups(groups: &[Group]) -> Vec<Group> {
    groups
        .iter()
        .filter_map(|g| {
            let shapes: Vec<_> = g.valid_shapes().copied().collect();
            if shapes.len() != g.shapes.len() {
                warn!(
                    "group {} ({:?}): dropping {} invalid shape(s)",
                    g.id,
                    g.name,
                    g.shapes.len() - shapes.len()
                );
            }
            if shapes.is_empty() {
                warn!("group {} ({:?}) has no valid shapes, not persisted", g.id, g.name);
                return None;
            }
            Some(Group {
                shapes,
                ..g.clone()
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,
    /// JSON document for the file store.
    pub path: String,
    /// Base URL of the REST backend.
    pub url: String,
    pub api_key: String,
    pub table: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            kind: StoreKind::File,
            path: "areas.json".to_string(),
            url: "".to_string(),
            api_key: "".to_string(),
            table: "treatment_areas".to_string(),
        }
    }
}

pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match settings.kind {
        StoreKind::Memory => Arc::new(MemoryStore::default()),
        StoreKind::File => Arc::new(FileStore::new(&settings.path)),
        StoreKind::Rest => Arc::new(
            RestStore::new(&settings.url, &settings.api_key, &settings.table)
                .context("Failed to configure REST record store")?,
        ),
    };
    info!("opened {:?} record store", settings.kind);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use crate::model::GroupId;

    #[test]
    fn invalid_shapes_are_stripped() {
        let groups = vec![
            Group {
                id: GroupId(1),
                name: "cheeks".into(),
                price: 100.0,
                shapes: vec![Shape::new(10., 10., 5., 5.), Shape::new(10., 10., 0., 5.)],
            },
            Group {
                id: GroupId(2),
                name: "broken".into(),
                price: 50.0,
                shapes: vec![Shape::new(98., 10., 5., 5.)],
            },
        ];

        let out = persistable_groups(&groups);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, GroupId(1));
        assert_eq!(out[0].shapes, vec![Shape::new(10., 10., 5., 5.)]);
    }

    #[test]
    fn settings_from_toml() {
        let s: StoreSettings = toml::from_str(
            r#"
            kind = "rest"
            url = "https://db.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(s.kind, StoreKind::Rest);
        assert_eq!(s.table, "treatment_areas");
    }
}

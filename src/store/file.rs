use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{RecordStore, StoreError};
use crate::model::{Gender, Group, SubjectKey};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    partitions: Vec<Partition>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Partition {
    subject: SubjectKey,
    gender: Option<Gender>,
    updated_at: DateTime<Utc>,
    groups: Vec<Group>,
}

/// Every partition in one JSON document on disk.
pub struct FileStore {
    path: PathBuf,
    /// serializes read-modify-write within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(StoreDocument::default()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                Ok(StoreDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the document.
    fn write_document(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let s = serde_json::to_string_pretty(doc)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, s)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Last write time of a partition, if it was ever saved.
    pub fn updated_at(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self
            .read_document()?
            .partitions
            .iter()
            .find(|p| &p.subject == subject && p.gender == gender)
            .map(|p| p.updated_at))
    }
}

impl RecordStore for FileStore {
    fn load_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
    ) -> Result<Vec<Group>, StoreError> {
        let _guard = self.lock.lock();
        let doc = self.read_document()?;
        Ok(doc
            .partitions
            .into_iter()
            .find(|p| &p.subject == subject && p.gender == gender)
            .map(|p| p.groups)
            .unwrap_or_default())
    }

    fn replace_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
        groups: &[Group],
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut doc = self.read_document()?;

        doc.partitions
            .retain(|p| !(&p.subject == subject && p.gender == gender));
        doc.partitions.push(Partition {
            subject: subject.clone(),
            gender,
            updated_at: Utc::now(),
            groups: groups.to_vec(),
        });

        self.write_document(&doc)?;
        info!(
            "saved {} group(s) for {}/{:?} to {}",
            groups.len(),
            subject,
            gender,
            self.path.display()
        );
        Ok(())
    }
}

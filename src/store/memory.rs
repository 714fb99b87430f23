use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use super::{RecordStore, StoreError};
use crate::model::{Gender, Group, SubjectKey};

type PartitionKey = (SubjectKey, Option<Gender>);

/// Process-local store. Also used by tests, which can make the next request fail.
#[derive(Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<PartitionKey, Vec<Group>>>,
    fail_next: AtomicBool,
}

impl MemoryStore {
    /// The next load or replace returns a backend error.
    pub fn fail_next_request(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        Ok(())
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.lock().len()
    }
}

impl RecordStore for MemoryStore {
    fn load_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
    ) -> Result<Vec<Group>, StoreError> {
        self.check_failure()?;
        let partitions = self.partitions.lock();
        Ok(partitions
            .get(&(subject.clone(), gender))
            .cloned()
            .unwrap_or_default())
    }

    fn replace_groups(
        &self,
        subject: &SubjectKey,
        gender: Option<Gender>,
        groups: &[Group],
    ) -> Result<(), StoreError> {
        self.check_failure()?;
        debug!(
            "memory store: replacing {}/{:?} with {} group(s)",
            subject,
            gender,
            groups.len()
        );
        self.partitions
            .lock()
            .insert((subject.clone(), gender), groups.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use crate::model::GroupId;

    #[test]
    fn partitions_are_independent() {
        let store = MemoryStore::default();
        let key = SubjectKey("face".into());
        let g = Group {
            id: GroupId(1),
            name: "forehead".into(),
            price: 10.0,
            shapes: vec![Shape::new(1., 1., 2., 2.)],
        };

        store
            .replace_groups(&key, Some(Gender::Female), &[g.clone()])
            .unwrap();
        assert_eq!(store.load_groups(&key, Some(Gender::Female)).unwrap(), vec![g]);
        assert!(store.load_groups(&key, Some(Gender::Male)).unwrap().is_empty());
        assert!(store.load_groups(&key, None).unwrap().is_empty());
    }

    #[test]
    fn injected_failure_is_one_shot() {
        let store = MemoryStore::default();
        let key = SubjectKey("face".into());
        store.fail_next_request();
        assert!(store.load_groups(&key, None).is_err());
        assert!(store.load_groups(&key, None).is_ok());
    }
}

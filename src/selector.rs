//! Consumption side: click or tap priced areas to build a selection.
//!
//! Groups are read-only here. Every change of the selection set is reported as
//! a [`SelectionChanged`] on the channel registered with [`AreaSelector::with_events`].

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::geometry::{hit_test_index, projection::Surface};
use crate::model::{total_price, Gender, Group, GroupId, SubjectConfig};
use crate::render::AreaStyle;
use crate::store::{RecordStore, StoreError};
use crate::variant::{resolve_variant, Resolution};

pub const DEFAULT_TOUCH_LABEL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged {
    /// Selected groups in group-list order.
    pub groups: Vec<Group>,
    pub total_price: f64,
    pub gender: Option<Gender>,
}

/// One row of the companion list next to the image.
#[derive(Debug, Clone, Copy)]
pub struct AreaEntry<'a> {
    /// 1-based, matches the badge drawn on the image.
    pub ordinal: usize,
    pub group: &'a Group,
    pub selected: bool,
}

pub struct AreaSelector {
    subject: SubjectConfig,
    gender: Option<Gender>,
    resolution: Resolution,
    groups: Vec<Group>,
    loaded: bool,
    selected: BTreeSet<GroupId>,
    hovered: Option<usize>,
    touch_label_until: Option<Instant>,
    touch_label_duration: Duration,
    events: Option<Sender<SelectionChanged>>,
    redraw: bool,
}

impl AreaSelector {
    pub fn new(subject: SubjectConfig, gender: Option<Gender>) -> Self {
        let gender = subject.implied_gender().or(gender);
        let resolution = resolve_variant(&subject, gender);
        Self {
            subject,
            gender,
            resolution,
            groups: vec![],
            loaded: false,
            selected: BTreeSet::new(),
            hovered: None,
            touch_label_until: None,
            touch_label_duration: DEFAULT_TOUCH_LABEL,
            events: None,
            redraw: true,
        }
    }

    pub fn with_events(mut self, events: Sender<SelectionChanged>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_touch_label_duration(mut self, duration: Duration) -> Self {
        self.touch_label_duration = duration;
        self
    }

    pub fn subject(&self) -> &SubjectConfig {
        &self.subject
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Areas are selectable only once a variant is resolved and its groups loaded.
    pub fn is_ready(&self) -> bool {
        self.loaded && matches!(self.resolution, Resolution::Ready(_))
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn request_redraw(&mut self) {
        self.redraw = true;
    }

    fn dataset_gender(resolution: &Resolution) -> Option<Option<Gender>> {
        match resolution {
            Resolution::Ready(v) => Some(v.gender),
            Resolution::NeedsGender => None,
            Resolution::NoImage => Some(None),
        }
    }

    /// Loads the groups of the current `(subject, gender)` partition. With no
    /// gender chosen yet there is nothing to load and the selector stays idle.
    pub fn load(&mut self, store: &dyn RecordStore) -> Result<(), StoreError> {
        let Some(gender) = Self::dataset_gender(&self.resolution) else {
            debug!("selector for {} waiting on a gender", self.subject.key);
            self.groups.clear();
            self.loaded = false;
            self.request_redraw();
            return Ok(());
        };

        let groups = store.load_groups(&self.subject.key, gender)?;
        info!(
            "selector loaded {} group(s) for {}/{:?}",
            groups.len(),
            self.subject.key,
            gender
        );
        self.groups = groups;
        self.loaded = true;
        self.hovered = None;
        self.touch_label_until = None;

        let before = self.selected.len();
        let groups = &self.groups;
        self.selected.retain(|id| groups.iter().any(|g| &g.id == id));
        if self.selected.len() != before {
            self.emit();
        }
        self.request_redraw();
        Ok(())
    }

    /// Swaps image and dataset. The selection belongs to the previous dataset
    /// and is cleared. On a store failure nothing changes.
    pub fn set_gender(&mut self, gender: Gender, store: &dyn RecordStore) -> Result<(), StoreError> {
        if self.subject.implied_gender().is_some() {
            return Ok(());
        }

        let resolution = resolve_variant(&self.subject, Some(gender));
        let groups = match Self::dataset_gender(&resolution) {
            Some(partition) => store.load_groups(&self.subject.key, partition)?,
            None => vec![],
        };
        debug!("selector gender -> {:?}, {} group(s)", gender, groups.len());

        self.gender = Some(gender);
        self.loaded = matches!(resolution, Resolution::Ready(_) | Resolution::NoImage);
        self.resolution = resolution;
        self.groups = groups;
        self.hovered = None;
        self.touch_label_until = None;
        self.selected.clear();
        self.emit();
        self.request_redraw();
        Ok(())
    }
}

/// Pointer and touch input
impl AreaSelector {
    pub fn pointer_move(&mut self, pos: egui::Pos2, surface: &Surface) {
        if !self.is_ready() {
            return;
        }
        let hovered = hit_test_index(surface.to_percentage(pos), &self.groups);
        self.touch_label_until = None;
        if hovered != self.hovered {
            self.hovered = hovered;
            self.request_redraw();
        }
    }

    /// Mouse left the surface. A label shown by a tap keeps its timer.
    pub fn pointer_leave(&mut self) {
        if self.touch_label_until.is_some() {
            return;
        }
        if self.hovered.take().is_some() {
            self.request_redraw();
        }
    }

    /// Toggles the group under `pos`. Returns it when something was hit.
    pub fn pointer_click(&mut self, pos: egui::Pos2, surface: &Surface) -> Option<GroupId> {
        if !self.is_ready() {
            return None;
        }
        let index = hit_test_index(surface.to_percentage(pos), &self.groups)?;
        let id = self.groups[index].id;
        self.toggle(id);
        Some(id)
    }

    /// Like a click, and also shows the label for a fixed time since touch
    /// has no hover.
    pub fn touch_start(&mut self, pos: egui::Pos2, surface: &Surface, now: Instant) -> Option<GroupId> {
        if !self.is_ready() {
            return None;
        }
        let index = hit_test_index(surface.to_percentage(pos), &self.groups);
        self.hovered = index;
        self.touch_label_until = index.map(|_| now + self.touch_label_duration);
        self.request_redraw();

        let id = self.groups[index?].id;
        self.toggle(id);
        Some(id)
    }

    /// Expires the touch label. Returns true when it just went away.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.touch_label_until {
            Some(until) if now >= until => {
                self.touch_label_until = None;
                self.hovered = None;
                self.request_redraw();
                true
            }
            _ => false,
        }
    }

    pub fn touch_label_remaining(&self, now: Instant) -> Option<Duration> {
        self.touch_label_until
            .map(|until| until.saturating_duration_since(now))
    }
}

/// Selection
impl AreaSelector {
    /// Flips membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: GroupId) -> bool {
        if !self.groups.iter().any(|g| g.id == id) {
            warn!("toggle of unknown group {}", id);
            return false;
        }
        let selected = if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        };
        debug!("group {} {}", id, if selected { "selected" } else { "deselected" });
        self.emit();
        self.request_redraw();
        selected
    }

    pub fn clear_selection(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.emit();
        self.request_redraw();
    }

    pub fn is_selected(&self, id: GroupId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_groups(&self) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|g| self.selected.contains(&g.id))
            .collect()
    }

    pub fn total_price(&self) -> f64 {
        total_price(self.selected_groups())
    }

    pub fn selection(&self) -> SelectionChanged {
        SelectionChanged {
            groups: self.selected_groups().into_iter().cloned().collect(),
            total_price: self.total_price(),
            gender: self.gender,
        }
    }

    pub fn hovered(&self) -> Option<(usize, &Group)> {
        self.hovered
            .and_then(|i| self.groups.get(i).map(|g| (i, g)))
    }

    pub fn visual_state(&self, index: usize) -> AreaStyle {
        let Some(group) = self.groups.get(index) else {
            return AreaStyle::Idle;
        };
        if self.selected.contains(&group.id) {
            AreaStyle::Selected
        } else if self.hovered == Some(index) {
            AreaStyle::Hovered
        } else {
            AreaStyle::Idle
        }
    }

    pub fn entries(&self) -> Vec<AreaEntry<'_>> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, group)| AreaEntry {
                ordinal: i + 1,
                group,
                selected: self.selected.contains(&group.id),
            })
            .collect()
    }

    fn emit(&mut self) {
        let Some(tx) = self.events.as_ref() else {
            return;
        };
        let event = self.selection();
        debug!(
            "selection changed: {} group(s), total {:.2}",
            event.groups.len(),
            event.total_price
        );
        if tx.send(event).is_err() {
            warn!("selection listener went away, no longer reporting");
            self.events = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Shape;
    use crate::model::{Region, SubjectCategory, SubjectKey};
    use crate::store::MemoryStore;

    fn surface() -> Surface {
        Surface::with_layout(100.0, 100.0, 1.0)
    }

    fn face() -> SubjectConfig {
        SubjectConfig {
            key: SubjectKey("face".into()),
            name: "Face".into(),
            category: SubjectCategory::Gendered { region: Region::Face },
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::default();
        let key = SubjectKey("face".into());
        store
            .replace_groups(
                &key,
                Some(Gender::Female),
                &[
                    Group {
                        id: GroupId(1),
                        name: "Cheeks".into(),
                        price: 150.0,
                        shapes: vec![
                            Shape::new(10., 40., 15., 15.),
                            Shape::new(75., 40., 15., 15.),
                            Shape::new(40., 60., 5., 5.),
                        ],
                    },
                    Group {
                        id: GroupId(2),
                        name: "Chin".into(),
                        price: 80.0,
                        shapes: vec![Shape::new(35., 55., 30., 20.)],
                    },
                ],
            )
            .unwrap();
        store
            .replace_groups(
                &key,
                Some(Gender::Male),
                &[Group {
                    id: GroupId(3),
                    name: "Jaw".into(),
                    price: 200.0,
                    shapes: vec![Shape::new(20., 80., 60., 10.)],
                }],
            )
            .unwrap();
        store
    }

    fn selector(store: &MemoryStore) -> (AreaSelector, crossbeam_channel::Receiver<SelectionChanged>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut s = AreaSelector::new(face(), Some(Gender::Female)).with_events(tx);
        s.load(store).unwrap();
        (s, rx)
    }

    #[test]
    fn failed_reload_keeps_selection() {
        let store = seeded_store();
        let (mut s, rx) = selector(&store);
        s.pointer_click(egui::pos2(50., 70.), &surface());
        rx.try_iter().count();

        store.fail_next_request();
        assert!(s.load(&store).is_err());
        assert!(s.is_ready());
        assert_eq!(s.groups().len(), 2);
        assert_eq!(s.total_price(), 80.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn price_counts_each_group_once() {
        let store = seeded_store();
        let (mut s, rx) = selector(&store);

        s.pointer_click(egui::pos2(15., 45.), &surface());
        s.pointer_click(egui::pos2(50., 70.), &surface());

        assert_eq!(s.total_price(), 230.0);
        let last = rx.try_iter().last().unwrap();
        assert_eq!(last.total_price, 230.0);
        assert_eq!(last.gender, Some(Gender::Female));
        assert_eq!(
            last.groups.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![GroupId(1), GroupId(2)]
        );
    }

    #[test]
    fn toggle_twice_restores_state() {
        let store = seeded_store();
        let (mut s, rx) = selector(&store);
        s.toggle(GroupId(2));
        let before = s.selection();

        assert!(s.toggle(GroupId(1)));
        assert!(!s.toggle(GroupId(1)));
        assert_eq!(s.selection(), before);
        assert_eq!(rx.try_iter().count(), 3);
    }

    #[test]
    fn overlap_click_selects_earlier_group() {
        let store = seeded_store();
        let (mut s, _rx) = selector(&store);
        // (42, 62) is in a Cheeks shape and inside Chin
        assert_eq!(s.pointer_click(egui::pos2(42., 62.), &surface()), Some(GroupId(1)));
        assert_eq!(s.pointer_click(egui::pos2(95., 5.), &surface()), None);
    }

    #[test]
    fn hover_drives_visual_state() {
        let store = seeded_store();
        let (mut s, _rx) = selector(&store);

        s.pointer_move(egui::pos2(50., 70.), &surface());
        assert_eq!(s.hovered().map(|(i, _)| i), Some(1));
        assert_eq!(s.visual_state(1), AreaStyle::Hovered);
        assert_eq!(s.visual_state(0), AreaStyle::Idle);

        s.toggle(GroupId(2));
        assert_eq!(s.visual_state(1), AreaStyle::Selected);

        s.pointer_leave();
        assert!(s.hovered().is_none());
    }

    #[test]
    fn touch_label_expires() {
        let store = seeded_store();
        let (mut s, _rx) = selector(&store);
        let now = Instant::now();

        assert_eq!(
            s.touch_start(egui::pos2(50., 70.), &surface(), now),
            Some(GroupId(2))
        );
        assert!(s.is_selected(GroupId(2)));
        s.pointer_leave();
        assert!(s.hovered().is_some());

        assert!(!s.tick(now + Duration::from_millis(500)));
        assert!(s.tick(now + DEFAULT_TOUCH_LABEL));
        assert!(s.hovered().is_none());
    }

    #[test]
    fn gender_switch_clears_selection() {
        let store = seeded_store();
        let (mut s, rx) = selector(&store);
        s.toggle(GroupId(1));

        s.set_gender(Gender::Male, &store).unwrap();
        assert_eq!(s.groups().len(), 1);
        assert!(s.selected_groups().is_empty());

        let last = rx.try_iter().last().unwrap();
        assert!(last.groups.is_empty());
        assert_eq!(last.total_price, 0.0);
        assert_eq!(last.gender, Some(Gender::Male));
    }

    #[test]
    fn no_gender_means_no_interaction() {
        let store = seeded_store();
        let mut s = AreaSelector::new(face(), None);
        s.load(&store).unwrap();
        assert!(!s.is_ready());
        assert_eq!(s.pointer_click(egui::pos2(15., 45.), &surface()), None);

        s.set_gender(Gender::Female, &store).unwrap();
        assert!(s.is_ready());
        assert_eq!(s.pointer_click(egui::pos2(15., 45.), &surface()), Some(GroupId(1)));
    }

    #[test]
    fn failed_switch_keeps_state() {
        let store = seeded_store();
        let (mut s, _rx) = selector(&store);
        s.toggle(GroupId(1));

        store.fail_next_request();
        assert!(s.set_gender(Gender::Male, &store).is_err());
        assert_eq!(s.gender(), Some(Gender::Female));
        assert!(s.is_selected(GroupId(1)));
    }

    #[test]
    fn entries_are_numbered_in_order() {
        let store = seeded_store();
        let (mut s, _rx) = selector(&store);
        s.toggle(GroupId(2));
        let entries = s.entries();
        assert_eq!(entries[0].ordinal, 1);
        assert_eq!(entries[1].ordinal, 2);
        assert!(!entries[0].selected);
        assert!(entries[1].selected);
    }
}

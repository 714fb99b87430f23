//! Authoring side: draw rectangles over the reference image, bundle them into
//! named, priced groups and save the set for one `(subject, gender)` partition.
//!
//! Pointer positions come in layout space relative to the surface origin and
//! are projected into percentage space immediately, so a resize in the middle
//! of a drag does not disturb the shape being drawn.

pub mod draft;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

pub use self::draft::{Draft, GroupForm, Interaction};

use crate::geometry::{clamp_shape, hit_test_shapes, projection::Surface, Shape};
use crate::model::{parse_price, Gender, Group, GroupId, SubjectConfig, SubjectKey};
use crate::store::{persistable_groups, RecordStore, StoreError};
use crate::variant::{resolve_variant, Resolution};

/// Default minimum width and height of a committed shape, percentage units.
pub const DEFAULT_MIN_SHAPE_SIZE: f64 = 1.0;

/// Shared by every editor so a result from a replaced editor never matches.
static NEXT_SAVE_TOKEN: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("draw at least one area before adding the group")]
    EmptyDraft,
    #[error("group name must not be empty")]
    EmptyName,
    #[error("no group with id {0}")]
    UnknownGroup(GroupId),
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("choose a gender first")]
    GenderRequired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Snapshot handed to whoever performs the store round trip.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub subject: SubjectKey,
    pub gender: Option<Gender>,
    pub groups: Vec<Group>,
    token: u64,
}

#[derive(Debug)]
struct PendingSave {
    token: u64,
    committed: Vec<Group>,
    draft_generation: u64,
}

pub struct AreaEditor {
    subject: SubjectConfig,
    gender: Option<Gender>,
    resolution: Resolution,
    groups: Vec<Group>,
    /// Groups as of the last successful load or save.
    saved: Vec<Group>,
    draft: Draft,
    interaction: Interaction,
    min_shape_size: f64,
    pending_save: Option<PendingSave>,
    redraw: bool,
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        0.0
    }
}

/// New
impl AreaEditor {
    pub fn new(subject: SubjectConfig, gender: Option<Gender>) -> Self {
        let gender = subject.implied_gender().or(gender);
        let resolution = resolve_variant(&subject, gender);
        Self {
            subject,
            gender,
            resolution,
            groups: vec![],
            saved: vec![],
            draft: Draft::default(),
            interaction: Interaction::Idle,
            min_shape_size: DEFAULT_MIN_SHAPE_SIZE,
            pending_save: None,
            redraw: true,
        }
    }

    pub fn with_min_shape_size(mut self, min_shape_size: f64) -> Self {
        self.min_shape_size = min_shape_size.max(0.0);
        self
    }
}

/// Accessors
impl AreaEditor {
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

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn form_mut(&mut self) -> &mut GroupForm {
        &mut self.draft.form
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// The rectangle currently being drawn, if any.
    pub fn in_progress_shape(&self) -> Option<Shape> {
        match self.interaction {
            Interaction::Drawing { current, .. } => Some(current),
            _ => None,
        }
    }

    pub fn moving_index(&self) -> Option<usize> {
        match self.interaction {
            Interaction::Moving { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.groups != self.saved
    }

    pub fn is_saving(&self) -> bool {
        self.pending_save.is_some()
    }

    /// Returns and clears the redraw request raised by every mutation.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Dataset gender for the current variant.
    fn partition(&self) -> Result<Option<Gender>, EditorError> {
        match &self.resolution {
            Resolution::Ready(v) => Ok(v.gender),
            Resolution::NeedsGender => Err(EditorError::GenderRequired),
            Resolution::NoImage => Ok(None),
        }
    }
}

/// Loading and variant switching
impl AreaEditor {
    /// Replaces the committed groups with the stored partition. On failure
    /// nothing in memory changes.
    pub fn load(&mut self, store: &dyn RecordStore) -> Result<(), EditorError> {
        let gender = self.partition()?;
        let groups = store.load_groups(&self.subject.key, gender)?;
        info!(
            "editor loaded {} group(s) for {}/{:?}",
            groups.len(),
            self.subject.key,
            gender
        );

        self.groups = groups;
        self.saved = self.groups.clone();
        self.draft.reset();
        self.interaction = Interaction::Idle;
        self.request_redraw();
        Ok(())
    }

    /// Swaps to the other gender's image and dataset, discarding the draft.
    /// Subjects with an implied gender ignore this.
    pub fn set_gender(&mut self, gender: Gender, store: &dyn RecordStore) -> Result<(), EditorError> {
        if let Some(implied) = self.subject.implied_gender() {
            debug!("subject {} is fixed to {:?}, ignoring gender switch", self.subject.key, implied);
            return Ok(());
        }

        let resolution = resolve_variant(&self.subject, Some(gender));
        let partition = match &resolution {
            Resolution::Ready(v) => v.gender,
            Resolution::NeedsGender => return Err(EditorError::GenderRequired),
            Resolution::NoImage => None,
        };

        let groups = store.load_groups(&self.subject.key, partition)?;
        if self.is_dirty() {
            warn!(
                "switching {} to {:?} drops unsaved changes to {:?}",
                self.subject.key, gender, self.gender
            );
        }
        debug!("editor gender -> {:?}, {} group(s)", gender, groups.len());

        self.gender = Some(gender);
        self.resolution = resolution;
        self.groups = groups;
        self.saved = self.groups.clone();
        self.draft.reset();
        self.interaction = Interaction::Idle;
        self.request_redraw();
        Ok(())
    }
}

/// Pointer interaction
impl AreaEditor {
    /// Primary press: move a draft shape when the press lands on one,
    /// otherwise start drawing a new one.
    pub fn pointer_down(&mut self, pos: egui::Pos2, surface: &Surface) {
        if !self.start_move(pos, surface) {
            self.start_shape(pos, surface);
        }
    }

    pub fn pointer_moved(&mut self, pos: egui::Pos2, surface: &Surface) {
        match self.interaction {
            Interaction::Drawing { .. } => self.update_shape(pos, surface),
            Interaction::Moving { .. } => self.update_move(pos, surface),
            Interaction::Idle => {}
        }
    }

    pub fn pointer_up(&mut self) {
        match self.interaction {
            Interaction::Drawing { .. } => {
                self.end_shape();
            }
            Interaction::Moving { .. } => {
                self.end_move();
            }
            Interaction::Idle => {}
        }
    }

    /// Begins a rectangle at `pos`. Ignored while a move is in progress.
    pub fn start_shape(&mut self, pos: egui::Pos2, surface: &Surface) -> bool {
        if matches!(self.interaction, Interaction::Moving { .. }) {
            return false;
        }
        let origin = surface.to_percentage(pos);
        self.interaction = Interaction::Drawing {
            origin,
            current: Shape::from_corners(origin, origin),
        };
        self.request_redraw();
        true
    }

    pub fn update_shape(&mut self, pos: egui::Pos2, surface: &Surface) {
        if let Interaction::Drawing { origin, current } = &mut self.interaction {
            *current = Shape::from_corners(*origin, surface.to_percentage(pos));
            self.redraw = true;
        }
    }

    /// Commits the drawn rectangle into the draft when it is at least
    /// `min_shape_size` on both axes, otherwise drops it.
    pub fn end_shape(&mut self) -> Option<usize> {
        let Interaction::Drawing { current, .. } = self.interaction else {
            return None;
        };
        self.interaction = Interaction::Idle;
        self.request_redraw();

        if current.width < self.min_shape_size
            || current.height < self.min_shape_size
            || !current.is_valid()
        {
            debug!(
                "discarding {:.2}x{:.2} shape below {:.2}",
                current.width, current.height, self.min_shape_size
            );
            return None;
        }

        let shape = clamp_shape(current);
        self.draft.shapes.push(shape);
        self.draft.touch();
        debug!("draft shape added: {:?}", shape);
        Some(self.draft.shapes.len() - 1)
    }

    /// Begins moving the draft shape under `pos`, if any.
    pub fn start_move(&mut self, pos: egui::Pos2, surface: &Surface) -> bool {
        if !self.interaction.is_idle() {
            return false;
        }
        let grab = surface.to_percentage(pos);
        let Some(index) = hit_test_shapes(grab, &self.draft.shapes) else {
            return false;
        };
        self.interaction = Interaction::Moving {
            index,
            grab,
            original: self.draft.shapes[index],
        };
        self.request_redraw();
        true
    }

    /// Translates the moving shape by the pointer delta since the grab,
    /// clamped to the image.
    pub fn update_move(&mut self, pos: egui::Pos2, surface: &Surface) {
        let Interaction::Moving {
            index,
            grab,
            original,
        } = self.interaction
        else {
            return;
        };
        let p = surface.to_percentage(pos);
        let moved = clamp_shape(original.translated(p.x - grab.x, p.y - grab.y));
        if let Some(shape) = self.draft.shapes.get_mut(index) {
            *shape = moved;
            self.redraw = true;
        }
    }

    pub fn end_move(&mut self) -> bool {
        let Interaction::Moving { index, original, .. } = self.interaction else {
            return false;
        };
        self.interaction = Interaction::Idle;
        if self.draft.shapes.get(index) != Some(&original) {
            self.draft.touch();
        }
        self.request_redraw();
        true
    }

    /// Pointer left the surface: abort without committing. An aborted move
    /// puts the shape back where it was.
    pub fn cancel_interaction(&mut self) {
        match self.interaction {
            Interaction::Idle => return,
            Interaction::Drawing { .. } => debug!("drawing cancelled"),
            Interaction::Moving { index, original, .. } => {
                debug!("move cancelled, restoring shape {}", index);
                if let Some(shape) = self.draft.shapes.get_mut(index) {
                    *shape = original;
                }
            }
        }
        self.interaction = Interaction::Idle;
        self.request_redraw();
    }
}

/// Draft and group management
impl AreaEditor {
    pub fn remove_draft_shape(&mut self, index: usize) -> Option<Shape> {
        if !self.interaction.is_idle() || index >= self.draft.shapes.len() {
            return None;
        }
        let shape = self.draft.shapes.remove(index);
        self.draft.touch();
        self.request_redraw();
        Some(shape)
    }

    pub fn undo_draft_shape(&mut self) -> Option<Shape> {
        let last = self.draft.shapes.len().checked_sub(1)?;
        self.remove_draft_shape(last)
    }

    pub fn discard_draft(&mut self) {
        self.draft.reset();
        self.interaction = Interaction::Idle;
        self.request_redraw();
    }

    /// Promotes the draft to a committed group. On a validation error the
    /// draft is left untouched so it can be corrected.
    pub fn finalize_group(&mut self, name: &str, price: f64) -> Result<GroupId, EditorError> {
        if self.draft.shapes.is_empty() {
            return Err(EditorError::EmptyDraft);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::EmptyName);
        }

        let mut id = GroupId::generate();
        while self.groups.iter().any(|g| g.id == id) {
            id = GroupId::generate();
        }

        let group = Group {
            id,
            name: name.to_string(),
            price: sanitize_price(price),
            shapes: std::mem::take(&mut self.draft.shapes),
        };
        info!(
            "group {} {:?} added: {} shape(s), price {:.2}",
            group.id,
            group.name,
            group.shapes.len(),
            group.price
        );
        self.groups.push(group);
        self.draft.reset();
        self.request_redraw();
        Ok(id)
    }

    /// Applies the pending form: updates the group being edited, or finalizes
    /// the draft into a new group.
    pub fn commit_form(&mut self) -> Result<GroupId, EditorError> {
        let name = self.draft.form.name.clone();
        let price = parse_price(&self.draft.form.price);

        match self.draft.editing {
            Some(id) => {
                self.update_group(id, &name, price)?;
                self.draft.form = GroupForm::default();
                self.draft.editing = None;
                Ok(id)
            }
            None => self.finalize_group(&name, price),
        }
    }

    /// Loads a committed group's metadata into the form.
    pub fn edit_group(&mut self, id: GroupId) -> Result<(), EditorError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.id == id)
            .ok_or(EditorError::UnknownGroup(id))?;
        self.draft.form = GroupForm::from_group(group);
        self.draft.editing = Some(id);
        self.request_redraw();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if self.draft.editing.take().is_some() {
            self.draft.form = GroupForm::default();
            self.request_redraw();
        }
    }

    /// Metadata only, shapes are left alone.
    pub fn update_group(&mut self, id: GroupId, name: &str, price: f64) -> Result<(), EditorError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditorError::EmptyName);
        }
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(EditorError::UnknownGroup(id))?;

        group.name = name.to_string();
        group.price = sanitize_price(price);
        debug!("group {} updated: {:?} {:.2}", id, group.name, group.price);
        self.request_redraw();
        Ok(())
    }

    pub fn delete_group(&mut self, id: GroupId) -> Result<Group, EditorError> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or(EditorError::UnknownGroup(id))?;
        let group = self.groups.remove(index);
        if self.draft.editing == Some(id) {
            self.draft.editing = None;
            self.draft.form = GroupForm::default();
        }
        info!("group {} {:?} deleted", group.id, group.name);
        self.request_redraw();
        Ok(group)
    }
}

/// Saving
impl AreaEditor {
    /// First half of a save: snapshot what should be written.
    pub fn begin_save(&mut self) -> Result<SaveRequest, EditorError> {
        if self.pending_save.is_some() {
            return Err(EditorError::SaveInFlight);
        }
        let gender = self.partition()?;

        let token = NEXT_SAVE_TOKEN.fetch_add(1, Ordering::Relaxed);

        self.pending_save = Some(PendingSave {
            token,
            committed: self.groups.clone(),
            draft_generation: self.draft.generation,
        });

        Ok(SaveRequest {
            subject: self.subject.key.clone(),
            gender,
            groups: persistable_groups(&self.groups),
            token,
        })
    }

    /// Second half of a save. Success marks the snapshot as saved and drops
    /// the draft if it has not changed since; failure keeps everything.
    pub fn complete_save(
        &mut self,
        request: SaveRequest,
        result: Result<(), StoreError>,
    ) -> Result<(), EditorError> {
        let pending = match self.pending_save.take() {
            Some(p) if p.token == request.token => p,
            other => {
                warn!("save result for an unknown request ({}/{:?})", request.subject, request.gender);
                self.pending_save = other;
                return result.map_err(EditorError::from);
            }
        };

        if let Err(e) = result {
            warn!("save of {}/{:?} failed: {}", request.subject, request.gender, e);
            return Err(e.into());
        }

        info!(
            "saved {} group(s) for {}/{:?}",
            request.groups.len(),
            request.subject,
            request.gender
        );

        let same_partition =
            request.subject == self.subject.key && self.partition().ok() == Some(request.gender);
        if !same_partition {
            debug!("partition changed while saving, leaving current state alone");
            return Ok(());
        }

        self.saved = pending.committed;
        if self.draft.generation == pending.draft_generation {
            self.draft.reset();
            self.interaction = Interaction::Idle;
        }
        self.request_redraw();
        Ok(())
    }

    /// Blocking save: both halves around a store round trip.
    pub fn save(&mut self, store: &dyn RecordStore) -> Result<(), EditorError> {
        let request = self.begin_save()?;
        let result = store.replace_groups(&request.subject, request.gender, &request.groups);
        self.complete_save(request, result)
    }
}

use crate::geometry::{Point, Shape};
use crate::model::{format_price, Group, GroupId};

/// Pending name/price form. Price is kept as typed and parsed leniently on commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupForm {
    pub name: String,
    pub price: String,
}

impl GroupForm {
    pub fn from_group(group: &Group) -> Self {
        GroupForm {
            name: group.name.clone(),
            price: format_price(group.price),
        }
    }
}

/// The group being authored: shapes drawn so far plus its pending form.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub(super) shapes: Vec<Shape>,
    pub form: GroupForm,
    /// Committed group whose metadata the form is editing.
    pub(super) editing: Option<GroupId>,
    /// Bumped on every shape change, lets a finished save tell whether the
    /// draft it snapshotted is still the current one.
    pub(super) generation: u64,
}

impl Draft {
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn editing(&self) -> Option<GroupId> {
        self.editing
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.form == GroupForm::default() && self.editing.is_none()
    }

    pub(super) fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Empties the draft but keeps the generation counter moving forward.
    pub(super) fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Draft {
            generation,
            ..Default::default()
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Drawing {
        origin: Point,
        current: Shape,
    },
    Moving {
        index: usize,
        grab: Point,
        original: Shape,
    },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }
}

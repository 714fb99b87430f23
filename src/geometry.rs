//! Percentage-space geometry shared by the editor and the selector.
//!
//! Shapes are stored relative to the reference image: `0..=100` on both axes.
//! Pixel coordinates only exist at render time, see [`projection`].

pub mod projection;

use serde::{Deserialize, Serialize};

use crate::model::Group;

/// Upper bound of percentage space on both axes.
pub const PERCENT_MAX: f64 = 100.0;

/// Slack for float noise when checking bounds.
const BOUNDS_EPSILON: f64 = 1e-9;

/// A point in percentage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pins the point inside `[0, 100] x [0, 100]`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, PERCENT_MAX),
            y: self.y.clamp(0.0, PERCENT_MAX),
        }
    }
}

/// Axis-aligned rectangle in percentage units of the reference image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Shape {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the rectangle spanned by two corners. Whatever the drag
    /// direction, `x,y` is the minimum corner and the size is the absolute delta.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Inclusive containment on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        self.x <= p.x && p.x <= self.x + self.width && self.y <= p.y && p.y <= self.y + self.height
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// A shape is renderable, hit-testable and persistable only when it has a
    /// positive finite size and lies inside percentage space.
    pub fn is_valid(&self) -> bool {
        let finite = self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite();

        finite
            && self.width > 0.0
            && self.height > 0.0
            && self.x >= -BOUNDS_EPSILON
            && self.y >= -BOUNDS_EPSILON
            && self.x + self.width <= PERCENT_MAX + BOUNDS_EPSILON
            && self.y + self.height <= PERCENT_MAX + BOUNDS_EPSILON
    }
}

/// Percentage -> layout pixels, relative to the surface origin.
pub fn to_layout(shape: &Shape, layout_width: f32, layout_height: f32) -> egui::Rect {
    let sx = layout_width as f64 / PERCENT_MAX;
    let sy = layout_height as f64 / PERCENT_MAX;

    egui::Rect::from_min_size(
        egui::pos2((shape.x * sx) as f32, (shape.y * sy) as f32),
        egui::vec2((shape.width * sx) as f32, (shape.height * sy) as f32),
    )
}

/// Layout pixels -> percentage. Returns the origin for a degenerate surface.
pub fn to_percentage(pos: egui::Pos2, layout_width: f32, layout_height: f32) -> Point {
    if layout_width <= 0.0 || layout_height <= 0.0 {
        return Point::default();
    }

    Point {
        x: pos.x as f64 * PERCENT_MAX / layout_width as f64,
        y: pos.y as f64 * PERCENT_MAX / layout_height as f64,
    }
}

/// Index of the first valid shape in `shapes` containing `p`.
pub fn hit_test_shapes(p: Point, shapes: &[Shape]) -> Option<usize> {
    shapes.iter().position(|s| s.is_valid() && s.contains(p))
}

/// Index of the first group with any valid shape containing `p`.
///
/// Overlaps are resolved by array order: the group list is kept in authoring
/// order, so the earlier-authored group always wins. This is a deliberate
/// tie-break and callers rely on it being stable across calls.
pub fn hit_test_index(p: Point, groups: &[Group]) -> Option<usize> {
    groups
        .iter()
        .position(|g| hit_test_shapes(p, &g.shapes).is_some())
}

pub fn hit_test(p: Point, groups: &[Group]) -> Option<&Group> {
    hit_test_index(p, groups).map(|i| &groups[i])
}

/// Moves `shape` back inside `[0,100] x [0,100]` without changing its size.
pub fn clamp_shape(shape: Shape) -> Shape {
    let max_x = (PERCENT_MAX - shape.width).max(0.0);
    let max_y = (PERCENT_MAX - shape.height).max(0.0);

    let x = if shape.x.is_nan() { 0.0 } else { shape.x.clamp(0.0, max_x) };
    let y = if shape.y.is_nan() { 0.0 } else { shape.y.clamp(0.0, max_y) };

    Shape { x, y, ..shape }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupId;
    use proptest::prelude::*;

    fn group(id: u64, shapes: Vec<Shape>) -> Group {
        Group {
            id: GroupId(id),
            name: format!("g{}", id),
            price: 10.0,
            shapes,
        }
    }

    #[test]
    fn corners_normalize_to_min_corner() {
        let down_right = Shape::from_corners(Point::new(20., 20.), Point::new(80., 80.));
        let up_left = Shape::from_corners(Point::new(80., 80.), Point::new(20., 20.));

        assert_eq!(down_right, up_left);
        assert_eq!(down_right, Shape::new(20., 20., 60., 60.));
    }

    #[test]
    fn containment_is_inclusive() {
        let s = Shape::new(10., 10., 20., 20.);
        assert!(s.contains(Point::new(10., 10.)));
        assert!(s.contains(Point::new(30., 30.)));
        assert!(!s.contains(Point::new(30.01, 30.)));
    }

    #[test]
    fn overlap_goes_to_earlier_group() {
        let groups = vec![
            group(1, vec![Shape::new(10., 10., 40., 40.)]),
            group(2, vec![Shape::new(30., 30., 40., 40.)]),
        ];

        for _ in 0..5 {
            assert_eq!(hit_test(Point::new(35., 35.), &groups).map(|g| g.id), Some(GroupId(1)));
        }
        assert_eq!(hit_test(Point::new(65., 65.), &groups).map(|g| g.id), Some(GroupId(2)));
        assert!(hit_test(Point::new(90., 5.), &groups).is_none());
    }

    #[test]
    fn any_shape_of_a_group_hits() {
        let groups = vec![group(
            7,
            vec![Shape::new(0., 0., 10., 10.), Shape::new(80., 80., 10., 10.)],
        )];
        assert_eq!(hit_test_index(Point::new(85., 85.), &groups), Some(0));
    }

    #[test]
    fn invalid_shapes_are_not_hit() {
        let groups = vec![group(
            1,
            vec![Shape::new(10., 10., 0., 20.), Shape::new(90., 90., 20., 20.)],
        )];
        assert!(hit_test(Point::new(10., 15.), &groups).is_none());
        assert!(hit_test(Point::new(95., 95.), &groups).is_none());
    }

    #[test]
    fn clamp_pulls_back_inside() {
        assert_eq!(
            clamp_shape(Shape::new(-5., 95., 10., 10.)),
            Shape::new(0., 90., 10., 10.)
        );
    }

    #[test]
    fn to_percentage_degenerate_surface() {
        assert_eq!(to_percentage(egui::pos2(5., 5.), 0., 10.), Point::default());
    }

    proptest! {
        #[test]
        fn clamp_keeps_shape_in_bounds(
            x in -200.0f64..200.0,
            y in -200.0f64..200.0,
            w in 0.01f64..100.0,
            h in 0.01f64..100.0,
        ) {
            let s = clamp_shape(Shape::new(x, y, w, h));
            prop_assert!(s.x >= 0.0);
            prop_assert!(s.y >= 0.0);
            prop_assert!(s.x + s.width <= PERCENT_MAX + BOUNDS_EPSILON);
            prop_assert!(s.y + s.height <= PERCENT_MAX + BOUNDS_EPSILON);
            prop_assert_eq!(s.width, w);
            prop_assert_eq!(s.height, h);
        }

        #[test]
        fn layout_round_trip(
            x in 0.0f64..50.0,
            y in 0.0f64..50.0,
            w in 0.1f64..50.0,
            h in 0.1f64..50.0,
            lw in 10.0f32..4000.0,
            lh in 10.0f32..4000.0,
        ) {
            let shape = Shape::new(x, y, w, h);
            let rect = to_layout(&shape, lw, lh);
            let min = to_percentage(rect.min, lw, lh);
            let max = to_percentage(rect.max, lw, lh);

            let tol = 1e-3;
            prop_assert!((min.x - x).abs() < tol);
            prop_assert!((min.y - y).abs() < tol);
            prop_assert!((max.x - min.x - w).abs() < tol);
            prop_assert!((max.y - min.y - h).abs() < tol);
        }

        #[test]
        fn strictly_inside_hits_outside_misses(
            x in 0.0f64..80.0,
            y in 0.0f64..80.0,
            w in 1.0f64..20.0,
            h in 1.0f64..20.0,
            fx in 0.01f64..0.99,
            fy in 0.01f64..0.99,
        ) {
            let groups = vec![group(3, vec![Shape::new(x, y, w, h)])];
            let inside = Point::new(x + w * fx, y + h * fy);
            prop_assert_eq!(hit_test(inside, &groups).map(|g| g.id), Some(GroupId(3)));

            let outside = Point::new(x + w + 0.5, y + h * fy);
            prop_assert!(hit_test(outside, &groups).is_none());
        }
    }
}

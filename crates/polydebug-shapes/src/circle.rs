//! Circle shape with a clamped, non-negative radius.

use crate::geometry::{closed_loop, Edge, Vec2};
use crate::hook::ChangeHook;
use crate::shape::Shape;
use crate::ShapeError;

/// Radius of a freshly created circle.
pub const DEFAULT_RADIUS: f32 = 1.0;

/// Number of chords used when a circle describes its outline.
pub const CIRCLE_OUTLINE_SEGMENTS: usize = 32;

/// A circle centred on its local origin.
#[derive(Debug)]
pub struct Circle {
    radius: f32,
    changed: ChangeHook,
}

impl Default for Circle {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            changed: ChangeHook::new(),
        }
    }
}

impl Circle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circle with an initial radius (clamped to `>= 0`).
    pub fn with_radius(radius: f32) -> Self {
        Self {
            radius: radius.max(0.0),
            changed: ChangeHook::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Assign the radius.
    ///
    /// A request equal to the stored radius does nothing. Anything else
    /// stores `max(radius, 0)` and notifies, so requesting `-5.0` twice in a
    /// row notifies twice even though the stored value stays `0.0` (the
    /// comparison is against the stored value, not the clamped request).
    /// NaN clamps to `0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Observer`] if a change callback fails.
    pub fn set_radius(&mut self, radius: f32) -> Result<(), ShapeError> {
        if radius == self.radius {
            return Ok(());
        }
        self.radius = radius.max(0.0);
        tracing::trace!(requested = radius, stored = self.radius, "circle radius set");
        self.changed.notify()
    }

    /// Raw inspector write, then [`validate`](Shape::validate), which clamps
    /// the stored value to `>= 0` and notifies.
    pub fn apply_external_edit(&mut self, radius: f32) -> Result<(), ShapeError> {
        self.radius = radius;
        self.validate()
    }

    /// Points on the circle at [`CIRCLE_OUTLINE_SEGMENTS`] even angles.
    /// Empty when the radius is not positive.
    pub fn outline_points(&self) -> Vec<Vec2> {
        if self.radius.is_nan() || self.radius <= 0.0 {
            return Vec::new();
        }
        (0..CIRCLE_OUTLINE_SEGMENTS)
            .map(|i| {
                let theta = i as f32 / CIRCLE_OUTLINE_SEGMENTS as f32 * std::f32::consts::TAU;
                Vec2::new(self.radius * theta.cos(), self.radius * theta.sin())
            })
            .collect()
    }
}

impl Shape for Circle {
    fn changed(&self) -> &ChangeHook {
        &self.changed
    }

    fn changed_mut(&mut self) -> &mut ChangeHook {
        &mut self.changed
    }

    fn outline(&self) -> Vec<Edge> {
        closed_loop(&self.outline_points()).collect()
    }

    fn validate(&mut self) -> Result<(), ShapeError> {
        self.radius = self.radius.max(0.0);
        self.changed.notify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_radius_is_one() {
        assert_eq!(Circle::new().radius(), 1.0);
    }

    #[test]
    fn with_radius_clamps() {
        assert_eq!(Circle::with_radius(-2.0).radius(), 0.0);
    }

    #[test]
    fn nan_request_clamps_to_zero() {
        let mut circle = Circle::new();
        circle.set_radius(f32::NAN).unwrap();
        assert_eq!(circle.radius(), 0.0);
    }

    #[test]
    fn external_edit_is_clamped_by_validate() {
        let mut circle = Circle::new();
        circle.apply_external_edit(-2.5).unwrap();
        assert_eq!(circle.radius(), 0.0);
        circle.apply_external_edit(f32::NAN).unwrap();
        assert_eq!(circle.radius(), 0.0);
    }

    #[test]
    fn outline_has_fixed_segment_count() {
        let circle = Circle::with_radius(2.0);
        let outline = circle.outline();
        assert_eq!(outline.len(), CIRCLE_OUTLINE_SEGMENTS);
        for edge in &outline {
            assert!((edge.start.length() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_radius_has_no_outline() {
        assert!(Circle::with_radius(0.0).outline().is_empty());
    }
}

//! polydebug shapes -- 2D shape data with change notification.
//!
//! This crate owns the geometric data that the debug renderer draws:
//! [`Polygon`](polygon::Polygon) (an ordered vertex loop, defaulting to a
//! unit square) and [`Circle`](circle::Circle) (a clamped radius). Every
//! shape carries a [`ChangeHook`](hook::ChangeHook) that fires once per
//! meaningful mutation, so consumers can treat shapes as passive data and
//! re-read them whenever they are told something moved.
//!
//! # Quick Start
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use polydebug_shapes::prelude::*;
//!
//! let mut circle = Circle::new();
//! let fired = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&fired);
//! circle.changed_mut().subscribe_infallible(move || counter.set(counter.get() + 1));
//!
//! circle.set_radius(1.0).unwrap(); // same value: nothing happens
//! circle.set_radius(-3.0).unwrap(); // clamped to 0, notifies
//! assert_eq!(circle.radius(), 0.0);
//! assert_eq!(fired.get(), 1);
//! ```

#![deny(unsafe_code)]

pub mod circle;
pub mod geometry;
pub mod hook;
pub mod polygon;
pub mod shape;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by shape mutations.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// A vertex sequence was required but none was given.
    #[error("vertices must not be absent")]
    MissingVertices,

    /// A checked assignment was given a sequence with no points.
    #[error("vertices must contain at least one point")]
    EmptyVertices,

    /// A change callback failed. Callbacks registered after it did not run.
    #[error("change observer {hook} failed: {source}")]
    Observer {
        hook: hook::HookId,
        source: hook::ObserverError,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::circle::{Circle, CIRCLE_OUTLINE_SEGMENTS, DEFAULT_RADIUS};
    pub use crate::geometry::{closed_loop, Edge, Vec2};
    pub use crate::hook::{ChangeCallback, ChangeHook, HookId, ObserverError};
    pub use crate::polygon::{default_vertices, Polygon, Vertices, DEFAULT_VERTICES};
    pub use crate::shape::{AnyShape, Shape, ShapeKind};
    pub use crate::ShapeError;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn any_shape_dispatches_to_inner_shape() {
        let mut shape = AnyShape::from(Polygon::new());
        assert_eq!(shape.kind(), ShapeKind::Polygon);
        assert_eq!(shape.outline().len(), 4);
        assert!(shape.as_circle().is_none());

        shape.changed_mut().subscribe_infallible(|| {});
        assert_eq!(shape.changed().len(), 1);
        assert_eq!(shape.as_polygon().map(|p| p.changed().len()), Some(1));
    }

    #[test]
    fn any_shape_validate_notifies_circle() {
        let mut shape = AnyShape::from(Circle::with_radius(3.0));
        let count = std::rc::Rc::new(std::cell::Cell::new(0));
        let c = std::rc::Rc::clone(&count);
        shape.changed_mut().subscribe_infallible(move || c.set(c.get() + 1));
        shape.validate().unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(shape.as_circle().map(Circle::radius), Some(3.0));
    }

    #[test]
    fn error_messages_are_readable() {
        assert_eq!(ShapeError::MissingVertices.to_string(), "vertices must not be absent");
        assert_eq!(
            ShapeError::EmptyVertices.to_string(),
            "vertices must contain at least one point"
        );
    }
}

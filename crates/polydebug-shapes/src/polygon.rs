//! Closed polygon defined by an ordered vertex loop.
//!
//! Vertices are held as a shared [`Vertices`] slice. Assignment compares by
//! reference ([`Arc::ptr_eq`]), not by value: handing the polygon the exact
//! sequence it already holds is a no-op, while a freshly built sequence
//! always counts as a change even if its points happen to match.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use polydebug_shapes::prelude::*;
//!
//! let mut polygon = Polygon::new();
//! assert_eq!(polygon.len(), 4); // unit square until told otherwise
//!
//! let triangle: Vertices = Arc::from(vec![
//!     Vec2::new(0.0, 1.0),
//!     Vec2::new(-1.0, -1.0),
//!     Vec2::new(1.0, -1.0),
//! ]);
//! polygon.set_vertices(Some(triangle)).unwrap();
//! assert_eq!(polygon.edges().count(), 3);
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;

use crate::geometry::{closed_loop, Edge, Vec2};
use crate::hook::ChangeHook;
use crate::shape::Shape;
use crate::ShapeError;

/// Shared, reference-counted vertex sequence.
pub type Vertices = Arc<[Vec2]>;

/// Unit square, counter-clockwise, starting in the top-right corner.
pub const DEFAULT_VERTICES: [Vec2; 4] = [
    Vec2::new(0.5, 0.5),
    Vec2::new(-0.5, 0.5),
    Vec2::new(-0.5, -0.5),
    Vec2::new(0.5, -0.5),
];

static SHARED_DEFAULT: Lazy<Vertices> = Lazy::new(|| Arc::from(DEFAULT_VERTICES));

/// The process-wide default sequence. Every defaulted polygon holds a clone
/// of this one allocation.
pub fn default_vertices() -> Vertices {
    Arc::clone(&SHARED_DEFAULT)
}

// ---------------------------------------------------------------------------
// Polygon
// ---------------------------------------------------------------------------

/// A polygon shape.
///
/// The vertex slot starts empty and is filled with the shared default on the
/// first read, so a polygon whose vertices are injected before anyone looks
/// never touches the default.
#[derive(Debug, Default)]
pub struct Polygon {
    vertices: OnceCell<Vertices>,
    changed: ChangeHook,
}

impl Polygon {
    /// Create a polygon with no vertices assigned yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a polygon that already holds `vertices`. No notification is
    /// sent since nobody can be subscribed yet.
    pub fn with_vertices(vertices: impl Into<Vertices>) -> Self {
        Self {
            vertices: OnceCell::from(vertices.into()),
            changed: ChangeHook::new(),
        }
    }

    /// Current vertex sequence, assigning the default square on first read.
    pub fn vertices(&self) -> &Vertices {
        self.vertices.get_or_init(default_vertices)
    }

    /// Whether a sequence has been assigned (explicitly or by a read).
    pub fn has_vertices(&self) -> bool {
        self.vertices.get().is_some()
    }

    /// Replace the vertex sequence.
    ///
    /// Passing the sequence the polygon already holds does nothing. Any other
    /// sequence is stored and the change hook fires once.
    ///
    /// # Errors
    ///
    /// - [`ShapeError::MissingVertices`] if `vertices` is `None`.
    /// - [`ShapeError::EmptyVertices`] if the sequence has no points.
    /// - [`ShapeError::Observer`] if a change callback fails. The new
    ///   sequence is already stored at that point.
    ///
    /// On the first two the previous sequence is untouched.
    pub fn set_vertices(&mut self, vertices: Option<Vertices>) -> Result<(), ShapeError> {
        let vertices = vertices.ok_or(ShapeError::MissingVertices)?;
        if vertices.is_empty() {
            return Err(ShapeError::EmptyVertices);
        }
        if let Some(current) = self.vertices.get() {
            if Arc::ptr_eq(current, &vertices) {
                return Ok(());
            }
        }
        tracing::trace!(count = vertices.len(), "polygon vertices replaced");
        self.vertices = OnceCell::from(vertices);
        self.changed.notify()
    }

    /// Write the raw vertex slot the way a host inspector or deserializer
    /// would, then run [`validate`](Shape::validate).
    ///
    /// No checks apply: `None` falls back to the default square and an empty
    /// sequence is stored as-is. Always notifies.
    pub fn apply_external_edit(&mut self, vertices: Option<Vertices>) -> Result<(), ShapeError> {
        self.vertices = match vertices {
            Some(vertices) => OnceCell::from(vertices),
            None => OnceCell::new(),
        };
        self.validate()
    }

    /// Number of vertices (and therefore edges).
    pub fn len(&self) -> usize {
        self.vertices().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices().is_empty()
    }

    /// Edges of the closed loop, in local space, with wraparound.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        closed_loop(self.vertices())
    }
}

impl Shape for Polygon {
    fn changed(&self) -> &ChangeHook {
        &self.changed
    }

    fn changed_mut(&mut self) -> &mut ChangeHook {
        &mut self.changed
    }

    fn outline(&self) -> Vec<Edge> {
        self.edges().collect()
    }

    /// External edits cannot be diffed, so this always notifies.
    fn validate(&mut self) -> Result<(), ShapeError> {
        self.vertices.get_or_init(default_vertices);
        self.changed.notify()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_read_assigns_shared_default() {
        let polygon = Polygon::new();
        assert!(!polygon.has_vertices());
        let first = Arc::clone(polygon.vertices());
        assert!(polygon.has_vertices());
        assert!(Arc::ptr_eq(&first, &default_vertices()));
    }

    #[test]
    fn injected_vertices_skip_the_default() {
        let polygon = Polygon::with_vertices(vec![Vec2::ZERO, Vec2::new(1.0, 0.0)]);
        assert_eq!(polygon.len(), 2);
        assert!(!Arc::ptr_eq(polygon.vertices(), &default_vertices()));
    }

    #[test]
    fn empty_sequence_rejected_on_checked_path() {
        let mut polygon = Polygon::new();
        let err = polygon.set_vertices(Some(Arc::from(Vec::new()))).unwrap_err();
        assert!(matches!(err, ShapeError::EmptyVertices));
        assert_eq!(polygon.len(), 4);
    }

    #[test]
    fn external_edit_can_store_empty_sequence() {
        let mut polygon = Polygon::new();
        polygon.apply_external_edit(Some(Arc::from(Vec::new()))).unwrap();
        assert!(polygon.is_empty());
        assert_eq!(polygon.edges().count(), 0);
    }

    #[test]
    fn external_edit_with_nothing_restores_default() {
        let mut polygon = Polygon::with_vertices(vec![Vec2::ZERO; 3]);
        polygon.apply_external_edit(None).unwrap();
        assert!(Arc::ptr_eq(polygon.vertices(), &default_vertices()));
    }
}

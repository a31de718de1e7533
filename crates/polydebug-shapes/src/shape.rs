//! The [`Shape`] capability trait and the [`AnyShape`] variant.

use crate::circle::Circle;
use crate::geometry::Edge;
use crate::hook::ChangeHook;
use crate::polygon::Polygon;
use crate::ShapeError;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A renderable 2D shape with a change-notification contract.
///
/// Implementors fire [`changed_mut`](Shape::changed_mut)'s hook exactly once
/// per mutation that alters derived data, and never on a write that leaves
/// the shape as it was.
pub trait Shape {
    /// The hook fired when this shape's data changes.
    fn changed(&self) -> &ChangeHook;

    /// Mutable access to the hook, for subscribing and unsubscribing.
    fn changed_mut(&mut self) -> &mut ChangeHook;

    /// Closed outline in local space.
    fn outline(&self) -> Vec<Edge>;

    /// Re-establish invariants after a host wrote raw fields directly
    /// (inspector edit, deserialization), then notify.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Observer`] if a change callback fails.
    fn validate(&mut self) -> Result<(), ShapeError>;
}

// ---------------------------------------------------------------------------
// AnyShape
// ---------------------------------------------------------------------------

/// Discriminant of an [`AnyShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    Polygon,
    Circle,
}

/// Either concrete shape, for hosts that store shapes heterogeneously.
#[derive(Debug)]
pub enum AnyShape {
    Polygon(Polygon),
    Circle(Circle),
}

impl AnyShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            AnyShape::Polygon(_) => ShapeKind::Polygon,
            AnyShape::Circle(_) => ShapeKind::Circle,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            AnyShape::Polygon(polygon) => Some(polygon),
            AnyShape::Circle(_) => None,
        }
    }

    pub fn as_polygon_mut(&mut self) -> Option<&mut Polygon> {
        match self {
            AnyShape::Polygon(polygon) => Some(polygon),
            AnyShape::Circle(_) => None,
        }
    }

    pub fn as_circle(&self) -> Option<&Circle> {
        match self {
            AnyShape::Circle(circle) => Some(circle),
            AnyShape::Polygon(_) => None,
        }
    }

    pub fn as_circle_mut(&mut self) -> Option<&mut Circle> {
        match self {
            AnyShape::Circle(circle) => Some(circle),
            AnyShape::Polygon(_) => None,
        }
    }

    fn as_dyn(&self) -> &dyn Shape {
        match self {
            AnyShape::Polygon(polygon) => polygon,
            AnyShape::Circle(circle) => circle,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn Shape {
        match self {
            AnyShape::Polygon(polygon) => polygon,
            AnyShape::Circle(circle) => circle,
        }
    }
}

impl Shape for AnyShape {
    fn changed(&self) -> &ChangeHook {
        self.as_dyn().changed()
    }

    fn changed_mut(&mut self) -> &mut ChangeHook {
        self.as_dyn_mut().changed_mut()
    }

    fn outline(&self) -> Vec<Edge> {
        self.as_dyn().outline()
    }

    fn validate(&mut self) -> Result<(), ShapeError> {
        self.as_dyn_mut().validate()
    }
}

impl From<Polygon> for AnyShape {
    fn from(polygon: Polygon) -> Self {
        AnyShape::Polygon(polygon)
    }
}

impl From<Circle> for AnyShape {
    fn from(circle: Circle) -> Self {
        AnyShape::Circle(circle)
    }
}

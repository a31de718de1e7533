//! 2D affine transforms for placing shapes in the world.

use polydebug_shapes::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

// ---------------------------------------------------------------------------
// Affine2
// ---------------------------------------------------------------------------

/// A 2D affine transform stored as two basis columns and a translation.
///
/// A point `p` maps to `x_axis * p.x + y_axis * p.y + translation`.
/// `a * b` applies `b` first, then `a`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub x_axis: Vec2,
    pub y_axis: Vec2,
    pub translation: Vec2,
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        x_axis: Vec2::new(1.0, 0.0),
        y_axis: Vec2::new(0.0, 1.0),
        translation: Vec2::ZERO,
    };

    pub fn from_translation(translation: Vec2) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Counter-clockwise rotation by `radians`.
    pub fn from_rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            x_axis: Vec2::new(cos, sin),
            y_axis: Vec2::new(-sin, cos),
            translation: Vec2::ZERO,
        }
    }

    pub fn from_scale(scale: Vec2) -> Self {
        Self {
            x_axis: Vec2::new(scale.x, 0.0),
            y_axis: Vec2::new(0.0, scale.y),
            translation: Vec2::ZERO,
        }
    }

    /// Scale, then rotate, then translate.
    pub fn from_scale_rotation_translation(scale: Vec2, radians: f32, translation: Vec2) -> Self {
        Self::from_translation(translation) * Self::from_rotation(radians) * Self::from_scale(scale)
    }

    /// Map a point (translation applies).
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.x_axis * p.x + self.y_axis * p.y + self.translation
    }

    /// Map a direction (translation ignored).
    #[inline]
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        self.x_axis * v.x + self.y_axis * v.y
    }

    /// Column-major 4x4 matrix with z passed through, for GPU upload.
    pub fn to_mat4(&self) -> [f32; 16] {
        let (x, y, t) = (self.x_axis, self.y_axis, self.translation);
        [
            x.x, x.y, 0.0, 0.0, // column 0
            y.x, y.y, 0.0, 0.0, // column 1
            0.0, 0.0, 1.0, 0.0, // column 2
            t.x, t.y, 0.0, 1.0, // column 3
        ]
    }

    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.x_axis.abs_diff_eq(other.x_axis, epsilon)
            && self.y_axis.abs_diff_eq(other.y_axis, epsilon)
            && self.translation.abs_diff_eq(other.translation, epsilon)
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Affine2 {
    type Output = Affine2;

    fn mul(self, rhs: Affine2) -> Affine2 {
        Affine2 {
            x_axis: self.transform_vector(rhs.x_axis),
            y_axis: self.transform_vector(rhs.y_axis),
            translation: self.transform_point(rhs.translation),
        }
    }
}

// ---------------------------------------------------------------------------
// Transform2D
// ---------------------------------------------------------------------------

/// A node's local placement relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform2D {
    pub translation: Vec2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    pub fn from_translation(translation: Vec2) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

//! Line-drawing primitives supplied by the host.
//!
//! Two primitives back the two pipelines:
//!
//! - [`GizmoLines`]: an immediate-mode, world-space line drawer with an
//!   ambient color (the editor overlay). [`ColorScope`] changes that color
//!   for a scope and puts the previous one back on drop.
//! - [`GpuLines`]: a retained GPU line batch with a model-matrix stack,
//!   explicit `begin`/`end` brackets, and a bound line material.
//!
//! [`LineAssembler`] turns the [`GpuLines`] call stream into world-space
//! [`LineSegment`]s; both the recording backend and the wgpu backend use it.

use std::ops::{Deref, DerefMut};

use polydebug_shapes::geometry::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Color;
use crate::transform::Affine2;
use crate::RenderError;

// ---------------------------------------------------------------------------
// LineSegment
// ---------------------------------------------------------------------------

/// A finished world-space line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub from: Vec2,
    pub to: Vec2,
    pub color: Color,
}

// ---------------------------------------------------------------------------
// GizmoLines
// ---------------------------------------------------------------------------

/// Immediate-mode line drawing for the editor overlay.
pub trait GizmoLines {
    /// The ambient color used by [`draw_line`](Self::draw_line).
    fn color(&self) -> Color;

    fn set_color(&mut self, color: Color);

    /// Draw a world-space line in the ambient color.
    fn draw_line(&mut self, from: Vec2, to: Vec2);
}

/// Sets a [`GizmoLines`] color for a scope and restores the previous color
/// when dropped, including on early return.
pub struct ColorScope<'a, G: GizmoLines + ?Sized> {
    gizmos: &'a mut G,
    saved: Color,
}

impl<'a, G: GizmoLines + ?Sized> ColorScope<'a, G> {
    pub fn new(gizmos: &'a mut G, color: Color) -> Self {
        let saved = gizmos.color();
        gizmos.set_color(color);
        Self { gizmos, saved }
    }

    /// The color that will be restored.
    pub fn saved(&self) -> Color {
        self.saved
    }
}

impl<G: GizmoLines + ?Sized> Deref for ColorScope<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.gizmos
    }
}

impl<G: GizmoLines + ?Sized> DerefMut for ColorScope<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.gizmos
    }
}

impl<G: GizmoLines + ?Sized> Drop for ColorScope<'_, G> {
    fn drop(&mut self) {
        self.gizmos.set_color(self.saved);
    }
}

// ---------------------------------------------------------------------------
// Line material
// ---------------------------------------------------------------------------

/// Handle to a line material allocated by a [`GpuLines`] backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// Source replaces destination.
    Opaque,
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    AlphaBlend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CullMode {
    Off,
    Back,
    Front,
}

/// Render state requested for a line material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineMaterialDescriptor {
    pub label: &'static str,
    pub blend: BlendMode,
    pub cull: CullMode,
    pub depth_write: bool,
}

impl LineMaterialDescriptor {
    /// Colored debug lines: alpha blended, never culled, no depth writes.
    /// Outlines stay visible whatever their winding or depth.
    pub const DEBUG_LINES: Self = Self {
        label: "polydebug_lines",
        blend: BlendMode::AlphaBlend,
        cull: CullMode::Off,
        depth_write: false,
    };
}

// ---------------------------------------------------------------------------
// GpuLines
// ---------------------------------------------------------------------------

/// A GPU line batch, driven like a classic immediate-mode GL context.
///
/// Vertices are given in the space of the current model matrix; pairs of
/// vertices inside a `begin_lines`/`end` bracket form one segment each.
pub trait GpuLines {
    /// Allocate a line material.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MaterialCreation`] if the backend cannot honour
    /// the descriptor.
    fn create_line_material(
        &mut self,
        descriptor: &LineMaterialDescriptor,
    ) -> Result<MaterialId, RenderError>;

    /// Bind `material` for subsequent batches.
    fn set_pass(&mut self, material: MaterialId);

    /// Push a copy of the current model matrix multiplied by `model`.
    fn push_matrix(&mut self, model: &Affine2);

    fn pop_matrix(&mut self);

    fn begin_lines(&mut self);

    /// Color for the following vertices.
    fn color(&mut self, color: Color);

    fn vertex(&mut self, x: f32, y: f32, z: f32);

    fn end(&mut self);
}

// ---------------------------------------------------------------------------
// LineAssembler
// ---------------------------------------------------------------------------

/// Turns a [`GpuLines`] call stream into world-space segments.
///
/// Each segment takes the color current when its second vertex arrives.
/// `z` is dropped. A vertex outside a batch, or an unpaired vertex at `end`,
/// is discarded.
#[derive(Debug, Clone, Default)]
pub struct LineAssembler {
    stack: Vec<Affine2>,
    color: Color,
    in_batch: bool,
    pending: Option<Vec2>,
    segments: Vec<LineSegment>,
    discarded: usize,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current model matrix (identity when the stack is empty).
    pub fn current(&self) -> Affine2 {
        self.stack.last().copied().unwrap_or(Affine2::IDENTITY)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push_matrix(&mut self, model: &Affine2) {
        let top = self.current() * *model;
        self.stack.push(top);
    }

    /// Returns `false` if the stack was already empty.
    pub fn pop_matrix(&mut self) -> bool {
        self.stack.pop().is_some()
    }

    pub fn begin(&mut self) {
        self.in_batch = true;
        self.pending = None;
    }

    pub fn color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn vertex(&mut self, x: f32, y: f32) {
        if !self.in_batch {
            self.discarded += 1;
            return;
        }
        let point = Vec2::new(x, y);
        match self.pending.take() {
            None => self.pending = Some(point),
            Some(start) => {
                let model = self.current();
                self.segments.push(LineSegment {
                    from: model.transform_point(start),
                    to: model.transform_point(point),
                    color: self.color,
                });
            }
        }
    }

    pub fn end(&mut self) {
        if self.pending.take().is_some() {
            self.discarded += 1;
        }
        self.in_batch = false;
    }

    pub fn in_batch(&self) -> bool {
        self.in_batch
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    /// Vertices dropped because they were outside a batch or unpaired.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Hand over the finished segments, leaving the assembler empty of them.
    pub fn take_segments(&mut self) -> Vec<LineSegment> {
        std::mem::take(&mut self.segments)
    }
}

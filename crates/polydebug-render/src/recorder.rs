//! Recording implementations of the draw primitives.
//!
//! Headless hosts and tests drive the renderer against these instead of a
//! real editor overlay or GPU. [`GpuLineRecorder`] keeps both the raw call
//! log and the segments it assembles.

use polydebug_shapes::geometry::Vec2;

use crate::config::Color;
use crate::draw::{GizmoLines, GpuLines, LineAssembler, LineMaterialDescriptor, LineSegment, MaterialId};
use crate::transform::Affine2;
use crate::RenderError;

// ---------------------------------------------------------------------------
// GizmoRecorder
// ---------------------------------------------------------------------------

/// Records every gizmo line with the ambient color at the time it was drawn.
#[derive(Debug, Clone, Default)]
pub struct GizmoRecorder {
    color: Color,
    lines: Vec<LineSegment>,
}

impl GizmoRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a specific ambient color.
    pub fn with_color(color: Color) -> Self {
        Self {
            color,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[LineSegment] {
        &self.lines
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl GizmoLines for GizmoRecorder {
    fn color(&self) -> Color {
        self.color
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2) {
        self.lines.push(LineSegment {
            from,
            to,
            color: self.color,
        });
    }
}

// ---------------------------------------------------------------------------
// GpuLineRecorder
// ---------------------------------------------------------------------------

/// One call made against a [`GpuLineRecorder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpuCall {
    CreateMaterial(MaterialId),
    SetPass(MaterialId),
    PushMatrix(Affine2),
    PopMatrix,
    Begin,
    Color(Color),
    Vertex(f32, f32, f32),
    End,
}

/// Records [`GpuLines`] calls and assembles them into world-space segments.
#[derive(Debug, Clone, Default)]
pub struct GpuLineRecorder {
    calls: Vec<GpuCall>,
    assembler: LineAssembler,
    materials_created: u64,
    bound: Option<MaterialId>,
    fail_materials: bool,
}

impl GpuLineRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose material creation always fails.
    pub fn failing() -> Self {
        Self {
            fail_materials: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub fn segments(&self) -> &[LineSegment] {
        self.assembler.segments()
    }

    /// Number of `create_line_material` calls that succeeded.
    pub fn materials_created(&self) -> u64 {
        self.materials_created
    }

    /// The material bound by the last `set_pass`.
    pub fn bound_material(&self) -> Option<MaterialId> {
        self.bound
    }

    /// Current model-matrix stack depth. Zero after a balanced frame.
    pub fn matrix_depth(&self) -> usize {
        self.assembler.depth()
    }

    /// Count the calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Drop the recorded calls and segments, keeping material bookkeeping.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.assembler = LineAssembler::new();
    }
}

impl GpuLines for GpuLineRecorder {
    fn create_line_material(
        &mut self,
        descriptor: &LineMaterialDescriptor,
    ) -> Result<MaterialId, RenderError> {
        if self.fail_materials {
            return Err(RenderError::MaterialCreation {
                label: descriptor.label.to_owned(),
                details: "material creation disabled on this recorder".to_owned(),
            });
        }
        self.materials_created += 1;
        let id = MaterialId(self.materials_created);
        self.calls.push(GpuCall::CreateMaterial(id));
        Ok(id)
    }

    fn set_pass(&mut self, material: MaterialId) {
        self.bound = Some(material);
        self.calls.push(GpuCall::SetPass(material));
    }

    fn push_matrix(&mut self, model: &Affine2) {
        self.assembler.push_matrix(model);
        self.calls.push(GpuCall::PushMatrix(*model));
    }

    fn pop_matrix(&mut self) {
        self.assembler.pop_matrix();
        self.calls.push(GpuCall::PopMatrix);
    }

    fn begin_lines(&mut self) {
        self.assembler.begin();
        self.calls.push(GpuCall::Begin);
    }

    fn color(&mut self, color: Color) {
        self.assembler.color(color);
        self.calls.push(GpuCall::Color(color));
    }

    fn vertex(&mut self, x: f32, y: f32, z: f32) {
        self.assembler.vertex(x, y);
        self.calls.push(GpuCall::Vertex(x, y, z));
    }

    fn end(&mut self) {
        self.assembler.end();
        self.calls.push(GpuCall::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gizmo_recorder_tags_lines_with_ambient_color() {
        let mut gizmos = GizmoRecorder::with_color(Color::BLACK);
        gizmos.draw_line(Vec2::ZERO, Vec2::new(1.0, 0.0));
        gizmos.set_color(Color::WHITE);
        gizmos.draw_line(Vec2::ZERO, Vec2::new(0.0, 1.0));
        let colors: Vec<Color> = gizmos.lines().iter().map(|l| l.color).collect();
        assert_eq!(colors, vec![Color::BLACK, Color::WHITE]);
    }

    #[test]
    fn gpu_recorder_logs_calls_in_order() {
        let mut gpu = GpuLineRecorder::new();
        let id = gpu
            .create_line_material(&LineMaterialDescriptor::DEBUG_LINES)
            .unwrap();
        gpu.set_pass(id);
        gpu.push_matrix(&Affine2::IDENTITY);
        gpu.begin_lines();
        gpu.color(Color::WHITE);
        gpu.vertex(0.0, 0.0, 0.0);
        gpu.vertex(1.0, 1.0, 0.0);
        gpu.end();
        gpu.pop_matrix();

        assert_eq!(gpu.calls().len(), 9);
        assert_eq!(gpu.calls()[0], GpuCall::CreateMaterial(id));
        assert_eq!(gpu.bound_material(), Some(id));
        assert_eq!(gpu.segments().len(), 1);
        assert_eq!(gpu.matrix_depth(), 0);
        assert_eq!(gpu.count(|c| matches!(c, GpuCall::Vertex(..))), 2);
    }

    #[test]
    fn failing_recorder_reports_material_error() {
        let mut gpu = GpuLineRecorder::failing();
        let err = gpu
            .create_line_material(&LineMaterialDescriptor::DEBUG_LINES)
            .unwrap_err();
        assert!(err.to_string().contains("polydebug_lines"));
        assert!(gpu.calls().is_empty());
    }
}

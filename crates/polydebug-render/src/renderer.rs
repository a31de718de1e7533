//! The polygon debug renderer.
//!
//! [`PolygonDebugRenderer`] draws the outline of every polygon under a root
//! node. The host drives it through [`FrameDriver`]:
//!
//! 1. [`on_activate`](FrameDriver::on_activate) and
//!    [`on_children_changed`](FrameDriver::on_children_changed) rebuild the
//!    discovered polygon list from the root's subtree.
//! 2. [`draw_preview`](FrameDriver::draw_preview) runs the editor overlay
//!    with selection highlighting.
//! 3. [`draw_runtime`](FrameDriver::draw_runtime) runs the GPU line batch
//!    through the shared line material.
//!
//! [`step_frame`] is the per-frame sequence a runtime host loop uses: run the
//! host update, rebuild the list if the update changed the scene's
//! structure, then draw.
//!
//! Each entry point runs exactly one pipeline, gated by the toggle in
//! [`DebugDrawConfig`] for its [`DrawContext`]. Shape activity is checked
//! per polygon on every frame, so toggling a node never needs a rebuild.

use std::sync::Arc;

use polydebug_shapes::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{Color, DebugDrawConfig};
use crate::draw::{ColorScope, GizmoLines, GpuLines, LineMaterialDescriptor};
use crate::material::SharedLineMaterial;
use crate::scene::{NodeId, SceneGraph, SelectionSet};
use crate::RenderError;

// ---------------------------------------------------------------------------
// Draw context
// ---------------------------------------------------------------------------

/// Where the runtime pipeline is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostKind {
    /// Play mode inside the editor.
    Editor,
    /// A packaged build.
    Build,
}

/// The three contexts a draw can be invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawContext {
    /// Editor scene view (preview pipeline).
    ScenePreview,
    /// Play mode in the editor (GPU pipeline).
    LiveInEditor,
    /// Packaged build (GPU pipeline).
    LiveInBuild,
}

impl DrawContext {
    pub fn runtime(host: HostKind) -> Self {
        match host {
            HostKind::Editor => Self::LiveInEditor,
            HostKind::Build => Self::LiveInBuild,
        }
    }

    /// The visibility toggle for this context.
    pub fn is_enabled(self, config: &DebugDrawConfig) -> bool {
        match self {
            Self::ScenePreview => config.draw_in_scene_view,
            Self::LiveInEditor => config.draw_in_play_mode,
            Self::LiveInBuild => config.draw_in_build,
        }
    }
}

/// Per-frame counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawStats {
    /// Polygons whose outline was emitted.
    pub polygons_drawn: usize,
    /// Listed polygons skipped as inactive, disabled, unknown, or empty.
    pub polygons_skipped: usize,
    /// Line segments emitted.
    pub segments: usize,
}

// ---------------------------------------------------------------------------
// FrameDriver
// ---------------------------------------------------------------------------

/// Lifecycle and per-frame entry points the host calls.
pub trait FrameDriver {
    /// The renderer became active in the scene.
    fn on_activate(&mut self, scene: &dyn SceneGraph);

    /// The root's direct children changed.
    fn on_children_changed(&mut self, scene: &dyn SceneGraph);

    /// Editor overlay pass. A no-op when the scene-view toggle is off.
    fn draw_preview(
        &mut self,
        scene: &dyn SceneGraph,
        selection: &SelectionSet,
        gizmos: &mut dyn GizmoLines,
    ) -> DrawStats;

    /// Runtime GPU pass. A no-op when the toggle for `host` is off.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MaterialCreation`] if the shared line material
    /// does not exist yet and the backend cannot create it.
    fn draw_runtime(
        &mut self,
        host: HostKind,
        scene: &dyn SceneGraph,
        gpu: &mut dyn GpuLines,
    ) -> Result<DrawStats, RenderError>;
}

// ---------------------------------------------------------------------------
// PolygonDebugRenderer
// ---------------------------------------------------------------------------

/// Draws polygon outlines for a subtree of the scene.
///
/// The polygon list is either set explicitly with
/// [`set_polygons`](Self::set_polygons) or discovered from the root's
/// subtree. An explicit list is never replaced by discovery.
#[derive(Debug)]
pub struct PolygonDebugRenderer {
    root: NodeId,
    pub config: DebugDrawConfig,
    explicit: Option<Vec<NodeId>>,
    discovered: Option<Vec<NodeId>>,
    line_material: Arc<SharedLineMaterial>,
}

impl PolygonDebugRenderer {
    /// A renderer for `root`'s subtree using the process-wide line material.
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            config: DebugDrawConfig::default(),
            explicit: None,
            discovered: None,
            line_material: SharedLineMaterial::global(),
        }
    }

    pub fn with_config(mut self, config: DebugDrawConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `material` instead of the process-wide holder.
    pub fn with_line_material(mut self, material: Arc<SharedLineMaterial>) -> Self {
        self.line_material = material;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn line_material(&self) -> &Arc<SharedLineMaterial> {
        &self.line_material
    }

    /// Set (or with `None`, clear) the explicit polygon list.
    pub fn set_polygons(&mut self, polygons: Option<Vec<NodeId>>) {
        self.explicit = polygons;
    }

    pub fn explicit_polygons(&self) -> Option<&[NodeId]> {
        self.explicit.as_deref()
    }

    /// The polygons drawn each frame: the explicit list if set, otherwise
    /// the discovered list, discovering it now if needed.
    pub fn polygons(&mut self, scene: &dyn SceneGraph) -> &[NodeId] {
        if self.explicit.is_none() && self.discovered.is_none() {
            self.rediscover(scene);
        }
        match &self.explicit {
            Some(explicit) => explicit,
            None => self.discovered.as_deref().unwrap_or(&[]),
        }
    }

    fn rediscover(&mut self, scene: &dyn SceneGraph) {
        let found = scene.polygons_in_subtree(self.root);
        tracing::debug!(
            root = %self.root,
            polygons = found.len(),
            explicit = self.explicit.is_some(),
            "rebuilt polygon list"
        );
        self.discovered = Some(found);
    }
}

/// What a host update did to the scene this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneChange {
    /// Only transforms, flags or shape values changed. These are read
    /// fresh every frame.
    #[default]
    Unchanged,
    /// Nodes were spawned, despawned or reparented, or shapes attached or
    /// removed. The discovered polygon list must be rebuilt.
    Structure,
}

/// Run one runtime frame.
///
/// Calls `update` with the scene and `frame`, notifies `driver` through
/// [`on_children_changed`](FrameDriver::on_children_changed) when the update
/// reports [`SceneChange::Structure`], then runs
/// [`draw_runtime`](FrameDriver::draw_runtime) against `gpu`.
///
/// # Errors
///
/// Returns the error from [`draw_runtime`](FrameDriver::draw_runtime).
pub fn step_frame<S, U>(
    driver: &mut dyn FrameDriver,
    scene: &mut S,
    update: &mut U,
    frame: u64,
    host: HostKind,
    gpu: &mut dyn GpuLines,
) -> Result<DrawStats, RenderError>
where
    S: SceneGraph,
    U: FnMut(&mut S, u64) -> SceneChange,
{
    if update(scene, frame) == SceneChange::Structure {
        tracing::debug!(frame, "scene structure changed during update");
        driver.on_children_changed(&*scene);
    }
    driver.draw_runtime(host, &*scene, gpu)
}

/// The polygon to draw for `id`, or `None` if it should be skipped this
/// frame.
fn drawable(scene: &dyn SceneGraph, id: NodeId) -> Option<&Polygon> {
    if !scene.is_active_and_enabled(id) {
        return None;
    }
    let polygon = scene.polygon(id)?;
    if polygon.is_empty() {
        tracing::trace!(node = %id, "skipping polygon with no vertices");
        return None;
    }
    Some(polygon)
}

impl FrameDriver for PolygonDebugRenderer {
    fn on_activate(&mut self, scene: &dyn SceneGraph) {
        self.rediscover(scene);
    }

    fn on_children_changed(&mut self, scene: &dyn SceneGraph) {
        self.rediscover(scene);
    }

    fn draw_preview(
        &mut self,
        scene: &dyn SceneGraph,
        selection: &SelectionSet,
        gizmos: &mut dyn GizmoLines,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        if !DrawContext::ScenePreview.is_enabled(&self.config) {
            return stats;
        }

        let draw_color = self.config.draw_color;
        let selected_color = self.config.selected_color;
        let polygons = self.polygons(scene);

        let mut gizmos = ColorScope::new(gizmos, draw_color);
        for &id in polygons {
            let Some(polygon) = drawable(scene, id) else {
                stats.polygons_skipped += 1;
                continue;
            };
            let color: Color = if selection.contains(id) {
                selected_color
            } else {
                draw_color
            };
            gizmos.set_color(color);

            let world = scene.local_to_world(id);
            for edge in polygon.edges() {
                gizmos.draw_line(world.transform_point(edge.start), world.transform_point(edge.end));
                stats.segments += 1;
            }
            stats.polygons_drawn += 1;
        }
        drop(gizmos);

        tracing::trace!(
            context = ?DrawContext::ScenePreview,
            drawn = stats.polygons_drawn,
            skipped = stats.polygons_skipped,
            segments = stats.segments,
            "polygon debug draw"
        );
        stats
    }

    fn draw_runtime(
        &mut self,
        host: HostKind,
        scene: &dyn SceneGraph,
        gpu: &mut dyn GpuLines,
    ) -> Result<DrawStats, RenderError> {
        let context = DrawContext::runtime(host);
        let mut stats = DrawStats::default();
        if !context.is_enabled(&self.config) {
            return Ok(stats);
        }

        let material = self
            .line_material
            .get_or_create(|| gpu.create_line_material(&LineMaterialDescriptor::DEBUG_LINES))?;
        gpu.set_pass(material);

        let draw_color = self.config.draw_color;
        let polygons = self.polygons(scene);

        for &id in polygons {
            let Some(polygon) = drawable(scene, id) else {
                stats.polygons_skipped += 1;
                continue;
            };
            gpu.push_matrix(&scene.local_to_world(id));
            gpu.begin_lines();
            for edge in polygon.edges() {
                gpu.color(draw_color);
                gpu.vertex(edge.start.x, edge.start.y, 0.0);
                gpu.vertex(edge.end.x, edge.end.y, 0.0);
                stats.segments += 1;
            }
            gpu.end();
            gpu.pop_matrix();
            stats.polygons_drawn += 1;
        }

        tracing::trace!(
            context = ?context,
            drawn = stats.polygons_drawn,
            skipped = stats.polygons_skipped,
            segments = stats.segments,
            "polygon debug draw"
        );
        Ok(stats)
    }
}

//! polydebug render -- debug outlines for 2D polygon shapes.
//!
//! This crate builds on [`polydebug_shapes`] to draw polygon outlines for
//! debugging, in two mutually exclusive pipelines:
//!
//! - the **preview pipeline**, an editor-only immediate-mode overlay
//!   ([`GizmoLines`](draw::GizmoLines)) that highlights selected shapes, and
//! - the **GPU pipeline**, a runtime line batch ([`GpuLines`](draw::GpuLines))
//!   drawn through one shared line material created on first use.
//!
//! The host engine drives a [`PolygonDebugRenderer`](renderer::PolygonDebugRenderer)
//! through the [`FrameDriver`](renderer::FrameDriver) trait and supplies the
//! scene through [`SceneGraph`](scene::SceneGraph). [`Scene`](scene::Scene) is
//! a ready-made in-memory scene graph.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use polydebug_render::prelude::*;
//!
//! let mut scene = Scene::new();
//! let root = scene.spawn("root");
//! let square = scene.spawn_child(root, "square").unwrap();
//! scene.attach_shape(square, Polygon::new()).unwrap();
//!
//! let mut renderer = PolygonDebugRenderer::new(root)
//!     .with_line_material(Arc::new(SharedLineMaterial::new()));
//! renderer.on_activate(&scene);
//!
//! let mut gpu = GpuLineRecorder::new();
//! let stats = renderer.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
//! assert_eq!(stats.segments, 4);
//! assert_eq!(gpu.segments().len(), 4);
//! ```
//!
//! # Features
//!
//! - `renderer`: a wgpu implementation of [`GpuLines`](draw::GpuLines) and a
//!   winit windowed runner.

#![deny(unsafe_code)]

#[cfg(feature = "renderer")]
pub mod backend;
pub mod config;
pub mod draw;
pub mod material;
pub mod recorder;
pub mod renderer;
pub mod scene;
pub mod transform;

/// Re-export the shapes crate for convenience.
pub use polydebug_shapes;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while drawing or configuring the renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The host could not allocate the shared line material.
    #[error("failed to create line material '{label}': {details}")]
    MaterialCreation { label: String, details: String },

    /// A configuration document could not be parsed or written.
    #[error("invalid debug draw configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The window surface could not provide a frame.
    #[cfg(feature = "renderer")]
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Errors produced by [`Scene`](scene::Scene) operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The node does not exist (despawned or never allocated).
    #[error("node {0:?} does not exist (stale or never allocated)")]
    StaleNode(scene::NodeId),

    /// Reparenting would make a node its own ancestor.
    #[error("cannot parent {child:?} under {parent:?}: would create a cycle")]
    Cycle {
        child: scene::NodeId,
        parent: scene::NodeId,
    },

    /// A shape rejected validation.
    #[error(transparent)]
    Shape(#[from] polydebug_shapes::ShapeError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use polydebug_shapes::prelude::*;

    pub use crate::config::{Color, DebugDrawConfig};
    pub use crate::draw::{
        BlendMode, ColorScope, CullMode, GizmoLines, GpuLines, LineAssembler,
        LineMaterialDescriptor, LineSegment, MaterialId,
    };
    pub use crate::material::SharedLineMaterial;
    pub use crate::recorder::{GizmoRecorder, GpuCall, GpuLineRecorder};
    pub use crate::renderer::{
        step_frame, DrawContext, DrawStats, FrameDriver, HostKind, PolygonDebugRenderer, SceneChange,
    };
    pub use crate::scene::{NodeId, Scene, SceneGraph, SelectionSet};
    pub use crate::transform::{Affine2, Transform2D};
    pub use crate::{RenderError, SceneError};
}

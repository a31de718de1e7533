//! wgpu line backend and windowed runner.
//!
//! This module is feature-gated behind `renderer`. [`WgpuLines`] implements
//! [`GpuLines`](crate::draw::GpuLines) on a wgpu surface, and
//! [`run_windowed`] drives a [`PolygonDebugRenderer`](crate::renderer::PolygonDebugRenderer)
//! inside a winit event loop.
//!
//! This is a debug view, not a production renderer: one line list per
//! frame, a fixed orthographic camera, no depth buffer.

pub mod app;
pub mod wgpu_lines;

pub use app::{run_windowed, WindowConfig};
pub use wgpu_lines::{Camera2D, WgpuLines};

//! [`GpuLines`] on wgpu.
//!
//! # Architecture
//!
//! The backend does NOT own the event loop. Each frame the host:
//!
//! 1. Drives it through [`GpuLines`] (usually via
//!    [`draw_runtime`](crate::renderer::FrameDriver::draw_runtime)). The
//!    model-matrix stack is applied on the CPU by a [`LineAssembler`], so
//!    only world-space vertices reach the GPU.
//! 2. Calls [`WgpuLines::present`], which uploads the frame's segments and
//!    draws them as one `LineList` with the bound material's pipeline.
//!
//! Each line material is one render pipeline built from its
//! [`LineMaterialDescriptor`].

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::config::Color;
use crate::draw::{
    BlendMode, CullMode, GpuLines, LineAssembler, LineMaterialDescriptor, LineSegment, MaterialId,
};
use crate::transform::Affine2;
use crate::RenderError;

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// A line endpoint with world position and RGBA color, sent to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
struct LineVertex {
    position: [f32; 2],
    color: [f32; 4],
}

impl LineVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

fn segment_vertices(segment: &LineSegment) -> [LineVertex; 2] {
    let color = segment.color.to_array();
    [
        LineVertex {
            position: segment.from.to_array(),
            color,
        },
        LineVertex {
            position: segment.to.to_array(),
            color,
        },
    ]
}

// ---------------------------------------------------------------------------
// Camera2D
// ---------------------------------------------------------------------------

/// A 2D orthographic camera in world units.
///
/// Shapes are authored around the origin at unit scale, so the default view
/// is a few units wide and centered on `(0, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera2D {
    /// Width of the visible area in world units.
    pub width: f32,
    /// Height of the visible area in world units.
    pub height: f32,
    /// Camera center X in world units.
    pub x: f32,
    /// Camera center Y in world units.
    pub y: f32,
}

impl Camera2D {
    /// Produce a column-major 4x4 orthographic projection matrix mapping
    /// the visible area to clip space `[-1, 1]` on both axes.
    pub fn orthographic_matrix(&self) -> [f32; 16] {
        let left = self.x - self.width / 2.0;
        let right = self.x + self.width / 2.0;
        let bottom = self.y - self.height / 2.0;
        let top = self.y + self.height / 2.0;

        let sx = 2.0 / (right - left);
        let sy = 2.0 / (top - bottom);
        let tx = -(right + left) / (right - left);
        let ty = -(top + bottom) / (top - bottom);

        [
            sx, 0.0, 0.0, 0.0, // column 0
            0.0, sy, 0.0, 0.0, // column 1
            0.0, 0.0, 1.0, 0.0, // column 2
            tx, ty, 0.0, 1.0, // column 3
        ]
    }

    /// Keep the height and widen or narrow the view to match a surface of
    /// `width` x `height` pixels. Zero-sized surfaces are ignored.
    pub fn fit_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = self.height * width as f32 / height as f32;
        }
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 6.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Render state mapping
// ---------------------------------------------------------------------------

fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Opaque => wgpu::BlendState::REPLACE,
        BlendMode::AlphaBlend => wgpu::BlendState::ALPHA_BLENDING,
    }
}

fn cull_face(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::Off => None,
        CullMode::Back => Some(wgpu::Face::Back),
        CullMode::Front => Some(wgpu::Face::Front),
    }
}

/// Segments uploaded per frame; anything beyond is dropped with a warning.
const MAX_SEGMENTS: usize = 16 * 1024;
const MAX_LINE_VERTICES: usize = MAX_SEGMENTS * 2;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.1,
    a: 1.0,
};

// ---------------------------------------------------------------------------
// WgpuLines
// ---------------------------------------------------------------------------

/// A window surface that draws [`GpuLines`] output.
///
/// Call [`WgpuLines::new`] with an `Arc<winit::window::Window>`. If no
/// suitable GPU is available the error is returned to the caller.
pub struct WgpuLines {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: Vec<wgpu::RenderPipeline>,
    bound: Option<MaterialId>,
    vertex_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    window: Arc<winit::window::Window>,
    assembler: LineAssembler,
    /// The 2D orthographic camera.
    pub camera: Camera2D,
}

impl WgpuLines {
    /// Initialize wgpu: surface, device, queue, and shared GPU resources.
    /// No pipeline exists until a line material is created.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter or device is available.
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, anyhow::Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("polydebug_lines"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("polydebug_lines_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("lines.wgsl").into()),
        });

        let mut camera = Camera2D::default();
        camera.fit_aspect(width, height);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_uniform"),
            contents: bytemuck::cast_slice(&camera.orthographic_matrix()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("polydebug_lines_pipeline_layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line_vertex_buffer"),
            size: (MAX_LINE_VERTICES * std::mem::size_of::<LineVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shader,
            pipeline_layout,
            pipelines: Vec::new(),
            bound: None,
            vertex_buffer,
            camera_buffer,
            camera_bind_group,
            window,
            assembler: LineAssembler::new(),
            camera,
        })
    }

    /// Upload this frame's segments, draw them, and present.
    ///
    /// Segments are consumed even if the surface fails. A frame with
    /// segments but no bound material is cleared and nothing is drawn.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface cannot provide an
    /// output texture (e.g., window minimized, surface lost).
    pub fn present(&mut self) -> Result<(), RenderError> {
        if self.assembler.depth() != 0 || self.assembler.in_batch() {
            tracing::warn!(
                depth = self.assembler.depth(),
                in_batch = self.assembler.in_batch(),
                "unbalanced line batch at end of frame"
            );
        }
        let segments = std::mem::take(&mut self.assembler).take_segments();

        if segments.len() > MAX_SEGMENTS {
            tracing::warn!(
                segments = segments.len(),
                max = MAX_SEGMENTS,
                "too many line segments, dropping the excess"
            );
        }
        let vertices: Vec<LineVertex> = segments
            .iter()
            .take(MAX_SEGMENTS)
            .flat_map(segment_vertices)
            .collect();

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&self.camera.orthographic_matrix()),
        );
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }

        let pipeline = self.bound.and_then(|id| self.pipelines.get(id.0 as usize));
        if pipeline.is_none() && !vertices.is_empty() {
            tracing::warn!(vertices = vertices.len(), "no line material bound, skipping draw");
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("polydebug_lines_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("polydebug_lines_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(pipeline) = pipeline {
                if !vertices.is_empty() {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                    render_pass.draw(0..vertices.len() as u32, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Resize the surface and refit the camera. Zero-sized windows are
    /// ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.camera.fit_aspect(new_size.width, new_size.height);
        }
    }

    pub fn window(&self) -> &winit::window::Window {
        &self.window
    }

    fn build_pipeline(&self, descriptor: &LineMaterialDescriptor) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(descriptor.label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[LineVertex::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(blend_state(descriptor.blend)),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: cull_face(descriptor.cull),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
    }
}

impl GpuLines for WgpuLines {
    fn create_line_material(
        &mut self,
        descriptor: &LineMaterialDescriptor,
    ) -> Result<MaterialId, RenderError> {
        // The surface has no depth attachment.
        if descriptor.depth_write {
            return Err(RenderError::MaterialCreation {
                label: descriptor.label.to_owned(),
                details: "depth writes requested but the line surface has no depth buffer"
                    .to_owned(),
            });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.build_pipeline(descriptor);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::MaterialCreation {
                label: descriptor.label.to_owned(),
                details: error.to_string(),
            });
        }

        let id = MaterialId(self.pipelines.len() as u64);
        self.pipelines.push(pipeline);
        tracing::debug!(
            material = id.0,
            label = descriptor.label,
            blend = ?descriptor.blend,
            cull = ?descriptor.cull,
            "built line pipeline"
        );
        Ok(id)
    }

    fn set_pass(&mut self, material: MaterialId) {
        if (material.0 as usize) < self.pipelines.len() {
            self.bound = Some(material);
        } else {
            tracing::warn!(material = material.0, "set_pass with unknown material");
        }
    }

    fn push_matrix(&mut self, model: &Affine2) {
        self.assembler.push_matrix(model);
    }

    fn pop_matrix(&mut self) {
        if !self.assembler.pop_matrix() {
            tracing::warn!("pop_matrix with an empty matrix stack");
        }
    }

    fn begin_lines(&mut self) {
        self.assembler.begin();
    }

    fn color(&mut self, color: Color) {
        self.assembler.color(color);
    }

    fn vertex(&mut self, x: f32, y: f32, _z: f32) {
        self.assembler.vertex(x, y);
    }

    fn end(&mut self) {
        self.assembler.end();
    }
}

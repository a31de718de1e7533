//! Windowed runner for the polygon debug renderer.
//!
//! [`run_windowed`] takes ownership of a [`Scene`] and a
//! [`PolygonDebugRenderer`] and drives them inside a winit event loop. Each
//! `RedrawRequested` event runs one [`step_frame`] against the window's line
//! backend and presents the result.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{WindowAttributes, WindowId};

use super::wgpu_lines::WgpuLines;
use crate::renderer::{step_frame, FrameDriver, HostKind, PolygonDebugRenderer, SceneChange};
use crate::scene::Scene;
use crate::RenderError;

/// Window settings for [`run_windowed`].
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Initial width in physical pixels.
    pub width: u32,
    /// Initial height in physical pixels.
    pub height: u32,
    /// Which toggle gates drawing: `draw_in_build` or `draw_in_play_mode`.
    pub host: HostKind,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "polydebug".to_owned(),
            width: 800,
            height: 600,
            host: HostKind::Build,
        }
    }
}

/// Run the renderer in a window.
///
/// Blocks until the window is closed. Each frame:
///
/// 1. Calls `update` with the scene and the frame number (starting at 1).
///    If it returns [`SceneChange::Structure`], the renderer rebuilds its
///    polygon list through
///    [`on_children_changed`](FrameDriver::on_children_changed).
/// 2. Runs [`draw_runtime`](FrameDriver::draw_runtime) against the window's
///    line backend.
/// 3. Presents the frame.
///
/// The renderer is activated once, right after the window opens. The shared
/// line material is released when the window closes.
///
/// # Errors
///
/// Returns an error if the event loop cannot be created, if the window or
/// GPU cannot be initialized, or if the line material cannot be created.
pub fn run_windowed<U>(
    scene: Scene,
    renderer: PolygonDebugRenderer,
    update: U,
    config: WindowConfig,
) -> Result<(), anyhow::Error>
where
    U: FnMut(&mut Scene, u64) -> SceneChange,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App {
        state: AppState::Pending {
            session: Session {
                scene,
                renderer,
                update,
                frame: 0,
            },
            config,
        },
        failure: None,
    };

    event_loop.run_app(&mut app)?;

    if let Some(failure) = app.failure {
        return Err(anyhow::anyhow!("windowed renderer stopped: {failure}"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal state machine
// ---------------------------------------------------------------------------

/// Everything the frame loop owns besides the window.
struct Session<U> {
    scene: Scene,
    renderer: PolygonDebugRenderer,
    update: U,
    frame: u64,
}

/// Winit 0.30 only allows window creation inside
/// `ApplicationHandler::resumed`, so the app starts `Pending` and becomes
/// `Running` once the window and backend exist.
enum AppState<U> {
    Pending {
        session: Session<U>,
        config: WindowConfig,
    },
    Running {
        session: Session<U>,
        lines: WgpuLines,
        host: HostKind,
    },
    /// Placeholder while moving between states.
    Transitioning,
}

struct App<U> {
    state: AppState<U>,
    /// Why the loop exited early, reported by `run_windowed`.
    failure: Option<String>,
}

impl<U> App<U> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, reason: String) {
        tracing::error!(%reason, "exiting windowed renderer");
        self.failure = Some(reason);
        event_loop.exit();
    }
}

impl<U: FnMut(&mut Scene, u64) -> SceneChange> ApplicationHandler for App<U> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let state = std::mem::replace(&mut self.state, AppState::Transitioning);
        match state {
            AppState::Pending { mut session, config } => {
                let attrs = WindowAttributes::default()
                    .with_title(config.title.clone())
                    .with_inner_size(winit::dpi::PhysicalSize::new(config.width, config.height));

                let window = match event_loop.create_window(attrs) {
                    Ok(window) => Arc::new(window),
                    Err(e) => {
                        self.state = AppState::Pending { session, config };
                        self.fail(event_loop, format!("failed to create window: {e}"));
                        return;
                    }
                };

                match pollster::block_on(WgpuLines::new(window.clone())) {
                    Ok(lines) => {
                        tracing::info!(
                            width = config.width,
                            height = config.height,
                            host = ?config.host,
                            "line renderer window created"
                        );
                        session.renderer.on_activate(&session.scene);
                        window.request_redraw();
                        self.state = AppState::Running {
                            session,
                            lines,
                            host: config.host,
                        };
                    }
                    Err(e) => {
                        self.state = AppState::Pending { session, config };
                        self.fail(event_loop, format!("failed to initialize line renderer: {e}"));
                    }
                }
            }
            running @ AppState::Running { .. } => {
                self.state = running;
            }
            AppState::Transitioning => {
                tracing::warn!("resumed called during state transition");
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running {
            session,
            lines,
            host,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!(frames = session.frame, "window close requested, shutting down");
                session.renderer.line_material().shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!(
                    width = new_size.width,
                    height = new_size.height,
                    "window resized"
                );
                lines.resize(new_size);
            }
            WindowEvent::RedrawRequested => {
                session.frame += 1;
                let step = step_frame(
                    &mut session.renderer,
                    &mut session.scene,
                    &mut session.update,
                    session.frame,
                    *host,
                    lines,
                );
                if let Err(e) = step {
                    let reason = format!("debug draw failed: {e}");
                    self.fail(event_loop, reason);
                    return;
                }

                match lines.present() {
                    Ok(()) => {}
                    Err(RenderError::Surface(wgpu::SurfaceError::Lost)) => {
                        let size = lines.window().inner_size();
                        lines.resize(size);
                    }
                    Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        self.fail(event_loop, "GPU out of memory".to_owned());
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "surface error during present");
                    }
                }

                lines.window().request_redraw();
            }
            _ => {}
        }
    }
}

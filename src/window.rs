//! Shell window and message loop.
//!
//! One top-level window, one [`RenderSurface`], one [`OverlayContext`],
//! composed in that order and torn down in reverse. The loop is a winit
//! `ApplicationHandler`; every window event is first offered to the
//! overlay hook and only routed to the shell when the overlay did not
//! consume it.
//!
//! Single-window by design: dispatch is keyed to the one window this shell
//! owns. A multi-window extension would need a handle-to-shell registry in
//! the event dispatch below.

use std::sync::Arc;
use std::time::Instant;

use dear_imgui_rs as imgui;
use dear_imgui_wgpu as imgui_wgpu;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalPosition, LogicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::ShellError;
use crate::overlay::OverlayContext;
use crate::surface::RenderSurface;

#[cfg(feature = "multi-viewport")]
use dear_imgui_winit::multi_viewport as winit_mvp;

/// Redraw behavior for the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawMode {
    /// Render continuously.
    Poll,
    /// Render only when the OS delivers an event.
    Wait,
}

/// Shell window configuration.
pub struct ShellConfig {
    pub title: String,
    /// Logical inner size.
    pub size: (f64, f64),
    pub decorations: bool,
    /// Initial visibility; visibility policy past construction is the
    /// caller's.
    pub visible: bool,
    /// Fixed logical position, if any.
    pub position: Option<(f64, f64)>,
    /// Clear color for the frame's render pass.
    pub clear_color: [f32; 4],
    pub redraw: RedrawMode,
    /// Extra io config flags merged into the overlay context.
    pub io_config_flags: Option<imgui::ConfigFlags>,
}

// `imgui::ConfigFlags` implements neither `Clone` nor `Debug` in this
// release, so the derives are spelled out by hand; the flags clone via a
// bits round-trip.
impl Clone for ShellConfig {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            size: self.size,
            decorations: self.decorations,
            visible: self.visible,
            position: self.position,
            clear_color: self.clear_color,
            redraw: self.redraw,
            io_config_flags: self
                .io_config_flags
                .as_ref()
                .map(|f| imgui::ConfigFlags::from_bits_retain(f.bits())),
        }
    }
}

impl std::fmt::Debug for ShellConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellConfig")
            .field("title", &self.title)
            .field("size", &self.size)
            .field("decorations", &self.decorations)
            .field("visible", &self.visible)
            .field("position", &self.position)
            .field("clear_color", &self.clear_color)
            .field("redraw", &self.redraw)
            .field(
                "io_config_flags",
                &self.io_config_flags.as_ref().map(|f| f.bits()),
            )
            .finish()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: format!("Dear Shell {}", env!("CARGO_PKG_VERSION")),
            size: (1280.0, 720.0),
            decorations: true,
            visible: true,
            position: None,
            clear_color: [0.1, 0.2, 0.3, 1.0],
            redraw: RedrawMode::Poll,
            io_config_flags: None,
        }
    }
}

impl ShellConfig {
    /// The invisible-host style: a 1x1, undecorated, hidden window pinned
    /// at the origin. Useful when all visible UI lives in overlay-created
    /// viewports (`multi-viewport` feature).
    pub fn hidden_host() -> Self {
        Self {
            size: (1.0, 1.0),
            decorations: false,
            visible: false,
            position: Some((0.0, 0.0)),
            ..Self::default()
        }
    }
}

fn window_attributes(cfg: &ShellConfig) -> WindowAttributes {
    let mut attrs = Window::default_attributes()
        .with_title(cfg.title.clone())
        .with_inner_size(LogicalSize::new(cfg.size.0, cfg.size.1))
        .with_decorations(cfg.decorations)
        .with_visible(cfg.visible);
    if let Some((x, y)) = cfg.position {
        attrs = attrs.with_position(LogicalPosition::new(x, y));
    }
    attrs
}

/// Where a window event goes after the overlay hook has seen it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    /// Overlay consumed the event; stop processing.
    Consumed,
    /// The OS asked the window to close; leave the loop (dropping the
    /// shell destroys the native window).
    Close,
    /// The native window is gone; post the final quit.
    Quit,
    /// Keep the surface configuration in sync with the window.
    Resize,
    /// Drive one full frame.
    Redraw,
    /// Default handling (nothing for the shell to do).
    Ignore,
}

/// Pure dispatch policy for the shell's window procedure. The overlay's
/// verdict short-circuits everything else, including close requests.
pub(crate) fn route_event(consumed: bool, event: &WindowEvent) -> Route {
    if consumed {
        return Route::Consumed;
    }
    match event {
        WindowEvent::CloseRequested => Route::Close,
        WindowEvent::Destroyed => Route::Quit,
        WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => Route::Resize,
        WindowEvent::RedrawRequested => Route::Redraw,
        _ => Route::Ignore,
    }
}

/// Guard so the loop exit is requested exactly once, no matter how many
/// close/destroy notifications arrive.
#[derive(Debug, Default)]
pub(crate) struct QuitLatch {
    posted: bool,
}

impl QuitLatch {
    /// True exactly once.
    pub(crate) fn post(&mut self) -> bool {
        !std::mem::replace(&mut self.posted, true)
    }
}

/// The shell window: native window + GPU surface + overlay.
///
/// Field order is teardown order: overlay first (it borrows nothing but
/// must logically die before its window and device), then the GPU
/// surface, then the window itself.
struct ShellWindow {
    overlay: OverlayContext,
    surface: RenderSurface,
    window: Arc<Window>,
    clear_color: wgpu::Color,
    last_frame: Instant,
}

impl ShellWindow {
    /// Construct window, surface, and overlay in dependency order. Either
    /// everything succeeds or the error unwinds with no live resources
    /// (drop glue releases any partially built members).
    fn new(event_loop: &ActiveEventLoop, cfg: &ShellConfig) -> Result<Self, ShellError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let window = Arc::new(event_loop.create_window(window_attributes(cfg))?);
        let surface = RenderSurface::new(&instance, window.clone())?;

        let init = imgui_wgpu::WgpuInitInfo::new(
            surface.device().clone(),
            surface.queue().clone(),
            surface.format(),
        );
        #[cfg(feature = "multi-viewport")]
        let init = init
            .with_instance(instance.clone())
            .with_adapter(surface.adapter().clone());

        let overlay = OverlayContext::new(&window, init, cfg)?;

        info!(title = %cfg.title, "shell window constructed");
        Ok(Self {
            overlay,
            surface,
            window,
            clear_color: wgpu::Color {
                r: cfg.clear_color[0] as f64,
                g: cfg.clear_color[1] as f64,
                b: cfg.clear_color[2] as f64,
                a: cfg.clear_color[3] as f64,
            },
            last_frame: Instant::now(),
        })
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) -> bool {
        self.surface.resize(size)
    }

    /// Drive one full frame: overlay frame boundaries around the caller's
    /// UI callback, then render the composed draw data into the acquired
    /// target and present with vsync.
    fn frame(&mut self, gui: &mut dyn FnMut(&imgui::Ui)) -> Result<(), ShellError> {
        let now = Instant::now();
        self.overlay
            .context
            .io_mut()
            .set_delta_time((now - self.last_frame).as_secs_f32());
        self.last_frame = now;

        // Recoverable skip: the surface was rebuilt or the frame timed out.
        let Some(frame) = self.surface.acquire()? else {
            return Ok(());
        };

        self.overlay
            .platform
            .prepare_frame(&self.window, &mut self.overlay.context);
        let ui = self.overlay.context.frame();
        gui(ui);
        let draw_data = self.overlay.context.render();

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.surface
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("shell-frame-encoder"),
                });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shell-frame-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.overlay
                .renderer
                .new_frame()
                .map_err(|e| ShellError::Overlay(format!("new_frame failed: {e}")))?;
            self.overlay
                .renderer
                .render_draw_data(draw_data, &mut rpass)
                .map_err(|e| ShellError::Overlay(format!("render_draw_data failed: {e}")))?;
        }

        self.surface.queue().submit(Some(encoder.finish()));
        frame.present();

        self.overlay.propagate_viewports();
        Ok(())
    }
}

struct Shell<F>
where
    F: FnMut(&imgui::Ui),
{
    cfg: ShellConfig,
    gui: F,
    window: Option<ShellWindow>,
    quit: QuitLatch,
    failure: Option<ShellError>,
}

impl<F> ApplicationHandler for Shell<F>
where
    F: FnMut(&imgui::Ui),
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[cfg(feature = "multi-viewport")]
        winit_mvp::set_event_loop(event_loop);

        if self.window.is_none() {
            match ShellWindow::new(event_loop, &self.cfg) {
                Ok(shell) => {
                    shell.window.request_redraw();
                    self.window = Some(shell);

                    // Viewport handlers want the overlay pinned in its
                    // final location before installation.
                    #[cfg(feature = "multi-viewport")]
                    if let Some(shell) = self.window.as_mut() {
                        winit_mvp::init_multi_viewport_support(
                            &mut shell.overlay.context,
                            &shell.window,
                        );
                        imgui_wgpu::multi_viewport::enable(
                            &mut shell.overlay.renderer,
                            &mut shell.overlay.context,
                        );
                    }
                }
                Err(e) => {
                    error!(%e, "shell window construction failed");
                    self.failure = Some(e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(shell) = self.window.as_mut() else {
            return;
        };

        // Overlay hook first, always.
        let full: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        let consumed = if window_id == shell.window.id() {
            shell.overlay.handle_event(&shell.window, &full)
        } else {
            false
        };
        #[cfg(feature = "multi-viewport")]
        let _ = winit_mvp::route_event_to_viewports(&mut shell.overlay.context, &full);

        match route_event(consumed, &event) {
            Route::Consumed => {}
            Route::Close => {
                info!("close requested, leaving the loop");
                if self.quit.post() {
                    event_loop.exit();
                }
            }
            Route::Quit => {
                if self.quit.post() {
                    event_loop.exit();
                }
            }
            Route::Resize => {
                let size = match event {
                    WindowEvent::Resized(size) => size,
                    _ => shell.window.inner_size(),
                };
                if !shell.resize(size) {
                    debug!("zero-sized resize ignored");
                }
                shell.window.request_redraw();
            }
            Route::Redraw => {
                if let Err(e) = shell.frame(&mut self.gui) {
                    error!(%e, "frame failed");
                    self.failure = Some(e);
                    event_loop.exit();
                } else if self.cfg.redraw == RedrawMode::Poll {
                    shell.window.request_redraw();
                }
            }
            Route::Ignore => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.cfg.redraw == RedrawMode::Poll {
            if let Some(shell) = &self.window {
                shell.window.request_redraw();
            }
        }
    }
}

/// Build the event loop, construct the shell window inside it, and run
/// until the OS close path ends the loop.
///
/// `gui` is called once per frame between the overlay's frame boundaries;
/// it cannot signal termination, only the close path can.
pub fn run<F>(cfg: ShellConfig, gui: F) -> Result<(), ShellError>
where
    F: FnMut(&imgui::Ui),
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(match cfg.redraw {
        RedrawMode::Poll => ControlFlow::Poll,
        RedrawMode::Wait => ControlFlow::Wait,
    });

    let mut shell = Shell {
        cfg,
        gui,
        window: None,
        quit: QuitLatch::default(),
        failure: None,
    };
    info!("entering message loop");
    event_loop.run_app(&mut shell)?;

    match shell.failure {
        Some(e) => Err(e),
        None => {
            info!("message loop ended cleanly");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn overlay_verdict_short_circuits_everything() {
        // Even a close request stops at the overlay when consumed.
        assert_eq!(
            route_event(true, &WindowEvent::CloseRequested),
            Route::Consumed
        );
        assert_eq!(
            route_event(true, &WindowEvent::RedrawRequested),
            Route::Consumed
        );
        assert_eq!(route_event(true, &WindowEvent::Focused(true)), Route::Consumed);
    }

    #[test]
    fn close_and_destroy_are_distinct_steps() {
        // Close leaves the loop (and thereby destroys the window); only
        // the destroy notification is the quit path.
        assert_eq!(route_event(false, &WindowEvent::CloseRequested), Route::Close);
        assert_eq!(route_event(false, &WindowEvent::Destroyed), Route::Quit);
    }

    #[test]
    fn resize_and_redraw_route_to_the_shell() {
        assert_eq!(
            route_event(false, &WindowEvent::Resized(PhysicalSize::new(800, 600))),
            Route::Resize
        );
        assert_eq!(
            route_event(false, &WindowEvent::RedrawRequested),
            Route::Redraw
        );
    }

    #[test]
    fn unhandled_events_fall_through() {
        assert_eq!(route_event(false, &WindowEvent::Focused(true)), Route::Ignore);
        assert_eq!(route_event(false, &WindowEvent::Moved((0, 0).into())), Route::Ignore);
    }

    #[test]
    fn quit_posts_exactly_once() {
        let mut latch = QuitLatch::default();
        assert!(latch.post());
        assert!(!latch.post());
        assert!(!latch.post());
    }

    #[test]
    fn window_attributes_follow_the_config() {
        let cfg = ShellConfig {
            title: "test shell".into(),
            size: (640.0, 480.0),
            decorations: false,
            visible: false,
            position: Some((10.0, 20.0)),
            ..ShellConfig::default()
        };
        let attrs = window_attributes(&cfg);
        assert_eq!(attrs.title, "test shell");
        assert!(!attrs.decorations);
        assert!(!attrs.visible);
        assert_eq!(
            attrs.inner_size,
            Some(LogicalSize::new(640.0, 480.0).into())
        );
        assert_eq!(
            attrs.position,
            Some(LogicalPosition::new(10.0, 20.0).into())
        );
    }

    #[test]
    fn hidden_host_matches_the_invisible_window_style() {
        let cfg = ShellConfig::hidden_host();
        assert_eq!(cfg.size, (1.0, 1.0));
        assert!(!cfg.decorations);
        assert!(!cfg.visible);
        assert_eq!(cfg.position, Some((0.0, 0.0)));
    }
}

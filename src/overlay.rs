//! Dear ImGui overlay bound to one window and one render surface.
//!
//! The overlay is process-wide singleton state (at most one imgui context
//! may be live at a time), so it is created strictly after the window and
//! the GPU surface exist and torn down strictly before them. The shell
//! window owns it and never hands it out.

use dear_imgui_rs as imgui;
use dear_imgui_wgpu as imgui_wgpu;
use dear_imgui_winit as imgui_winit;
use tracing::info;
use winit::event::Event;
use winit::window::Window;

use crate::error::ShellError;
use crate::window::ShellConfig;

/// Imgui context plus its platform and renderer backends.
///
/// Field order is teardown order: the renderer (device-bound) drops before
/// the platform (window-bound), which drops before the context itself —
/// the reverse of initialization.
pub struct OverlayContext {
    pub(crate) renderer: imgui_wgpu::WgpuRenderer,
    pub(crate) platform: imgui_winit::WinitPlatform,
    pub(crate) context: imgui::Context,
}

impl OverlayContext {
    /// Create the context, attach the winit platform to `window`, and
    /// initialize the wgpu renderer from `init`. Both backends must exist
    /// before the first frame; any failure here is fatal for construction.
    pub fn new(
        window: &Window,
        init: imgui_wgpu::WgpuInitInfo,
        cfg: &ShellConfig,
    ) -> Result<Self, ShellError> {
        let mut context = imgui::Context::try_create()
            .map_err(|e| ShellError::Overlay(format!("context creation failed: {e}")))?;

        // No ini persistence; the shell has no state to restore.
        let _ = context.set_ini_filename(None::<String>);

        #[cfg(feature = "multi-viewport")]
        context.enable_multi_viewport();

        if let Some(extra) = &cfg.io_config_flags {
            let io = context.io_mut();
            let merged = io.config_flags().bits() | extra.bits();
            io.set_config_flags(imgui::ConfigFlags::from_bits_retain(merged));
        }

        let mut platform = imgui_winit::WinitPlatform::new(&mut context);
        platform.attach_window(window, imgui_winit::HiDpiMode::Default, &mut context);

        let mut renderer = imgui_wgpu::WgpuRenderer::new(init, &mut context)
            .map_err(|e| ShellError::Overlay(format!("renderer init failed: {e}")))?;
        renderer.set_gamma_mode(imgui_wgpu::GammaMode::Auto);

        info!("overlay context initialized");
        Ok(Self {
            renderer,
            platform,
            context,
        })
    }

    /// The window-procedure hook: the overlay sees every event before the
    /// shell acts on it. Returns `true` when the overlay consumed the
    /// event and the shell must not process it further.
    pub fn handle_event(&mut self, window: &Window, event: &Event<()>) -> bool {
        self.platform.handle_event(&mut self.context, window, event)
    }

    /// Update and render the secondary OS windows the overlay created.
    /// A no-op unless the `multi-viewport` capability is compiled in and
    /// viewports are enabled on the context.
    pub fn propagate_viewports(&mut self) {
        #[cfg(feature = "multi-viewport")]
        if self
            .context
            .io()
            .config_flags()
            .contains(imgui::ConfigFlags::VIEWPORTS_ENABLE)
        {
            self.context.update_platform_windows();
            self.context.render_platform_windows_default();
        }
    }
}

//! GPU presentation surface for a single window.
//!
//! [`RenderSurface`] owns the device, its queue, the window surface, and the
//! surface configuration, and keeps the configuration in sync with the
//! window so the acquired texture is always presentable. It knows nothing
//! about the overlay or the event loop.

use std::sync::Arc;

use pollster::block_on;
use tracing::{info, warn};
use winit::window::Window;

use crate::error::ShellError;

/// Fixed presentation policy used to build the surface configuration.
///
/// Building a configuration twice from the same inputs yields identical
/// values; nothing here depends on ambient state.
#[derive(Clone, Debug)]
pub struct SurfaceSpec {
    /// Present mode; `Fifo` is vsync and is always supported.
    pub present_mode: wgpu::PresentMode,
    /// Frame latency hint passed through to the swap chain.
    pub desired_maximum_frame_latency: u32,
}

impl Default for SurfaceSpec {
    fn default() -> Self {
        Self {
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
        }
    }
}

impl SurfaceSpec {
    /// Preferred formats, newest-first fallback: sRGB BGRA, then sRGB RGBA.
    const PREFERRED_FORMATS: [wgpu::TextureFormat; 2] = [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ];

    /// Pick the first preferred format the surface supports, falling back
    /// to whatever the adapter reports first.
    pub fn select_format(&self, available: &[wgpu::TextureFormat]) -> wgpu::TextureFormat {
        Self::PREFERRED_FORMATS
            .iter()
            .copied()
            .find(|f| available.contains(f))
            .unwrap_or_else(|| {
                available
                    .first()
                    .copied()
                    .unwrap_or(wgpu::TextureFormat::Bgra8Unorm)
            })
    }

    /// Build the surface configuration for the given format and extents.
    /// Extents are clamped to at least 1; a zero-sized swap chain is not
    /// configurable.
    pub fn configuration(
        &self,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: self.present_mode,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: self.desired_maximum_frame_latency,
        }
    }
}

/// Apply a resize to a configuration. Returns `false` and leaves the
/// configuration untouched when either extent is zero (minimized window).
pub(crate) fn apply_resize(
    config: &mut wgpu::SurfaceConfiguration,
    width: u32,
    height: u32,
) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    config.width = width;
    config.height = height;
    true
}

/// Device, queue, surface, and the configuration the surface was last
/// configured with.
pub struct RenderSurface {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl RenderSurface {
    /// Stand up the whole GPU side for `window`: surface, adapter, device,
    /// queue, and an initial configuration sized to the window.
    ///
    /// All failures here are fatal for the shell being constructed.
    pub fn new(instance: &wgpu::Instance, window: Arc<Window>) -> Result<Self, ShellError> {
        let surface = instance.create_surface(window.clone())?;

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))?;

        let spec = SurfaceSpec::default();
        let caps = surface.get_capabilities(&adapter);
        let format = spec.select_format(&caps.formats);

        let size = window.inner_size();
        let config = spec.configuration(format, size.width, size.height);
        surface.configure(&device, &config);
        info!(
            ?format,
            width = config.width,
            height = config.height,
            "render surface configured"
        );

        Ok(Self {
            device,
            queue,
            adapter,
            surface,
            config,
        })
    }

    /// Fetch the next presentable texture.
    ///
    /// `Ok(None)` means the frame should be skipped: a lost or outdated
    /// surface has been reconfigured and the next redraw will retry, and a
    /// timeout is simply a dropped frame. Anything else is fatal.
    pub fn acquire(&mut self) -> Result<Option<wgpu::SurfaceTexture>, ShellError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => Ok(None),
            Err(e) => Err(ShellError::Surface(e)),
        }
    }

    /// Rebuild the presentable target for a new window size. Returns
    /// `false` (and does nothing) for a zero-sized extent; the caller may
    /// retry on the next resize.
    pub fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) -> bool {
        if !apply_resize(&mut self.config, size.width, size.height) {
            return false;
        }
        self.surface.configure(&self.device, &self.config);
        true
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn config(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_is_deterministic() {
        let spec = SurfaceSpec::default();
        let a = spec.configuration(wgpu::TextureFormat::Bgra8UnormSrgb, 1280, 720);
        let b = spec.configuration(wgpu::TextureFormat::Bgra8UnormSrgb, 1280, 720);
        assert_eq!(a.usage, b.usage);
        assert_eq!(a.format, b.format);
        assert_eq!(a.width, b.width);
        assert_eq!(a.height, b.height);
        assert_eq!(a.present_mode, b.present_mode);
        assert_eq!(a.alpha_mode, b.alpha_mode);
        assert_eq!(a.view_formats, b.view_formats);
        assert_eq!(
            a.desired_maximum_frame_latency,
            b.desired_maximum_frame_latency
        );
    }

    #[test]
    fn configuration_uses_vsync_and_render_attachment() {
        let config = SurfaceSpec::default().configuration(wgpu::TextureFormat::Rgba8Unorm, 64, 64);
        assert_eq!(config.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!(config.usage, wgpu::TextureUsages::RENDER_ATTACHMENT);
    }

    #[test]
    fn configuration_clamps_zero_extents() {
        let config = SurfaceSpec::default().configuration(wgpu::TextureFormat::Rgba8Unorm, 0, 0);
        assert_eq!(config.width, 1);
        assert_eq!(config.height, 1);
    }

    #[test]
    fn format_fallback_prefers_srgb_bgra() {
        let spec = SurfaceSpec::default();
        let available = [
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(
            spec.select_format(&available),
            wgpu::TextureFormat::Bgra8UnormSrgb
        );
    }

    #[test]
    fn format_fallback_walks_the_list() {
        let spec = SurfaceSpec::default();
        assert_eq!(
            spec.select_format(&[wgpu::TextureFormat::Rgba8UnormSrgb]),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        // Nothing preferred available: take the adapter's first.
        assert_eq!(
            spec.select_format(&[wgpu::TextureFormat::Rgba16Float]),
            wgpu::TextureFormat::Rgba16Float
        );
    }

    #[test]
    fn resize_rejects_zero_extents() {
        let mut config = SurfaceSpec::default().configuration(wgpu::TextureFormat::Rgba8Unorm, 800, 600);
        assert!(!apply_resize(&mut config, 0, 600));
        assert!(!apply_resize(&mut config, 800, 0));
        assert_eq!((config.width, config.height), (800, 600));
        assert!(apply_resize(&mut config, 1024, 768));
        assert_eq!((config.width, config.height), (1024, 768));
    }
}

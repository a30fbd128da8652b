//! Shell error types.
//!
//! Construction-time failures are typed and fatal: they abort startup and
//! propagate to the process entry point. Recoverable per-frame conditions
//! (a lost or zero-sized presentable target) never show up here; those are
//! reported as `bool` / `Option` by [`crate::RenderSurface`] so the caller
//! can simply skip the frame.

use thiserror::Error;

/// Result alias for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors that can abort the shell.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The event loop could not be built or exited with a hard error.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// The OS refused to create the native window.
    #[error("window creation failed: {0}")]
    WindowCreation(#[from] winit::error::OsError),
    /// No presentable surface could be created for the window.
    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    /// No adapter is compatible with the window's surface.
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    /// The adapter refused to hand out a device.
    #[error("device creation failed: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// Unrecoverable surface failure while acquiring a frame.
    #[error("surface error: {0}")]
    Surface(wgpu::SurfaceError),
    /// The overlay (imgui context or renderer backend) failed to initialize
    /// or render.
    #[error("overlay error: {0}")]
    Overlay(String),
}

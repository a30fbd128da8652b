//! dear-shell: minimal immediate-mode application shell
//!
//! One native window, one GPU presentation surface bound to it, one Dear
//! ImGui overlay, and a frame loop that drives a caller-supplied UI
//! callback. The crate's job is the lifecycle coordination between those
//! three resources: they are created in dependency order (window, then
//! surface, then overlay), used by the loop, and torn down in reverse.
//!
//! Quickstart
//! ```no_run
//! use dear_shell::{ShellConfig, run};
//!
//! fn main() {
//!     run(ShellConfig::default(), |ui| {
//!         ui.window("Hello, world!")
//!             .build(|| ui.text("This is some useful text."));
//!     })
//!     .unwrap();
//! }
//! ```
//!
//! Everything is affine to the thread running the loop; there is no
//! cross-thread sharing of the device, the surface, or the overlay.

mod error;
mod overlay;
mod surface;
mod window;

pub use dear_imgui_rs as imgui;
pub use dear_imgui_rs::Ui;

pub use error::{ShellError, ShellResult};
pub use overlay::OverlayContext;
pub use surface::{RenderSurface, SurfaceSpec};
pub use window::{RedrawMode, ShellConfig, run};

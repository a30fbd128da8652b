//! Public-surface tests: configuration presets and descriptor policy.

use dear_shell::{RedrawMode, ShellConfig, ShellError, SurfaceSpec};

#[test]
fn default_config_is_a_visible_vsynced_window() {
    let cfg = ShellConfig::default();
    assert!(cfg.visible);
    assert!(cfg.decorations);
    assert_eq!(cfg.size, (1280.0, 720.0));
    assert_eq!(cfg.redraw, RedrawMode::Poll);
    assert_eq!(cfg.position, None);
    assert!(cfg.io_config_flags.is_none());
}

#[test]
fn hidden_host_preset_is_hidden_and_minimal() {
    let cfg = ShellConfig::hidden_host();
    assert!(!cfg.visible);
    assert!(!cfg.decorations);
    assert_eq!(cfg.size, (1.0, 1.0));
    assert_eq!(cfg.position, Some((0.0, 0.0)));
}

#[test]
fn surface_spec_builds_identical_configurations() {
    // Same inputs, two builds, field-for-field identical.
    let spec = SurfaceSpec::default();
    let a = spec.configuration(wgpu::TextureFormat::Rgba8UnormSrgb, 800, 600);
    let b = spec.configuration(wgpu::TextureFormat::Rgba8UnormSrgb, 800, 600);
    assert_eq!(a.format, b.format);
    assert_eq!((a.width, a.height), (b.width, b.height));
    assert_eq!(a.present_mode, b.present_mode);
    assert_eq!(a.usage, b.usage);
    assert_eq!(a.alpha_mode, b.alpha_mode);
    assert_eq!(a.view_formats, b.view_formats);
    assert_eq!(
        a.desired_maximum_frame_latency,
        b.desired_maximum_frame_latency
    );
}

#[test]
fn surface_spec_defaults_to_vsync() {
    let spec = SurfaceSpec::default();
    assert_eq!(spec.present_mode, wgpu::PresentMode::Fifo);
    assert_eq!(spec.desired_maximum_frame_latency, 2);
}

#[test]
fn errors_name_their_failure_stage() {
    let err = ShellError::Overlay("backend missing".into());
    assert!(err.to_string().contains("overlay"));
}

//! Unit tests for config.rs

use crate::config::*;
use crate::error::Error;
use crate::renderer::{CullMode, PolygonMode};

// ============================================================================
// DEFAULTS
// ============================================================================

#[test]
fn test_default_config_is_valid() {
    assert!(RendererConfig::default().validate().is_ok());
}

#[test]
fn test_default_config_values() {
    let config = RendererConfig::default();

    assert_eq!(config.validation_layers, vec!["VK_LAYER_KHRONOS_validation".to_string()]);
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert_eq!(config.frame_pacing, FramePacing::InFlight(2));
    assert!(config.prefer_mailbox);
    assert!(config.depth_buffer);
    assert!(config.instance_extensions.is_empty());
    assert!(config.device_extensions.is_empty());
    assert_eq!(config.rasterization.polygon_mode, PolygonMode::Fill);
    assert_eq!(config.rasterization.cull_mode, CullMode::Back);
}

#[test]
fn test_default_debug_config() {
    let debug = DebugConfig::default();

    assert_eq!(debug.severity, DebugSeverity::ErrorsAndWarnings);
    assert_eq!(debug.output, DebugOutput::Console);
    assert!(debug.message_filter.show_validation);
    assert!(!debug.panic_on_error);
}

// ============================================================================
// FRAME PACING
// ============================================================================

#[test]
fn test_frame_pacing_sync_set_count() {
    assert_eq!(FramePacing::Blocking.frames_in_flight(), 1);
    assert_eq!(FramePacing::InFlight(3).frames_in_flight(), 3);
    assert!(FramePacing::Blocking.is_blocking());
    assert!(!FramePacing::InFlight(1).is_blocking());
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let config = RendererConfig {
        frame_pacing: FramePacing::InFlight(0),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(Error::InitError(_))));
}

#[test]
fn test_too_many_frames_in_flight_rejected() {
    let config = RendererConfig {
        frame_pacing: FramePacing::InFlight(MAX_FRAMES_IN_FLIGHT + 1),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(Error::InitError(_))));
}

#[test]
fn test_blocking_pacing_valid() {
    let config = RendererConfig {
        frame_pacing: FramePacing::Blocking,
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

// ============================================================================
// VALIDATION RULES
// ============================================================================

#[test]
fn test_validation_without_layers_rejected() {
    let config = RendererConfig {
        enable_validation: true,
        validation_layers: Vec::new(),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(Error::InitError(_))));
}

#[test]
fn test_no_validation_without_layers_accepted() {
    let config = RendererConfig {
        enable_validation: false,
        validation_layers: Vec::new(),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_extension_name_rejected() {
    let config = RendererConfig {
        device_extensions: vec!["  ".to_string()],
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_debug_file_rejected() {
    let mut config = RendererConfig::default();
    config.debug.output = DebugOutput::Both(String::new());
    assert!(config.validate().is_err());

    config.debug.output = DebugOutput::File("validation.log".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_non_finite_clear_color_rejected() {
    let config = RendererConfig {
        clear_color: [0.0, f32::NAN, 0.0, 1.0],
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_non_positive_line_width_rejected() {
    let mut config = RendererConfig::default();
    config.rasterization.line_width = 0.0;
    assert!(config.validate().is_err());
}

// ============================================================================
// VALIDATION STATS
// ============================================================================

#[test]
fn test_validation_stats_total() {
    let stats = ValidationStats { errors: 1, warnings: 2, info: 3, verbose: 4 };
    assert_eq!(stats.total(), 10);
    assert!(stats.has_errors());
    assert!(!ValidationStats::default().has_errors());
}

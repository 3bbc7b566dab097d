/// Renderer configuration
///
/// One `RendererConfig` is built by the application and handed to `Renderer::new`.
/// It carries every list the backend needs (validation layers, extra instance and
/// device extensions) so nothing lives in global state.

use crate::error::Result;
use crate::renderer::RasterizationState;

/// Debug message severity filter for validation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Where validation messages are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// Colored console output
    Console,
    /// Append to the given file
    File(String),
    /// Console and file
    Both(String),
}

/// Validation message type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Validation layer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
    /// Trigger a debugger break on validation errors (debug builds only)
    pub break_on_error: bool,
    /// Panic on validation errors
    pub panic_on_error: bool,
    /// Count messages per severity, see `ValidationStats`
    pub enable_stats: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            severity: DebugSeverity::ErrorsAndWarnings,
            output: DebugOutput::Console,
            message_filter: DebugMessageFilter::default(),
            break_on_error: false,
            panic_on_error: false,
            enable_stats: true,
        }
    }
}

/// Validation message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// CPU/GPU frame pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePacing {
    /// One sync set; the CPU waits for the present queue to go idle after every present
    Blocking,
    /// `n` sync sets with per-slot fences; the CPU may record up to `n` frames ahead
    InFlight(usize),
}

impl FramePacing {
    /// Number of semaphore/fence sets to create
    pub fn frames_in_flight(&self) -> usize {
        match self {
            FramePacing::Blocking => 1,
            FramePacing::InFlight(n) => *n,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, FramePacing::Blocking)
    }
}

impl Default for FramePacing {
    fn default() -> Self {
        FramePacing::InFlight(2)
    }
}

/// Upper bound on `FramePacing::InFlight`
pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

/// Renderer configuration, built once and threaded through construction
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub app_name: String,
    pub app_version: (u32, u32, u32),
    pub engine_name: String,
    /// Request validation layers and the debug messenger
    pub enable_validation: bool,
    pub validation_layers: Vec<String>,
    /// Instance extensions on top of the window-system ones
    pub instance_extensions: Vec<String>,
    /// Device extensions on top of VK_KHR_swapchain
    pub device_extensions: Vec<String>,
    pub debug: DebugConfig,
    pub frame_pacing: FramePacing,
    /// Use MAILBOX when the surface offers it, FIFO otherwise
    pub prefer_mailbox: bool,
    /// Create a depth attachment and enable depth testing
    pub depth_buffer: bool,
    pub clear_color: [f32; 4],
    pub rasterization: RasterizationState,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Rendan Application".to_string(),
            app_version: (0, 1, 0),
            engine_name: "Rendan".to_string(),
            enable_validation: cfg!(debug_assertions),
            validation_layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            instance_extensions: Vec::new(),
            device_extensions: Vec::new(),
            debug: DebugConfig::default(),
            frame_pacing: FramePacing::default(),
            prefer_mailbox: true,
            depth_buffer: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            rasterization: RasterizationState::default(),
        }
    }
}

impl RendererConfig {
    /// Reject inconsistent settings before any GPU object is created
    pub fn validate(&self) -> Result<()> {
        if let FramePacing::InFlight(n) = self.frame_pacing {
            if n == 0 || n > MAX_FRAMES_IN_FLIGHT {
                crate::engine_bail!(
                    InitError,
                    "rendan::Config",
                    "frames in flight must be in 1..={}, got {}",
                    MAX_FRAMES_IN_FLIGHT,
                    n
                );
            }
        }

        if self.enable_validation && self.validation_layers.is_empty() {
            crate::engine_bail!(
                InitError,
                "rendan::Config",
                "validation enabled but no validation layer requested"
            );
        }

        let empty_name = |names: &[String]| names.iter().any(|n| n.trim().is_empty());
        if empty_name(&self.validation_layers)
            || empty_name(&self.instance_extensions)
            || empty_name(&self.device_extensions)
        {
            crate::engine_bail!(InitError, "rendan::Config", "empty layer or extension name");
        }

        if let DebugOutput::File(path) | DebugOutput::Both(path) = &self.debug.output {
            if path.is_empty() {
                crate::engine_bail!(InitError, "rendan::Config", "debug output file path is empty");
            }
        }

        if self.clear_color.iter().any(|c| !c.is_finite()) {
            crate::engine_bail!(
                InitError,
                "rendan::Config",
                "clear color must be finite, got {:?}",
                self.clear_color
            );
        }

        if !(self.rasterization.line_width.is_finite() && self.rasterization.line_width > 0.0) {
            crate::engine_bail!(
                InitError,
                "rendan::Config",
                "line width must be positive, got {}",
                self.rasterization.line_width
            );
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

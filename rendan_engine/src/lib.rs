/*!
# Rendan Engine

Core traits and types for the Rendan real-time renderer.

This crate owns everything that does not need a GPU: the frame orchestrator, the
backend contract it drives, the pure selection policies (swap image count, extent
clamping, shader stage table, descriptor pool sizing, mesh draw paths), logging,
errors and configuration. Backend crates (Vulkan) implement [`rendan::render::GraphicsBackend`].

## Architecture

- **Renderer**: frame orchestrator, generic over the backend
- **GraphicsBackend**: factory contract for every GPU object the renderer owns
- **CommandList**: per-frame command recording
- **Mesh**: vertex/index buffers and draw-path selection
- **PerImage**: containers sized to the swap image count

Teardown order is encoded in the `Renderer` field order: per-frame objects first,
then the swapchain and its sync primitives, then device, surface and instance.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod renderer;

// Main rendan namespace module
pub mod rendan {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine logging hub
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{
        RendererConfig, DebugConfig, DebugSeverity, DebugOutput, DebugMessageFilter,
        ValidationStats, FramePacing, MAX_FRAMES_IN_FLIGHT,
    };

    // Frame orchestrator
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, LogCrateLogger};
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::renderer::*;
    }
}

// Re-export math library at crate root
pub use glam;

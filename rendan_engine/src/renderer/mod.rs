/// Renderer module - backend contract, frame orchestrator and pure policies

// Module declarations
pub mod types;
pub mod swapchain;
pub mod shader;
pub mod pipeline;
pub mod buffer;
pub mod image;
pub mod command_list;
pub mod backend;
pub mod per_image;
pub mod mesh;
pub mod frame;
pub mod camera;
pub mod overlay;
pub mod renderer;

#[cfg(test)]
pub(crate) mod mock_backend;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use types::*;
pub use swapchain::*;
pub use shader::*;
pub use pipeline::*;
pub use buffer::*;
pub use image::*;
pub use command_list::*;
pub use backend::*;
pub use per_image::*;
pub use mesh::*;
pub use frame::*;
pub use camera::*;
pub use overlay::*;

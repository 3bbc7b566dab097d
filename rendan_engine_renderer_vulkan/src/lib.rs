/*!
# Rendan Engine - Vulkan Renderer Backend

Vulkan implementation of the Rendan renderer.

This crate implements [`rendan_engine::rendan::render::GraphicsBackend`] using the Ash
library for Vulkan bindings and gpu-allocator for memory management. The frame
orchestrator itself lives in the core crate; [`VulkanRenderer`] is that orchestrator
instantiated over [`VulkanBackend`].

```no_run
use rendan_engine::rendan::render::ShaderModuleDesc;
use rendan_engine::rendan::RendererConfig;
use rendan_engine_renderer_vulkan::VulkanRenderer;
# fn demo(window: &winit::window::Window) -> rendan_engine::rendan::Result<()> {
let shaders = [
    ShaderModuleDesc::from_file("shaders/mesh.vert.spv")?,
    ShaderModuleDesc::from_file("shaders/mesh.frag.spv")?,
];
let renderer = VulkanRenderer::new(window, RendererConfig::default(), &shaders)?;
# Ok(())
# }
```
*/

// Bring-up
mod debug;
mod vulkan_format;
mod vulkan_context;
mod vulkan_surface;
mod vulkan_device;

// Presentation
mod vulkan_swapchain;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_sync;

// Resources and pipeline
mod vulkan_buffer;
mod vulkan_image;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_command_list;

mod vulkan_backend;

pub use vulkan_backend::VulkanBackend;
pub use vulkan_context::VulkanContext;
pub use vulkan_surface::VulkanSurface;
pub use vulkan_device::VulkanDevice;
pub use vulkan_swapchain::VulkanSwapchain;
pub use vulkan_render_pass::VulkanRenderPass;
pub use vulkan_frame_buffer::VulkanFramebuffer;
pub use vulkan_sync::VulkanFrameSync;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_image::{VulkanDepthImage, VulkanImage, VulkanSampler};
pub use vulkan_shader::VulkanShaderModule;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_command_list::{VulkanCommandBuffer, VulkanCommandPool};

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};

/// The frame orchestrator driving the Vulkan backend
pub type VulkanRenderer = rendan_engine::rendan::Renderer<VulkanBackend>;

//! Graphics backend contract
//!
//! A backend is a zero-sized type whose associated types are the GPU objects the
//! renderer owns and whose associated functions create and drive them. Every
//! function takes the objects it depends on explicitly, so ownership stays
//! hierarchical: the renderer owns each object exclusively and drops them in
//! reverse dependency order. Backends share their logical device internally
//! (`Arc`) so child objects can release themselves on drop.

use crate::config::RendererConfig;
use crate::error::Result;
use crate::renderer::{
    BufferDesc, CommandList, Extent2D, FramebufferSize, GpuBuffer, ImageData, PipelineDesc,
    PipelineObject, SamplerDesc, ShaderModuleDesc, ShaderReflection, SwapImageChain,
};

/// Result of asking the swapchain for the next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image acquired; `suboptimal` asks for a recreation after this frame
    Image { index: usize, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be rebuilt
    OutOfDate,
}

/// Result of queueing an image for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented,
    /// Presented, but the swapchain should be rebuilt
    Suboptimal,
    /// Not presented, the swapchain must be rebuilt
    OutOfDate,
}

/// Shader module created by a backend, with the descriptors it uses
pub trait ShaderModuleInfo {
    fn reflection(&self) -> &ShaderReflection;
}

/// One descriptor update for a single swap image's set
pub enum DescriptorWrite<'a, B: GraphicsBackend> {
    UniformBuffer {
        binding: u32,
        buffer: &'a B::Buffer,
    },
    CombinedImageSampler {
        binding: u32,
        image: &'a B::Image,
        sampler: &'a B::Sampler,
    },
}

/// Factory and driver for every GPU object of the renderer
pub trait GraphicsBackend: Sized + 'static {
    /// Window collaborator (framebuffer size and native handles)
    type Window: FramebufferSize;
    /// API instance, debug messenger, selected physical device
    type Context;
    /// OS drawable bound to the window
    type Surface;
    /// Logical device with graphics/present queues and the memory allocator
    type Device;
    /// Semaphores and fences for acquire -> render -> present
    type FrameSync;
    type Swapchain: SwapImageChain;
    type RenderPass;
    type DepthImage;
    type Framebuffer;
    type ShaderModule: ShaderModuleInfo;
    type Pipeline: PipelineObject;
    type CommandPool;
    type CommandBuffer: CommandList<Self>;
    type Buffer: GpuBuffer;
    /// Sampled texture image and its view
    type Image;
    type Sampler;

    // ===== BRING-UP =====

    /// Create the instance, validate layers/extensions and install debug hooks
    fn create_context(window: &Self::Window, config: &RendererConfig) -> Result<Self::Context>;

    fn create_surface(context: &Self::Context, window: &Self::Window) -> Result<Self::Surface>;

    /// Select the physical device for `surface` and create the logical device
    fn create_device(
        context: &Self::Context,
        surface: &Self::Surface,
        config: &RendererConfig,
    ) -> Result<Self::Device>;

    /// Create `frames_in_flight` acquire sets and one render-finished signal per
    /// swap image
    fn create_frame_sync(
        device: &Self::Device,
        frames_in_flight: usize,
        image_count: usize,
    ) -> Result<Self::FrameSync>;

    /// Resize the per-image signals after recreation; the device must be idle
    fn resize_frame_sync(device: &Self::Device, sync: &mut Self::FrameSync, image_count: usize) -> Result<()>;

    // ===== SWAPCHAIN & TARGETS =====

    fn create_swapchain(
        device: &Self::Device,
        surface: &Self::Surface,
        window_extent: Extent2D,
        config: &RendererConfig,
    ) -> Result<Self::Swapchain>;

    /// Extent the surface would give a chain built now (empty while minimized)
    fn surface_extent(
        device: &Self::Device,
        surface: &Self::Surface,
        window_extent: Extent2D,
    ) -> Result<Extent2D>;

    /// Rebuild the chain in place; the caller guarantees the device is idle and
    /// that no framebuffer still references the old image views
    fn recreate_swapchain(
        device: &Self::Device,
        surface: &Self::Surface,
        swapchain: &mut Self::Swapchain,
        window_extent: Extent2D,
    ) -> Result<()>;

    fn create_render_pass(
        device: &Self::Device,
        swapchain: &Self::Swapchain,
        depth: bool,
    ) -> Result<Self::RenderPass>;

    fn create_depth_image(device: &Self::Device, extent: Extent2D) -> Result<Self::DepthImage>;

    /// Framebuffer for swap image `image_index`: [view(i), optional depth view]
    fn create_framebuffer(
        device: &Self::Device,
        render_pass: &Self::RenderPass,
        swapchain: &Self::Swapchain,
        image_index: usize,
        depth: Option<&Self::DepthImage>,
    ) -> Result<Self::Framebuffer>;

    // ===== PIPELINE =====

    /// Create a module and reflect its descriptors (`ShaderError` on failure)
    fn create_shader_module(device: &Self::Device, desc: &ShaderModuleDesc) -> Result<Self::ShaderModule>;

    /// Create the pipeline with one descriptor set per swap image
    fn create_pipeline(
        device: &Self::Device,
        render_pass: &Self::RenderPass,
        shaders: &[Self::ShaderModule],
        desc: &PipelineDesc,
        image_count: usize,
    ) -> Result<Self::Pipeline>;

    /// Recreate the descriptor pool and sets for a new swap image count
    fn reallocate_descriptor_sets(
        device: &Self::Device,
        pipeline: &mut Self::Pipeline,
        image_count: usize,
    ) -> Result<()>;

    /// Update descriptor set `image_index`; the GPU must not be reading it
    fn write_descriptor_set(
        device: &Self::Device,
        pipeline: &Self::Pipeline,
        image_index: usize,
        writes: &[DescriptorWrite<'_, Self>],
    ) -> Result<()>;

    // ===== COMMANDS =====

    /// Command pool on the graphics family, buffers individually resettable
    fn create_command_pool(device: &Self::Device) -> Result<Self::CommandPool>;

    fn allocate_command_buffers(
        device: &Self::Device,
        pool: &Self::CommandPool,
        count: usize,
    ) -> Result<Vec<Self::CommandBuffer>>;

    // ===== RESOURCES =====

    fn create_buffer(device: &Self::Device, desc: &BufferDesc) -> Result<Self::Buffer>;

    /// Upload `data` through a staging buffer with a one-time command buffer
    fn create_texture(
        device: &Self::Device,
        pool: &Self::CommandPool,
        data: &ImageData,
    ) -> Result<Self::Image>;

    fn create_sampler(device: &Self::Device, desc: &SamplerDesc) -> Result<Self::Sampler>;

    // ===== FRAME =====

    /// Block until the GPU finished the last frame that used sync slot `slot`
    fn wait_for_frame(device: &Self::Device, sync: &mut Self::FrameSync, slot: usize) -> Result<()>;

    /// Acquire the next image, signalling the slot's image-available semaphore
    ///
    /// On success the image is free for CPU writes: any earlier frame still
    /// reading its uniform buffer or descriptor set has completed.
    fn acquire_next_image(
        device: &Self::Device,
        swapchain: &Self::Swapchain,
        sync: &mut Self::FrameSync,
        slot: usize,
    ) -> Result<AcquireResult>;

    /// Submit `commands`: wait the slot's image-available at color-attachment
    /// output, signal the image's render-finished and the slot's fence
    fn submit(
        device: &Self::Device,
        sync: &mut Self::FrameSync,
        slot: usize,
        image_index: usize,
        commands: &Self::CommandBuffer,
    ) -> Result<()>;

    /// Present `image_index` once its render-finished is signalled
    fn present(
        device: &Self::Device,
        swapchain: &Self::Swapchain,
        sync: &mut Self::FrameSync,
        slot: usize,
        image_index: usize,
    ) -> Result<PresentResult>;

    /// Wait for the present queue to go idle
    fn wait_present_idle(device: &Self::Device) -> Result<()>;

    /// Wait for the whole device to go idle
    fn wait_idle(device: &Self::Device) -> Result<()>;
}

/// VulkanBackend - `GraphicsBackend` implementation over ash
///
/// Each associated function forwards to the constructor or method of the
/// matching Vulkan object; the objects themselves hold the device they need.

use rendan_engine::rendan::render::{
    AcquireResult, BufferDesc, DescriptorWrite, Extent2D, GraphicsBackend, ImageData, PipelineDesc,
    PresentResult, SamplerDesc, ShaderModuleDesc,
};
use rendan_engine::rendan::{RendererConfig, Result};
use winit::window::Window;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_list::{VulkanCommandBuffer, VulkanCommandPool};
use crate::vulkan_context::VulkanContext;
use crate::vulkan_device::VulkanDevice;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_image::{VulkanDepthImage, VulkanImage, VulkanSampler};
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_shader::VulkanShaderModule;
use crate::vulkan_surface::VulkanSurface;
use crate::vulkan_swapchain::VulkanSwapchain;
use crate::vulkan_sync::VulkanFrameSync;

/// Vulkan implementation of the renderer backend
pub struct VulkanBackend;

impl GraphicsBackend for VulkanBackend {
    type Window = Window;
    type Context = VulkanContext;
    type Surface = VulkanSurface;
    type Device = VulkanDevice;
    type FrameSync = VulkanFrameSync;
    type Swapchain = VulkanSwapchain;
    type RenderPass = VulkanRenderPass;
    type DepthImage = VulkanDepthImage;
    type Framebuffer = VulkanFramebuffer;
    type ShaderModule = VulkanShaderModule;
    type Pipeline = VulkanPipeline;
    type CommandPool = VulkanCommandPool;
    type CommandBuffer = VulkanCommandBuffer;
    type Buffer = VulkanBuffer;
    type Image = VulkanImage;
    type Sampler = VulkanSampler;

    // ===== BRING-UP =====

    fn create_context(window: &Window, config: &RendererConfig) -> Result<VulkanContext> {
        VulkanContext::new(window, config)
    }

    fn create_surface(context: &VulkanContext, window: &Window) -> Result<VulkanSurface> {
        VulkanSurface::new(context, window)
    }

    fn create_device(context: &VulkanContext, surface: &VulkanSurface, config: &RendererConfig) -> Result<VulkanDevice> {
        VulkanDevice::new(context, surface, config)
    }

    fn create_frame_sync(device: &VulkanDevice, frames_in_flight: usize, image_count: usize) -> Result<VulkanFrameSync> {
        VulkanFrameSync::new(device, frames_in_flight, image_count)
    }

    fn resize_frame_sync(_device: &VulkanDevice, sync: &mut VulkanFrameSync, image_count: usize) -> Result<()> {
        sync.resize_images(image_count)
    }

    // ===== SWAPCHAIN & TARGETS =====

    fn create_swapchain(
        device: &VulkanDevice,
        surface: &VulkanSurface,
        window_extent: Extent2D,
        config: &RendererConfig,
    ) -> Result<VulkanSwapchain> {
        VulkanSwapchain::new(device, surface, window_extent, config)
    }

    fn surface_extent(device: &VulkanDevice, surface: &VulkanSurface, window_extent: Extent2D) -> Result<Extent2D> {
        VulkanSwapchain::negotiated_extent(device, surface, window_extent)
    }

    fn recreate_swapchain(
        _device: &VulkanDevice,
        surface: &VulkanSurface,
        swapchain: &mut VulkanSwapchain,
        window_extent: Extent2D,
    ) -> Result<()> {
        swapchain.recreate(surface, window_extent)
    }

    fn create_render_pass(device: &VulkanDevice, swapchain: &VulkanSwapchain, depth: bool) -> Result<VulkanRenderPass> {
        VulkanRenderPass::new(device, swapchain, depth)
    }

    fn create_depth_image(device: &VulkanDevice, extent: Extent2D) -> Result<VulkanDepthImage> {
        VulkanDepthImage::new(device, extent)
    }

    fn create_framebuffer(
        device: &VulkanDevice,
        render_pass: &VulkanRenderPass,
        swapchain: &VulkanSwapchain,
        image_index: usize,
        depth: Option<&VulkanDepthImage>,
    ) -> Result<VulkanFramebuffer> {
        VulkanFramebuffer::new(device, render_pass, swapchain, image_index, depth)
    }

    // ===== PIPELINE =====

    fn create_shader_module(device: &VulkanDevice, desc: &ShaderModuleDesc) -> Result<VulkanShaderModule> {
        VulkanShaderModule::new(device, desc)
    }

    fn create_pipeline(
        device: &VulkanDevice,
        render_pass: &VulkanRenderPass,
        shaders: &[VulkanShaderModule],
        desc: &PipelineDesc,
        image_count: usize,
    ) -> Result<VulkanPipeline> {
        VulkanPipeline::new(device, render_pass, shaders, desc, image_count)
    }

    fn reallocate_descriptor_sets(_device: &VulkanDevice, pipeline: &mut VulkanPipeline, image_count: usize) -> Result<()> {
        pipeline.reallocate(image_count)
    }

    fn write_descriptor_set(
        _device: &VulkanDevice,
        pipeline: &VulkanPipeline,
        image_index: usize,
        writes: &[DescriptorWrite<'_, Self>],
    ) -> Result<()> {
        pipeline.write(image_index, writes)
    }

    // ===== COMMANDS =====

    fn create_command_pool(device: &VulkanDevice) -> Result<VulkanCommandPool> {
        VulkanCommandPool::new(device)
    }

    fn allocate_command_buffers(
        _device: &VulkanDevice,
        pool: &VulkanCommandPool,
        count: usize,
    ) -> Result<Vec<VulkanCommandBuffer>> {
        pool.allocate(count)
    }

    // ===== RESOURCES =====

    fn create_buffer(device: &VulkanDevice, desc: &BufferDesc) -> Result<VulkanBuffer> {
        VulkanBuffer::new(device, desc)
    }

    fn create_texture(device: &VulkanDevice, pool: &VulkanCommandPool, data: &ImageData) -> Result<VulkanImage> {
        VulkanImage::new(device, pool, data)
    }

    fn create_sampler(device: &VulkanDevice, desc: &SamplerDesc) -> Result<VulkanSampler> {
        VulkanSampler::new(device, desc)
    }

    // ===== FRAME =====

    fn wait_for_frame(_device: &VulkanDevice, sync: &mut VulkanFrameSync, slot: usize) -> Result<()> {
        sync.wait_for_frame(slot)
    }

    fn acquire_next_image(
        _device: &VulkanDevice,
        swapchain: &VulkanSwapchain,
        sync: &mut VulkanFrameSync,
        slot: usize,
    ) -> Result<AcquireResult> {
        sync.acquire(swapchain, slot)
    }

    fn submit(
        _device: &VulkanDevice,
        sync: &mut VulkanFrameSync,
        slot: usize,
        image_index: usize,
        commands: &VulkanCommandBuffer,
    ) -> Result<()> {
        sync.submit(slot, image_index, commands)
    }

    fn present(
        _device: &VulkanDevice,
        swapchain: &VulkanSwapchain,
        sync: &mut VulkanFrameSync,
        _slot: usize,
        image_index: usize,
    ) -> Result<PresentResult> {
        sync.present(swapchain, image_index)
    }

    fn wait_present_idle(device: &VulkanDevice) -> Result<()> {
        device.wait_present_idle()
    }

    fn wait_idle(device: &VulkanDevice) -> Result<()> {
        device.wait_idle()
    }
}

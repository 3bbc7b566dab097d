/// VulkanCommandPool / VulkanCommandBuffer - command recording
///
/// One primary command buffer per swap image, re-recorded every frame. Recording
/// state is tracked so misuse (drawing outside a render pass, ending twice...)
/// is reported as `InvalidResource` instead of reaching the driver.

use ash::vk;
use rendan_engine::rendan::render::{
    ClearValue, CommandList, Extent2D, IndexType, PipelineObject, Rect2D, Viewport,
};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_bail, engine_debug, engine_err};
use std::sync::Arc;

use crate::vulkan_backend::VulkanBackend;
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_format::{clear_value_to_vk, extent_to_vk, index_type_to_vk};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;

// ===== COMMAND POOL =====

/// Pool on the graphics family; buffers are individually resettable
pub struct VulkanCommandPool {
    pub(crate) pool: vk::CommandPool,
    device: Arc<DeviceShared>,
}

impl VulkanCommandPool {
    pub fn new(device: &VulkanDevice) -> Result<Self> {
        let shared = &device.shared;
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(shared.graphics_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { shared.device.create_command_pool(&pool_info, None) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create command pool: {:?}", e))?;

        Ok(Self {
            pool,
            device: Arc::clone(shared),
        })
    }

    /// Allocate `count` primary command buffers
    pub fn allocate(&self, count: usize) -> Result<Vec<VulkanCommandBuffer>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count as u32);

        let handles = unsafe { self.device.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to allocate {} command buffer(s): {:?}", count, e))?;

        engine_debug!("rendan::vulkan", "Allocated {} command buffer(s)", count);

        Ok(handles
            .into_iter()
            .map(|command_buffer| VulkanCommandBuffer {
                device: Arc::clone(&self.device),
                pool: self.pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
            })
            .collect())
    }

    /// Record `record` into a temporary command buffer, submit it on the graphics
    /// queue and wait for completion
    ///
    /// The temporary buffer is freed on every path.
    pub(crate) fn submit_one_time(&self, record: impl FnOnce(vk::CommandBuffer)) -> Result<()> {
        let device = &self.device.device;
        let command_buffer = self.begin_single_time_commands()?;

        record(command_buffer);

        let result = self.end_single_time_commands(command_buffer);
        unsafe {
            device.free_command_buffers(self.pool, &[command_buffer]);
        }
        result
    }

    fn begin_single_time_commands(&self) -> Result<vk::CommandBuffer> {
        let device = &self.device.device;
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        unsafe {
            let command_buffer = device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to allocate upload command buffer: {:?}", e))?
                .into_iter()
                .next()
                .ok_or_else(|| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Driver returned no command buffer"))?;

            let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            if let Err(e) = device.begin_command_buffer(command_buffer, &begin_info) {
                device.free_command_buffers(self.pool, &[command_buffer]);
                engine_bail!(RuntimeSubmitError, "rendan::vulkan", "Failed to begin upload command buffer: {:?}", e);
            }
            Ok(command_buffer)
        }
    }

    fn end_single_time_commands(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        let shared = &self.device;
        unsafe {
            shared
                .device
                .end_command_buffer(command_buffer)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to end upload command buffer: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            shared
                .device
                .queue_submit(shared.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to submit upload commands: {:?}", e))?;
            shared
                .device
                .queue_wait_idle(shared.graphics_queue)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to wait for upload: {:?}", e))
        }
    }
}

impl Drop for VulkanCommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.device.destroy_command_pool(self.pool, None);
        }
    }
}

// ===== COMMAND BUFFER =====

pub struct VulkanCommandBuffer {
    device: Arc<DeviceShared>,
    /// Owning pool (must outlive this buffer)
    pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
}

impl VulkanCommandBuffer {
    fn ensure_recording(&self, operation: &str) -> Result<()> {
        if !self.is_recording {
            engine_bail!(InvalidResource, "rendan::vulkan", "{}: command buffer is not recording", operation);
        }
        Ok(())
    }

    fn ensure_in_render_pass(&self, operation: &str) -> Result<()> {
        self.ensure_recording(operation)?;
        if !self.in_render_pass {
            engine_bail!(InvalidResource, "rendan::vulkan", "{}: no render pass is active", operation);
        }
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }
}

impl CommandList<VulkanBackend> for VulkanCommandBuffer {
    fn reset(&mut self) -> Result<()> {
        if self.is_recording {
            engine_bail!(InvalidResource, "rendan::vulkan", "reset: command buffer is still recording");
        }
        unsafe {
            self.device
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to reset command buffer: {:?}", e))
        }
    }

    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            engine_bail!(InvalidResource, "rendan::vulkan", "begin: command buffer is already recording");
        }
        let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording("end")?;
        if self.in_render_pass {
            engine_bail!(InvalidResource, "rendan::vulkan", "end: render pass not ended");
        }
        unsafe {
            self.device
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &VulkanRenderPass,
        framebuffer: &VulkanFramebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording("begin_render_pass")?;
        if self.in_render_pass {
            engine_bail!(InvalidResource, "rendan::vulkan", "begin_render_pass: a render pass is already active");
        }

        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();
        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass.render_pass)
            .framebuffer(framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: extent_to_vk(extent),
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.device
                .device
                .cmd_begin_render_pass(self.command_buffer, &render_pass_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_in_render_pass("end_render_pass")?;
        unsafe {
            self.device.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording("set_viewport")?;
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);
        unsafe {
            self.device.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording("set_scissor")?;
        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D {
                width: scissor.width,
                height: scissor.height,
            });
        unsafe {
            self.device.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &VulkanPipeline) -> Result<()> {
        self.ensure_in_render_pass("bind_pipeline")?;
        unsafe {
            self.device
                .device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline);
        }
        Ok(())
    }

    fn bind_descriptor_set(&mut self, pipeline: &VulkanPipeline, image_index: usize) -> Result<()> {
        self.ensure_in_render_pass("bind_descriptor_set")?;
        if !pipeline.has_descriptors() && image_index < pipeline.descriptor_set_count() {
            // Empty layout: nothing to bind
            return Ok(());
        }
        let set = pipeline.descriptor_set(image_index).ok_or_else(|| {
            engine_err!(
                InvalidResource,
                "rendan::vulkan",
                "bind_descriptor_set: no descriptor set for swap image {}",
                image_index
            )
        })?;
        unsafe {
            self.device.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline.layout,
                0,
                &[set],
                &[],
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &VulkanBuffer, offset: u64) -> Result<()> {
        self.ensure_in_render_pass("bind_vertex_buffer")?;
        unsafe {
            self.device
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &VulkanBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_in_render_pass("bind_index_buffer")?;
        unsafe {
            self.device.device.cmd_bind_index_buffer(
                self.command_buffer,
                buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_in_render_pass("draw")?;
        unsafe {
            self.device
                .device
                .cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_in_render_pass("draw_indexed")?;
        unsafe {
            self.device
                .device
                .cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }
}

impl Drop for VulkanCommandBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.device.free_command_buffers(self.pool, &[self.command_buffer]);
        }
    }
}

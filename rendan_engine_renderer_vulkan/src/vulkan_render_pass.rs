/// VulkanRenderPass - single-subpass pass: swapchain color + optional depth

use ash::vk;
use rendan_engine::rendan::Result;
use rendan_engine::{engine_debug, engine_err};
use std::sync::Arc;

use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_swapchain::VulkanSwapchain;

pub struct VulkanRenderPass {
    pub(crate) render_pass: vk::RenderPass,
    /// Depth attachment format, `None` for a color-only pass
    pub(crate) depth_format: Option<vk::Format>,
    device: Arc<DeviceShared>,
}

/// Stage and access masks of the external -> subpass 0 dependency
pub fn subpass_dependency_masks(has_depth: bool) -> (vk::PipelineStageFlags, vk::AccessFlags) {
    if has_depth {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
    } else {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        )
    }
}

impl VulkanRenderPass {
    /// Color is cleared and stored, ending in PRESENT_SRC; depth is cleared and discarded
    pub fn new(device: &VulkanDevice, swapchain: &VulkanSwapchain, depth: bool) -> Result<Self> {
        let shared = &device.shared;
        let depth_format = if depth {
            Some(shared.depth_format.ok_or_else(|| {
                engine_err!(InitError, "rendan::vulkan", "Depth buffer requested but no depth format is supported")
            })?)
        } else {
            None
        };

        let mut attachments = vec![vk::AttachmentDescription::default()
            .format(swapchain.format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];

        let color_refs = [vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
        let depth_ref = vk::AttachmentReference::default()
            .attachment(1)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        if let Some(format) = depth_format {
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .stencil_load_op(vk::AttachmentLoadOp::CLEAR)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            );
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if depth_format.is_some() {
            subpass = subpass.depth_stencil_attachment(&depth_ref);
        }

        let (stage_mask, access_mask) = subpass_dependency_masks(depth_format.is_some());
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stage_mask)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stage_mask)
            .dst_access_mask(access_mask);

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        let render_pass = unsafe { shared.device.create_render_pass(&render_pass_info, None) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create render pass: {:?}", e))?;

        engine_debug!(
            "rendan::vulkan",
            "Render pass created ({} attachment(s))",
            attachments.len()
        );

        Ok(Self {
            render_pass,
            depth_format,
            device: Arc::clone(shared),
        })
    }

    pub fn has_depth(&self) -> bool {
        self.depth_format.is_some()
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

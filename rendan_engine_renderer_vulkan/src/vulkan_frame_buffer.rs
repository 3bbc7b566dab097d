/// VulkanFramebuffer - one per swap image, grouping its color view and the depth view
///
/// Destroyed when dropped, which must happen before the swapchain views it
/// references are destroyed.

use ash::vk;
use rendan_engine::rendan::render::{Extent2D, SwapImageChain};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_bail, engine_err};
use std::sync::Arc;

use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_image::VulkanDepthImage;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_swapchain::VulkanSwapchain;

pub struct VulkanFramebuffer {
    pub(crate) framebuffer: vk::Framebuffer,
    extent: Extent2D,
    device: Arc<DeviceShared>,
}

impl VulkanFramebuffer {
    pub fn new(
        device: &VulkanDevice,
        render_pass: &VulkanRenderPass,
        swapchain: &VulkanSwapchain,
        image_index: usize,
        depth: Option<&VulkanDepthImage>,
    ) -> Result<Self> {
        let Some(color_view) = swapchain.image_view(image_index) else {
            engine_bail!(
                InvalidResource,
                "rendan::vulkan",
                "Swap image index {} out of range ({} images)",
                image_index,
                swapchain.image_count()
            );
        };

        if render_pass.has_depth() != depth.is_some() {
            engine_bail!(
                InvalidResource,
                "rendan::vulkan",
                "Framebuffer depth attachment does not match the render pass"
            );
        }

        let mut attachments = vec![color_view];
        if let Some(depth) = depth {
            attachments.push(depth.view);
        }

        let extent = swapchain.extent();
        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.shared.device.create_framebuffer(&framebuffer_info, None) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create framebuffer: {:?}", e))?;

        Ok(Self {
            framebuffer,
            extent,
            device: Arc::clone(&device.shared),
        })
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

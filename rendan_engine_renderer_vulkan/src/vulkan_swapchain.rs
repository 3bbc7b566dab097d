/// VulkanSwapchain - presentable images and their views
///
/// Recreated in place: the new chain is created with the old one as
/// `old_swapchain`, then the old one is destroyed. Framebuffers referencing the
/// views must be dropped by the caller first.

use ash::vk;
use rendan_engine::rendan::render::{clamp_extent, swap_image_count, Extent2D, SwapImageChain};
use rendan_engine::rendan::{RendererConfig, Result};
use rendan_engine::{engine_bail, engine_debug, engine_err, engine_info, engine_warn};
use std::sync::Arc;

use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_format::{extent_from_vk, extent_to_vk};
use crate::vulkan_surface::VulkanSurface;

// ===== SELECTION POLICIES =====

/// B8G8R8A8_SRGB with sRGB non-linear color space, else the first reported format
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .or_else(|| formats.first())
        .copied()
}

/// MAILBOX when preferred and available, FIFO otherwise (always supported)
pub fn choose_present_mode(modes: &[vk::PresentModeKHR], prefer_mailbox: bool) -> vk::PresentModeKHR {
    if prefer_mailbox && modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Surface-imposed extent, or the window size clamped to the surface limits
/// when the surface leaves it to the application (`u32::MAX` width)
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window: Extent2D) -> Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        extent_from_vk(capabilities.current_extent)
    } else {
        clamp_extent(
            window,
            extent_from_vk(capabilities.min_image_extent),
            extent_from_vk(capabilities.max_image_extent),
        )
    }
}

/// Image sharing across the graphics and present families
pub fn sharing_mode(graphics_family: u32, present_family: u32) -> (vk::SharingMode, Vec<u32>) {
    if graphics_family == present_family {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        (vk::SharingMode::CONCURRENT, vec![graphics_family, present_family])
    }
}

// ===== SWAPCHAIN =====

pub struct VulkanSwapchain {
    device: Arc<DeviceShared>,
    pub(crate) swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    pub(crate) format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    present_mode: vk::PresentModeKHR,
    extent: Extent2D,
    prefer_mailbox: bool,
}

impl VulkanSwapchain {
    pub fn new(
        device: &VulkanDevice,
        surface: &VulkanSurface,
        window_extent: Extent2D,
        config: &RendererConfig,
    ) -> Result<Self> {
        let shared = &device.shared;
        let formats = surface.formats(shared.physical_device)?;
        let surface_format = choose_surface_format(&formats)
            .ok_or_else(|| engine_err!(InitError, "rendan::vulkan", "Surface reports no formats"))?;
        if surface_format.format != vk::Format::B8G8R8A8_SRGB {
            engine_warn!(
                "rendan::vulkan",
                "B8G8R8A8_SRGB not offered, using {:?} / {:?}",
                surface_format.format,
                surface_format.color_space
            );
        }
        let present_mode = choose_present_mode(&surface.present_modes(shared.physical_device)?, config.prefer_mailbox);

        let mut swapchain = Self {
            device: Arc::clone(shared),
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: surface_format.format,
            color_space: surface_format.color_space,
            present_mode,
            extent: Extent2D::default(),
            prefer_mailbox: config.prefer_mailbox,
        };
        swapchain.build(surface, window_extent)?;

        engine_info!(
            "rendan::vulkan",
            "Swapchain created: {} image(s), {}x{}, {:?}, {:?}",
            swapchain.images.len(),
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.format,
            swapchain.present_mode
        );
        Ok(swapchain)
    }

    /// Extent a chain built now would get; empty while the window is minimized
    pub fn negotiated_extent(device: &VulkanDevice, surface: &VulkanSurface, window_extent: Extent2D) -> Result<Extent2D> {
        let capabilities = surface.capabilities(device.shared.physical_device)?;
        Ok(choose_extent(&capabilities, window_extent))
    }

    /// Rebuild for the current surface size; the device must be idle
    pub fn recreate(&mut self, surface: &VulkanSurface, window_extent: Extent2D) -> Result<()> {
        self.present_mode = choose_present_mode(
            &surface.present_modes(self.device.physical_device)?,
            self.prefer_mailbox,
        );
        self.build(surface, window_extent)?;

        engine_debug!(
            "rendan::vulkan",
            "Swapchain recreated: {} image(s), {}x{}",
            self.images.len(),
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    /// Create the chain (retiring the current one if any) and its image views
    fn build(&mut self, surface: &VulkanSurface, window_extent: Extent2D) -> Result<()> {
        let shared = Arc::clone(&self.device);
        let capabilities = surface.capabilities(shared.physical_device)?;
        let extent = choose_extent(&capabilities, window_extent);
        if extent.is_empty() {
            engine_bail!(
                InvalidResource,
                "rendan::vulkan",
                "Surface extent is {}x{}, swapchain not rebuilt",
                extent.width,
                extent.height
            );
        }
        let image_count = swap_image_count(capabilities.min_image_count, capabilities.max_image_count);
        let (sharing, families) = sharing_mode(shared.graphics_family, shared.present_family);

        self.destroy_image_views();

        let old_swapchain = self.swapchain;
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.surface)
            .min_image_count(image_count)
            .image_format(self.format)
            .image_color_space(self.color_space)
            .image_extent(extent_to_vk(extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing)
            .queue_family_indices(&families)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(self.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        unsafe {
            let swapchain = shared
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create swapchain: {:?}", e))?;

            if old_swapchain != vk::SwapchainKHR::null() {
                shared.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = shared
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get swapchain images: {:?}", e))?;

            for &image in &self.images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(self.format)
                    .components(vk::ComponentMapping::default())
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view = shared
                    .device
                    .create_image_view(&view_info, None)
                    .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create swapchain image view: {:?}", e))?;
                self.image_views.push(view);
            }
        }

        Ok(())
    }

    fn destroy_image_views(&mut self) {
        unsafe {
            for view in self.image_views.drain(..) {
                self.device.device.destroy_image_view(view, None);
            }
        }
    }

    pub(crate) fn image_view(&self, index: usize) -> Option<vk::ImageView> {
        self.image_views.get(index).copied()
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }
}

impl SwapImageChain for VulkanSwapchain {
    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        self.destroy_image_views();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.device.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;

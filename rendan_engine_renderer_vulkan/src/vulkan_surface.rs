/// VulkanSurface - presentation surface bound to the window

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_debug, engine_err};
use winit::window::Window;

use crate::vulkan_context::VulkanContext;

/// Window surface, destroyed before the instance
pub struct VulkanSurface {
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) loader: ash::khr::surface::Instance,
}

impl VulkanSurface {
    pub fn new(context: &VulkanContext, window: &Window) -> Result<Self> {
        let display_handle = window
            .display_handle()
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get display handle: {}", e))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get window handle: {}", e))?;

        let surface = unsafe {
            ash_window::create_surface(
                &context.entry,
                &context.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
        }
        .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create surface: {:?}", e))?;

        engine_debug!("rendan::vulkan", "Window surface created");

        Ok(Self {
            surface,
            loader: context.surface_loader.clone(),
        })
    }

    pub(crate) fn capabilities(&self, physical_device: vk::PhysicalDevice) -> Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get surface capabilities: {:?}", e))
        }
    }

    pub(crate) fn formats(&self, physical_device: vk::PhysicalDevice) -> Result<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get surface formats: {:?}", e))
        }
    }

    pub(crate) fn present_modes(&self, physical_device: vk::PhysicalDevice) -> Result<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to get surface present modes: {:?}", e))
        }
    }

    pub(crate) fn supports_present(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> bool {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, queue_family, self.surface)
                .unwrap_or(false)
        }
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// VulkanDevice - physical device selection, logical device, queues and allocator
///
/// The logical device lives in an `Arc<DeviceShared>` held by every child object
/// (swapchain, pipeline, buffers, images...), so each child can release itself on
/// drop. The allocator is released before the device is destroyed.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, Allocator, AllocatorCreateDesc};
use rendan_engine::rendan::{Error, RendererConfig, Result};
use rendan_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_info, engine_warn};
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::{missing_names, to_c_strings, VulkanContext};
use crate::vulkan_surface::VulkanSurface;

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

// ===== SELECTION POLICIES =====

/// Queue family indices found on a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }
}

/// Find graphics and present families
///
/// A family supporting both is preferred; otherwise the first graphics family and
/// the first present family are used.
pub fn find_queue_families(
    families: &[vk::QueueFamilyProperties],
    supports_present: impl Fn(u32) -> bool,
) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();

    for (i, family) in families.iter().enumerate() {
        let index = i as u32;
        let graphics = family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        let present = supports_present(index);

        if graphics && present {
            return QueueFamilyIndices {
                graphics: Some(index),
                present: Some(index),
            };
        }
        if graphics && indices.graphics.is_none() {
            indices.graphics = Some(index);
        }
        if present && indices.present.is_none() {
            indices.present = Some(index);
        }
    }

    indices
}

/// Distinct family indices, one queue create info each
pub fn unique_queue_families(graphics: u32, present: u32) -> Vec<u32> {
    if graphics == present {
        vec![graphics]
    } else {
        vec![graphics, present]
    }
}

/// First candidate whose optimal-tiling features contain `features`
pub fn select_supported_format(
    candidates: &[vk::Format],
    features: vk::FormatFeatureFlags,
    properties: impl Fn(vk::Format) -> vk::FormatProperties,
) -> Option<vk::Format> {
    candidates
        .iter()
        .copied()
        .find(|&format| properties(format).optimal_tiling_features.contains(features))
}

// ===== SHARED DEVICE =====

/// Logical device state shared by every child object
pub(crate) struct DeviceShared {
    pub(crate) device: ash::Device,
    /// Released in `Drop` before the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) graphics_family: u32,
    pub(crate) present_family: u32,
    pub(crate) graphics_queue: vk::Queue,
    pub(crate) present_queue: vk::Queue,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,
    /// Preferred depth attachment format, `None` when no candidate is supported
    pub(crate) depth_format: Option<vk::Format>,
    /// Device anisotropy limit, `None` when the feature is not enabled
    pub(crate) max_sampler_anisotropy: Option<f32>,
}

impl DeviceShared {
    pub(crate) fn allocate(&self, desc: &AllocationCreateDesc<'_>) -> Result<Allocation> {
        let mut allocator = self
            .allocator
            .lock()
            .map_err(|_| engine_err!(RuntimeSubmitError, "rendan::vulkan", "GPU allocator lock poisoned"))?;
        allocator.allocate(desc).map_err(|e| {
            let size_mb = desc.requirements.size as f64 / (1024.0 * 1024.0);
            engine_error!(
                "rendan::vulkan",
                "Out of GPU memory for '{}' ({:.2} MB): {}",
                desc.name,
                size_mb,
                e
            );
            Error::OutOfMemory
        })
    }

    /// Free an allocation, logging failures (used from `Drop`)
    pub(crate) fn free(&self, allocation: Allocation) {
        match self.allocator.lock() {
            Ok(mut allocator) => {
                if let Err(e) = allocator.free(allocation) {
                    engine_warn!("rendan::vulkan", "Failed to free GPU allocation: {}", e);
                }
            }
            Err(_) => engine_warn!("rendan::vulkan", "GPU allocator lock poisoned, allocation leaked"),
        }
    }
}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            // Free VkDeviceMemory pages before the device goes away
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);
        }
    }
}

/// Logical device with its queues and memory allocator
pub struct VulkanDevice {
    pub(crate) shared: Arc<DeviceShared>,
}

/// Physical device candidate that passed every requirement
struct Candidate {
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
    present_family: u32,
    name: String,
    anisotropy: bool,
}

impl VulkanDevice {
    /// Select a physical device for `surface` and create the logical device
    pub fn new(context: &VulkanContext, surface: &VulkanSurface, config: &RendererConfig) -> Result<Self> {
        let mut required_extensions = vec![ash::khr::swapchain::NAME.to_string_lossy().into_owned()];
        for extension in &config.device_extensions {
            if !required_extensions.contains(extension) {
                required_extensions.push(extension.clone());
            }
        }

        let candidate = Self::pick_physical_device(context, surface, &required_extensions)?;
        let instance = &context.instance;

        unsafe {
            // ===== LOGICAL DEVICE =====
            let queue_priorities = [1.0];
            let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> =
                unique_queue_families(candidate.graphics_family, candidate.present_family)
                    .into_iter()
                    .map(|family| {
                        vk::DeviceQueueCreateInfo::default()
                            .queue_family_index(family)
                            .queue_priorities(&queue_priorities)
                    })
                    .collect();

            let extension_names = to_c_strings(&required_extensions)?;
            let extension_ptrs: Vec<*const std::os::raw::c_char> =
                extension_names.iter().map(|n| n.as_ptr()).collect();

            let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(candidate.anisotropy);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&extension_ptrs)
                .enabled_features(&device_features);

            let device = instance
                .create_device(candidate.physical_device, &device_create_info, None)
                .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create logical device: {:?}", e))?;

            let graphics_queue = device.get_device_queue(candidate.graphics_family, 0);
            let present_queue = device.get_device_queue(candidate.present_family, 0);

            // ===== ALLOCATOR =====
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: candidate.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    engine_bail!(InitError, "rendan::vulkan", "Failed to create GPU allocator: {:?}", e);
                }
            };

            let depth_format = select_supported_format(
                &DEPTH_FORMAT_CANDIDATES,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
                |format| instance.get_physical_device_format_properties(candidate.physical_device, format),
            );
            if depth_format.is_none() {
                engine_warn!("rendan::vulkan", "No supported depth format on '{}'", candidate.name);
            }

            let max_sampler_anisotropy = candidate.anisotropy.then(|| {
                instance
                    .get_physical_device_properties(candidate.physical_device)
                    .limits
                    .max_sampler_anisotropy
            });

            let swapchain_loader = ash::khr::swapchain::Device::new(instance, &device);

            engine_info!(
                "rendan::vulkan",
                "Logical device created on '{}' (graphics family {}, present family {})",
                candidate.name,
                candidate.graphics_family,
                candidate.present_family
            );

            Ok(Self {
                shared: Arc::new(DeviceShared {
                    device,
                    allocator: ManuallyDrop::new(Mutex::new(allocator)),
                    physical_device: candidate.physical_device,
                    graphics_family: candidate.graphics_family,
                    present_family: candidate.present_family,
                    graphics_queue,
                    present_queue,
                    swapchain_loader,
                    depth_format,
                    max_sampler_anisotropy,
                }),
            })
        }
    }

    /// First device with complete queue families, the required extensions
    /// and at least one surface format and present mode
    fn pick_physical_device(
        context: &VulkanContext,
        surface: &VulkanSurface,
        required_extensions: &[String],
    ) -> Result<Candidate> {
        let instance = &context.instance;
        let physical_devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to enumerate physical devices: {:?}", e))?;

        if physical_devices.is_empty() {
            engine_bail!(InitError, "rendan::vulkan", "No Vulkan-capable GPU found");
        }

        let mut found: Option<Candidate> = None;
        for physical_device in physical_devices {
            let properties = unsafe { instance.get_physical_device_properties(physical_device) };
            let name = properties
                .device_name_as_c_str()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "<unnamed>".to_string());

            match Self::check_device(context, surface, physical_device, required_extensions) {
                Ok((graphics_family, present_family, anisotropy)) => {
                    engine_debug!("rendan::vulkan", "Selected GPU '{}' ({:?})", name, properties.device_type);
                    found = Some(Candidate {
                        physical_device,
                        graphics_family,
                        present_family,
                        name,
                        anisotropy,
                    });
                    break;
                }
                Err(reason) => engine_debug!("rendan::vulkan", "Skipping GPU '{}': {}", name, reason),
            }
        }

        found.ok_or_else(|| {
            engine_err!(
                InitError,
                "rendan::vulkan",
                "No GPU supports graphics + present queues, {} and the window surface",
                required_extensions.join(", ")
            )
        })
    }

    /// `(graphics family, present family, anisotropy)` or the reason the device is unsuitable
    fn check_device(
        context: &VulkanContext,
        surface: &VulkanSurface,
        physical_device: vk::PhysicalDevice,
        required_extensions: &[String],
    ) -> std::result::Result<(u32, u32, bool), String> {
        let instance = &context.instance;
        let families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let indices = find_queue_families(&families, |i| surface.supports_present(physical_device, i));
        let (graphics, present) = match (indices.graphics, indices.present) {
            (Some(g), Some(p)) => (g, p),
            _ => return Err("missing graphics or present queue family".to_string()),
        };

        let available: Vec<String> = unsafe { instance.enumerate_device_extension_properties(physical_device) }
            .map_err(|e| format!("cannot enumerate extensions: {:?}", e))?
            .iter()
            .filter_map(|p| p.extension_name_as_c_str().ok())
            .map(|n: &CStr| n.to_string_lossy().into_owned())
            .collect();
        let missing = missing_names(required_extensions, &available);
        if !missing.is_empty() {
            return Err(format!("missing extension(s) {}", missing.join(", ")));
        }

        let formats = surface.formats(physical_device).map_err(|e| e.to_string())?;
        let present_modes = surface.present_modes(physical_device).map_err(|e| e.to_string())?;
        if formats.is_empty() || present_modes.is_empty() {
            return Err("no surface format or present mode".to_string());
        }

        let features = unsafe { instance.get_physical_device_features(physical_device) };
        Ok((graphics, present, features.sampler_anisotropy == vk::TRUE))
    }

    pub(crate) fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.shared
                .device
                .device_wait_idle()
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    pub(crate) fn wait_present_idle(&self) -> Result<()> {
        unsafe {
            self.shared
                .device
                .queue_wait_idle(self.shared.present_queue)
                .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to wait for present queue: {:?}", e))
        }
    }

    pub fn depth_format(&self) -> Option<vk::Format> {
        self.shared.depth_format
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;

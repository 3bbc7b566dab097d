/// VulkanBuffer - buffer with its gpu-allocator allocation

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use rendan_engine::rendan::render::{check_write_range, BufferDesc, GpuBuffer};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_bail, engine_err, engine_trace};
use std::sync::Arc;

use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_format::{buffer_usage_to_vk, memory_location};

pub struct VulkanBuffer {
    device: Arc<DeviceShared>,
    pub(crate) buffer: vk::Buffer,
    /// Taken in `Drop`; `None` only while construction is incomplete
    allocation: Option<Allocation>,
    size: u64,
    label: String,
}

impl VulkanBuffer {
    pub fn new(device: &VulkanDevice, desc: &BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            engine_bail!(InvalidResource, "rendan::vulkan", "Buffer '{}' has size 0", desc.label);
        }

        let shared = &device.shared;
        let buffer_info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(buffer_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { shared.device.create_buffer(&buffer_info, None) }.map_err(|e| {
            engine_err!(
                RuntimeSubmitError,
                "rendan::vulkan",
                "Failed to create buffer '{}' of {} bytes: {:?}",
                desc.label,
                desc.size,
                e
            )
        })?;

        // Owns the handle from here on, so early returns clean it up
        let mut this = Self {
            device: Arc::clone(shared),
            buffer,
            allocation: None,
            size: desc.size,
            label: desc.label.clone(),
        };

        let requirements = unsafe { shared.device.get_buffer_memory_requirements(buffer) };
        let allocation = shared.allocate(&AllocationCreateDesc {
            name: &desc.label,
            requirements,
            location: memory_location(desc.residency),
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        let bound = unsafe { shared.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) };
        this.allocation = Some(allocation);
        bound.map_err(|e| {
            engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to bind memory of buffer '{}': {:?}", desc.label, e)
        })?;

        engine_trace!("rendan::vulkan", "Buffer '{}' created ({} bytes)", desc.label, desc.size);
        Ok(this)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl GpuBuffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_write_range(&self.label, self.size, offset, data.len())?;

        let mapped = self
            .allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .ok_or_else(|| {
                engine_err!(
                    InvalidResource,
                    "rendan::vulkan",
                    "Buffer '{}' is not CPU-accessible",
                    self.label
                )
            })?;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                (mapped.as_ptr() as *mut u8).add(offset as usize),
                data.len(),
            );
        }
        Ok(())
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.device.free(allocation);
        }
        unsafe {
            self.device.device.destroy_buffer(self.buffer, None);
        }
    }
}

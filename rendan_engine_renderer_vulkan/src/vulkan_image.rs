/// VulkanImage / VulkanDepthImage / VulkanSampler - image resources
///
/// Textures are RGBA8 sRGB, uploaded once through a staging buffer and left in
/// SHADER_READ_ONLY_OPTIMAL. Each struct owns its handles from the moment they
/// exist, so a failure half-way through construction still releases everything.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use rendan_engine::rendan::render::{
    BufferDesc, BufferUsage, Extent2D, GpuBuffer, ImageData, MemoryResidency, SamplerDesc,
};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_bail, engine_debug, engine_err};
use std::sync::Arc;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_list::VulkanCommandPool;
use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_format::{address_mode_to_vk, filter_to_vk, has_stencil_component};

/// Format of every sampled texture
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Requested anisotropy clamped to the device limit; `None` disables it
pub fn effective_anisotropy(requested: Option<f32>, device_limit: Option<f32>) -> Option<f32> {
    match (requested, device_limit) {
        (Some(requested), Some(limit)) if requested >= 1.0 => Some(requested.min(limit)),
        _ => None,
    }
}

// ===== SHARED IMAGE STORAGE =====

/// Image, its memory and a single-mip 2D view
struct ImageStorage {
    device: Arc<DeviceShared>,
    image: vk::Image,
    allocation: Option<Allocation>,
    view: vk::ImageView,
}

impl ImageStorage {
    fn new(
        shared: &Arc<DeviceShared>,
        name: &str,
        extent: Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        aspect_mask: vk::ImageAspectFlags,
    ) -> Result<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { shared.device.create_image(&image_info, None) }
            .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to create image '{}': {:?}", name, e))?;

        let mut storage = Self {
            device: Arc::clone(shared),
            image,
            allocation: None,
            view: vk::ImageView::null(),
        };

        let requirements = unsafe { shared.device.get_image_memory_requirements(image) };
        let allocation = shared.allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        let bound = unsafe { shared.device.bind_image_memory(image, allocation.memory(), allocation.offset()) };
        storage.allocation = Some(allocation);
        bound.map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to bind memory of image '{}': {:?}", name, e))?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        storage.view = unsafe { shared.device.create_image_view(&view_info, None) }
            .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to create view of image '{}': {:?}", name, e))?;

        Ok(storage)
    }
}

impl Drop for ImageStorage {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.device.device.destroy_image_view(self.view, None);
            }
        }
        if let Some(allocation) = self.allocation.take() {
            self.device.free(allocation);
        }
        unsafe {
            self.device.device.destroy_image(self.image, None);
        }
    }
}

// ===== TEXTURE =====

/// Sampled 2D texture
pub struct VulkanImage {
    _storage: ImageStorage,
    pub(crate) view: vk::ImageView,
    extent: Extent2D,
}

impl VulkanImage {
    /// Create the image and upload `data` (converted to RGBA8) with a one-time submission
    pub fn new(device: &VulkanDevice, pool: &VulkanCommandPool, data: &ImageData) -> Result<Self> {
        let pixels = data.to_rgba8()?;
        let extent = Extent2D::new(data.width, data.height);

        let staging = VulkanBuffer::new(
            device,
            &BufferDesc {
                label: "texture_staging".to_string(),
                size: pixels.len() as u64,
                usage: BufferUsage::TRANSFER_SRC,
                residency: MemoryResidency::CpuToGpu,
            },
        )?;
        staging.write(0, &pixels)?;

        let storage = ImageStorage::new(
            &device.shared,
            "texture",
            extent,
            TEXTURE_FORMAT,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::ImageAspectFlags::COLOR,
        )?;

        let raw = &device.shared.device;
        let image = storage.image;
        let range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };

        pool.submit_one_time(|command_buffer| unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
            raw.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                });
            raw.cmd_copy_buffer_to_image(
                command_buffer,
                staging.buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);
            raw.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader],
            );
        })?;

        engine_debug!(
            "rendan::vulkan",
            "Texture uploaded ({}x{}, {} channel(s))",
            extent.width,
            extent.height,
            data.channels
        );

        Ok(Self {
            view: storage.view,
            _storage: storage,
            extent,
        })
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

// ===== DEPTH =====

/// Depth attachment sized to the swapchain
pub struct VulkanDepthImage {
    _storage: ImageStorage,
    pub(crate) view: vk::ImageView,
    format: vk::Format,
}

impl VulkanDepthImage {
    pub fn new(device: &VulkanDevice, extent: Extent2D) -> Result<Self> {
        let Some(format) = device.shared.depth_format else {
            engine_bail!(InitError, "rendan::vulkan", "No supported depth format for the depth buffer");
        };
        if extent.is_empty() {
            engine_bail!(InvalidResource, "rendan::vulkan", "Depth image extent {}x{} is empty", extent.width, extent.height);
        }

        // Depth-only view even for combined formats
        let storage = ImageStorage::new(
            &device.shared,
            "depth",
            extent,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::ImageAspectFlags::DEPTH,
        )?;

        engine_debug!(
            "rendan::vulkan",
            "Depth image created ({}x{}, {:?}, stencil: {})",
            extent.width,
            extent.height,
            format,
            has_stencil_component(format)
        );

        Ok(Self {
            view: storage.view,
            _storage: storage,
            format,
        })
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }
}

// ===== SAMPLER =====

pub struct VulkanSampler {
    pub(crate) sampler: vk::Sampler,
    device: Arc<DeviceShared>,
}

impl VulkanSampler {
    pub fn new(device: &VulkanDevice, desc: &SamplerDesc) -> Result<Self> {
        let shared = &device.shared;
        let address = address_mode_to_vk(desc.address_mode);
        let anisotropy = effective_anisotropy(desc.max_anisotropy, shared.max_sampler_anisotropy);

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.mag_filter))
            .min_filter(filter_to_vk(desc.min_filter))
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .anisotropy_enable(anisotropy.is_some())
            .max_anisotropy(anisotropy.unwrap_or(1.0))
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .min_lod(0.0)
            .max_lod(0.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false);

        let sampler = unsafe { shared.device.create_sampler(&create_info, None) }
            .map_err(|e| engine_err!(RuntimeSubmitError, "rendan::vulkan", "Failed to create sampler: {:?}", e))?;

        Ok(Self {
            sampler,
            device: Arc::clone(shared),
        })
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe {
            self.device.device.destroy_sampler(self.sampler, None);
        }
    }
}

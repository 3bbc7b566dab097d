/// VulkanPipeline - graphics pipeline, its layout and one descriptor set per swap image
///
/// Viewport and scissor are dynamic, so the pipeline survives swapchain
/// recreation. Only the descriptor pool is rebuilt when the image count changes.

use ash::vk;
use rendan_engine::rendan::render::{
    DescriptorBinding, DescriptorKind, DescriptorPoolSizes, DescriptorWrite, PipelineDesc, PipelineObject,
};
use rendan_engine::rendan::Result;
use rendan_engine::{engine_bail, engine_debug, engine_err};
use std::sync::Arc;

use crate::vulkan_backend::VulkanBackend;
use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_format::{
    cull_mode_to_vk, descriptor_kind_to_vk, front_face_to_vk, polygon_mode_to_vk, stage_flags_to_vk,
    topology_to_vk, vertex_format_to_vk,
};
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_shader::VulkanShaderModule;

/// Pool sizes with zero-count entries left out
pub fn descriptor_pool_sizes(sizes: &DescriptorPoolSizes) -> Vec<vk::DescriptorPoolSize> {
    [
        (vk::DescriptorType::UNIFORM_BUFFER, sizes.uniform_buffers),
        (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, sizes.combined_image_samplers),
    ]
    .into_iter()
    .filter(|&(_, count)| count > 0)
    .map(|(ty, descriptor_count)| vk::DescriptorPoolSize { ty, descriptor_count })
    .collect()
}

pub struct VulkanPipeline {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    set_layout: vk::DescriptorSetLayout,
    /// `None` when the layout has no bindings
    descriptor_pool: Option<vk::DescriptorPool>,
    descriptor_sets: Vec<vk::DescriptorSet>,
    /// One per swap image, even when there are no descriptors to allocate
    set_count: usize,
    bindings: Vec<DescriptorBinding>,
    device: Arc<DeviceShared>,
}

impl VulkanPipeline {
    pub fn new(
        device: &VulkanDevice,
        render_pass: &VulkanRenderPass,
        shaders: &[VulkanShaderModule],
        desc: &PipelineDesc,
        image_count: usize,
    ) -> Result<Self> {
        if shaders.is_empty() {
            engine_bail!(ShaderError, "rendan::vulkan", "Pipeline needs at least one shader module");
        }
        let shared = &device.shared;
        let raw = &shared.device;

        // ===== LAYOUTS =====
        let layout_bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_kind_to_vk(b.kind))
                    .descriptor_count(1)
                    .stage_flags(stage_flags_to_vk(b.stages))
            })
            .collect();
        let set_layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&layout_bindings);
        let set_layout = unsafe { raw.create_descriptor_set_layout(&set_layout_info, None) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create descriptor set layout: {:?}", e))?;

        // Owns every handle from here on
        let mut this = Self {
            pipeline: vk::Pipeline::null(),
            layout: vk::PipelineLayout::null(),
            set_layout,
            descriptor_pool: None,
            descriptor_sets: Vec::new(),
            set_count: 0,
            bindings: desc.bindings.clone(),
            device: Arc::clone(shared),
        };

        let set_layouts = [set_layout];
        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        this.layout = unsafe { raw.create_pipeline_layout(&layout_info, None) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create pipeline layout: {:?}", e))?;

        // ===== FIXED FUNCTION STATE =====
        let shader_stages: Vec<vk::PipelineShaderStageCreateInfo> = shaders
            .iter()
            .map(|shader| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader.stage)
                    .module(shader.module)
                    .name(&shader.entry_point)
            })
            .collect();

        let vertex_bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: desc.vertex_layout.stride,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: 0,
                format: vertex_format_to_vk(a.format),
                offset: a.offset,
            })
            .collect();
        let vertex_input_state = if desc.vertex_layout.attributes.is_empty() {
            vk::PipelineVertexInputStateCreateInfo::default()
        } else {
            vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&vertex_bindings)
                .vertex_attribute_descriptions(&vertex_attributes)
        };

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        // Counts only, the values are dynamic
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = &desc.rasterization;
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(rasterization.polygon_mode))
            .line_width(rasterization.line_width)
            .cull_mode(cull_mode_to_vk(rasterization.cull_mode))
            .front_face(front_face_to_vk(rasterization.front_face))
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_test = desc.depth_test && render_pass.has_depth();
        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(depth_test)
            .depth_write_enable(depth_test)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let mut color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(desc.alpha_blending);
        if desc.alpha_blending {
            color_blend_attachment = color_blend_attachment
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD);
        }
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(this.layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe { raw.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None) }
            .map_err(|(_, e)| engine_err!(InitError, "rendan::vulkan", "Failed to create graphics pipeline: {:?}", e))?;
        this.pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| engine_err!(InitError, "rendan::vulkan", "Driver returned no pipeline"))?;

        // ===== DESCRIPTOR SETS =====
        this.allocate_descriptor_sets(image_count)?;

        engine_debug!(
            "rendan::vulkan",
            "Graphics pipeline created ({} stage(s), {} binding(s), {} descriptor set(s))",
            shaders.len(),
            desc.bindings.len(),
            image_count
        );

        Ok(this)
    }

    fn allocate_descriptor_sets(&mut self, image_count: usize) -> Result<()> {
        self.set_count = image_count;
        if self.bindings.is_empty() || image_count == 0 {
            return Ok(());
        }

        let raw = &self.device.device;
        let pool_sizes = descriptor_pool_sizes(&DescriptorPoolSizes::for_bindings(&self.bindings, image_count));
        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(image_count as u32)
            .pool_sizes(&pool_sizes);
        let pool = unsafe { raw.create_descriptor_pool(&pool_info, None) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to create descriptor pool: {:?}", e))?;
        self.descriptor_pool = Some(pool);

        let layouts = vec![self.set_layout; image_count];
        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);
        self.descriptor_sets = unsafe { raw.allocate_descriptor_sets(&allocate_info) }
            .map_err(|e| engine_err!(InitError, "rendan::vulkan", "Failed to allocate {} descriptor set(s): {:?}", image_count, e))?;
        Ok(())
    }

    fn destroy_descriptor_pool(&mut self) {
        self.descriptor_sets.clear();
        if let Some(pool) = self.descriptor_pool.take() {
            unsafe {
                self.device.device.destroy_descriptor_pool(pool, None);
            }
        }
    }

    /// Replace the pool and sets for `image_count` swap images; the GPU must be idle
    pub fn reallocate(&mut self, image_count: usize) -> Result<()> {
        self.destroy_descriptor_pool();
        self.allocate_descriptor_sets(image_count)?;
        engine_debug!("rendan::vulkan", "Descriptor sets reallocated for {} swap image(s)", image_count);
        Ok(())
    }

    pub(crate) fn has_descriptors(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub(crate) fn descriptor_set(&self, image_index: usize) -> Option<vk::DescriptorSet> {
        self.descriptor_sets.get(image_index).copied()
    }

    /// Update the set of swap image `image_index`
    pub fn write(&self, image_index: usize, writes: &[DescriptorWrite<'_, VulkanBackend>]) -> Result<()> {
        let Some(set) = self.descriptor_set(image_index) else {
            engine_bail!(
                InvalidResource,
                "rendan::vulkan",
                "Descriptor set index {} out of range ({} sets)",
                image_index,
                self.descriptor_sets.len()
            );
        };

        // Infos first so the writes can borrow them
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        for write in writes {
            let (binding, kind) = match write {
                DescriptorWrite::UniformBuffer { binding, buffer } => {
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(buffer.buffer)
                            .offset(0)
                            .range(vk::WHOLE_SIZE),
                    );
                    (*binding, DescriptorKind::UniformBuffer)
                }
                DescriptorWrite::CombinedImageSampler { binding, image, sampler } => {
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(image.view)
                            .sampler(sampler.sampler)
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                    );
                    (*binding, DescriptorKind::CombinedImageSampler)
                }
            };
            self.check_binding(binding, kind)?;
        }

        let (buffer_infos, image_infos) = (&buffer_infos, &image_infos);
        let mut buffer_index = 0;
        let mut image_info_index = 0;
        let descriptor_writes: Vec<vk::WriteDescriptorSet> = writes
            .iter()
            .map(move |write| match write {
                DescriptorWrite::UniformBuffer { binding, .. } => {
                    let info = &buffer_infos[buffer_index..buffer_index + 1];
                    buffer_index += 1;
                    vk::WriteDescriptorSet::default()
                        .dst_set(set)
                        .dst_binding(*binding)
                        .dst_array_element(0)
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(info)
                }
                DescriptorWrite::CombinedImageSampler { binding, .. } => {
                    let info = &image_infos[image_info_index..image_info_index + 1];
                    image_info_index += 1;
                    vk::WriteDescriptorSet::default()
                        .dst_set(set)
                        .dst_binding(*binding)
                        .dst_array_element(0)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(info)
                }
            })
            .collect();

        unsafe {
            self.device.device.update_descriptor_sets(&descriptor_writes, &[]);
        }
        Ok(())
    }

    fn check_binding(&self, binding: u32, kind: DescriptorKind) -> Result<()> {
        match self.bindings.iter().find(|b| b.binding == binding) {
            Some(b) if b.kind == kind => Ok(()),
            Some(b) => Err(engine_err!(
                InvalidResource,
                "rendan::vulkan",
                "Binding {} is a {:?}, not a {:?}",
                binding,
                b.kind,
                kind
            )),
            None => Err(engine_err!(InvalidResource, "rendan::vulkan", "Pipeline has no binding {}", binding)),
        }
    }
}

impl PipelineObject for VulkanPipeline {
    fn descriptor_set_count(&self) -> usize {
        self.set_count
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        self.destroy_descriptor_pool();
        unsafe {
            let raw = &self.device.device;
            if self.pipeline != vk::Pipeline::null() {
                raw.destroy_pipeline(self.pipeline, None);
            }
            if self.layout != vk::PipelineLayout::null() {
                raw.destroy_pipeline_layout(self.layout, None);
            }
            raw.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}

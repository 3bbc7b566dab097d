/// VulkanShaderModule - SPIR-V module with its reflected descriptors
///
/// The code is validated and reflected (spirq) before the module is created, so
/// an unusable binary never reaches the driver. Every failure is a `ShaderError`.

use ash::vk;
use rendan_engine::rendan::render::{
    DescriptorKind, ReflectedBinding, ShaderModuleDesc, ShaderModuleInfo, ShaderReflection, ShaderStage,
    SPIRV_MAGIC,
};
use rendan_engine::rendan::{Error, Result};
use rendan_engine::{engine_bail, engine_debug, engine_err};
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_device::{DeviceShared, VulkanDevice};
use crate::vulkan_format::shader_stage_to_vk;

/// Map a SPIR-V descriptor type to the engine's descriptor kinds
///
/// Separate samplers and sampled images are bound as combined image samplers.
pub fn descriptor_kind_from_spirq(desc_ty: &spirq::ty::DescriptorType) -> Result<DescriptorKind> {
    use spirq::ty::DescriptorType;
    match desc_ty {
        DescriptorType::UniformBuffer() => Ok(DescriptorKind::UniformBuffer),
        DescriptorType::CombinedImageSampler() | DescriptorType::SampledImage() | DescriptorType::Sampler() => {
            Ok(DescriptorKind::CombinedImageSampler)
        }
        other => Err(engine_err!(
            ShaderError,
            "rendan::vulkan",
            "Unsupported SPIR-V descriptor type: {:?}",
            other
        )),
    }
}

/// Reflect the descriptors used by entry point `entry_point` of `code`
pub fn reflect_spirv(code: &[u32], stage: ShaderStage, entry_point: &str) -> Result<ShaderReflection> {
    if code.first() != Some(&SPIRV_MAGIC) {
        engine_bail!(ShaderError, "rendan::vulkan", "Shader code is not SPIR-V (bad magic number)");
    }

    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| engine_err!(ShaderError, "rendan::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let entry = entry_points
        .iter()
        .find(|ep| ep.name == entry_point)
        .ok_or_else(|| {
            engine_err!(
                ShaderError,
                "rendan::vulkan",
                "Entry point '{}' not found in {:?} shader",
                entry_point,
                stage
            )
        })?;

    let mut bindings = Vec::new();
    for var in entry.vars.iter() {
        if let spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, .. } = var {
            bindings.push(ReflectedBinding {
                name: name.clone().unwrap_or_default(),
                set: desc_bind.set(),
                binding: desc_bind.bind(),
                kind: descriptor_kind_from_spirq(desc_ty)?,
            });
        }
    }
    bindings.sort_by_key(|b| (b.set, b.binding));

    Ok(ShaderReflection { stage, bindings })
}

pub struct VulkanShaderModule {
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: vk::ShaderStageFlags,
    pub(crate) entry_point: CString,
    reflection: ShaderReflection,
    device: Arc<DeviceShared>,
}

impl VulkanShaderModule {
    pub fn new(device: &VulkanDevice, desc: &ShaderModuleDesc) -> Result<Self> {
        let reflection = reflect_spirv(&desc.code, desc.stage, &desc.entry_point)?;
        let entry_point = CString::new(desc.entry_point.as_str()).map_err(|_| {
            engine_err!(ShaderError, "rendan::vulkan", "Entry point '{}' contains a NUL byte", desc.entry_point)
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&desc.code);
        let module = unsafe { device.shared.device.create_shader_module(&create_info, None) }
            .map_err(|e| -> Error {
                engine_err!(ShaderError, "rendan::vulkan", "Failed to create {:?} shader module: {:?}", desc.stage, e)
            })?;

        engine_debug!(
            "rendan::vulkan",
            "{:?} shader module created ({} descriptor(s))",
            desc.stage,
            reflection.bindings.len()
        );

        Ok(Self {
            module,
            stage: shader_stage_to_vk(desc.stage),
            entry_point,
            reflection,
            device: Arc::clone(&device.shared),
        })
    }
}

impl ShaderModuleInfo for VulkanShaderModule {
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }
}

impl Drop for VulkanShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirq::ty::DescriptorType;

    #[test]
    fn test_descriptor_kinds() {
        assert_eq!(
            descriptor_kind_from_spirq(&DescriptorType::UniformBuffer()).unwrap(),
            DescriptorKind::UniformBuffer
        );
        assert_eq!(
            descriptor_kind_from_spirq(&DescriptorType::CombinedImageSampler()).unwrap(),
            DescriptorKind::CombinedImageSampler
        );
        assert_eq!(
            descriptor_kind_from_spirq(&DescriptorType::SampledImage()).unwrap(),
            DescriptorKind::CombinedImageSampler
        );
        assert_eq!(
            descriptor_kind_from_spirq(&DescriptorType::Sampler()).unwrap(),
            DescriptorKind::CombinedImageSampler
        );
    }

    #[test]
    fn test_unsupported_descriptor_is_shader_error() {
        let result = descriptor_kind_from_spirq(&DescriptorType::UniformTexelBuffer());
        assert!(matches!(result, Err(Error::ShaderError(_))));
    }

    #[test]
    fn test_reflect_rejects_non_spirv() {
        assert!(matches!(reflect_spirv(&[], ShaderStage::Vertex, "main"), Err(Error::ShaderError(_))));
        assert!(matches!(
            reflect_spirv(&[0xdead_beef, 0, 0, 0, 0], ShaderStage::Fragment, "main"),
            Err(Error::ShaderError(_))
        ));
    }

    #[test]
    fn test_reflect_rejects_truncated_module() {
        // Magic only, no header
        assert!(matches!(
            reflect_spirv(&[SPIRV_MAGIC], ShaderStage::Vertex, "main"),
            Err(Error::ShaderError(_))
        ));
    }
}

/// Shader stages, SPIR-V loading and reflection merging
///
/// Every per-stage fact (backend stage bits, source language stage, file
/// extension) comes from the single `STAGE_CAPABILITIES` table.

use std::path::Path;
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::renderer::{DescriptorBinding, DescriptorKind};

/// SPIR-V magic number (first word of every module)
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

bitflags! {
    /// Set of shader stages; bit values match the Vulkan stage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x0000_0001;
        const TESSELLATION_CONTROL = 0x0000_0002;
        const TESSELLATION_EVALUATION = 0x0000_0004;
        const GEOMETRY = 0x0000_0008;
        const FRAGMENT = 0x0000_0010;
        const COMPUTE = 0x0000_0020;
        const ALL_GRAPHICS = 0x0000_001F;
    }
}

/// Source-language stage used by the offline GLSL compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderLanguageStage {
    GlslVertex,
    GlslTessControl,
    GlslTessEvaluation,
    GlslGeometry,
    GlslFragment,
    GlslCompute,
}

/// One row of the stage table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCapability {
    pub stage: ShaderStage,
    pub flags: ShaderStageFlags,
    pub language: ShaderLanguageStage,
    /// Source file extension (without the trailing ".spv")
    pub extension: &'static str,
}

/// Stage -> capability table
pub const STAGE_CAPABILITIES: [StageCapability; 6] = [
    StageCapability {
        stage: ShaderStage::Vertex,
        flags: ShaderStageFlags::VERTEX,
        language: ShaderLanguageStage::GlslVertex,
        extension: "vert",
    },
    StageCapability {
        stage: ShaderStage::TessellationControl,
        flags: ShaderStageFlags::TESSELLATION_CONTROL,
        language: ShaderLanguageStage::GlslTessControl,
        extension: "tesc",
    },
    StageCapability {
        stage: ShaderStage::TessellationEvaluation,
        flags: ShaderStageFlags::TESSELLATION_EVALUATION,
        language: ShaderLanguageStage::GlslTessEvaluation,
        extension: "tese",
    },
    StageCapability {
        stage: ShaderStage::Geometry,
        flags: ShaderStageFlags::GEOMETRY,
        language: ShaderLanguageStage::GlslGeometry,
        extension: "geom",
    },
    StageCapability {
        stage: ShaderStage::Fragment,
        flags: ShaderStageFlags::FRAGMENT,
        language: ShaderLanguageStage::GlslFragment,
        extension: "frag",
    },
    StageCapability {
        stage: ShaderStage::Compute,
        flags: ShaderStageFlags::COMPUTE,
        language: ShaderLanguageStage::GlslCompute,
        extension: "comp",
    },
];

impl ShaderStage {
    /// Row of `STAGE_CAPABILITIES` for this stage
    pub fn capability(self) -> &'static StageCapability {
        // Rows are in declaration order
        &STAGE_CAPABILITIES[self as usize]
    }

    pub fn flags(self) -> ShaderStageFlags {
        self.capability().flags
    }

    pub fn from_extension(extension: &str) -> Option<ShaderStage> {
        STAGE_CAPABILITIES
            .iter()
            .find(|row| row.extension.eq_ignore_ascii_case(extension))
            .map(|row| row.stage)
    }

    /// Infer the stage from a file name such as `mesh.vert` or `mesh.frag.spv`
    pub fn from_path(path: &Path) -> Result<ShaderStage> {
        let mut path = path.to_path_buf();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("spv")) {
            path.set_extension("");
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(ShaderStage::from_extension)
            .ok_or_else(|| {
                crate::engine_err!(
                    ShaderError,
                    "rendan::Shader",
                    "Cannot infer shader stage from '{}'",
                    path.display()
                )
            })
    }
}

/// Compiled shader module ready for the backend
#[derive(Debug, Clone)]
pub struct ShaderModuleDesc {
    pub stage: ShaderStage,
    /// SPIR-V words
    pub code: Vec<u32>,
    pub entry_point: String,
}

impl ShaderModuleDesc {
    /// Load a `.spv` file, inferring the stage from its name
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            stage: ShaderStage::from_path(path)?,
            code: load_spirv_file(path)?,
            entry_point: "main".to_string(),
        })
    }
}

/// Read and validate a SPIR-V binary
pub fn load_spirv_file(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        crate::engine_err!(
            ShaderError,
            "rendan::Shader",
            "Failed to read shader '{}': {}",
            path.display(),
            e
        )
    })?;
    spirv_from_bytes(&bytes)
}

/// Convert raw bytes into SPIR-V words
///
/// The length must be a non-zero multiple of 4 and the first word must be the
/// SPIR-V magic number in either byte order.
pub fn spirv_from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        crate::engine_bail!(
            ShaderError,
            "rendan::Shader",
            "SPIR-V size {} is not a non-zero multiple of 4",
            bytes.len()
        );
    }

    let mut words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if words[0] == SPIRV_MAGIC.swap_bytes() {
        for word in &mut words {
            *word = word.swap_bytes();
        }
    } else if words[0] != SPIRV_MAGIC {
        crate::engine_bail!(
            ShaderError,
            "rendan::Shader",
            "Invalid SPIR-V magic number 0x{:08x}",
            words[0]
        );
    }

    Ok(words)
}

// ===== REFLECTION =====

/// One descriptor found by reflecting a shader module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedBinding {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub kind: DescriptorKind,
}

/// Descriptors used by one shader stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReflection {
    pub stage: ShaderStage,
    pub bindings: Vec<ReflectedBinding>,
}

/// Merge per-stage reflections into one descriptor layout
///
/// Bindings shared by several stages are merged with their stage flags OR'd.
/// The same binding declared with two different kinds, or any set other than 0,
/// is a `ShaderError`. The result is sorted by binding index.
pub fn merge_bindings(reflections: &[ShaderReflection]) -> Result<Vec<DescriptorBinding>> {
    let mut merged: FxHashMap<u32, DescriptorBinding> = FxHashMap::default();

    for reflection in reflections {
        for reflected in &reflection.bindings {
            if reflected.set != 0 {
                crate::engine_bail!(
                    ShaderError,
                    "rendan::Shader",
                    "Descriptor '{}' uses set {}, only set 0 is supported",
                    reflected.name,
                    reflected.set
                );
            }

            let stage_flags = reflection.stage.flags();
            match merged.get_mut(&reflected.binding) {
                Some(existing) if existing.kind != reflected.kind => {
                    crate::engine_bail!(
                        ShaderError,
                        "rendan::Shader",
                        "Binding {} declared as {:?} and {:?}",
                        reflected.binding,
                        existing.kind,
                        reflected.kind
                    );
                }
                Some(existing) => existing.stages |= stage_flags,
                None => {
                    merged.insert(
                        reflected.binding,
                        DescriptorBinding {
                            binding: reflected.binding,
                            kind: reflected.kind,
                            stages: stage_flags,
                        },
                    );
                }
            }
        }
    }

    let mut bindings: Vec<DescriptorBinding> = merged.into_values().collect();
    bindings.sort_by_key(|b| b.binding);
    Ok(bindings)
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;

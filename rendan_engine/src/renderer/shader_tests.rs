//! Unit tests for shader.rs

use std::path::Path;
use crate::error::Error;
use crate::renderer::shader::*;
use crate::renderer::{DescriptorKind, DescriptorBinding};

fn spirv_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn reflected(name: &str, binding: u32, kind: DescriptorKind) -> ReflectedBinding {
    ReflectedBinding {
        name: name.to_string(),
        set: 0,
        binding,
        kind,
    }
}

// ============================================================================
// STAGE TABLE
// ============================================================================

#[test]
fn test_stage_table_rows_match_variants() {
    for stage in [
        ShaderStage::Vertex,
        ShaderStage::TessellationControl,
        ShaderStage::TessellationEvaluation,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Compute,
    ] {
        assert_eq!(stage.capability().stage, stage);
    }
}

#[test]
fn test_stage_flags_are_distinct_single_bits() {
    let mut seen = ShaderStageFlags::empty();
    for row in STAGE_CAPABILITIES.iter() {
        assert_eq!(row.flags.bits().count_ones(), 1, "{:?}", row.stage);
        assert!(!seen.intersects(row.flags));
        seen |= row.flags;
    }
}

#[test]
fn test_stage_flags_match_vulkan_bits() {
    assert_eq!(ShaderStage::Vertex.flags().bits(), 0x1);
    assert_eq!(ShaderStage::Fragment.flags().bits(), 0x10);
    assert_eq!(ShaderStage::Compute.flags().bits(), 0x20);
    assert!(ShaderStageFlags::ALL_GRAPHICS.contains(ShaderStageFlags::GEOMETRY));
    assert!(!ShaderStageFlags::ALL_GRAPHICS.contains(ShaderStageFlags::COMPUTE));
}

#[test]
fn test_language_stage_from_table() {
    assert_eq!(ShaderStage::Vertex.capability().language, ShaderLanguageStage::GlslVertex);
    assert_eq!(ShaderStage::Fragment.capability().language, ShaderLanguageStage::GlslFragment);
}

// ============================================================================
// STAGE FROM PATH
// ============================================================================

#[test]
fn test_stage_from_source_path() {
    assert_eq!(ShaderStage::from_path(Path::new("shaders/mesh.vert")).unwrap(), ShaderStage::Vertex);
    assert_eq!(ShaderStage::from_path(Path::new("mesh.frag")).unwrap(), ShaderStage::Fragment);
}

#[test]
fn test_stage_from_spirv_path() {
    assert_eq!(ShaderStage::from_path(Path::new("mesh.frag.spv")).unwrap(), ShaderStage::Fragment);
    assert_eq!(ShaderStage::from_path(Path::new("cull.COMP.SPV")).unwrap(), ShaderStage::Compute);
}

#[test]
fn test_stage_from_unknown_path_fails() {
    assert!(matches!(
        ShaderStage::from_path(Path::new("mesh.glsl")),
        Err(Error::ShaderError(_))
    ));
    assert!(ShaderStage::from_path(Path::new("mesh.spv")).is_err());
    assert!(ShaderStage::from_path(Path::new("mesh")).is_err());
}

// ============================================================================
// SPIR-V VALIDATION
// ============================================================================

#[test]
fn test_spirv_from_bytes_valid() {
    let words = spirv_from_bytes(&spirv_bytes(&[SPIRV_MAGIC, 0x0001_0000, 7])).unwrap();
    assert_eq!(words, vec![SPIRV_MAGIC, 0x0001_0000, 7]);
}

#[test]
fn test_spirv_from_bytes_big_endian_swapped() {
    let bytes: Vec<u8> = [SPIRV_MAGIC, 0x0001_0000]
        .iter()
        .flat_map(|w| w.to_be_bytes())
        .collect();
    let words = spirv_from_bytes(&bytes).unwrap();
    assert_eq!(words, vec![SPIRV_MAGIC, 0x0001_0000]);
}

#[test]
fn test_spirv_bad_magic_rejected() {
    let result = spirv_from_bytes(&spirv_bytes(&[0xdead_beef, 0]));
    assert!(matches!(result, Err(Error::ShaderError(msg)) if msg.contains("magic")));
}

#[test]
fn test_spirv_unaligned_rejected() {
    let mut bytes = spirv_bytes(&[SPIRV_MAGIC]);
    bytes.push(0);
    assert!(matches!(spirv_from_bytes(&bytes), Err(Error::ShaderError(_))));
}

#[test]
fn test_spirv_empty_rejected() {
    assert!(spirv_from_bytes(&[]).is_err());
}

#[test]
fn test_load_missing_file_is_shader_error() {
    let result = load_spirv_file("definitely/not/here.vert.spv");
    assert!(matches!(result, Err(Error::ShaderError(_))));
}

#[test]
fn test_load_spirv_file_roundtrip_through_disk() {
    let path = std::env::temp_dir().join(format!("rendan_shader_test_{}.frag.spv", std::process::id()));
    std::fs::write(&path, spirv_bytes(&[SPIRV_MAGIC, 1, 2, 3])).unwrap();

    let desc = ShaderModuleDesc::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(desc.stage, ShaderStage::Fragment);
    assert_eq!(desc.code.len(), 4);
    assert_eq!(desc.entry_point, "main");
}

// ============================================================================
// BINDING MERGE
// ============================================================================

#[test]
fn test_merge_bindings_combines_stages() {
    let vertex = ShaderReflection {
        stage: ShaderStage::Vertex,
        bindings: vec![reflected("ubo", 0, DescriptorKind::UniformBuffer)],
    };
    let fragment = ShaderReflection {
        stage: ShaderStage::Fragment,
        bindings: vec![
            reflected("texSampler", 1, DescriptorKind::CombinedImageSampler),
            reflected("ubo", 0, DescriptorKind::UniformBuffer),
        ],
    };

    let merged = merge_bindings(&[vertex, fragment]).unwrap();

    assert_eq!(
        merged,
        vec![
            DescriptorBinding {
                binding: 0,
                kind: DescriptorKind::UniformBuffer,
                stages: ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
            },
            DescriptorBinding {
                binding: 1,
                kind: DescriptorKind::CombinedImageSampler,
                stages: ShaderStageFlags::FRAGMENT,
            },
        ]
    );
}

#[test]
fn test_merge_bindings_kind_conflict_rejected() {
    let vertex = ShaderReflection {
        stage: ShaderStage::Vertex,
        bindings: vec![reflected("ubo", 0, DescriptorKind::UniformBuffer)],
    };
    let fragment = ShaderReflection {
        stage: ShaderStage::Fragment,
        bindings: vec![reflected("tex", 0, DescriptorKind::CombinedImageSampler)],
    };

    assert!(matches!(merge_bindings(&[vertex, fragment]), Err(Error::ShaderError(_))));
}

#[test]
fn test_merge_bindings_non_zero_set_rejected() {
    let mut binding = reflected("ubo", 0, DescriptorKind::UniformBuffer);
    binding.set = 1;
    let reflection = ShaderReflection {
        stage: ShaderStage::Vertex,
        bindings: vec![binding],
    };

    assert!(merge_bindings(&[reflection]).is_err());
}

#[test]
fn test_merge_bindings_empty() {
    assert!(merge_bindings(&[]).unwrap().is_empty());
}

/// Pipeline descriptor, fixed-function state and descriptor layout sizing

use crate::renderer::ShaderStageFlags;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

// ===== RASTERIZATION =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    /// Fill polygons
    Fill,
    /// Draw edges only (wireframe)
    Line,
    /// Draw vertices only
    Point,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            line_width: 1.0,
        }
    }
}

// ===== VERTEX INPUT =====

/// Vertex attribute component format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float2,
    Float3,
    Float4,
}

impl VertexFormat {
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexFormat::Float2 => 8,
            VertexFormat::Float3 => 12,
            VertexFormat::Float4 => 16,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    pub format: VertexFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex input layout (single interleaved binding)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    /// Stride in bytes between consecutive vertices
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

// ===== DESCRIPTORS =====

/// Kind of resource bound at a descriptor slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    UniformBuffer,
    CombinedImageSampler,
}

/// One slot of the pipeline's descriptor-set layout (set 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBinding {
    pub binding: u32,
    pub kind: DescriptorKind,
    pub stages: ShaderStageFlags,
}

/// Descriptor pool capacity for one descriptor set per swap image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DescriptorPoolSizes {
    pub uniform_buffers: u32,
    pub combined_image_samplers: u32,
    pub max_sets: u32,
}

impl DescriptorPoolSizes {
    /// (uniform count x image count) + (sampler count x image count), one set per image
    pub fn for_bindings(bindings: &[DescriptorBinding], image_count: usize) -> Self {
        let count = image_count as u32;
        let of_kind = |kind| bindings.iter().filter(|b| b.kind == kind).count() as u32;
        Self {
            uniform_buffers: of_kind(DescriptorKind::UniformBuffer) * count,
            combined_image_samplers: of_kind(DescriptorKind::CombinedImageSampler) * count,
            max_sets: count,
        }
    }
}

/// Pipeline object trait
///
/// Backend pipelines own their layout, descriptor-set layout, descriptor pool and
/// one descriptor set per swap image.
pub trait PipelineObject {
    /// Number of allocated descriptor sets (tracks the swap image count)
    fn descriptor_set_count(&self) -> usize;
}

// ===== PIPELINE DESCRIPTOR =====

/// Descriptor for creating the forward pipeline
///
/// Blending is fixed to src-alpha / one-minus-src-alpha. Viewport and scissor are
/// dynamic state, so a pipeline survives swapchain recreation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDesc {
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub rasterization: RasterizationState,
    /// Descriptor layout (set 0), usually merged from shader reflection
    pub bindings: Vec<DescriptorBinding>,
    /// Enable depth test (LESS) and depth writes
    pub depth_test: bool,
    pub alpha_blending: bool,
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

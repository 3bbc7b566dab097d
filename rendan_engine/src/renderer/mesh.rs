/// Mesh: vertex buffer, optional index buffer and the draw call they imply

use bytemuck::{Pod, Zeroable};
use crate::error::Result;
use crate::renderer::{
    BufferDesc, BufferUsage, CommandList, GpuBuffer, GraphicsBackend, IndexType,
    MemoryResidency, VertexAttribute, VertexFormat, VertexLayout,
};

/// Interleaved vertex: position, normal, texture coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }

    /// Vertex input layout matching the struct (locations 0, 1, 2)
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute { location: 0, format: VertexFormat::Float3, offset: 0 },
                VertexAttribute { location: 1, format: VertexFormat::Float3, offset: 12 },
                VertexAttribute { location: 2, format: VertexFormat::Float2, offset: 24 },
            ],
        }
    }
}

/// Vertex and index lists from the asset loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Empty for non-indexed meshes
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned cube centered on the origin, 24 vertices and 36 indices
    pub fn cube(half_extent: f32) -> Self {
        let h = half_extent;
        // (normal, tangent u, tangent v) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = [
                    (normal[0] + u[0] * su + v[0] * sv) * h,
                    (normal[1] + u[1] * su + v[1] * sv) * h,
                    (normal[2] + u[2] * su + v[2] * sv) * h,
                ];
                let uv = [(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5];
                vertices.push(Vertex::new(position, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self { vertices, indices }
    }
}

/// Draw call selected for a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPath {
    Indexed { index_count: u32 },
    NonIndexed { vertex_count: u32 },
}

impl DrawPath {
    /// Indexed when there are indices, non-indexed otherwise
    pub fn select(vertex_count: u32, index_count: u32) -> DrawPath {
        if index_count > 0 {
            DrawPath::Indexed { index_count }
        } else {
            DrawPath::NonIndexed { vertex_count }
        }
    }
}

/// GPU mesh owning its vertex and index buffers
pub struct Mesh<B: GraphicsBackend> {
    index_buffer: Option<B::Buffer>,
    vertex_buffer: B::Buffer,
    vertex_count: u32,
    index_count: u32,
}

impl<B: GraphicsBackend> Mesh<B> {
    /// Upload `data` into host-visible vertex/index buffers
    pub fn new(device: &B::Device, data: &MeshData) -> Result<Self> {
        if data.vertices.is_empty() {
            crate::engine_bail!(InvalidResource, "rendan::Mesh", "Mesh has no vertices");
        }
        let vertex_count = u32::try_from(data.vertices.len()).map_err(|_| {
            crate::engine_err!(InvalidResource, "rendan::Mesh", "Too many vertices: {}", data.vertices.len())
        })?;
        if let Some(&bad) = data.indices.iter().find(|&&i| i >= vertex_count) {
            crate::engine_bail!(
                InvalidResource,
                "rendan::Mesh",
                "Index {} out of range for {} vertices",
                bad,
                vertex_count
            );
        }
        let index_count = u32::try_from(data.indices.len()).map_err(|_| {
            crate::engine_err!(InvalidResource, "rendan::Mesh", "Too many indices: {}", data.indices.len())
        })?;

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&data.vertices);
        let vertex_buffer = B::create_buffer(device, &BufferDesc {
            label: "mesh.vertices".to_string(),
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::VERTEX,
            residency: MemoryResidency::CpuToGpu,
        })?;
        vertex_buffer.write(0, vertex_bytes)?;

        let index_buffer = if data.indices.is_empty() {
            None
        } else {
            let index_bytes: &[u8] = bytemuck::cast_slice(&data.indices);
            let buffer = B::create_buffer(device, &BufferDesc {
                label: "mesh.indices".to_string(),
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX,
                residency: MemoryResidency::CpuToGpu,
            })?;
            buffer.write(0, index_bytes)?;
            Some(buffer)
        };

        crate::engine_debug!(
            "rendan::Mesh",
            "Mesh uploaded: {} vertices, {} indices",
            vertex_count,
            index_count
        );

        Ok(Self {
            index_buffer,
            vertex_buffer,
            vertex_count,
            index_count,
        })
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn draw_path(&self) -> DrawPath {
        DrawPath::select(self.vertex_count, self.index_count)
    }

    /// Bind buffers and issue the draw into an open render pass
    pub fn record(&self, commands: &mut B::CommandBuffer) -> Result<DrawPath> {
        commands.bind_vertex_buffer(&self.vertex_buffer, 0)?;
        // index_buffer is Some exactly when index_count > 0
        match &self.index_buffer {
            Some(index_buffer) => {
                commands.bind_index_buffer(index_buffer, 0, IndexType::U32)?;
                commands.draw_indexed(self.index_count, 0, 0)?;
            }
            None => commands.draw(self.vertex_count, 0)?,
        }
        Ok(self.draw_path())
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;

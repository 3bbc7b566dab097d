/// CommandList trait - for recording rendering commands

use crate::error::Result;
use crate::renderer::{GraphicsBackend, ClearValue, Extent2D, IndexType, Rect2D, Viewport};

/// Primary command buffer recording one frame
///
/// A buffer is reset before being re-recorded; the renderer records one buffer
/// per swap image and submits it through `GraphicsBackend::submit`.
pub trait CommandList<B: GraphicsBackend> {
    /// Reset the buffer to the initial state
    fn reset(&mut self) -> Result<()>;

    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - Framebuffer of the acquired swap image
    /// * `extent` - Render area
    /// * `clear_values` - One clear value per attachment (color, then depth)
    fn begin_render_pass(
        &mut self,
        render_pass: &B::RenderPass,
        framebuffer: &B::Framebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &B::Pipeline) -> Result<()>;

    /// Bind the pipeline's descriptor set for `image_index`
    fn bind_descriptor_set(&mut self, pipeline: &B::Pipeline, image_index: usize) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: &B::Buffer, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &B::Buffer, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;
}

/// Overlay hook (debug UI and similar) drawn inside the forward pass

use crate::error::Result;
use crate::renderer::GraphicsBackend;

/// External draw contributor
///
/// `prepare` runs before the render pass begins (layout, uploads); `render`
/// runs while the pass is open, after the mesh has been drawn.
pub trait Overlay<B: GraphicsBackend> {
    fn prepare(&mut self, image_index: usize) -> Result<()>;

    fn render(&mut self, commands: &mut B::CommandBuffer) -> Result<()>;
}

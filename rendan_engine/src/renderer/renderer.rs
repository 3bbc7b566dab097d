//! Frame orchestrator
//!
//! `Renderer<B>` owns every GPU object of one window and drives the
//! acquire -> record -> submit -> present cycle. Construction follows the
//! dependency chain context -> surface -> device -> swapchain -> render pass ->
//! framebuffers -> pipeline -> command pool/buffers -> sync. Teardown is encoded in
//! the struct field order (Rust drops fields top to bottom) after a device idle
//! wait in `Drop`.

use crate::config::RendererConfig;
use crate::error::Result;
use crate::renderer::{
    AcquireResult, BufferDesc, CameraUniform, ClearValue, CommandList, DescriptorKind,
    DescriptorWrite, Extent2D, FrameOutcome, FrameState, FrameStats, FramebufferSize, GpuBuffer,
    GraphicsBackend, ImageData, Mesh, MeshData, Overlay, PerImage, PipelineDesc, PipelineObject,
    PresentResult, PrimitiveTopology, Rect2D, SamplerDesc, ShaderModuleDesc, ShaderModuleInfo,
    ShaderReflection, ShaderStage, SkipReason, SwapImageChain, Vertex, Viewport, merge_bindings,
};

/// Sampled texture bound at the pipeline's combined-image-sampler slot
struct BoundTexture<B: GraphicsBackend> {
    sampler: B::Sampler,
    image: B::Image,
}

/// Real-time forward renderer, generic over the graphics backend
pub struct Renderer<B: GraphicsBackend> {
    // ===== GPU OBJECTS (drop order) =====
    overlay: Option<Box<dyn Overlay<B>>>,
    mesh: Option<Mesh<B>>,
    texture: BoundTexture<B>,
    uniforms: PerImage<B::Buffer>,
    command_buffers: PerImage<B::CommandBuffer>,
    command_pool: B::CommandPool,
    pipeline: B::Pipeline,
    framebuffers: PerImage<B::Framebuffer>,
    depth: Option<B::DepthImage>,
    render_pass: B::RenderPass,
    swapchain: B::Swapchain,
    sync: B::FrameSync,
    device: B::Device,
    surface: B::Surface,
    context: B::Context,

    // ===== FRAME STATE =====
    config: RendererConfig,
    uniform_binding: Option<u32>,
    texture_binding: Option<u32>,
    window_extent: Extent2D,
    needs_recreate: bool,
    frames_in_flight: usize,
    frame_slot: usize,
    state: FrameState,
    stats: FrameStats,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Bring up every GPU object for `window`
    ///
    /// `shaders` must contain a vertex and a fragment stage. Their reflected
    /// descriptors define the pipeline layout: at most one uniform block, which
    /// receives the camera constant, and at most one combined image sampler,
    /// which receives the texture. Any further binding is a `ShaderError`.
    pub fn new(window: &B::Window, config: RendererConfig, shaders: &[ShaderModuleDesc]) -> Result<Self> {
        config.validate()?;

        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if !shaders.iter().any(|s| s.stage == stage) {
                crate::engine_bail!(
                    ShaderError,
                    "rendan::Renderer",
                    "Missing {:?} shader stage",
                    stage
                );
            }
        }

        let window_extent = window.framebuffer_size();

        let context = B::create_context(window, &config)?;
        let surface = B::create_surface(&context, window)?;
        let device = B::create_device(&context, &surface, &config)?;
        let swapchain = B::create_swapchain(&device, &surface, window_extent, &config)?;
        let image_count = swapchain.image_count();

        let render_pass = B::create_render_pass(&device, &swapchain, config.depth_buffer)?;
        let depth = if config.depth_buffer {
            Some(B::create_depth_image(&device, swapchain.extent())?)
        } else {
            None
        };
        let framebuffers = PerImage::build(image_count, |i| {
            B::create_framebuffer(&device, &render_pass, &swapchain, i, depth.as_ref())
        })?;

        // Shader modules are only needed until the pipeline exists
        let (pipeline, bindings) = {
            let modules = shaders
                .iter()
                .map(|desc| B::create_shader_module(&device, desc))
                .collect::<Result<Vec<_>>>()?;
            let reflections: Vec<ShaderReflection> =
                modules.iter().map(|m| m.reflection().clone()).collect();
            let bindings = merge_bindings(&reflections)?;
            for kind in [DescriptorKind::UniformBuffer, DescriptorKind::CombinedImageSampler] {
                let declared: Vec<u32> = bindings.iter().filter(|b| b.kind == kind).map(|b| b.binding).collect();
                if declared.len() > 1 {
                    crate::engine_bail!(
                        ShaderError,
                        "rendan::Renderer",
                        "Shaders declare {:?} at bindings {:?}; only one can be filled",
                        kind,
                        declared
                    );
                }
            }

            let desc = PipelineDesc {
                vertex_layout: Vertex::layout(),
                topology: PrimitiveTopology::TriangleList,
                rasterization: config.rasterization,
                bindings: bindings.clone(),
                depth_test: config.depth_buffer,
                alpha_blending: true,
            };
            (B::create_pipeline(&device, &render_pass, &modules, &desc, image_count)?, bindings)
        };

        let uniform_binding = bindings
            .iter()
            .find(|b| b.kind == DescriptorKind::UniformBuffer)
            .map(|b| b.binding);
        let texture_binding = bindings
            .iter()
            .find(|b| b.kind == DescriptorKind::CombinedImageSampler)
            .map(|b| b.binding);

        let command_pool = B::create_command_pool(&device)?;
        let command_buffers =
            PerImage::from_vec(B::allocate_command_buffers(&device, &command_pool, image_count)?);

        let frames_in_flight = config.frame_pacing.frames_in_flight();
        let sync = B::create_frame_sync(&device, frames_in_flight, image_count)?;

        let uniforms = Self::create_uniforms(&device, image_count)?;

        let texture = BoundTexture {
            sampler: B::create_sampler(&device, &SamplerDesc::default())?,
            image: B::create_texture(&device, &command_pool, &ImageData::white())?,
        };

        crate::engine_info!(
            "rendan::Renderer",
            "Renderer ready: {} swap images, {}x{}, {} frame(s) in flight",
            image_count,
            swapchain.extent().width,
            swapchain.extent().height,
            frames_in_flight
        );

        let renderer = Self {
            overlay: None,
            mesh: None,
            texture,
            uniforms,
            command_buffers,
            command_pool,
            pipeline,
            framebuffers,
            depth,
            render_pass,
            swapchain,
            sync,
            device,
            surface,
            context,
            config,
            uniform_binding,
            texture_binding,
            window_extent,
            needs_recreate: false,
            frames_in_flight,
            frame_slot: 0,
            state: FrameState::Idle,
            stats: FrameStats::default(),
        };
        renderer.write_all_descriptor_sets()?;
        Ok(renderer)
    }

    // ===== SCENE INPUTS =====

    /// Upload a mesh, replacing the current one after the GPU is idle
    pub fn load_mesh(&mut self, data: &MeshData) -> Result<()> {
        let mesh = Mesh::new(&self.device, data)?;
        B::wait_idle(&self.device)?;
        self.mesh = Some(mesh);
        Ok(())
    }

    /// Upload a texture and rebind it in every descriptor set
    pub fn set_texture(&mut self, data: &ImageData) -> Result<()> {
        let image = B::create_texture(&self.device, &self.command_pool, data)?;
        B::wait_idle(&self.device)?;
        self.texture.image = image;
        self.write_all_descriptor_sets()
    }

    /// Install (or remove) the overlay drawn after the mesh
    pub fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay<B>>>) {
        self.overlay = overlay;
    }

    /// Record the new window framebuffer size; the swapchain is rebuilt on the
    /// next frame (or skipped while the size is zero)
    pub fn resize(&mut self, extent: Extent2D) {
        if extent != self.window_extent {
            crate::engine_debug!(
                "rendan::Renderer",
                "Resize requested: {}x{}",
                extent.width,
                extent.height
            );
            self.window_extent = extent;
            self.needs_recreate = true;
        }
    }

    // ===== FRAME =====

    /// Render and present one frame
    ///
    /// Transient swapchain conditions are handled here and reported as
    /// `FrameOutcome::Skipped`; any `Err` is fatal.
    pub fn render_frame(&mut self, camera: &CameraUniform) -> Result<FrameOutcome> {
        let result = self.render_frame_inner(camera);
        if result.is_err() {
            self.state = FrameState::Idle;
        }
        result
    }

    fn render_frame_inner(&mut self, camera: &CameraUniform) -> Result<FrameOutcome> {
        if self.window_extent.is_empty() {
            return Ok(self.skip(SkipReason::Minimized));
        }
        if self.needs_recreate {
            self.recreate_swapchain()?;
            if self.needs_recreate {
                return Ok(self.skip(SkipReason::Minimized));
            }
        }

        self.advance(FrameState::Acquiring);
        let slot = self.frame_slot;
        B::wait_for_frame(&self.device, &mut self.sync, slot)?;

        let image_index = match B::acquire_next_image(&self.device, &self.swapchain, &mut self.sync, slot)? {
            AcquireResult::OutOfDate => {
                crate::engine_warn!("rendan::Renderer", "Swapchain out of date on acquire, rebuilding");
                self.recreate_swapchain()?;
                self.advance(FrameState::Idle);
                let reason = if self.needs_recreate { SkipReason::Minimized } else { SkipReason::OutOfDate };
                return Ok(self.skip(reason));
            }
            AcquireResult::Image { index, suboptimal } => {
                if suboptimal {
                    self.needs_recreate = true;
                }
                index
            }
        };
        if image_index >= self.command_buffers.len() {
            crate::engine_bail!(
                InvalidResource,
                "rendan::Renderer",
                "Acquired image {} but only {} command buffers exist",
                image_index,
                self.command_buffers.len()
            );
        }

        self.advance(FrameState::Recording);
        self.uniforms[image_index].write(0, camera.as_bytes())?;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.prepare(image_index)?;
        }
        self.record(image_index)?;

        self.advance(FrameState::Submitted);
        B::submit(&self.device, &mut self.sync, slot, image_index, &self.command_buffers[image_index])?;

        self.advance(FrameState::Presenting);
        let presented = match B::present(&self.device, &self.swapchain, &mut self.sync, slot, image_index) {
            Ok(PresentResult::Presented) => true,
            Ok(PresentResult::Suboptimal) => {
                self.needs_recreate = true;
                true
            }
            Ok(PresentResult::OutOfDate) => {
                self.needs_recreate = true;
                false
            }
            Err(e) if e.is_transient() => {
                self.needs_recreate = true;
                false
            }
            Err(e) => return Err(e),
        };

        if self.config.frame_pacing.is_blocking() {
            B::wait_present_idle(&self.device)?;
        }

        self.frame_slot = (self.frame_slot + 1) % self.frames_in_flight;
        self.advance(FrameState::Idle);

        if presented {
            self.stats.frames_presented += 1;
            Ok(FrameOutcome::Presented { image_index })
        } else {
            self.stats.frames_skipped += 1;
            Ok(FrameOutcome::Skipped(SkipReason::PresentOutOfDate))
        }
    }

    fn record(&mut self, image_index: usize) -> Result<()> {
        let extent = self.swapchain.extent();
        let mut clear_values = vec![ClearValue::Color(self.config.clear_color)];
        if self.depth.is_some() {
            clear_values.push(ClearValue::DepthStencil { depth: 1.0, stencil: 0 });
        }

        let commands = self.command_buffers.get_mut(image_index).ok_or_else(|| {
            crate::engine_err!(InvalidResource, "rendan::Renderer", "No command buffer for image {}", image_index)
        })?;

        commands.reset()?;
        commands.begin()?;
        commands.begin_render_pass(&self.render_pass, &self.framebuffers[image_index], extent, &clear_values)?;
        commands.set_viewport(Viewport::full(extent))?;
        commands.set_scissor(Rect2D::full(extent))?;
        commands.bind_pipeline(&self.pipeline)?;
        commands.bind_descriptor_set(&self.pipeline, image_index)?;
        if let Some(mesh) = &self.mesh {
            mesh.record(commands)?;
            self.stats.draw_calls += 1;
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.render(commands)?;
        }
        commands.end_render_pass()?;
        commands.end()?;

        crate::engine_trace!("rendan::Renderer", "Recorded frame for image {}", image_index);
        Ok(())
    }

    // ===== SWAPCHAIN RECREATION =====

    /// Rebuild the swapchain and everything sized by it
    ///
    /// Waits for the device to go idle, releases command buffers, framebuffers and
    /// the depth image, rebuilds the chain in place, then recreates depth,
    /// framebuffers and command buffers for the new image count and resizes the
    /// per-image sync signals. Descriptor sets and uniform buffers are reallocated
    /// when the image count changed.
    ///
    /// While the window or the surface reports a zero-area extent nothing is
    /// touched and the rebuild stays pending.
    pub fn recreate_swapchain(&mut self) -> Result<()> {
        if self.window_extent.is_empty() {
            self.needs_recreate = true;
            return Ok(());
        }
        let surface_extent = B::surface_extent(&self.device, &self.surface, self.window_extent)?;
        if surface_extent.is_empty() {
            crate::engine_debug!("rendan::Renderer", "Surface extent is empty, swapchain rebuild deferred");
            self.needs_recreate = true;
            return Ok(());
        }

        B::wait_idle(&self.device)?;

        self.command_buffers.clear();
        self.framebuffers.clear();
        self.depth = None;

        B::recreate_swapchain(&self.device, &self.surface, &mut self.swapchain, self.window_extent)?;
        let image_count = self.swapchain.image_count();
        let extent = self.swapchain.extent();

        if self.config.depth_buffer {
            self.depth = Some(B::create_depth_image(&self.device, extent)?);
        }
        self.framebuffers.rebuild(image_count, |i| {
            B::create_framebuffer(&self.device, &self.render_pass, &self.swapchain, i, self.depth.as_ref())
        })?;
        self.command_buffers =
            PerImage::from_vec(B::allocate_command_buffers(&self.device, &self.command_pool, image_count)?);
        B::resize_frame_sync(&self.device, &mut self.sync, image_count)?;

        if self.pipeline.descriptor_set_count() != image_count || self.uniforms.len() != image_count {
            B::reallocate_descriptor_sets(&self.device, &mut self.pipeline, image_count)?;
            self.uniforms = Self::create_uniforms(&self.device, image_count)?;
            self.write_all_descriptor_sets()?;
        }

        self.needs_recreate = false;
        self.stats.swapchain_recreations += 1;

        crate::engine_info!(
            "rendan::Renderer",
            "Swapchain recreated: {} images, {}x{}",
            image_count,
            extent.width,
            extent.height
        );
        Ok(())
    }

    // ===== HELPERS =====

    fn create_uniforms(device: &B::Device, image_count: usize) -> Result<PerImage<B::Buffer>> {
        PerImage::build(image_count, |i| {
            let buffer = B::create_buffer(device, &BufferDesc::uniform(format!("camera[{}]", i), CameraUniform::SIZE))?;
            buffer.write(0, CameraUniform::default().as_bytes())?;
            Ok(buffer)
        })
    }

    fn write_all_descriptor_sets(&self) -> Result<()> {
        for image_index in 0..self.uniforms.len() {
            let mut writes = Vec::with_capacity(2);
            if let Some(binding) = self.uniform_binding {
                writes.push(DescriptorWrite::UniformBuffer {
                    binding,
                    buffer: &self.uniforms[image_index],
                });
            }
            if let Some(binding) = self.texture_binding {
                writes.push(DescriptorWrite::CombinedImageSampler {
                    binding,
                    image: &self.texture.image,
                    sampler: &self.texture.sampler,
                });
            }
            if !writes.is_empty() {
                B::write_descriptor_set(&self.device, &self.pipeline, image_index, &writes)?;
            }
        }
        Ok(())
    }

    fn advance(&mut self, next: FrameState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal frame transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    fn skip(&mut self, reason: SkipReason) -> FrameOutcome {
        self.stats.frames_skipped += 1;
        crate::engine_trace!("rendan::Renderer", "Frame skipped: {:?}", reason);
        FrameOutcome::Skipped(reason)
    }

    // ===== ACCESSORS =====

    /// Block until the GPU finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        B::wait_idle(&self.device)
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    pub fn extent(&self) -> Extent2D {
        self.swapchain.extent()
    }

    pub fn command_buffer_count(&self) -> usize {
        self.command_buffers.len()
    }

    pub fn descriptor_set_count(&self) -> usize {
        self.pipeline.descriptor_set_count()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn context(&self) -> &B::Context {
        &self.context
    }
}

impl<B: GraphicsBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        // The GPU must be done with every object before fields drop in declaration order:
        // 1. overlay, mesh, texture, uniform buffers
        // 2. command buffers, command pool
        // 3. pipeline, framebuffers, depth image, render pass
        // 4. swapchain, sync primitives
        // 5. device (allocator first), surface, context (instance last)
        if let Err(e) = B::wait_idle(&self.device) {
            crate::engine_error!("rendan::Renderer", "wait_idle failed during teardown: {}", e);
        }
        crate::engine_debug!("rendan::Renderer", "Renderer teardown");
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;

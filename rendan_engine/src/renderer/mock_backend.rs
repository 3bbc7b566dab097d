/// Mock graphics backend for unit tests (no GPU required)
///
/// Every mock object registers itself with a shared tracker together with the
/// ids of the objects it depends on. Destroying an object while a live object
/// still depends on it is recorded as a violation, which is how teardown order is
/// verified. The same shared state scripts swapchain behaviour (image counts,
/// out-of-date acquires, present results, failures) and logs every call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::config::RendererConfig;
use crate::error::{Error, Result};
use crate::renderer::{
    AcquireResult, BufferDesc, ClearValue, CommandList, DescriptorKind, DescriptorPoolSizes,
    DescriptorWrite, Extent2D, FramebufferSize, GpuBuffer, GraphicsBackend, ImageData, IndexType,
    Overlay, PipelineDesc, PipelineObject, PresentResult, ReflectedBinding, Rect2D, SamplerDesc,
    ShaderModuleDesc, ShaderModuleInfo, ShaderReflection, ShaderStage, SwapImageChain, Viewport,
    check_write_range, clamp_extent, swap_image_count,
};

// ============================================================================
// Shared state
// ============================================================================

struct LiveObject {
    kind: &'static str,
    deps: Vec<u64>,
}

pub struct MockState {
    next_id: u64,
    live: FxHashMap<u64, LiveObject>,
    /// Every call and destruction, in order
    pub events: Vec<String>,
    /// Kinds in destruction order
    pub destroyed: Vec<&'static str>,
    pub violations: Vec<String>,

    // Script
    pub min_image_count: u32,
    pub max_image_count: u32,
    /// None = surface reports the "any extent" sentinel
    pub surface_extent: Option<Extent2D>,
    pub out_of_date_acquires: u32,
    pub suboptimal_acquires: u32,
    pub present_results: VecDeque<PresentResult>,
    pub transient_present_errors: u32,
    pub fail_next_submit: bool,
    /// Object kind whose creation fails with InitError
    pub fail_create: Option<&'static str>,
    pub reflections: FxHashMap<ShaderStage, Vec<ReflectedBinding>>,

    // Counters
    next_image: usize,
    pub swapchain_creations: u32,
    pub swapchain_recreations: u32,
    pub descriptor_reallocations: u32,
    pub submitted: Vec<Vec<String>>,
}

impl MockState {
    fn register(&mut self, kind: &'static str, deps: &[u64]) -> u64 {
        for dep in deps {
            if !self.live.contains_key(dep) {
                self.violations.push(format!("{} created with destroyed dependency #{}", kind, dep));
            }
        }
        self.next_id += 1;
        self.live.insert(self.next_id, LiveObject { kind, deps: deps.to_vec() });
        self.next_id
    }

    fn destroy(&mut self, id: u64) {
        let Some(object) = self.live.remove(&id) else {
            self.violations.push(format!("#{} destroyed twice", id));
            return;
        };
        for (dependent_id, dependent) in &self.live {
            if dependent.deps.contains(&id) {
                self.violations.push(format!(
                    "{} #{} destroyed while {} #{} depends on it",
                    object.kind, id, dependent.kind, dependent_id
                ));
            }
        }
        self.destroyed.push(object.kind);
        self.events.push(format!("destroy {}", object.kind));
    }

    fn check_create(&self, kind: &'static str) -> Result<()> {
        if self.fail_create == Some(kind) {
            return Err(Error::InitError(format!("scripted {} failure", kind)));
        }
        Ok(())
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of_kind(&self, kind: &str) -> usize {
        self.live.values().filter(|o| o.kind == kind).count()
    }

    pub fn event_count(&self, event: &str) -> usize {
        self.events.iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }
}

/// Handle shared by the test and every mock object
pub struct MockShared {
    state: Mutex<MockState>,
}

impl MockShared {
    pub fn new() -> Arc<Self> {
        let mut reflections = FxHashMap::default();
        reflections.insert(
            ShaderStage::Vertex,
            vec![ReflectedBinding {
                name: "camera".to_string(),
                set: 0,
                binding: 0,
                kind: DescriptorKind::UniformBuffer,
            }],
        );
        reflections.insert(
            ShaderStage::Fragment,
            vec![ReflectedBinding {
                name: "texSampler".to_string(),
                set: 0,
                binding: 1,
                kind: DescriptorKind::CombinedImageSampler,
            }],
        );

        Arc::new(Self {
            state: Mutex::new(MockState {
                next_id: 0,
                live: FxHashMap::default(),
                events: Vec::new(),
                destroyed: Vec::new(),
                violations: Vec::new(),
                min_image_count: 2,
                max_image_count: 0,
                surface_extent: None,
                out_of_date_acquires: 0,
                suboptimal_acquires: 0,
                present_results: VecDeque::new(),
                transient_present_errors: 0,
                fail_next_submit: false,
                fail_create: None,
                reflections,
                next_image: 0,
                swapchain_creations: 0,
                swapchain_recreations: 0,
                descriptor_reallocations: 0,
                submitted: Vec::new(),
            }),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn event(&self, event: impl Into<String>) {
        self.state().events.push(event.into());
    }
}

/// Registration of one mock object; destroys it in the tracker on drop
pub struct Tracked {
    id: u64,
    shared: Arc<MockShared>,
}

impl Tracked {
    fn new(shared: &Arc<MockShared>, kind: &'static str, deps: &[u64]) -> Result<Self> {
        let mut state = shared.state();
        state.check_create(kind)?;
        let id = state.register(kind, deps);
        state.events.push(format!("create {}", kind));
        Ok(Self { id, shared: shared.clone() })
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.shared.state().destroy(self.id);
    }
}

// ============================================================================
// Mock objects
// ============================================================================

pub struct MockWindow {
    pub shared: Arc<MockShared>,
    pub extent: Extent2D,
}

impl MockWindow {
    pub fn new(shared: &Arc<MockShared>, width: u32, height: u32) -> Self {
        Self { shared: shared.clone(), extent: Extent2D::new(width, height) }
    }
}

impl FramebufferSize for MockWindow {
    fn framebuffer_size(&self) -> Extent2D {
        self.extent
    }
}

pub struct MockContext {
    tracked: Tracked,
}

pub struct MockSurface {
    tracked: Tracked,
}

pub struct MockDevice {
    // Allocator goes first, the device after it
    allocator: Tracked,
    tracked: Tracked,
    shared: Arc<MockShared>,
}

/// Lifecycle of one swap image's render-finished semaphore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Idle,
    /// Signaled by a submit, not yet waited on
    Signaled,
    /// A present waits on it until the image is acquired again
    PresentPending,
}

pub struct MockFrameSync {
    _tracked: Tracked,
    pub slots: usize,
    images_in_flight: Vec<Option<usize>>,
    pub render_finished: Vec<SignalState>,
}

pub struct MockSwapchain {
    tracked: Option<Tracked>,
    surface_id: u64,
    image_count: usize,
    extent: Extent2D,
}

impl MockSwapchain {
    fn id(&self) -> u64 {
        self.tracked.as_ref().map_or(0, Tracked::id)
    }
}

impl SwapImageChain for MockSwapchain {
    fn image_count(&self) -> usize {
        self.image_count
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }
}

pub struct MockRenderPass {
    tracked: Tracked,
    pub depth: bool,
}

pub struct MockDepthImage {
    tracked: Tracked,
    pub extent: Extent2D,
}

pub struct MockFramebuffer {
    _tracked: Tracked,
    pub image_index: usize,
}

pub struct MockShaderModule {
    _tracked: Tracked,
    reflection: ShaderReflection,
}

impl ShaderModuleInfo for MockShaderModule {
    fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }
}

pub struct MockPipeline {
    _tracked: Tracked,
    pub desc: PipelineDesc,
    pub pool_sizes: DescriptorPoolSizes,
}

impl PipelineObject for MockPipeline {
    fn descriptor_set_count(&self) -> usize {
        self.pool_sizes.max_sets as usize
    }
}

pub struct MockCommandPool {
    tracked: Tracked,
}

pub struct MockCommandBuffer {
    _tracked: Tracked,
    shared: Arc<MockShared>,
    pub commands: Vec<String>,
}

impl MockCommandBuffer {
    fn push(&mut self, command: String) {
        self.shared.event(format!("cmd {}", command));
        self.commands.push(command);
    }
}

impl CommandList<MockBackend> for MockCommandBuffer {
    fn reset(&mut self) -> Result<()> {
        self.commands.clear();
        self.push("reset".to_string());
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.push("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &MockRenderPass,
        framebuffer: &MockFramebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.push(format!(
            "begin_render_pass fb={} {}x{} clears={}",
            framebuffer.image_index,
            extent.width,
            extent.height,
            clear_values.len()
        ));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.push(format!("set_viewport {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.push(format!("set_scissor {}x{}", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, _pipeline: &MockPipeline) -> Result<()> {
        self.push("bind_pipeline".to_string());
        Ok(())
    }

    fn bind_descriptor_set(&mut self, pipeline: &MockPipeline, image_index: usize) -> Result<()> {
        if image_index >= pipeline.descriptor_set_count() {
            return Err(Error::InvalidResource(format!("descriptor set {} not allocated", image_index)));
        }
        self.push(format!("bind_descriptor_set {}", image_index));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &MockBuffer, offset: u64) -> Result<()> {
        self.push(format!("bind_vertex_buffer {} offset={}", buffer.label, offset));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &MockBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.push(format!("bind_index_buffer {} offset={} {:?}", buffer.label, offset, index_type));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<()> {
        self.push(format!("draw {}", vertex_count));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.push(format!("draw_indexed {}", index_count));
        Ok(())
    }
}

pub struct MockBuffer {
    _tracked: Tracked,
    shared: Arc<MockShared>,
    pub label: String,
    size: u64,
    pub data: Mutex<Vec<u8>>,
}

impl GpuBuffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_write_range(&self.label, self.size, offset, data.len())?;
        let start = offset as usize;
        self.data.lock().unwrap()[start..start + data.len()].copy_from_slice(data);
        self.shared.event(format!("write {}", self.label));
        Ok(())
    }
}

pub struct MockImage {
    _tracked: Tracked,
    pub width: u32,
    pub height: u32,
}

pub struct MockSampler {
    _tracked: Tracked,
}

// ============================================================================
// Mock backend
// ============================================================================

pub struct MockBackend;

impl GraphicsBackend for MockBackend {
    type Window = MockWindow;
    type Context = MockContext;
    type Surface = MockSurface;
    type Device = MockDevice;
    type FrameSync = MockFrameSync;
    type Swapchain = MockSwapchain;
    type RenderPass = MockRenderPass;
    type DepthImage = MockDepthImage;
    type Framebuffer = MockFramebuffer;
    type ShaderModule = MockShaderModule;
    type Pipeline = MockPipeline;
    type CommandPool = MockCommandPool;
    type CommandBuffer = MockCommandBuffer;
    type Buffer = MockBuffer;
    type Image = MockImage;
    type Sampler = MockSampler;

    fn create_context(window: &MockWindow, _config: &RendererConfig) -> Result<MockContext> {
        Ok(MockContext { tracked: Tracked::new(&window.shared, "context", &[])? })
    }

    fn create_surface(context: &MockContext, _window: &MockWindow) -> Result<MockSurface> {
        let shared = context.tracked.shared.clone();
        Ok(MockSurface { tracked: Tracked::new(&shared, "surface", &[context.tracked.id()])? })
    }

    fn create_device(context: &MockContext, _surface: &MockSurface, _config: &RendererConfig) -> Result<MockDevice> {
        let shared = context.tracked.shared.clone();
        let tracked = Tracked::new(&shared, "device", &[context.tracked.id()])?;
        let allocator = Tracked::new(&shared, "allocator", &[tracked.id()])?;
        Ok(MockDevice { allocator, tracked, shared })
    }

    fn create_frame_sync(device: &MockDevice, frames_in_flight: usize, image_count: usize) -> Result<MockFrameSync> {
        Ok(MockFrameSync {
            _tracked: Tracked::new(&device.shared, "sync", &[device.tracked.id()])?,
            slots: frames_in_flight,
            images_in_flight: Vec::new(),
            render_finished: vec![SignalState::Idle; image_count],
        })
    }

    fn resize_frame_sync(device: &MockDevice, sync: &mut MockFrameSync, image_count: usize) -> Result<()> {
        sync.render_finished = vec![SignalState::Idle; image_count];
        sync.images_in_flight.clear();
        device.shared.event(format!("resize_frame_sync {}", image_count));
        Ok(())
    }

    fn create_swapchain(
        device: &MockDevice,
        surface: &MockSurface,
        window_extent: Extent2D,
        _config: &RendererConfig,
    ) -> Result<MockSwapchain> {
        let tracked = Tracked::new(&device.shared, "swapchain", &[device.tracked.id(), surface.tracked.id()])?;
        let (image_count, extent) = negotiate(&device.shared, window_extent);
        device.shared.state().swapchain_creations += 1;
        Ok(MockSwapchain {
            tracked: Some(tracked),
            surface_id: surface.tracked.id(),
            image_count,
            extent,
        })
    }

    fn surface_extent(device: &MockDevice, _surface: &MockSurface, window_extent: Extent2D) -> Result<Extent2D> {
        Ok(negotiate(&device.shared, window_extent).1)
    }

    fn recreate_swapchain(
        device: &MockDevice,
        surface: &MockSurface,
        swapchain: &mut MockSwapchain,
        window_extent: Extent2D,
    ) -> Result<()> {
        if swapchain.surface_id != surface.tracked.id() {
            return Err(Error::InitError("swapchain recreated against another surface".to_string()));
        }
        let (image_count, extent) = negotiate(&device.shared, window_extent);
        if extent.is_empty() {
            return Err(Error::InvalidResource(format!("swapchain rebuilt at {}x{}", extent.width, extent.height)));
        }
        // Old chain released before the new one is registered
        swapchain.tracked = None;
        swapchain.tracked = Some(Tracked::new(
            &device.shared,
            "swapchain",
            &[device.tracked.id(), surface.tracked.id()],
        )?);

        swapchain.image_count = image_count;
        swapchain.extent = extent;
        device.shared.state().swapchain_recreations += 1;
        Ok(())
    }

    fn create_render_pass(device: &MockDevice, _swapchain: &MockSwapchain, depth: bool) -> Result<MockRenderPass> {
        Ok(MockRenderPass {
            tracked: Tracked::new(&device.shared, "render_pass", &[device.tracked.id()])?,
            depth,
        })
    }

    fn create_depth_image(device: &MockDevice, extent: Extent2D) -> Result<MockDepthImage> {
        if extent.is_empty() {
            return Err(Error::InvalidResource(format!("depth image {}x{}", extent.width, extent.height)));
        }
        Ok(MockDepthImage {
            tracked: Tracked::new(&device.shared, "depth_image", &[device.allocator.id()])?,
            extent,
        })
    }

    fn create_framebuffer(
        device: &MockDevice,
        render_pass: &MockRenderPass,
        swapchain: &MockSwapchain,
        image_index: usize,
        depth: Option<&MockDepthImage>,
    ) -> Result<MockFramebuffer> {
        if image_index >= swapchain.image_count {
            return Err(Error::InvalidResource(format!("no swap image {}", image_index)));
        }
        if render_pass.depth != depth.is_some() {
            return Err(Error::InitError("depth attachment mismatch".to_string()));
        }
        let mut deps = vec![device.tracked.id(), render_pass.tracked.id(), swapchain.id()];
        if let Some(depth) = depth {
            deps.push(depth.tracked.id());
        }
        Ok(MockFramebuffer {
            _tracked: Tracked::new(&device.shared, "framebuffer", &deps)?,
            image_index,
        })
    }

    fn create_shader_module(device: &MockDevice, desc: &ShaderModuleDesc) -> Result<MockShaderModule> {
        let bindings = device.shared.state().reflections.get(&desc.stage).cloned().unwrap_or_default();
        Ok(MockShaderModule {
            _tracked: Tracked::new(&device.shared, "shader_module", &[device.tracked.id()])?,
            reflection: ShaderReflection { stage: desc.stage, bindings },
        })
    }

    fn create_pipeline(
        device: &MockDevice,
        render_pass: &MockRenderPass,
        shaders: &[MockShaderModule],
        desc: &PipelineDesc,
        image_count: usize,
    ) -> Result<MockPipeline> {
        if shaders.is_empty() {
            return Err(Error::ShaderError("no shader stages".to_string()));
        }
        Ok(MockPipeline {
            _tracked: Tracked::new(&device.shared, "pipeline", &[device.tracked.id(), render_pass.tracked.id()])?,
            desc: desc.clone(),
            pool_sizes: DescriptorPoolSizes::for_bindings(&desc.bindings, image_count),
        })
    }

    fn reallocate_descriptor_sets(device: &MockDevice, pipeline: &mut MockPipeline, image_count: usize) -> Result<()> {
        pipeline.pool_sizes = DescriptorPoolSizes::for_bindings(&pipeline.desc.bindings, image_count);
        device.shared.state().descriptor_reallocations += 1;
        device.shared.event(format!("reallocate_descriptor_sets {}", image_count));
        Ok(())
    }

    fn write_descriptor_set(
        device: &MockDevice,
        pipeline: &MockPipeline,
        image_index: usize,
        writes: &[DescriptorWrite<'_, MockBackend>],
    ) -> Result<()> {
        if image_index >= pipeline.descriptor_set_count() {
            return Err(Error::InvalidResource(format!("descriptor set {} not allocated", image_index)));
        }
        for write in writes {
            let event = match write {
                DescriptorWrite::UniformBuffer { binding, buffer } => {
                    format!("descriptor_write {} binding={} buffer={}", image_index, binding, buffer.label)
                }
                DescriptorWrite::CombinedImageSampler { binding, image, .. } => {
                    format!(
                        "descriptor_write {} binding={} image={}x{}",
                        image_index, binding, image.width, image.height
                    )
                }
            };
            device.shared.event(event);
        }
        Ok(())
    }

    fn create_command_pool(device: &MockDevice) -> Result<MockCommandPool> {
        Ok(MockCommandPool {
            tracked: Tracked::new(&device.shared, "command_pool", &[device.tracked.id()])?,
        })
    }

    fn allocate_command_buffers(
        device: &MockDevice,
        pool: &MockCommandPool,
        count: usize,
    ) -> Result<Vec<MockCommandBuffer>> {
        (0..count)
            .map(|_| {
                Ok(MockCommandBuffer {
                    _tracked: Tracked::new(&device.shared, "command_buffer", &[pool.tracked.id()])?,
                    shared: device.shared.clone(),
                    commands: Vec::new(),
                })
            })
            .collect()
    }

    fn create_buffer(device: &MockDevice, desc: &BufferDesc) -> Result<MockBuffer> {
        Ok(MockBuffer {
            _tracked: Tracked::new(&device.shared, "buffer", &[device.allocator.id()])?,
            shared: device.shared.clone(),
            label: desc.label.clone(),
            size: desc.size,
            data: Mutex::new(vec![0; desc.size as usize]),
        })
    }

    fn create_texture(device: &MockDevice, pool: &MockCommandPool, data: &ImageData) -> Result<MockImage> {
        data.validate()?;
        device.shared.event(format!("upload_texture {}x{} via pool #{}", data.width, data.height, pool.tracked.id()));
        Ok(MockImage {
            _tracked: Tracked::new(&device.shared, "image", &[device.allocator.id()])?,
            width: data.width,
            height: data.height,
        })
    }

    fn create_sampler(device: &MockDevice, _desc: &SamplerDesc) -> Result<MockSampler> {
        Ok(MockSampler {
            _tracked: Tracked::new(&device.shared, "sampler", &[device.tracked.id()])?,
        })
    }

    fn wait_for_frame(device: &MockDevice, sync: &mut MockFrameSync, slot: usize) -> Result<()> {
        if slot >= sync.slots {
            return Err(Error::InvalidResource(format!("sync slot {} of {}", slot, sync.slots)));
        }
        device.shared.event(format!("wait_for_frame {}", slot));
        Ok(())
    }

    fn acquire_next_image(
        device: &MockDevice,
        swapchain: &MockSwapchain,
        sync: &mut MockFrameSync,
        slot: usize,
    ) -> Result<AcquireResult> {
        let mut state = device.shared.state();
        if state.out_of_date_acquires > 0 {
            state.out_of_date_acquires -= 1;
            state.events.push(format!("acquire slot={} out_of_date", slot));
            return Ok(AcquireResult::OutOfDate);
        }
        let suboptimal = if state.suboptimal_acquires > 0 {
            state.suboptimal_acquires -= 1;
            true
        } else {
            false
        };
        let index = state.next_image % swapchain.image_count;
        state.next_image += 1;
        state.events.push(format!("acquire slot={} image={}", slot, index));
        drop(state);

        if sync.images_in_flight.len() < swapchain.image_count {
            sync.images_in_flight.resize(swapchain.image_count, None);
        }
        sync.images_in_flight[index] = Some(slot);
        // Re-acquiring an image means its previous present completed
        if let Some(signal) = sync.render_finished.get_mut(index) {
            *signal = SignalState::Idle;
        }
        Ok(AcquireResult::Image { index, suboptimal })
    }

    fn submit(
        device: &MockDevice,
        sync: &mut MockFrameSync,
        slot: usize,
        image_index: usize,
        commands: &MockCommandBuffer,
    ) -> Result<()> {
        let mut state = device.shared.state();
        if state.fail_next_submit {
            state.fail_next_submit = false;
            return Err(Error::RuntimeSubmitError("scripted device lost".to_string()));
        }
        if sync.images_in_flight.get(image_index).copied().flatten() != Some(slot) {
            state.violations.push(format!("image {} submitted from slot {} it was not acquired on", image_index, slot));
        }
        let Some(signal) = sync.render_finished.get_mut(image_index) else {
            return Err(Error::InvalidResource(format!("no render-finished semaphore for image {}", image_index)));
        };
        if *signal != SignalState::Idle {
            state.violations.push(format!(
                "render-finished semaphore of image {} signaled again while {:?}",
                image_index, signal
            ));
        }
        *signal = SignalState::Signaled;
        state.events.push(format!("submit slot={} image={}", slot, image_index));
        state.submitted.push(commands.commands.clone());
        Ok(())
    }

    fn present(
        device: &MockDevice,
        _swapchain: &MockSwapchain,
        sync: &mut MockFrameSync,
        slot: usize,
        image_index: usize,
    ) -> Result<PresentResult> {
        let mut state = device.shared.state();
        match sync.render_finished.get_mut(image_index) {
            Some(signal) => {
                if *signal != SignalState::Signaled {
                    state.violations.push(format!("present of image {} waits on an unsignaled semaphore", image_index));
                }
                *signal = SignalState::PresentPending;
            }
            None => return Err(Error::InvalidResource(format!("no render-finished semaphore for image {}", image_index))),
        }
        if state.transient_present_errors > 0 {
            state.transient_present_errors -= 1;
            state.events.push(format!("present slot={} image={} lost", slot, image_index));
            return Err(Error::TransientPresentError("scripted surface loss".to_string()));
        }
        let result = state.present_results.pop_front().unwrap_or(PresentResult::Presented);
        state.events.push(format!("present slot={} image={} {:?}", slot, image_index, result));
        Ok(result)
    }

    fn wait_present_idle(device: &MockDevice) -> Result<()> {
        device.shared.event("wait_present_idle");
        Ok(())
    }

    fn wait_idle(device: &MockDevice) -> Result<()> {
        device.shared.event("wait_idle");
        Ok(())
    }
}

/// Image count and extent the mock surface negotiates for `window_extent`
fn negotiate(shared: &Arc<MockShared>, window_extent: Extent2D) -> (usize, Extent2D) {
    let state = shared.state();
    let image_count = swap_image_count(state.min_image_count, state.max_image_count) as usize;
    let extent = match state.surface_extent {
        Some(current) => current,
        None => clamp_extent(window_extent, Extent2D::new(1, 1), Extent2D::new(4096, 4096)),
    };
    (image_count, extent)
}

// ============================================================================
// Mock overlay
// ============================================================================

/// Overlay logging its calls and drawing one triangle
pub struct MockOverlay {
    pub shared: Arc<MockShared>,
}

impl Overlay<MockBackend> for MockOverlay {
    fn prepare(&mut self, image_index: usize) -> Result<()> {
        self.shared.event(format!("overlay prepare {}", image_index));
        Ok(())
    }

    fn render(&mut self, commands: &mut MockCommandBuffer) -> Result<()> {
        self.shared.event("overlay render");
        commands.draw(3, 0)
    }
}

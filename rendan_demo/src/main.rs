//! Rendan demo - a textured, spinning cube
//!
//! Shaders are compiled by build.rs into `shaders/*.spv`. Logging goes through
//! `env_logger`; use `RUST_LOG=rendan=debug` for engine detail.

use std::path::PathBuf;
use std::time::Instant;

use rendan_engine::rendan::log::LogCrateLogger;
use rendan_engine::rendan::render::{Extent2D, ImageData, MeshData, OrbitCamera, ShaderModuleDesc};
use rendan_engine::rendan::{Engine, RendererConfig, Result};
use rendan_engine_renderer_vulkan::{print_validation_stats_report, VulkanRenderer};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

const WINDOW_TITLE: &str = "Rendan Demo";
const WINDOW_SIZE: (u32, u32) = (1280, 720);

fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders")
}

/// Extent the next frame is rendered at; the swapchain catches up inside
/// `render_frame`, so the camera must not read it beforehand
fn frame_extent(size: PhysicalSize<u32>) -> Extent2D {
    Extent2D::new(size.width, size.height)
}

fn load_shaders() -> Result<Vec<ShaderModuleDesc>> {
    let dir = shader_dir();
    Ok(vec![
        ShaderModuleDesc::from_file(dir.join("mesh.vert.spv"))?,
        ShaderModuleDesc::from_file(dir.join("mesh.frag.spv"))?,
    ])
}

/// The renderer is declared before the window so it is dropped first
#[derive(Default)]
struct DemoApp {
    renderer: Option<VulkanRenderer>,
    window: Option<Window>,
    camera: OrbitCamera,
    start: Option<Instant>,
}

impl DemoApp {
    fn init_renderer(&mut self, window: &Window) -> Result<VulkanRenderer> {
        let config = RendererConfig {
            app_name: WINDOW_TITLE.to_string(),
            clear_color: [0.05, 0.05, 0.08, 1.0],
            ..RendererConfig::default()
        };

        let mut renderer = VulkanRenderer::new(window, config, &load_shaders()?)?;
        renderer.load_mesh(&MeshData::cube(0.5))?;
        renderer.set_texture(&ImageData::checkerboard(256, 8, [235, 235, 235, 255], [200, 60, 40, 255]))?;
        Ok(renderer)
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(window), Some(start)) = (self.renderer.as_mut(), self.window.as_ref(), self.start) else {
            return;
        };

        let uniform = self.camera.uniform(start.elapsed().as_secs_f32(), frame_extent(window.inner_size()));
        if let Err(e) = renderer.render_frame(&uniform) {
            log::error!("Fatal render error: {}", e);
            self.shutdown(event_loop);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.wait_idle() {
                log::warn!("wait_idle failed during shutdown: {}", e);
            }
            let stats = renderer.stats();
            log::info!(
                "Presented {} frame(s), skipped {}, {} swapchain recreation(s)",
                stats.frames_presented,
                stats.frames_skipped,
                stats.swapchain_recreations
            );
        }
        print_validation_stats_report();
        event_loop.exit();
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(WINDOW_SIZE.0, WINDOW_SIZE.1));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => window,
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match self.init_renderer(&window) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                self.start = Some(Instant::now());
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(frame_extent(size));
                }
            }
            WindowEvent::RedrawRequested => self.draw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Engine::set_logger(LogCrateLogger);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };

    let mut app = DemoApp::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}

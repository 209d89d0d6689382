//! Shared window + render loop that drives one [`Program`].
//!
//! Each iteration: read input, update the program, draw its batch, present,
//! then wait a fixed delay before the next iteration. Startup failures (window,
//! GPU, sprite sheet) stop the loop and come back out of [`run`] as an error.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use wlk_core::input::{InputState, Key};
use wlk_core::time::{FramePacer, MonotonicClock, SystemClock};
use wlk_devtools::DebugOverlay;
use wlk_platform::window::create_window;
use wlk_render::{GpuContext, ScreenCamera, SpriteBatch, SpritePipeline, SpriteVertex, Texture};

use crate::config::{self, GameConfig};
use crate::program::{FrameContext, Program};

struct SheetBinding {
    size: (u32, u32),
    bind_group: wgpu::BindGroup,
}

struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    sprite_pipeline: SpritePipeline,
    camera: ScreenCamera,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sheet: Option<SheetBinding>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    batch: SpriteBatch,
    debug_overlay: DebugOverlay,
    input: InputState,
    pacer: FramePacer,
    clock: SystemClock,
    clear_color: wgpu::Color,
}

impl EngineState {
    fn new<P: Program>(
        window: Arc<Window>,
        config: &GameConfig,
        program: &P,
    ) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);

        let camera = ScreenCamera::new(gpu.size.0, gpu.size.1);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let sheet = match program.sheet() {
            Some(request) => {
                let texture = Texture::from_path(&gpu.device, &gpu.queue, request.path)?;
                config::validate_sheet_fits(&request.layout, request.rows, texture.size)
                    .map_err(|e| format!("{}: {e}", request.path.display()))?;
                let bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &texture);
                Some(SheetBinding {
                    size: texture.size,
                    bind_group,
                })
            }
            None => None,
        };

        let mesh_vertex_capacity = 16;
        let mesh_index_capacity = 32;
        let vertex_buffer = create_vertex_buffer(&gpu.device, mesh_vertex_capacity);
        let index_buffer = create_index_buffer(&gpu.device, mesh_index_capacity);

        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let [r, g, b] = config.window.clear_color;
        log::info!("Program '{}' ready", program.name());

        Ok(Self {
            window,
            gpu,
            sprite_pipeline,
            camera,
            camera_buffer,
            camera_bind_group,
            sheet,
            vertex_buffer,
            index_buffer,
            mesh_vertex_capacity,
            mesh_index_capacity,
            batch: SpriteBatch::new(),
            debug_overlay,
            input: InputState::new(),
            pacer: FramePacer::new(),
            clock: SystemClock::new(),
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
        })
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    /// One full iteration. Returns false when the program asked to quit.
    fn frame<P: Program>(&mut self, program: &mut P) -> bool {
        let now_ms = self.clock.now_ms();
        self.pacer.begin_frame(now_ms);

        if self.input.is_just_pressed(Key::Escape) {
            log::info!("Escape pressed, exiting.");
            return false;
        }
        if self.input.is_just_pressed(Key::F3) {
            self.debug_overlay.toggle();
        }
        if self.input.is_just_pressed(Key::R) {
            program.reload_script();
        }

        program.update(&FrameContext {
            input: &self.input,
            now_ms,
            dt: self.pacer.real_dt as f32,
        });

        self.batch.clear();
        if let Some(sheet) = &self.sheet {
            program.draw(sheet.size, &mut self.batch);
        }
        if !self.batch.is_empty() {
            self.ensure_mesh_capacity(self.batch.vertices.len(), self.batch.indices.len());
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.batch.vertices),
            );
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(&self.batch.indices),
            );
        }

        self.camera.viewport = self.gpu.size;
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let stats = program.overlay_stats(now_ms);
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.pacer, stats);
        if overlay_actions.reload_script {
            program.reload_script();
        }

        if let Some(surface_frame) = self.gpu.acquire_frame() {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
                pixels_per_point: self.window.scale_factor() as f32,
            };

            let mut encoder =
                self.gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Render Encoder"),
                    });

            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Sprite Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &surface_frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });

                if let Some(sheet) = &self.sheet {
                    if !self.batch.is_empty() {
                        render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
                        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                        render_pass.set_bind_group(1, &sheet.bind_group, &[]);
                        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(
                            self.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint32,
                        );
                        render_pass.draw_indexed(0..self.batch.indices.len() as u32, 0, 0..1);
                    }
                }
            }

            self.debug_overlay.upload(
                &self.gpu.device,
                &self.gpu.queue,
                &mut encoder,
                &egui_primitives,
                &egui_textures_delta,
                &screen_descriptor,
            );

            {
                let mut egui_pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &surface_frame.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();

                self.debug_overlay
                    .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
            }

            self.gpu.queue.submit(std::iter::once(encoder.finish()));
            surface_frame.present();
        }

        self.debug_overlay.cleanup(&egui_textures_delta);
        self.input.end_frame();
        self.pacer.end_frame(self.clock.now_ms());
        true
    }
}

struct App<'a, P: Program> {
    config: &'a GameConfig,
    program: P,
    state: Option<EngineState>,
    startup_error: Option<String>,
}

impl<P: Program> ApplicationHandler for App<'_, P> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let started = create_window(event_loop, &self.config.platform_config())
            .and_then(|window| EngineState::new(window, self.config, &self.program));
        match started {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            if frame_due(&state.pacer, &state.clock) {
                state.window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::WaitUntil(
                state.clock.instant_at(state.pacer.next_frame_ms()),
            ));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(key),
                            ElementState::Released => state.input.key_up(key),
                        }
                    }
                }
            }

            // System-initiated redraws (expose, resize) must not run an extra tick.
            WindowEvent::RedrawRequested if frame_due(&state.pacer, &state.clock) => {
                if !state.frame(&mut self.program) {
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

/// Open the window described by `config` and run `program` until it quits.
pub fn run<P: Program>(config: &GameConfig, program: P) -> Result<(), String> {
    log::info!("Starting '{}'", program.name());

    let event_loop =
        EventLoop::new().map_err(|e| format!("Failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App {
        config,
        program,
        state: None,
        startup_error: None,
    };
    event_loop
        .run_app(&mut app)
        .map_err(|e| format!("Event loop error: {e}"))?;

    match app.startup_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Entry point shared by the binaries: logging, config path, exit code.
///
/// The first command-line argument overrides `default_config`.
pub fn launch<P, F>(default_config: &str, make_program: F) -> ExitCode
where
    P: Program,
    F: FnOnce(&GameConfig) -> Result<P, String>,
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default_config));

    match start(&config_path, make_program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn start<P, F>(config_path: &Path, make_program: F) -> Result<(), String>
where
    P: Program,
    F: FnOnce(&GameConfig) -> Result<P, String>,
{
    let config = config::load_config(config_path)?;
    log::info!("Loaded config {}", config_path.display());
    let program = make_program(&config)?;
    run(&config, program)
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn frame_due(pacer: &FramePacer, clock: &impl MonotonicClock) -> bool {
    pacer.is_due(clock.now_ms())
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_and_wasd_keys_are_mapped() {
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_key(KeyCode::ArrowDown), Some(Key::Down));
        assert_eq!(map_key(KeyCode::KeyA), Some(Key::A));
        assert_eq!(map_key(KeyCode::KeyR), Some(Key::R));
        assert_eq!(map_key(KeyCode::F3), Some(Key::F3));
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        assert_eq!(map_key(KeyCode::KeyQ), None);
        assert_eq!(map_key(KeyCode::Enter), None);
    }

    struct FixedClock(u64);

    impl MonotonicClock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn redraw_before_deadline_is_not_a_frame() {
        let mut pacer = FramePacer::new();
        assert!(frame_due(&pacer, &FixedClock(0)));

        pacer.begin_frame(0);
        pacer.end_frame(4);
        assert!(!frame_due(&pacer, &FixedClock(4)));
        assert!(!frame_due(&pacer, &FixedClock(19)));
        assert!(frame_due(&pacer, &FixedClock(20)));
        assert_eq!(pacer.frame_count, 1);
    }

    #[test]
    fn missing_config_fails_before_opening_window() {
        let result = start(Path::new("__no_such_walkabout_config__.json"), |_| {
            Ok(crate::template::TemplateProgram::new())
        });
        let err = result.expect_err("missing config must fail");
        assert!(err.contains("Failed to read config"), "got: {err}");
    }
}

//! Debug overlay rendered via egui on top of the sprite pass.
//!
//! egui needs a `RenderPass<'static>` while `begin_render_pass` borrows the
//! encoder, so drawing is split in four calls per frame:
//!
//!   1. `prepare()` -- run the UI, produce tessellated primitives
//!   2. `upload()`  -- upload textures and buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a pass created with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui dropped
//!
//! The window is only built while `visible` (F3), but events always go through
//! egui so a shown window can take clicks.

use wlk_core::animation::{ActorState, FrameSpec};
use wlk_core::time::FramePacer;
use winit::window::Window;

/// Animation readout supplied by the running program.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub actor_state: ActorState,
    /// Facing row label, for direction-indexed sheets
    pub direction_label: Option<String>,
    pub frame: FrameSpec,
    pub ms_since_transition: u64,
    /// Script runtime status label (e.g. "Lua: loaded")
    pub script_status_label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    /// User clicked the script reload button
    pub reload_script: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        pacer: &FramePacer,
        stats: Option<OverlayStats>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let visible = self.visible;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if visible {
                show_panel(ctx, pacer, stats.as_ref(), &mut actions);
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn show_panel(
    ctx: &egui::Context,
    pacer: &FramePacer,
    stats: Option<&OverlayStats>,
    actions: &mut OverlayActions,
) {
    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            egui::Grid::new("debug_rows").num_columns(2).show(ui, |ui| {
                for (name, value) in overlay_rows(pacer, stats) {
                    ui.label(name);
                    ui.monospace(value);
                    ui.end_row();
                }
            });

            if let Some(status) = stats.and_then(|s| s.script_status_label.as_deref()) {
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(status);
                    if ui.button("Reload (R)").clicked() {
                        actions.reload_script = true;
                    }
                });
            }
        });
}

/// Label/value pairs shown in the panel, timing first.
fn overlay_rows(pacer: &FramePacer, stats: Option<&OverlayStats>) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("FPS", format!("{:.1}", pacer.smoothed_fps)),
        ("Frame time", format!("{:.2} ms", pacer.smoothed_frame_time_ms)),
        ("Frame", pacer.frame_count.to_string()),
    ];
    let Some(stats) = stats else {
        return rows;
    };

    rows.push(("State", stats.actor_state.to_string()));
    if let Some(direction) = &stats.direction_label {
        rows.push(("Direction", direction.clone()));
    }
    let rect = stats.frame.rect;
    rows.push((
        "Region",
        format!("{},{} {}x{}", rect.x, rect.y, rect.width, rect.height),
    ));
    rows.push((
        "Mirrored",
        stats.frame.orientation.is_mirrored().to_string(),
    ));
    rows.push(("Since transition", format!("{} ms", stats.ms_since_transition)));
    rows
}

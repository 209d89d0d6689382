//! Side-view walker: one sheet row, Idle/Walking/Jumping, mirrored when
//! moving right.

use std::path::PathBuf;

use wlk_core::animation::{
    select_frame, ActorState, AnimationClock, FrameInput, FrameSpec, Horizontal, SheetLayout,
};
use wlk_core::input::{InputState, Key};
use wlk_devtools::OverlayStats;
use wlk_render::{draw_region, DestRect, SpriteBatch};

use crate::config::{ActorConfig, GameConfig};
use crate::program::{FrameContext, Program, SheetRequest};

pub struct WalkerProgram {
    sheet_path: PathBuf,
    layout: SheetLayout,
    actor: ActorConfig,
    bounds: (f32, f32),
    x: f32,
    y: f32,
    vy: f32,
    airborne: bool,
    clock: AnimationClock,
    frame: FrameSpec,
}

impl WalkerProgram {
    pub fn new(config: &GameConfig) -> Result<Self, String> {
        let sheet = config.require_sheet()?;
        let layout = sheet.layout();
        let clock = AnimationClock::new(ActorState::Idle, 0);
        Ok(Self {
            sheet_path: sheet.texture_path(),
            layout,
            actor: config.actor.clone(),
            bounds: (config.window.width as f32, config.window.height as f32),
            x: config.actor.start_x,
            y: config.actor.start_y,
            vy: 0.0,
            airborne: false,
            clock,
            frame: clock.frame(&layout, 0, None),
        })
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn state(&self) -> ActorState {
        self.clock.state()
    }

    pub fn frame(&self) -> FrameSpec {
        self.frame
    }

    fn sprite_size(&self) -> (f32, f32) {
        (
            self.layout.frame_width as f32 * self.actor.scale,
            self.layout.frame_height as f32 * self.actor.scale,
        )
    }

    fn jump_pressed(input: &InputState) -> bool {
        [Key::Space, Key::Up, Key::W]
            .into_iter()
            .any(|key| input.is_just_pressed(key))
    }

    fn step_physics(&mut self, input: &InputState, dt: f32) -> f32 {
        let axis = input.horizontal_axis();
        let (sprite_w, _) = self.sprite_size();
        let max_x = (self.bounds.0 - sprite_w).max(0.0);
        self.x = (self.x + axis * self.actor.speed * dt).clamp(0.0, max_x);

        if !self.airborne && Self::jump_pressed(input) {
            self.airborne = true;
            self.vy = -self.actor.jump_speed;
        }

        if self.airborne {
            self.vy += self.actor.gravity * dt;
            self.y = (self.y + self.vy * dt).max(0.0);
            let floor = self.actor.start_y;
            if self.y >= floor {
                self.y = floor;
                self.vy = 0.0;
                self.airborne = false;
            }
        }

        axis
    }
}

/// Jumping wins over walking; walking needs horizontal input.
fn derive_state(airborne: bool, axis: f32) -> ActorState {
    if airborne {
        ActorState::Jumping
    } else if axis != 0.0 {
        ActorState::Walking
    } else {
        ActorState::Idle
    }
}

impl Program for WalkerProgram {
    fn name(&self) -> &str {
        "walker"
    }

    fn sheet(&self) -> Option<SheetRequest<'_>> {
        Some(SheetRequest {
            path: &self.sheet_path,
            layout: self.layout,
            rows: self.layout.row.saturating_add(1),
        })
    }

    fn update(&mut self, frame: &FrameContext<'_>) {
        let axis = self.step_physics(frame.input, frame.dt);
        let input = FrameInput {
            state: derive_state(self.airborne, axis),
            now_ms: frame.now_ms,
            direction: None,
            horizontal: Horizontal::from_axis(axis),
        };
        let (clock, spec) = select_frame(self.clock, &input, &self.layout);
        self.clock = clock;
        self.frame = spec;
    }

    fn draw(&self, texture_size: (u32, u32), batch: &mut SpriteBatch) {
        let dest = DestRect::scaled(self.frame.rect, self.x, self.y, self.actor.scale);
        draw_region(batch, texture_size, self.frame.rect, dest, self.frame.orientation);
    }

    fn overlay_stats(&self, now_ms: u64) -> Option<OverlayStats> {
        Some(OverlayStats {
            actor_state: self.clock.state(),
            direction_label: None,
            frame: self.frame,
            ms_since_transition: self.clock.elapsed_ms(now_ms),
            script_status_label: None,
        })
    }
}

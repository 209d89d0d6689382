//! Top-down walker: one sheet row per facing, movement decided by a Lua
//! script with a Rust controller standing in whenever the script can't.

use std::path::PathBuf;

use wlk_core::animation::{
    select_frame, ActorState, AnimationClock, Direction, FrameInput, FrameSpec, SheetLayout,
};
use wlk_core::input::InputState;
use wlk_devtools::OverlayStats;
use wlk_render::{draw_region, DestRect, SpriteBatch};

use crate::config::{ActorConfig, GameConfig};
use crate::lua_bridge::{ActorSnapshot, InputSnapshot, LuaBridge, ScriptIntent};
use crate::program::{FrameContext, Program, SheetRequest};

/// Rows in a direction-indexed sheet, one per [`Direction`].
const DIRECTION_ROWS: u32 = 4;

pub struct TopDownProgram {
    sheet_path: PathBuf,
    layout: SheetLayout,
    actor: ActorConfig,
    bounds: (f32, f32),
    x: f32,
    y: f32,
    direction: Direction,
    clock: AnimationClock,
    frame: FrameSpec,
    script: Option<LuaBridge>,
}

impl TopDownProgram {
    pub fn new(config: &GameConfig) -> Result<Self, String> {
        let sheet = config.require_sheet()?;
        let layout = sheet.layout();
        let direction = config.actor.start_direction;
        let clock = AnimationClock::new(ActorState::Idle, 0);
        let script = config.script_path().map(LuaBridge::new);
        if script.is_none() {
            log::info!("No script configured, using the Rust controller");
        }
        Ok(Self {
            sheet_path: sheet.texture_path(),
            layout,
            actor: config.actor.clone(),
            bounds: (config.window.width as f32, config.window.height as f32),
            x: config.actor.start_x,
            y: config.actor.start_y,
            direction,
            clock,
            frame: clock.frame(&layout, 0, Some(direction)),
            script,
        })
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn state(&self) -> ActorState {
        self.clock.state()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn frame(&self) -> FrameSpec {
        self.frame
    }

    fn intent(&self, frame: &FrameContext<'_>) -> ScriptIntent {
        let scripted = self.script.as_ref().and_then(|bridge| {
            bridge.call_update(
                frame.dt,
                frame.now_ms,
                &InputSnapshot::capture(frame.input),
                &ActorSnapshot {
                    x: self.x,
                    y: self.y,
                    state: self.clock.state(),
                    direction: self.direction,
                },
            )
        });
        scripted.unwrap_or_else(|| fallback_intent(frame.input))
    }

    fn apply_motion(&mut self, intent: &ScriptIntent, dt: f32) {
        let (mut move_x, mut move_y) = (intent.move_x, intent.move_y);
        let len = (move_x * move_x + move_y * move_y).sqrt();
        if len > 1.0 {
            move_x /= len;
            move_y /= len;
        }

        let sprite_w = self.layout.frame_width as f32 * self.actor.scale;
        let sprite_h = self.layout.frame_height as f32 * self.actor.scale;
        let max_x = (self.bounds.0 - sprite_w).max(0.0);
        let max_y = (self.bounds.1 - sprite_h).max(0.0);
        self.x = (self.x + move_x * self.actor.speed * dt).clamp(0.0, max_x);
        self.y = (self.y + move_y * self.actor.speed * dt).clamp(0.0, max_y);
    }
}

/// Arrow keys / WASD straight to an intent.
fn fallback_intent(input: &InputState) -> ScriptIntent {
    ScriptIntent {
        move_x: input.horizontal_axis(),
        move_y: input.vertical_axis(),
        face: None,
    }
}

/// Facing after this frame's intent. An explicit face request wins, then
/// horizontal motion, then vertical; no motion keeps `current`.
fn derive_direction(current: Direction, intent: &ScriptIntent) -> Direction {
    if let Some(face) = intent.face {
        return face;
    }
    if intent.move_x < 0.0 {
        Direction::Left
    } else if intent.move_x > 0.0 {
        Direction::Right
    } else if intent.move_y < 0.0 {
        Direction::Up
    } else if intent.move_y > 0.0 {
        Direction::Down
    } else {
        current
    }
}

fn derive_state(intent: &ScriptIntent) -> ActorState {
    if intent.move_x != 0.0 || intent.move_y != 0.0 {
        ActorState::Walking
    } else {
        ActorState::Idle
    }
}

impl Program for TopDownProgram {
    fn name(&self) -> &str {
        "scripted"
    }

    fn sheet(&self) -> Option<SheetRequest<'_>> {
        Some(SheetRequest {
            path: &self.sheet_path,
            layout: self.layout,
            rows: DIRECTION_ROWS,
        })
    }

    fn update(&mut self, frame: &FrameContext<'_>) {
        if let Some(bridge) = self.script.as_mut() {
            bridge.check_reload();
        }

        let intent = self.intent(frame);
        self.apply_motion(&intent, frame.dt);
        self.direction = derive_direction(self.direction, &intent);

        let input = FrameInput {
            state: derive_state(&intent),
            now_ms: frame.now_ms,
            direction: Some(self.direction),
            horizontal: None,
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
        let script_status_label = Some(match &self.script {
            Some(bridge) => bridge.status().label().to_string(),
            None => "Lua: off".to_string(),
        });
        Some(OverlayStats {
            actor_state: self.clock.state(),
            direction_label: Some(self.direction.label().to_string()),
            frame: self.frame,
            ms_since_transition: self.clock.elapsed_ms(now_ms),
            script_status_label,
        })
    }

    fn reload_script(&mut self) {
        if let Some(bridge) = self.script.as_mut() {
            bridge.force_reload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::lua_bridge::ScriptStatus;
    use std::io::Write;
    use wlk_core::input::Key;

    fn temp_script_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("wlk_topdown_{name}_{nanos}.lua"))
    }

    fn config_json(script: Option<&std::path::Path>) -> String {
        let script = script
            .map(|p| format!(r#", "script": {:?}"#, p.to_string_lossy()))
            .unwrap_or_default();
        format!(
            r#"{{
                "version": "0.1",
                "window": {{ "title": "Scripted", "width": 640, "height": 480 }},
                "sheet": {{
                    "texture": "assets/sprites/topdown.png",
                    "frame_width": 16,
                    "frame_height": 16,
                    "idle_frame": 0,
                    "walk_frames": [1, 2],
                    "animation_fps": 12
                }},
                "actor": {{ "scale": 4.0, "speed": 120.0,
                           "start_x": 288.0, "start_y": 208.0,
                           "start_direction": "down" }}{script}
            }}"#
        )
    }

    fn program(script: Option<&std::path::Path>) -> TopDownProgram {
        let config = parse_config(&config_json(script)).expect("config should parse");
        TopDownProgram::new(&config).expect("program should build")
    }

    fn step(program: &mut TopDownProgram, input: &mut InputState, now_ms: u64) {
        program.update(&FrameContext {
            input,
            now_ms,
            dt: 1.0 / 60.0,
        });
        input.end_frame();
    }

    fn intent(move_x: f32, move_y: f32) -> ScriptIntent {
        ScriptIntent {
            move_x,
            move_y,
            face: None,
        }
    }

    #[test]
    fn direction_prefers_horizontal_on_diagonals() {
        assert_eq!(derive_direction(Direction::Down, &intent(1.0, -1.0)), Direction::Right);
        assert_eq!(derive_direction(Direction::Down, &intent(-1.0, 1.0)), Direction::Left);
        assert_eq!(derive_direction(Direction::Down, &intent(0.0, -1.0)), Direction::Up);
        assert_eq!(derive_direction(Direction::Up, &intent(0.0, 1.0)), Direction::Down);
    }

    #[test]
    fn direction_kept_when_idle_and_face_overrides() {
        assert_eq!(derive_direction(Direction::Left, &intent(0.0, 0.0)), Direction::Left);
        let facing = ScriptIntent {
            face: Some(Direction::Up),
            ..intent(1.0, 0.0)
        };
        assert_eq!(derive_direction(Direction::Down, &facing), Direction::Up);
    }

    #[test]
    fn fallback_controller_walks_with_arrow_keys() {
        let mut program = program(None);
        let mut input = InputState::new();
        input.key_down(Key::Up);
        step(&mut program, &mut input, 0);

        assert_eq!(program.state(), ActorState::Walking);
        assert_eq!(program.direction(), Direction::Up);
        assert_eq!(program.frame().rect.y, 0);
        assert_eq!(program.frame().rect.x, 16);
        assert!(program.position().1 < 208.0);

        input.key_up(Key::Up);
        step(&mut program, &mut input, 16);
        assert_eq!(program.state(), ActorState::Idle);
        assert_eq!(program.direction(), Direction::Up);
        assert_eq!(program.frame().rect.x, 0);
    }

    #[test]
    fn starts_facing_configured_direction() {
        let program = program(None);
        assert_eq!(program.direction(), Direction::Down);
        assert_eq!(program.frame().rect.y, 48);
        assert!(!program.frame().orientation.is_mirrored());
        let request = program.sheet().expect("sheet");
        assert_eq!(request.rows, 4);
    }

    #[test]
    fn diagonal_speed_is_normalized() {
        let mut program = program(None);
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::Down);
        step(&mut program, &mut input, 0);

        let (x, y) = program.position();
        let moved = ((x - 288.0).powi(2) + (y - 208.0).powi(2)).sqrt();
        assert!((moved - 2.0).abs() < 1e-3, "moved {moved}");
        assert_eq!(program.direction(), Direction::Right);
        assert_eq!(program.frame().rect.y, 32);
        assert!(!program.frame().orientation.is_mirrored());
    }

    #[test]
    fn script_intent_drives_actor() {
        let path = temp_script_path("drive");
        let mut f = std::fs::File::create(&path).expect("create script");
        f.write_all(
            br#"
function on_update(dt)
    engine.actor.set_intent(-1.0, 0.0)
end
"#,
        )
        .expect("write script");
        drop(f);

        let mut program = program(Some(&path));
        let mut input = InputState::new();
        input.key_down(Key::Right);
        step(&mut program, &mut input, 0);

        assert_eq!(program.direction(), Direction::Left, "script wins over keys");
        assert!(program.position().0 < 288.0);
        let stats = program.overlay_stats(0).expect("stats");
        assert_eq!(stats.script_status_label.as_deref(), Some("Lua: loaded"));
        assert_eq!(stats.direction_label.as_deref(), Some("left"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn broken_script_falls_back_to_keys() {
        let path = temp_script_path("broken");
        std::fs::write(&path, "function on_update(dt) error('boom') end").expect("write");

        let mut program = program(Some(&path));
        let mut input = InputState::new();
        input.key_down(Key::Right);
        step(&mut program, &mut input, 0);

        assert_eq!(program.direction(), Direction::Right);
        assert_eq!(program.state(), ActorState::Walking);

        std::fs::write(&path, "this is not lua").expect("write");
        program.reload_script();
        let status = program.script.as_ref().map(|b| b.status());
        assert_eq!(status, Some(ScriptStatus::Error));

        step(&mut program, &mut input, 16);
        assert_eq!(program.state(), ActorState::Walking);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_script_reports_fallback() {
        let mut program = program(Some(std::path::Path::new("__missing_topdown_script__.lua")));
        let mut input = InputState::new();
        step(&mut program, &mut input, 0);
        let stats = program.overlay_stats(0).expect("stats");
        assert_eq!(stats.script_status_label.as_deref(), Some("Lua: fallback"));
    }

    #[test]
    fn position_clamped_inside_window() {
        let mut program = program(None);
        let mut input = InputState::new();
        input.key_down(Key::S);
        let mut now = 0;
        for _ in 0..300 {
            step(&mut program, &mut input, now);
            now += 16;
        }
        assert_eq!(program.position().1, 480.0 - 64.0);
    }
}

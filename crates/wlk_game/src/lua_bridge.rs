//! Rust <-> Lua bridge for the scripted program's game logic.
//!
//! Scripts provide **movement intents** (an axis pair plus an optional facing
//! override), never direct mutation of the actor. Rust owns position and the
//! animation clock; Lua reads a snapshot of them and writes into an `_intent`
//! table that Rust reads back after `on_update(dt)` returns.
//!
//! Input is exposed via lookup tables (`_held` / `_just_pressed`) so the whole
//! keyboard snapshot is set in one pass per frame.
//!
//! Reload (mtime change or the R key) always builds a **fresh Lua state** and
//! re-runs the script from scratch, so no stale globals survive. Any state the
//! script keeps in locals is lost, which is fine because the actor lives in
//! Rust.

use std::path::PathBuf;
use std::time::SystemTime;

use mlua::prelude::*;
use wlk_core::animation::{ActorState, Direction};
use wlk_core::input::{InputState, Key};

/// Intent returned by Lua's on_update: desired motion, not direct mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptIntent {
    /// -1..=1, negative is left
    pub move_x: f32,
    /// -1..=1, negative is up (screen space)
    pub move_y: f32,
    /// Facing requested with `engine.actor.face(dir)`
    pub face: Option<Direction>,
}

/// Status of the Lua runtime, shown in the debug overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    /// Script loaded and running normally.
    Loaded,
    /// Script had an error; the Rust fallback controller is in charge.
    Error,
    /// No script file found; the Rust fallback controller is in charge.
    Fallback,
}

impl ScriptStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Loaded => "Lua: loaded",
            Self::Error => "Lua: ERROR",
            Self::Fallback => "Lua: fallback",
        }
    }
}

impl std::fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the actor passed to Lua each frame.
#[derive(Debug, Clone)]
pub struct ActorSnapshot {
    pub x: f32,
    pub y: f32,
    pub state: ActorState,
    pub direction: Direction,
}

/// Snapshot of the keyboard passed to Lua each frame.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    pub held_keys: Vec<String>,
    pub just_pressed_keys: Vec<String>,
}

impl InputSnapshot {
    pub fn capture(input: &InputState) -> Self {
        let mut snapshot = Self::default();
        for &(key, name) in Key::SCRIPTABLE {
            if input.is_held(key) {
                snapshot.held_keys.push(name.to_string());
            }
            if input.is_just_pressed(key) {
                snapshot.just_pressed_keys.push(name.to_string());
            }
        }
        snapshot
    }
}

pub struct LuaBridge {
    lua: Lua,
    script_path: PathBuf,
    last_modified: Option<SystemTime>,
    status: ScriptStatus,
    last_error: Option<String>,
}

impl LuaBridge {
    /// Create a bridge and load the script. A missing file starts in Fallback.
    pub fn new(script_path: PathBuf) -> Self {
        let mut bridge = Self {
            lua: Lua::new(),
            script_path,
            last_modified: None,
            status: ScriptStatus::Fallback,
            last_error: None,
        };
        bridge.try_load_script();
        bridge
    }

    pub fn status(&self) -> ScriptStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reload when the script's mtime changed. Call at a frame boundary.
    pub fn check_reload(&mut self) {
        let current_mtime = match std::fs::metadata(&self.script_path) {
            Ok(meta) => meta.modified().ok(),
            Err(_) => return,
        };

        if current_mtime != self.last_modified {
            log::info!(
                "Lua script changed, reloading: {}",
                self.script_path.display()
            );
            self.try_load_script();
        }
    }

    pub fn force_reload(&mut self) {
        log::info!("Lua script force reload: {}", self.script_path.display());
        self.try_load_script();
    }

    /// Run `on_update(dt)`. `None` when Lua is unavailable or the call failed.
    pub fn call_update(
        &self,
        dt: f32,
        now_ms: u64,
        input: &InputSnapshot,
        actor: &ActorSnapshot,
    ) -> Option<ScriptIntent> {
        if self.status != ScriptStatus::Loaded {
            return None;
        }

        match self.call_update_inner(dt, now_ms, input, actor) {
            Ok(intent) => Some(intent),
            Err(err) => {
                log::error!("Lua on_update error: {}", err);
                None
            }
        }
    }

    fn call_update_inner(
        &self,
        dt: f32,
        now_ms: u64,
        input: &InputSnapshot,
        actor: &ActorSnapshot,
    ) -> LuaResult<ScriptIntent> {
        let engine: LuaTable = self.lua.globals().get("engine")?;
        let input_table: LuaTable = engine.get("input")?;
        let actor_table: LuaTable = engine.get("actor")?;
        let time_table: LuaTable = engine.get("time")?;

        let held_set = self.lua.create_table()?;
        for key in &input.held_keys {
            held_set.set(key.as_str(), true)?;
        }
        input_table.set("_held", held_set)?;

        let pressed_set = self.lua.create_table()?;
        for key in &input.just_pressed_keys {
            pressed_set.set(key.as_str(), true)?;
        }
        input_table.set("_just_pressed", pressed_set)?;

        actor_table.set("x", actor.x)?;
        actor_table.set("y", actor.y)?;
        actor_table.set("state", actor.state.label())?;
        actor_table.set("direction", actor.direction.label())?;
        time_table.set("now_ms", now_ms)?;

        let intent_table: LuaTable = engine.get("_intent")?;
        intent_table.set("move_x", 0.0f32)?;
        intent_table.set("move_y", 0.0f32)?;
        intent_table.set("face", LuaValue::Nil)?;

        let on_update: LuaFunction = self.lua.globals().get("on_update")?;
        on_update.call::<()>(dt)?;

        let move_x: f32 = intent_table.get("move_x")?;
        let move_y: f32 = intent_table.get("move_y")?;
        let face: Option<String> = intent_table.get("face")?;

        Ok(ScriptIntent {
            move_x: clamp_axis(move_x),
            move_y: clamp_axis(move_y),
            face: face.as_deref().and_then(Direction::from_label),
        })
    }

    fn try_load_script(&mut self) {
        if !self.script_path.exists() {
            log::warn!(
                "Lua script not found: {}. Using Rust fallback.",
                self.script_path.display()
            );
            self.status = ScriptStatus::Fallback;
            self.last_error = None;
            self.last_modified = None;
            return;
        }

        self.last_modified = std::fs::metadata(&self.script_path)
            .ok()
            .and_then(|m| m.modified().ok());

        self.lua = Lua::new();

        if let Err(err) = self.setup_engine_api() {
            self.fail(format!("Failed to setup Lua engine API: {}", err));
            return;
        }

        let source = match std::fs::read_to_string(&self.script_path) {
            Ok(source) => source,
            Err(err) => {
                self.fail(format!("Failed to read Lua script: {}", err));
                return;
            }
        };

        if let Err(err) = self
            .lua
            .load(&source)
            .set_name(self.script_path.to_string_lossy())
            .exec()
        {
            self.fail(format!("Lua script load error: {}", err));
            return;
        }

        self.status = ScriptStatus::Loaded;
        self.last_error = None;
        log::info!("Lua script loaded: {}", self.script_path.display());

        if let Ok(on_init) = self.lua.globals().get::<LuaFunction>("on_init") {
            if let Err(err) = on_init.call::<()>(()) {
                // on_init failures leave the script usable
                log::error!("Lua on_init error: {}", err);
            }
        }
    }

    fn fail(&mut self, msg: String) {
        log::error!("{}", msg);
        self.status = ScriptStatus::Error;
        self.last_error = Some(msg);
    }

    /// Build the `engine` global table that scripts interact with.
    ///
    /// Layout:
    ///   engine.input._held            -- key -> true for held keys
    ///   engine.input._just_pressed    -- key -> true for this frame's presses
    ///   engine.input.is_held(key)
    ///   engine.input.is_just_pressed(key)
    ///   engine.actor.x / y            -- read-only position, set each frame
    ///   engine.actor.state            -- "idle" | "walking"
    ///   engine.actor.direction        -- "up" | "left" | "right" | "down"
    ///   engine.actor.set_intent(move_x, move_y)
    ///   engine.actor.face(direction)
    ///   engine.time.now_ms            -- monotonic milliseconds
    ///   engine.log(message)
    ///   engine._intent                -- internal, read by Rust after on_update
    fn setup_engine_api(&self) -> LuaResult<()> {
        let lua = &self.lua;
        let engine = lua.create_table()?;

        let input_table = lua.create_table()?;
        input_table.set("_held", lua.create_table()?)?;
        input_table.set("_just_pressed", lua.create_table()?)?;

        let is_held = lua.create_function(|lua_ctx, key: String| {
            let engine: LuaTable = lua_ctx.globals().get("engine")?;
            let input: LuaTable = engine.get("input")?;
            let held: LuaTable = input.get("_held")?;
            Ok(held.get::<bool>(key.as_str()).unwrap_or(false))
        })?;
        input_table.set("is_held", is_held)?;

        let is_just_pressed = lua.create_function(|lua_ctx, key: String| {
            let engine: LuaTable = lua_ctx.globals().get("engine")?;
            let input: LuaTable = engine.get("input")?;
            let pressed: LuaTable = input.get("_just_pressed")?;
            Ok(pressed.get::<bool>(key.as_str()).unwrap_or(false))
        })?;
        input_table.set("is_just_pressed", is_just_pressed)?;

        engine.set("input", input_table)?;

        let actor_table = lua.create_table()?;
        actor_table.set("x", 0.0f32)?;
        actor_table.set("y", 0.0f32)?;
        actor_table.set("state", ActorState::Idle.label())?;
        actor_table.set("direction", Direction::Down.label())?;

        let set_intent = lua.create_function(|lua_ctx, (move_x, move_y): (f32, f32)| {
            let engine: LuaTable = lua_ctx.globals().get("engine")?;
            let intent: LuaTable = engine.get("_intent")?;
            intent.set("move_x", move_x)?;
            intent.set("move_y", move_y)?;
            Ok(())
        })?;
        actor_table.set("set_intent", set_intent)?;

        let face = lua.create_function(|lua_ctx, name: String| {
            if Direction::from_label(&name).is_none() {
                return Err(LuaError::RuntimeError(format!(
                    "engine.actor.face: unknown direction '{}'",
                    name
                )));
            }
            let engine: LuaTable = lua_ctx.globals().get("engine")?;
            let intent: LuaTable = engine.get("_intent")?;
            intent.set("face", name)?;
            Ok(())
        })?;
        actor_table.set("face", face)?;

        engine.set("actor", actor_table)?;

        let time_table = lua.create_table()?;
        time_table.set("now_ms", 0u64)?;
        engine.set("time", time_table)?;

        let log_fn = lua.create_function(|_, message: String| {
            log::info!(target: "script", "{}", message);
            Ok(())
        })?;
        engine.set("log", log_fn)?;

        let intent_table = lua.create_table()?;
        intent_table.set("move_x", 0.0f32)?;
        intent_table.set("move_y", 0.0f32)?;
        engine.set("_intent", intent_table)?;

        lua.globals().set("engine", engine)?;

        Ok(())
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

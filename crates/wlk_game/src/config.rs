//! JSON configuration shared by the sample programs.
//!
//! Every program reads one file: window settings, the sprite-sheet geometry
//! (sheet programs only), actor tuning and an optional Lua script path. Missing
//! sections fall back to defaults; present values are validated after parsing.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use wlk_core::animation::{Direction, SheetLayout};
use wlk_platform::window::PlatformConfig;

const SUPPORTED_VERSION: &str = "0.1";

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub version: String,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub sheet: Option<SheetConfig>,
    #[serde(default)]
    pub actor: ActorConfig,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub clear_color: [f64; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SheetConfig {
    pub texture: String,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub idle_frame: u32,
    pub walk_frames: [u32; 2],
    /// Defaults to the idle frame for sheets without a jump pose.
    #[serde(default)]
    pub jump_frame: Option<u32>,
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    #[serde(default)]
    pub row: u32,
}

impl SheetConfig {
    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            idle_frame: self.idle_frame,
            walk_frames: self.walk_frames,
            jump_frame: self.jump_frame.unwrap_or(self.idle_frame),
            animation_fps: self.animation_fps,
            row: self.row,
        }
    }

    pub fn texture_path(&self) -> PathBuf {
        PathBuf::from(&self.texture)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActorConfig {
    /// Screen pixels per sheet texel
    pub scale: f32,
    /// Walking speed in pixels per second
    pub speed: f32,
    /// Upward launch speed in pixels per second
    pub jump_speed: f32,
    /// Downward acceleration in pixels per second squared
    pub gravity: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub start_direction: Direction,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            scale: 4.0,
            speed: 120.0,
            jump_speed: 420.0,
            gravity: 1200.0,
            start_x: 288.0,
            start_y: 208.0,
            start_direction: Direction::Down,
        }
    }
}

impl GameConfig {
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }

    pub fn require_sheet(&self) -> Result<&SheetConfig, String> {
        self.sheet.as_ref().ok_or_else(|| {
            "Config has no 'sheet' section but this program draws a sprite sheet".to_string()
        })
    }

    pub fn script_path(&self) -> Option<PathBuf> {
        self.script.as_ref().map(PathBuf::from)
    }
}

pub fn load_config(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config = parse_config(&raw)
        .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
    log::info!(
        "Config loaded: {} ('{}' {}x{})",
        path.display(),
        config.window.title,
        config.window.width,
        config.window.height
    );
    Ok(config)
}

pub fn parse_config(raw: &str) -> Result<GameConfig, String> {
    let config: GameConfig =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse config JSON: {e}"))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.version != SUPPORTED_VERSION {
        return Err(format!(
            "Config validation failed: unsupported version '{}'",
            config.version
        ));
    }
    if config.window.title.is_empty() {
        return Err("Config validation failed: window title is empty".to_string());
    }
    if config.window.width == 0 || config.window.height == 0 {
        return Err(format!(
            "Config validation failed: window size {}x{} has a zero side",
            config.window.width, config.window.height
        ));
    }
    if config
        .window
        .clear_color
        .iter()
        .any(|c| !(0.0..=1.0).contains(c))
    {
        return Err("Config validation failed: clear_color components must be in 0..=1".to_string());
    }
    if let Some(sheet) = &config.sheet {
        if sheet.texture.is_empty() {
            return Err("Config validation failed: sheet texture path is empty".to_string());
        }
        if sheet.frame_width == 0 || sheet.frame_height == 0 {
            return Err(format!(
                "Config validation failed: frame size {}x{} has a zero side",
                sheet.frame_width, sheet.frame_height
            ));
        }
        if sheet.animation_fps == 0 {
            return Err("Config validation failed: animation_fps must be > 0".to_string());
        }
        // Direction-indexed sheets address all four rows.
        let rows = sheet
            .row
            .saturating_add(1)
            .max(Direction::ALL.len() as u32);
        if sheet.layout().extent(rows).is_none() {
            return Err(format!(
                "Config validation failed: sheet geometry ({}x{} frames, max column {}, {} rows) \
                 overflows u32 pixels",
                sheet.frame_width,
                sheet.frame_height,
                sheet.layout().max_column(),
                rows
            ));
        }
    }
    let actor = &config.actor;
    if actor.scale <= 0.0 {
        return Err("Config validation failed: actor scale must be > 0".to_string());
    }
    if actor.speed <= 0.0 {
        return Err("Config validation failed: actor speed must be > 0".to_string());
    }
    if actor.gravity < 0.0 || actor.jump_speed < 0.0 {
        return Err("Config validation failed: gravity and jump_speed must be >= 0".to_string());
    }
    if matches!(&config.script, Some(script) if script.is_empty()) {
        return Err("Config validation failed: script path is empty".to_string());
    }
    Ok(())
}

/// Reject sheets whose frames would sample outside the loaded texture.
pub fn validate_sheet_fits(
    layout: &SheetLayout,
    rows: u32,
    texture_size: (u32, u32),
) -> Result<(), String> {
    let (needed_w, needed_h) = layout.extent(rows).ok_or_else(|| {
        format!(
            "Sprite sheet geometry for {} rows of {}x{} frames overflows u32 pixels",
            rows, layout.frame_width, layout.frame_height
        )
    })?;
    if needed_w > texture_size.0 || needed_h > texture_size.1 {
        return Err(format!(
            "Sprite sheet is {}x{} but the configured frames need {}x{}",
            texture_size.0, texture_size.1, needed_w, needed_h
        ));
    }
    Ok(())
}

fn default_title() -> String {
    "Template".to_string()
}

const fn default_width() -> u32 {
    640
}

const fn default_height() -> u32 {
    480
}

const fn default_animation_fps() -> u32 {
    12
}

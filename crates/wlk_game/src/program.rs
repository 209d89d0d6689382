use std::path::Path;

use wlk_core::animation::SheetLayout;
use wlk_core::input::InputState;
use wlk_devtools::OverlayStats;
use wlk_render::SpriteBatch;

/// What the runner hands a program once per frame.
pub struct FrameContext<'a> {
    pub input: &'a InputState,
    /// Monotonic milliseconds since the runner started
    pub now_ms: u64,
    /// Seconds since the previous frame started (capped)
    pub dt: f32,
}

/// Sprite sheet a program needs loaded before its first frame.
pub struct SheetRequest<'a> {
    pub path: &'a Path,
    pub layout: SheetLayout,
    /// Number of rows the program addresses
    pub rows: u32,
}

/// One sample program driven by the shared runner.
pub trait Program {
    fn name(&self) -> &str;

    fn sheet(&self) -> Option<SheetRequest<'_>> {
        None
    }

    fn update(&mut self, frame: &FrameContext<'_>);

    fn draw(&self, _texture_size: (u32, u32), _batch: &mut SpriteBatch) {}

    fn overlay_stats(&self, _now_ms: u64) -> Option<OverlayStats> {
        None
    }

    fn reload_script(&mut self) {}
}

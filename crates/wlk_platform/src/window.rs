use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Title and logical size of the single program window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl PlatformConfig {
    pub fn logical_size(&self) -> LogicalSize<u32> {
        LogicalSize::new(self.width.max(1), self.height.max(1))
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Template".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Open a fixed-size window. Actors are clamped to its bounds, so it does not
/// resize.
pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    let attrs = WindowAttributes::default()
        .with_title(config.title.as_str())
        .with_inner_size(config.logical_size())
        .with_resizable(false);

    let window = event_loop
        .create_window(attrs)
        .map_err(|e| format!("Failed to create window '{}': {e}", config.title))?;
    log::info!(
        "Window created: '{}' {}x{} (scale factor {:.2})",
        config.title,
        config.width,
        config.height,
        window.scale_factor()
    );
    Ok(Arc::new(window))
}

pub mod camera;
pub mod gpu_context;
pub mod region;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use camera::{CameraUniform, ScreenCamera};
pub use gpu_context::{GpuContext, SurfaceFrame};
pub use region::{draw_region, DestRect, SpriteBatch};
pub use sprite_pipeline::SpritePipeline;
pub use texture::Texture;
pub use vertex::SpriteVertex;

//! Drawing a rectangular region of a sprite sheet onto the screen.
//!
//! `draw_region` is the renderer-facing half of the animation core: the state
//! machine picks a [`FrameRect`] and an [`Orientation`], this module turns
//! them into a textured quad in screen space.

use wlk_core::animation::{FrameRect, Orientation};

use crate::vertex::SpriteVertex;

/// Destination rectangle in screen pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DestRect {
    /// `source` scaled by `scale` with its top-left corner at `(x, y)`.
    pub fn scaled(source: FrameRect, x: f32, y: f32, scale: f32) -> Self {
        Self {
            x,
            y,
            width: source.width as f32 * scale,
            height: source.height as f32 * scale,
        }
    }
}

/// CPU-side quads for one texture, rebuilt every frame.
#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn push_quad(&mut self, quad: [SpriteVertex; 4]) {
        let base_index = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&quad);
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
    }
}

/// Corners in order top-left, top-right, bottom-right, bottom-left. A mirrored
/// region swaps the horizontal texture coordinates.
pub(crate) fn region_quad(
    texture_size: (u32, u32),
    source: FrameRect,
    dest: DestRect,
    orientation: Orientation,
    color: [f32; 4],
) -> [SpriteVertex; 4] {
    let tex_w = texture_size.0.max(1) as f32;
    let tex_h = texture_size.1.max(1) as f32;
    let mut u0 = source.x as f32 / tex_w;
    let mut u1 = source.x.saturating_add(source.width) as f32 / tex_w;
    let v0 = source.y as f32 / tex_h;
    let v1 = source.y.saturating_add(source.height) as f32 / tex_h;
    if orientation.is_mirrored() {
        std::mem::swap(&mut u0, &mut u1);
    }

    let left = dest.x;
    let right = dest.x + dest.width;
    let top = dest.y;
    let bottom = dest.y + dest.height;

    [
        SpriteVertex {
            position: [left, top],
            tex_coords: [u0, v0],
            color,
        },
        SpriteVertex {
            position: [right, top],
            tex_coords: [u1, v0],
            color,
        },
        SpriteVertex {
            position: [right, bottom],
            tex_coords: [u1, v1],
            color,
        },
        SpriteVertex {
            position: [left, bottom],
            tex_coords: [u0, v1],
            color,
        },
    ]
}

pub fn draw_region(
    batch: &mut SpriteBatch,
    texture_size: (u32, u32),
    source: FrameRect,
    dest: DestRect,
    orientation: Orientation,
) {
    batch.push_quad(region_quad(
        texture_size,
        source,
        dest,
        orientation,
        SpriteVertex::WHITE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: (u32, u32) = (64, 64);

    fn frame(x: u32, y: u32) -> FrameRect {
        FrameRect {
            x,
            y,
            width: 16,
            height: 16,
        }
    }

    #[test]
    fn quad_covers_source_texels() {
        let dest = DestRect::scaled(frame(16, 48), 100.0, 50.0, 4.0);
        let quad = region_quad(SHEET, frame(16, 48), dest, Orientation::Normal, [1.0; 4]);

        assert_eq!(quad[0].position, [100.0, 50.0]);
        assert_eq!(quad[2].position, [164.0, 114.0]);
        assert_eq!(quad[0].tex_coords, [0.25, 0.75]);
        assert_eq!(quad[2].tex_coords, [0.5, 1.0]);
    }

    #[test]
    fn mirrored_quad_swaps_u() {
        let dest = DestRect::scaled(frame(0, 0), 0.0, 0.0, 1.0);
        let normal = region_quad(SHEET, frame(0, 0), dest, Orientation::Normal, [1.0; 4]);
        let mirrored = region_quad(SHEET, frame(0, 0), dest, Orientation::Mirrored, [1.0; 4]);

        for i in 0..4 {
            assert_eq!(normal[i].position, mirrored[i].position);
            assert_eq!(normal[i].tex_coords[1], mirrored[i].tex_coords[1]);
        }
        assert_eq!(normal[0].tex_coords[0], mirrored[1].tex_coords[0]);
        assert_eq!(normal[1].tex_coords[0], mirrored[0].tex_coords[0]);
    }

    #[test]
    fn batch_indexes_each_quad() {
        let mut batch = SpriteBatch::new();
        assert!(batch.is_empty());
        let dest = DestRect::scaled(frame(0, 0), 0.0, 0.0, 1.0);
        draw_region(&mut batch, SHEET, frame(0, 0), dest, Orientation::Normal);
        draw_region(&mut batch, SHEET, frame(16, 0), dest, Orientation::Mirrored);

        assert_eq!(batch.quad_count(), 2);
        assert_eq!(batch.indices, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.quad_count(), 0);
    }
}

use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Pixel-space camera: origin at the top-left corner of the window, y grows
/// downward, one world unit per physical pixel.
pub struct ScreenCamera {
    pub viewport: (u32, u32),
}

impl ScreenCamera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(
            0.0,
            self.viewport.0.max(1) as f32,
            self.viewport.1.max(1) as f32,
            0.0,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.projection().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(camera: &ScreenCamera, x: f32, y: f32) -> (f32, f32) {
        let clip = camera.projection() * Vec4::new(x, y, 0.0, 1.0);
        (clip.x / clip.w, clip.y / clip.w)
    }

    #[test]
    fn top_left_maps_to_clip_top_left() {
        let camera = ScreenCamera::new(640, 480);
        let (x, y) = project(&camera, 0.0, 0.0);
        assert!((x + 1.0).abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bottom_right_maps_to_clip_bottom_right() {
        let camera = ScreenCamera::new(640, 480);
        let (x, y) = project(&camera, 640.0, 480.0);
        assert!((x - 1.0).abs() < 1e-6);
        assert!((y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_viewport_does_not_produce_nan() {
        let camera = ScreenCamera::new(0, 0);
        let uniform = camera.build_uniform();
        assert!(uniform.view_proj.iter().flatten().all(|v| v.is_finite()));
    }
}

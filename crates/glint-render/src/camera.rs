//! View-projection uniform consumed by the vertex stage.
//!
//! The compositor treats the matrix as opaque: hosts build it however they
//! like (glam, an engine camera, a plain array) and hand it over once per
//! frame through [`SubpixelRenderer::begin_frame`](crate::SubpixelRenderer::begin_frame).

use glam::Mat4;

/// A single 4x4 view-projection matrix, column-major, bound at group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn identity() -> Self {
        Self::from_mat4(Mat4::IDENTITY)
    }

    pub fn from_mat4(matrix: Mat4) -> Self {
        Self {
            view_proj: matrix.to_cols_array_2d(),
        }
    }

    /// Pixel-space projection with the origin at the top-left corner and
    /// y growing downward. Depth passes through unchanged, so `z` in
    /// `0.0..=1.0` maps directly to the depth buffer with 0 in front.
    pub fn screen_space(width: u32, height: u32) -> Self {
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        Self {
            view_proj: [
                [2.0 / width, 0.0, 0.0, 0.0],
                [0.0, -2.0 / height, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0, 1.0],
            ],
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Mat4> for CameraUniform {
    fn from(matrix: Mat4) -> Self {
        Self::from_mat4(matrix)
    }
}

//! Vertex format and the vertex stage.
//!
//! The layout here is the contract between the batching code and the
//! shaders: position (xyz plus a texture flag in w), color, UV, all `f32`.

use glam::{Vec2, Vec4};
use static_assertions::const_assert_eq;

use crate::camera::CameraUniform;
use crate::color::Color;
use crate::strategy::SubpixelChannel;

/// Value stored in `pos[3]` to enable texture sampling.
pub const TEXTURE_FLAG: f32 = 1.0;
/// Value stored in `pos[3]` for flat-colored geometry.
pub const NO_TEXTURE_FLAG: f32 = 0.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// `[x, y, z, flag]`; the flag enables texturing only when `> 0`.
    pub pos: [f32; 4],
    pub color: Color,
    pub uv: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<Vertex>(), 40);

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4, 2 => Float32x2];

impl Vertex {
    /// A flat-colored vertex (texture flag cleared).
    pub fn flat(position: [f32; 3], color: Color) -> Self {
        Self {
            pos: [position[0], position[1], position[2], NO_TEXTURE_FLAG],
            color,
            uv: [0.0, 0.0],
        }
    }

    /// A vertex that samples the bound texture at `uv`.
    pub fn textured(position: [f32; 3], color: Color, uv: [f32; 2]) -> Self {
        Self {
            pos: [position[0], position[1], position[2], TEXTURE_FLAG],
            color,
            uv,
        }
    }

    /// The texture flag as the fragment stage receives it.
    pub fn use_tex(&self) -> f32 {
        self.pos[3]
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRIBUTES,
        }
    }
}

/// The four vertex entry points. They differ only in the emitted depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexVariant {
    /// Keeps the vertex's own depth.
    Flat,
    /// Replaces the depth with the channel's fixed plane.
    DepthBiased(SubpixelChannel),
}

impl VertexVariant {
    pub fn entry_point(self) -> &'static str {
        match self {
            VertexVariant::Flat => "vs_main",
            VertexVariant::DepthBiased(SubpixelChannel::Red) => "subpixel_r_vs_main",
            VertexVariant::DepthBiased(SubpixelChannel::Green) => "subpixel_g_vs_main",
            VertexVariant::DepthBiased(SubpixelChannel::Blue) => "subpixel_b_vs_main",
        }
    }

    pub fn fixed_depth(self) -> Option<f32> {
        match self {
            VertexVariant::Flat => None,
            VertexVariant::DepthBiased(channel) => Some(channel.fixed_depth()),
        }
    }
}

/// What the vertex stage hands to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub color: Color,
    pub uv: Vec2,
    pub use_tex: f32,
}

/// CPU reference of the vertex stage.
pub fn transform_vertex(
    vertex: &Vertex,
    camera: &CameraUniform,
    variant: VertexVariant,
) -> VertexOutput {
    let [x, y, z, flag] = vertex.pos;
    let z = variant.fixed_depth().unwrap_or(z);

    VertexOutput {
        clip_position: camera.matrix() * Vec4::new(x, y, z, 1.0),
        color: vertex.color,
        uv: Vec2::from(vertex.uv),
        use_tex: flag,
    }
}

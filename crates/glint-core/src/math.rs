//! Math types for CPU-side transforms.
//!
//! Re-exports [`glam`], which the vertex stage reference and camera helpers
//! use for matrix/vector work. GPU-facing types keep their own `#[repr(C)]`
//! layouts and convert at the boundary.
//!
//! ```
//! use glint_core::math::{Mat4, Vec4};
//!
//! let clip = Mat4::IDENTITY * Vec4::new(1.0, 2.0, 0.5, 1.0);
//! assert_eq!(clip.z, 0.5);
//! ```

pub use glam::*;

/// Linear interpolation between `a` and `b`, matching WGSL `mix`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

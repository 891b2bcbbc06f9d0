//! WGSL sources.

/// Flat, textured and single-source subpixel entry points.
pub const COMPOSITOR_SHADER: &str = include_str!("../shaders/compositor.wgsl");

/// [`COMPOSITOR_SHADER`] plus `subpixel_dual_fs_main`, behind the
/// `dual_source_blending` extension. Only valid on devices with
/// `wgpu::Features::DUAL_SOURCE_BLENDING`.
pub const DUAL_SOURCE_SHADER: &str = concat!(
    "enable dual_source_blending;\n",
    include_str!("../shaders/compositor.wgsl"),
    include_str!("../shaders/dual_source.wgsl"),
);

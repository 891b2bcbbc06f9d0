//! glint render
//!
//! Gamma-correct subpixel (LCD) text compositing on wgpu.
//!
//! Glyph coverage arrives as one value per physical subpixel. The fragment
//! stage maps each coverage value through a luminance-dependent gamma and
//! contrast curve, and the selected [`SubpixelStrategy`] gets the three
//! resulting alphas into the framebuffer: per-channel write masks over three
//! passes, dual-source blending in one pass, or an averaged single pass.
//!
//! The CPU modules ([`gamma`], [`composite`], [`vertex`]) define the math the
//! WGSL in `shaders/` mirrors, so it can be tested without a GPU.

pub mod blend;
pub mod buffer;
pub mod camera;
pub mod color;
pub mod composite;
pub mod compositor;
pub mod config;
pub mod context;
pub mod depth;
pub mod error;
pub mod features;
pub mod frame;
pub mod gamma;
pub mod pipeline;
pub mod readback;
pub mod renderer;
pub mod shaders;
pub mod strategy;
pub mod vertex;

pub use blend::BlendMode;
pub use camera::CameraUniform;
pub use color::Color;
pub use composite::resolve_over;
pub use compositor::{Command, Compositor, DisplayList, PipelineKind, Rect, TextureLocation};
pub use config::CompositorConfig;
pub use context::{GraphicsContext, GraphicsContextDescriptor};
pub use depth::{DEFAULT_DEPTH_FORMAT, DepthTexture};
pub use error::{GraphicsError, RenderError, RenderResult};
pub use features::GpuFeatures;
pub use frame::{Frame, FrameStats};
pub use gamma::{CoverageMask, GammaParams, SubpixelAlpha, luminance, subpixel_gamma};
pub use pipeline::CompositorPipelines;
pub use readback::read_texture_rgba8;
pub use renderer::{AtlasBindings, SubpixelRenderer};
pub use strategy::{
    BackendCapabilities, DrawKind, Fidelity, FlatBlend, PassDescriptor, PassOrdering,
    StrategyPreference, SubpixelChannel, SubpixelStrategy, select_strategy,
};
pub use vertex::{Vertex, VertexVariant};

pub use wgpu;

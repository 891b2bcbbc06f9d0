//! GPU resources that live across frames.

use glint_core::profiling::profile_function;

use crate::buffer::StreamBuffer;
use crate::camera::CameraUniform;
use crate::config::CompositorConfig;
use crate::depth::DepthTexture;
use crate::error::{RenderError, RenderResult};
use crate::frame::{Frame, FrameStats};
use crate::pipeline::CompositorPipelines;
use crate::strategy::{BackendCapabilities, SubpixelStrategy};
use crate::vertex::Vertex;

/// Initial room for this many quads before the stream buffers grow.
const INITIAL_QUADS: u64 = 1024;

/// Host-owned atlas bind groups, looked up by the index a display list's
/// `BindTexture` commands carry.
///
/// Bind groups must be created against
/// [`SubpixelRenderer::texture_layout`], e.g. with
/// [`SubpixelRenderer::create_atlas_bind_group`].
pub trait AtlasBindings {
    fn bind_group(&self, atlas_index: usize) -> Option<&wgpu::BindGroup>;
}

impl AtlasBindings for [wgpu::BindGroup] {
    fn bind_group(&self, atlas_index: usize) -> Option<&wgpu::BindGroup> {
        self.get(atlas_index)
    }
}

impl AtlasBindings for Vec<wgpu::BindGroup> {
    fn bind_group(&self, atlas_index: usize) -> Option<&wgpu::BindGroup> {
        self.get(atlas_index)
    }
}

impl AtlasBindings for ahash::AHashMap<usize, wgpu::BindGroup> {
    fn bind_group(&self, atlas_index: usize) -> Option<&wgpu::BindGroup> {
        self.get(&atlas_index)
    }
}

/// Draws [`DisplayList`](crate::DisplayList)s with gamma-correct subpixel text.
///
/// # Example
///
/// ```rust,no_run
/// use glint_render::*;
///
/// # fn run(ctx: &GraphicsContext, target: &wgpu::TextureView, atlas: &wgpu::TextureView) -> RenderResult<()> {
/// let mut renderer = SubpixelRenderer::new(&ctx.device, CompositorConfig::default(), ctx.capabilities())?;
/// renderer.resize(&ctx.device, 800, 600)?;
/// let atlases = vec![renderer.create_atlas_bind_group(&ctx.device, atlas)];
///
/// let mut compositor = Compositor::new();
/// compositor.begin();
/// compositor.add_subpixel_rect([10.0, 10.0, 8.0, 12.0], 0.5, Color::BLACK, TextureLocation::full(0));
/// let list = compositor.build_display_list();
///
/// let mut encoder = ctx.device.create_command_encoder(&Default::default());
/// let mut frame = renderer.begin_frame(&ctx.device, &ctx.queue, CameraUniform::screen_space(800, 600));
/// frame.encode(&mut encoder, target, &list, &atlases)?;
/// frame.finish();
/// ctx.queue.submit(Some(encoder.finish()));
/// # Ok(())
/// # }
/// ```
pub struct SubpixelRenderer {
    pub(crate) config: CompositorConfig,
    pub(crate) pipelines: CompositorPipelines,
    camera_buffer: wgpu::Buffer,
    pub(crate) camera_bind_group: wgpu::BindGroup,
    /// Bound at group 1 when a list draws before binding any atlas. Its
    /// single texel is never read: untextured vertices skip the sample.
    pub(crate) fallback_bind_group: wgpu::BindGroup,
    pub(crate) depth: DepthTexture,
    pub(crate) vertices: StreamBuffer,
    pub(crate) indices: StreamBuffer,
    pub(crate) last_stats: FrameStats,
}

impl SubpixelRenderer {
    pub fn new(
        device: &wgpu::Device,
        config: CompositorConfig,
        capabilities: BackendCapabilities,
    ) -> RenderResult<Self> {
        profile_function!();

        let pipelines = CompositorPipelines::new(device, &config, capabilities)?;

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Compositor Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = pipelines.create_camera_bind_group(device, &camera_buffer);

        let fallback_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Compositor Fallback Texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let fallback_bind_group = pipelines.create_texture_bind_group(
            device,
            &fallback_texture.create_view(&wgpu::TextureViewDescriptor::default()),
        );

        let depth = DepthTexture::new(device, 1, 1, config.depth_format);

        let vertices = StreamBuffer::new(
            device,
            "Compositor Vertex Buffer",
            wgpu::BufferUsages::VERTEX,
            INITIAL_QUADS * 4 * std::mem::size_of::<Vertex>() as u64,
        );
        let indices = StreamBuffer::new(
            device,
            "Compositor Index Buffer",
            wgpu::BufferUsages::INDEX,
            INITIAL_QUADS * 6 * std::mem::size_of::<u32>() as u64,
        );

        tracing::debug!(
            "Created subpixel renderer: strategy {:?}, target {:?}",
            pipelines.strategy(),
            config.target_format
        );

        Ok(Self {
            config,
            pipelines,
            camera_buffer,
            camera_bind_group,
            fallback_bind_group,
            depth,
            vertices,
            indices,
            last_stats: FrameStats::default(),
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn strategy(&self) -> SubpixelStrategy {
        self.pipelines.strategy()
    }

    pub fn pipelines(&self) -> &CompositorPipelines {
        &self.pipelines
    }

    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        self.pipelines.texture_layout()
    }

    pub fn create_atlas_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        self.pipelines.create_texture_bind_group(device, view)
    }

    /// The depth attachment draws must render against. Hosts recording their
    /// own pass with [`Frame::draw`] attach `depth().attachment()`.
    pub fn depth(&self) -> &DepthTexture {
        &self.depth
    }

    /// Size the depth attachment to the render target.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyTarget { width, height });
        }
        if self.depth.resize(device, width, height) {
            tracing::debug!("Resized compositor depth texture to {}x{}", width, height);
        }
        Ok(())
    }

    /// Statistics of the last finished frame.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Upload the camera and start recording a frame.
    ///
    /// The camera is fixed for the frame's lifetime; the next frame may use a
    /// different one.
    pub fn begin_frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        camera: CameraUniform,
    ) -> Frame<'a> {
        profile_function!();
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));
        self.vertices.next_frame();
        self.indices.next_frame();
        Frame::new(self, device, queue, camera)
    }
}

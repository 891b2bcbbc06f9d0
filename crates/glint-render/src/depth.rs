//! Depth attachment for the compositor.
//!
//! Flat geometry writes depth; subpixel passes only test against it. Every
//! frame renders against a depth buffer cleared to [`DEPTH_CLEAR_VALUE`].

pub const DEFAULT_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Far plane; everything the compositor draws sits in front of it.
pub const DEPTH_CLEAR_VALUE: f32 = 1.0;

/// Depth buffer matching the render target's size.
pub struct DepthTexture {
    view: wgpu::TextureView,
    extent: wgpu::Extent3d,
    format: wgpu::TextureFormat,
}

impl DepthTexture {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let extent = depth_extent(width, height);
        Self {
            view: create_depth_view(device, extent, format),
            extent,
            format,
        }
    }

    /// Reallocate for a new target size. Returns false when the size is
    /// unchanged and the existing texture was kept.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let extent = depth_extent(width, height);
        if extent == self.extent {
            return false;
        }
        self.view = create_depth_view(device, extent, self.format);
        self.extent = extent;
        true
    }

    pub fn size(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Clears to the far plane and stores the result.
    pub fn attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(DEPTH_CLEAR_VALUE),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

impl std::fmt::Debug for DepthTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthTexture")
            .field("size", &self.size())
            .field("format", &self.format)
            .finish()
    }
}

fn depth_extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    extent: wgpu::Extent3d,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Compositor Depth Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

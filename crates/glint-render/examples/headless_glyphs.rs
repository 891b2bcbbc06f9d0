//! Headless Subpixel Glyphs Example
//!
//! Renders a row of synthetic glyphs with several inks into an offscreen
//! texture and prints the resulting texels, without opening a window.
//!
//! - Creating a `GraphicsContext` without a surface
//! - Uploading a coverage atlas
//! - Batching rects and glyphs with `Compositor`
//! - Drawing with `SubpixelRenderer` and reading the target back
//!
//! ## Usage
//! ```bash
//! RUST_LOG=glint_render=debug cargo run -p glint-render --example headless_glyphs
//! # with puffin_viewer attached on port 8585:
//! GLINT_PROFILE=1 cargo run -p glint-render --example headless_glyphs
//! ```

use glint_core::logging;
use glint_core::profiling::{self, ProfilingBackend};
use glint_render::{
    CameraUniform, Color, Compositor, CompositorConfig, GraphicsContext, SubpixelRenderer,
    TextureLocation, read_texture_rgba8, wgpu,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 16;
const GLYPH: u32 = 8;

/// A vertical stem whose edges fall between subpixels, like an LCD-filtered
/// "l": the left edge only covers blue, the right edge only covers red.
fn stem_coverage() -> Vec<u8> {
    let mut texels = Vec::with_capacity((GLYPH * GLYPH * 4) as usize);
    for _y in 0..GLYPH {
        for x in 0..GLYPH {
            let texel: [u8; 4] = match x {
                3 => [0, 96, 255, 255],
                4 => [255, 255, 255, 255],
                5 => [255, 96, 0, 255],
                _ => [0, 0, 0, 255],
            };
            texels.extend_from_slice(&texel);
        }
    }
    texels
}

fn upload_atlas(ctx: &GraphicsContext) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: GLYPH,
        height: GLYPH,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Glyph Atlas"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &stem_coverage(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(GLYPH * 4),
            rows_per_image: Some(GLYPH),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn main() {
    logging::init();
    if std::env::var_os("GLINT_PROFILE").is_some() {
        profiling::init_profiling(ProfilingBackend::PuffinHttp);
    }

    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let config = CompositorConfig::new()
        .with_target_format(wgpu::TextureFormat::Rgba8Unorm)
        .with_filter(wgpu::FilterMode::Nearest);
    let mut renderer = SubpixelRenderer::new(&ctx.device, config, ctx.capabilities())
        .expect("Failed to create renderer");
    renderer
        .resize(&ctx.device, WIDTH, HEIGHT)
        .expect("Failed to size renderer");
    tracing::info!(
        "Using {:?} subpixel strategy on {}",
        renderer.strategy(),
        ctx.info().name
    );

    let atlases = vec![renderer.create_atlas_bind_group(&ctx.device, &upload_atlas(&ctx))];

    let inks = [
        Color::BLACK,
        Color::from_hex(0x1f3a93),
        Color::from_hex(0xb03030),
        Color::WHITE,
    ];

    let mut compositor = Compositor::new();
    compositor.begin();
    // Dark background behind the white glyph.
    compositor.draw_rect([48.0, 0.0, 16.0, 16.0], 0.9, Color::from_hex(0x202020));
    for (i, ink) in inks.iter().enumerate() {
        let x = i as f32 * 16.0 + 4.0;
        compositor.add_subpixel_rect(
            [x, 4.0, GLYPH as f32, GLYPH as f32],
            0.5,
            *ink,
            TextureLocation::full(0),
        );
    }
    let list = compositor.build_display_list();

    let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    profiling::new_frame();
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Headless Glyphs Encoder"),
        });
    let mut frame = renderer.begin_frame(
        &ctx.device,
        &ctx.queue,
        CameraUniform::screen_space(WIDTH, HEIGHT),
    );
    frame
        .encode(&mut encoder, &view, &list, &atlases)
        .expect("Failed to encode frame");
    let stats = frame.finish();
    ctx.queue.submit(Some(encoder.finish()));
    tracing::info!(
        "{} pass(es), {} draw calls ({} subpixel)",
        stats.passes,
        stats.draw_calls,
        stats.subpixel_draw_calls
    );

    let pixels = read_texture_rgba8(&ctx.device, &ctx.queue, &target).expect("Failed to read back");
    let row = 8;
    for (i, _) in inks.iter().enumerate() {
        let line: Vec<String> = (6..11)
            .map(|x| {
                let offset = ((row * WIDTH + i as u32 * 16 + x) * 4) as usize;
                format!(
                    "{:3},{:3},{:3}",
                    pixels[offset],
                    pixels[offset + 1],
                    pixels[offset + 2]
                )
            })
            .collect();
        println!("ink {}: {}", i, line.join(" | "));
    }
}

//! Pipeline creation and end-to-end rendering on a real device.

use glint_render::{
    AtlasBindings, CameraUniform, Color, Compositor, CompositorConfig, CoverageMask,
    GraphicsContext, PassOrdering, RenderError, StrategyPreference, SubpixelRenderer,
    SubpixelStrategy, TextureLocation, read_texture_rgba8, resolve_over,
};

const SIZE: u32 = 16;
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn target(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test target"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// A 1x1 coverage atlas holding `texel`.
fn atlas(ctx: &GraphicsContext, texel: [u8; 4]) -> wgpu::TextureView {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test atlas"),
        size: wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
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
        &texel,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        },
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// A glyph quad covering the whole target, sampling atlas `atlas_index`.
#[derive(Clone, Copy)]
struct Glyph {
    ink: Color,
    depth: f32,
    atlas_index: usize,
}

impl Glyph {
    fn new(ink: Color) -> Self {
        Self {
            ink,
            depth: 0.5,
            atlas_index: 0,
        }
    }
}

/// Render `glyphs` over the clear color and return the center texel.
///
/// Every atlas holds the single texel `coverage`. The renderer is never
/// resized explicitly; `Frame::encode` sizes the depth attachment itself.
fn render_glyphs(
    ctx: &GraphicsContext,
    config: CompositorConfig,
    coverage: [u8; 4],
    glyphs: &[Glyph],
) -> Result<(SubpixelStrategy, [u8; 4]), RenderError> {
    let mut renderer = SubpixelRenderer::new(
        &ctx.device,
        config.with_target_format(TARGET_FORMAT),
        ctx.capabilities(),
    )?;
    let atlas_count = glyphs.iter().map(|g| g.atlas_index + 1).max().unwrap_or(1);
    let atlases: Vec<_> = (0..atlas_count)
        .map(|_| renderer.create_atlas_bind_group(&ctx.device, &atlas(ctx, coverage)))
        .collect();

    let mut compositor = Compositor::new();
    compositor.begin();
    for glyph in glyphs {
        compositor.add_subpixel_rect(
            [0.0, 0.0, SIZE as f32, SIZE as f32],
            glyph.depth,
            glyph.ink,
            TextureLocation::full(glyph.atlas_index),
        );
    }
    let list = compositor.build_display_list();

    let texture = target(&ctx.device);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = ctx.device.create_command_encoder(&Default::default());
    let mut frame = renderer.begin_frame(
        &ctx.device,
        &ctx.queue,
        CameraUniform::screen_space(SIZE, SIZE),
    );
    frame.encode(&mut encoder, &view, &list, &atlases)?;
    let stats = frame.finish();
    assert_eq!(stats.passes, 1);
    assert_eq!(
        stats.subpixel_draw_calls,
        renderer.strategy().draw_kinds().len() * atlas_count
    );
    assert_eq!(renderer.depth().size(), (SIZE, SIZE));
    ctx.queue.submit(Some(encoder.finish()));

    let pixels = read_texture_rgba8(&ctx.device, &ctx.queue, &texture)?;
    let center = (((SIZE / 2) * SIZE + SIZE / 2) * 4) as usize;
    let texel = [
        pixels[center],
        pixels[center + 1],
        pixels[center + 2],
        pixels[center + 3],
    ];
    Ok((renderer.strategy(), texel))
}

fn render_glyph(
    ctx: &GraphicsContext,
    config: CompositorConfig,
    ink: Color,
    coverage: [u8; 4],
) -> Result<(SubpixelStrategy, [u8; 4]), RenderError> {
    render_glyphs(ctx, config, coverage, &[Glyph::new(ink)])
}

/// The three-pass result of compositing `glyphs` in order over white,
/// quantized like the 8-bit target.
fn expected_three_pass(coverage: [u8; 4], glyphs: &[Glyph]) -> [u8; 3] {
    let mask = CoverageMask::new(
        coverage[0] as f32 / 255.0,
        coverage[1] as f32 / 255.0,
        coverage[2] as f32 / 255.0,
    );
    let mut background = [1.0f32; 3];
    for glyph in glyphs {
        background = resolve_over(SubpixelStrategy::ThreePass, glyph.ink, mask, background);
    }
    background.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn assert_texel_near(actual: [u8; 4], expected: [u8; 3], context: &str) {
    for i in 0..3 {
        assert!(
            actual[i].abs_diff(expected[i]) <= 3,
            "{}: got {:?}, expected {:?}",
            context,
            actual,
            expected
        );
    }
}

#[test]
#[ignore] // Requires GPU
fn test_pipelines_build_for_every_preference() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    for preference in [
        StrategyPreference::Auto,
        StrategyPreference::ThreePass,
        StrategyPreference::SinglePass,
        StrategyPreference::DualSource,
    ] {
        for ordering in [PassOrdering::DepthPlanes, PassOrdering::Submission] {
            let config = CompositorConfig::new()
                .with_strategy(preference)
                .with_pass_ordering(ordering);
            let renderer = SubpixelRenderer::new(&ctx.device, config, ctx.capabilities())
                .expect("Failed to create renderer");
            for kind in renderer.strategy().draw_kinds() {
                assert!(renderer.pipelines().contains(*kind));
            }
        }
    }
}

#[test]
#[ignore] // Requires GPU
fn test_black_ink_full_coverage_renders_black() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    for preference in [
        StrategyPreference::ThreePass,
        StrategyPreference::SinglePass,
        StrategyPreference::Auto,
    ] {
        let config = CompositorConfig::new().with_strategy(preference);
        let (strategy, texel) =
            render_glyph(&ctx, config, Color::BLACK, [255, 255, 255, 255]).expect("render");
        for channel in &texel[..3] {
            assert!(*channel <= 2, "{:?}: {:?}", strategy, texel);
        }
    }
}

#[test]
#[ignore] // Requires GPU
fn test_zero_coverage_leaves_clear_color() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let config = CompositorConfig::new().with_strategy(StrategyPreference::ThreePass);
    let (_, texel) = render_glyph(&ctx, config, Color::BLACK, [0, 0, 0, 255]).expect("render");
    assert_eq!(&texel[..3], &[255, 255, 255]);
}

#[test]
#[ignore] // Requires GPU
fn test_three_pass_keeps_channels_independent() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let config = CompositorConfig::new().with_strategy(StrategyPreference::ThreePass);
    // Only the red subpixel is covered.
    let (_, texel) = render_glyph(&ctx, config, Color::BLACK, [255, 0, 0, 255]).expect("render");
    assert!(texel[0] <= 2, "{:?}", texel);
    assert!(texel[1] >= 253, "{:?}", texel);
    assert!(texel[2] >= 253, "{:?}", texel);
}

#[test]
#[ignore] // Requires GPU
fn test_missing_atlas_fails_before_drawing() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let mut renderer = SubpixelRenderer::new(
        &ctx.device,
        CompositorConfig::new().with_target_format(TARGET_FORMAT),
        ctx.capabilities(),
    )
    .expect("Failed to create renderer");
    renderer.resize(&ctx.device, SIZE, SIZE).expect("resize");

    let mut compositor = Compositor::new();
    compositor.add_subpixel_rect([0.0, 0.0, 4.0, 4.0], 0.5, Color::BLACK, TextureLocation::full(5));
    let list = compositor.build_display_list();

    let atlases: Vec<wgpu::BindGroup> = Vec::new();
    assert!(atlases.bind_group(5).is_none());

    let texture = target(&ctx.device);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = ctx.device.create_command_encoder(&Default::default());
    let mut frame = renderer.begin_frame(&ctx.device, &ctx.queue, CameraUniform::identity());
    let result = frame.encode(&mut encoder, &view, &list, &atlases);
    assert!(matches!(result, Err(RenderError::MissingAtlas { atlas_index: 5 })));
}

#[test]
#[ignore] // Requires GPU
fn test_resize_rejects_empty_target() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let mut renderer =
        SubpixelRenderer::new(&ctx.device, CompositorConfig::default(), ctx.capabilities())
            .expect("Failed to create renderer");
    renderer.resize(&ctx.device, 32, 16).expect("resize");
    assert!(matches!(
        renderer.resize(&ctx.device, 0, 10),
        Err(RenderError::EmptyTarget { width: 0, height: 10 })
    ));
    assert_eq!(renderer.depth().size(), (32, 16));
    assert_eq!(renderer.depth().format(), glint_render::DEFAULT_DEPTH_FORMAT);
}

#[test]
#[ignore] // Requires GPU
fn test_overlapping_glyphs_composite_under_both_orderings() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let coverage = [255, 128, 64, 255];
    let first = Glyph::new(Color::BLACK);
    let second = Glyph {
        depth: 0.45,
        ..Glyph::new(Color::from_hex(0x2040a0))
    };
    // A later batch: a different atlas starts a new subpixel group.
    let later = Glyph {
        atlas_index: 1,
        ..Glyph::new(Color::from_hex(0x803010))
    };

    for glyphs in [vec![first, second], vec![first, second, later]] {
        let expected = expected_three_pass(coverage, &glyphs);
        for ordering in [PassOrdering::DepthPlanes, PassOrdering::Submission] {
            let config = CompositorConfig::new()
                .with_strategy(StrategyPreference::ThreePass)
                .with_pass_ordering(ordering);
            let (strategy, texel) =
                render_glyphs(&ctx, config, coverage, &glyphs).expect("render");
            assert_eq!(strategy, SubpixelStrategy::ThreePass);
            assert_texel_near(
                texel,
                expected,
                &format!("{:?} with {} glyphs", ordering, glyphs.len()),
            );
        }
    }
}

#[test]
#[ignore] // Requires GPU
fn test_submission_ordering_matches_cpu_resolver() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let coverage = [255, 0, 128, 255];
    let glyph = Glyph::new(Color::rgb(0.1, 0.2, 0.3));
    let config = CompositorConfig::new()
        .with_strategy(StrategyPreference::ThreePass)
        .with_pass_ordering(PassOrdering::Submission);
    let (_, texel) = render_glyphs(&ctx, config, coverage, &[glyph]).expect("render");
    assert_texel_near(texel, expected_three_pass(coverage, &[glyph]), "Submission");
}

#[test]
#[ignore] // Requires GPU
fn test_encode_sizes_depth_to_target() {
    let ctx = GraphicsContext::new_owned_sync().expect("Failed to create graphics context");
    let mut renderer = SubpixelRenderer::new(
        &ctx.device,
        CompositorConfig::new().with_target_format(TARGET_FORMAT),
        ctx.capabilities(),
    )
    .expect("Failed to create renderer");
    assert_eq!(renderer.depth().size(), (1, 1));

    let mut compositor = Compositor::new();
    compositor.draw_rect([0.0, 0.0, 4.0, 4.0], 0.5, Color::BLACK);
    let list = compositor.build_display_list();

    let texture = target(&ctx.device);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = ctx.device.create_command_encoder(&Default::default());
    let mut frame = renderer.begin_frame(&ctx.device, &ctx.queue, CameraUniform::identity());
    let atlases: Vec<wgpu::BindGroup> = Vec::new();
    frame
        .encode(&mut encoder, &view, &list, &atlases)
        .expect("encode without resize");
    frame.finish();
    ctx.queue.submit(Some(encoder.finish()));
    assert_eq!(renderer.depth().size(), (SIZE, SIZE));
}

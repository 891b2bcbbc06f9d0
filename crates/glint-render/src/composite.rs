//! CPU reference of the fragment entry points.
//!
//! Each function here matches one `@fragment` entry in
//! `shaders/compositor.wgsl` (or `dual_source.wgsl`). [`resolve_over`]
//! additionally applies the blend state the pipeline for a strategy is built
//! with, giving the value that ends up in the framebuffer.

use crate::color::Color;
use crate::gamma::{CoverageMask, SubpixelAlpha, subpixel_gamma};
use crate::strategy::{SubpixelChannel, SubpixelStrategy};

/// `transparent_fs_main`: flat color, modulated by the texel only when the
/// vertex flag is strictly positive.
pub fn composite_transparent(color: Color, use_tex: f32, sample: Color) -> Color {
    if use_tex > 0.0 { color * sample } else { color }
}

/// `subpixel_{r,g,b}_fs_main`: the ink's channel value with that channel's
/// alpha; the other two color slots are zero and masked off by the pipeline.
pub fn composite_subpixel_channel(
    color: Color,
    mask: CoverageMask,
    channel: SubpixelChannel,
) -> Color {
    let alpha = subpixel_gamma(color, mask);
    let mut out = Color::TRANSPARENT;
    match channel {
        SubpixelChannel::Red => out.r = color.r,
        SubpixelChannel::Green => out.g = color.g,
        SubpixelChannel::Blue => out.b = color.b,
    }
    out.a = alpha.channel(channel);
    out
}

/// `subpixel_fs_main`: color premultiplied by each channel's alpha, with the
/// mean alpha standing in for all three at blend time.
pub fn composite_subpixel_single_pass(color: Color, mask: CoverageMask) -> Color {
    let alpha = subpixel_gamma(color, mask);
    Color::rgba(
        color.r * alpha.r,
        color.g * alpha.g,
        color.b * alpha.b,
        alpha.average(),
    )
}

/// Both blend sources of `subpixel_dual_fs_main`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualSourceOutput {
    /// Source 0: the ink color with alpha 1.
    pub color: Color,
    /// Source 1: per-channel blend factors.
    pub alpha: SubpixelAlpha,
}

pub fn composite_subpixel_dual_source(color: Color, mask: CoverageMask) -> DualSourceOutput {
    DualSourceOutput {
        color: color.with_alpha(1.0),
        alpha: subpixel_gamma(color, mask),
    }
}

/// Framebuffer RGB after compositing one subpixel fragment over `background`
/// with the given strategy's pipelines and blend states.
pub fn resolve_over(
    strategy: SubpixelStrategy,
    color: Color,
    mask: CoverageMask,
    background: [f32; 3],
) -> [f32; 3] {
    match strategy {
        SubpixelStrategy::ThreePass => {
            let mut out = background;
            for channel in SubpixelChannel::ALL {
                let src = composite_subpixel_channel(color, mask, channel);
                let i = channel.index();
                let src_c = src.to_array()[i];
                // Alpha blending, with the write mask keeping only channel i.
                out[i] = src_c * src.a + out[i] * (1.0 - src.a);
            }
            out
        }
        SubpixelStrategy::SinglePass => {
            let src = composite_subpixel_single_pass(color, mask);
            [
                src.r + background[0] * (1.0 - src.a),
                src.g + background[1] * (1.0 - src.a),
                src.b + background[2] * (1.0 - src.a),
            ]
        }
        SubpixelStrategy::DualSource => {
            let DualSourceOutput { color, alpha } = composite_subpixel_dual_source(color, mask);
            [
                color.r * alpha.r + background[0] * (1.0 - alpha.r),
                color.g * alpha.g + background[1] * (1.0 - alpha.g),
                color.b * alpha.b + background[2] * (1.0 - alpha.b),
            ]
        }
    }
}

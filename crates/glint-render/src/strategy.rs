//! Subpixel output strategies and per-draw pipeline selection.
//!
//! A backend either writes three independent alphas in one blend (dual-source
//! blending), splits the glyph into three channel-masked passes, or falls back
//! to averaging the alphas in a single pass. The strategy is picked once when
//! the pipelines are built; every draw afterwards is tagged with a [`DrawKind`]
//! that names exactly one vertex/fragment pair and its fixed-function state.

use crate::blend::BlendMode;
use crate::vertex::VertexVariant;

/// One physical LCD subpixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubpixelChannel {
    Red,
    Green,
    Blue,
}

impl SubpixelChannel {
    /// Channels in the order the three-pass strategy draws them.
    pub const ALL: [SubpixelChannel; 3] = [
        SubpixelChannel::Red,
        SubpixelChannel::Green,
        SubpixelChannel::Blue,
    ];

    pub fn index(self) -> usize {
        match self {
            SubpixelChannel::Red => 0,
            SubpixelChannel::Green => 1,
            SubpixelChannel::Blue => 2,
        }
    }

    /// Depth plane the channel's pass is pinned to. Later passes sit closer
    /// so that a `Less` depth test accepts them over the earlier ones.
    pub fn fixed_depth(self) -> f32 {
        match self {
            SubpixelChannel::Red => 0.3,
            SubpixelChannel::Green => 0.2,
            SubpixelChannel::Blue => 0.1,
        }
    }

    /// The channel plus alpha; the pass must not touch the other two colors.
    pub fn write_mask(self) -> wgpu::ColorWrites {
        let color = match self {
            SubpixelChannel::Red => wgpu::ColorWrites::RED,
            SubpixelChannel::Green => wgpu::ColorWrites::GREEN,
            SubpixelChannel::Blue => wgpu::ColorWrites::BLUE,
        };
        color | wgpu::ColorWrites::ALPHA
    }

    pub fn fragment_entry(self) -> &'static str {
        match self {
            SubpixelChannel::Red => "subpixel_r_fs_main",
            SubpixelChannel::Green => "subpixel_g_fs_main",
            SubpixelChannel::Blue => "subpixel_b_fs_main",
        }
    }
}

/// How exactly a strategy reproduces the per-subpixel alphas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Every subpixel is blended with its own alpha.
    Exact,
    /// The three alphas are averaged into one; colored fringes are lost.
    Approximate,
}

/// How subpixel glyphs reach the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubpixelStrategy {
    /// Three draws per glyph batch, each restricted to one color channel by
    /// the write mask and pinned to its own depth plane.
    ThreePass,
    /// One draw with `rgb * alpha` premultiplied per channel and the mean
    /// alpha in the alpha slot.
    ///
    /// Lower fidelity than the other strategies: a single-source blend
    /// applies one destination factor to all three channels.
    SinglePass,
    /// One draw with the ink color as the first blend source and the alpha
    /// triple as the second. Requires `wgpu::Features::DUAL_SOURCE_BLENDING`.
    DualSource,
}

impl SubpixelStrategy {
    pub fn fidelity(self) -> Fidelity {
        match self {
            SubpixelStrategy::ThreePass | SubpixelStrategy::DualSource => Fidelity::Exact,
            SubpixelStrategy::SinglePass => Fidelity::Approximate,
        }
    }

    /// Draw kinds issued for one subpixel batch, in submission order.
    pub fn draw_kinds(self) -> &'static [DrawKind] {
        const THREE_PASS: [DrawKind; 3] = [
            DrawKind::Subpixel3Pass(SubpixelChannel::Red),
            DrawKind::Subpixel3Pass(SubpixelChannel::Green),
            DrawKind::Subpixel3Pass(SubpixelChannel::Blue),
        ];
        match self {
            SubpixelStrategy::ThreePass => &THREE_PASS,
            SubpixelStrategy::SinglePass => &[DrawKind::Subpixel1Pass],
            SubpixelStrategy::DualSource => &[DrawKind::SubpixelDualSource],
        }
    }

    /// Ordered pass descriptors for one subpixel batch.
    pub fn passes(self, ordering: PassOrdering) -> Vec<PassDescriptor> {
        self.draw_kinds()
            .iter()
            .enumerate()
            .map(|(index, &kind)| PassDescriptor {
                index,
                kind,
                write_mask: kind.write_mask(),
                depth_plane: match (kind, ordering) {
                    (DrawKind::Subpixel3Pass(channel), PassOrdering::DepthPlanes) => {
                        Some(channel.fixed_depth())
                    }
                    _ => None,
                },
            })
            .collect()
    }

    /// Device features the strategy's pipelines cannot be built without.
    pub fn required_features(self) -> wgpu::Features {
        match self {
            SubpixelStrategy::DualSource => wgpu::Features::DUAL_SOURCE_BLENDING,
            _ => wgpu::Features::empty(),
        }
    }
}

/// What the host asks for; resolved against [`BackendCapabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyPreference {
    /// Best available: dual-source, then three-pass, then single-pass.
    #[default]
    Auto,
    ThreePass,
    SinglePass,
    DualSource,
}

/// What the backend can do for subpixel output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Two blend sources per fragment (`Src1` blend factors).
    pub dual_source_blending: bool,
    /// Color writes can be restricted to single channels and the result
    /// accumulates correctly across passes.
    pub channel_write_masks: bool,
}

impl BackendCapabilities {
    /// Capabilities implied by a device's enabled features.
    ///
    /// Write masks are core in wgpu, so they are assumed; hosts on drivers
    /// where masking misbehaves can clear the flag with
    /// [`without_channel_write_masks`](Self::without_channel_write_masks).
    pub fn from_features(features: wgpu::Features) -> Self {
        Self {
            dual_source_blending: features.contains(wgpu::Features::DUAL_SOURCE_BLENDING),
            channel_write_masks: true,
        }
    }

    /// A backend with a single plain RGBA output.
    pub fn minimal() -> Self {
        Self {
            dual_source_blending: false,
            channel_write_masks: false,
        }
    }

    pub fn without_channel_write_masks(mut self) -> Self {
        self.channel_write_masks = false;
        self
    }

    fn best(self) -> SubpixelStrategy {
        if self.dual_source_blending {
            SubpixelStrategy::DualSource
        } else if self.channel_write_masks {
            SubpixelStrategy::ThreePass
        } else {
            SubpixelStrategy::SinglePass
        }
    }

    fn supports(self, strategy: SubpixelStrategy) -> bool {
        match strategy {
            SubpixelStrategy::DualSource => self.dual_source_blending,
            SubpixelStrategy::ThreePass => self.channel_write_masks,
            SubpixelStrategy::SinglePass => true,
        }
    }
}

/// Resolve a preference against what the backend supports.
///
/// An explicit preference the backend cannot honour falls back to the best
/// available strategy and logs a warning.
pub fn select_strategy(
    capabilities: BackendCapabilities,
    preference: StrategyPreference,
) -> SubpixelStrategy {
    let requested = match preference {
        StrategyPreference::Auto => return capabilities.best(),
        StrategyPreference::ThreePass => SubpixelStrategy::ThreePass,
        StrategyPreference::SinglePass => SubpixelStrategy::SinglePass,
        StrategyPreference::DualSource => SubpixelStrategy::DualSource,
    };

    if capabilities.supports(requested) {
        requested
    } else {
        let fallback = capabilities.best();
        tracing::warn!(
            "Subpixel strategy {:?} unsupported by backend ({:?}), using {:?}",
            requested,
            capabilities,
            fallback
        );
        fallback
    }
}

/// How the three channel passes are kept in a deterministic order.
///
/// Neither ordering writes depth from a subpixel pass, so overlapping glyph
/// quads and later batches are never rejected by earlier glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassOrdering {
    /// Each channel pass is pinned to its own depth plane (0.3, 0.2, 0.1)
    /// and tested `LessEqual` against flat geometry only.
    ///
    /// The planes replace the glyph's depth, so flat geometry between 0.1 and
    /// 0.3 hides some channels of a glyph and not others.
    DepthPlanes,
    /// Passes keep the glyph's own depth, test with `LessEqual` and never
    /// write depth; order comes solely from the pass index.
    #[default]
    Submission,
}

/// One pass of a subpixel batch, consumed by the frame renderer in index order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassDescriptor {
    pub index: usize,
    pub kind: DrawKind,
    pub write_mask: wgpu::ColorWrites,
    /// Clip-space depth the pass is pinned to, when ordering by depth planes.
    pub depth_plane: Option<f32>,
}

/// Blend behaviour of flat (non-subpixel) geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlatBlend {
    /// Source replaces destination.
    Opaque,
    /// Straight-alpha src-over.
    Transparent,
}

/// The closed set of vertex/fragment pairs a draw can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Flat(FlatBlend),
    Subpixel3Pass(SubpixelChannel),
    Subpixel1Pass,
    SubpixelDualSource,
}

impl DrawKind {
    /// Every kind, for building a complete pipeline table.
    pub const ALL: [DrawKind; 7] = [
        DrawKind::Flat(FlatBlend::Opaque),
        DrawKind::Flat(FlatBlend::Transparent),
        DrawKind::Subpixel3Pass(SubpixelChannel::Red),
        DrawKind::Subpixel3Pass(SubpixelChannel::Green),
        DrawKind::Subpixel3Pass(SubpixelChannel::Blue),
        DrawKind::Subpixel1Pass,
        DrawKind::SubpixelDualSource,
    ];

    pub fn is_subpixel(self) -> bool {
        !matches!(self, DrawKind::Flat(_))
    }

    pub fn vertex_variant(self, ordering: PassOrdering) -> VertexVariant {
        match (self, ordering) {
            (DrawKind::Subpixel3Pass(channel), PassOrdering::DepthPlanes) => {
                VertexVariant::DepthBiased(channel)
            }
            _ => VertexVariant::Flat,
        }
    }

    pub fn fragment_entry(self) -> &'static str {
        match self {
            DrawKind::Flat(_) => "transparent_fs_main",
            DrawKind::Subpixel3Pass(channel) => channel.fragment_entry(),
            DrawKind::Subpixel1Pass => "subpixel_fs_main",
            DrawKind::SubpixelDualSource => "subpixel_dual_fs_main",
        }
    }

    pub fn write_mask(self) -> wgpu::ColorWrites {
        match self {
            DrawKind::Subpixel3Pass(channel) => channel.write_mask(),
            _ => wgpu::ColorWrites::ALL,
        }
    }

    pub fn blend_mode(self) -> BlendMode {
        match self {
            DrawKind::Flat(FlatBlend::Opaque) => BlendMode::Replace,
            DrawKind::Flat(FlatBlend::Transparent) | DrawKind::Subpixel3Pass(_) => {
                BlendMode::Alpha
            }
            DrawKind::Subpixel1Pass => BlendMode::PremultipliedAlpha,
            DrawKind::SubpixelDualSource => BlendMode::DualSourceSubpixel,
        }
    }

    /// Depth state for this kind.
    ///
    /// Flat geometry writes depth and tests `Less`. Every subpixel kind tests
    /// `LessEqual` without writing, so glyph quads in one batch, and later
    /// batches, only ever depth-test against flat geometry.
    pub fn depth_stencil(self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        let writes = !self.is_subpixel();
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: writes,
            depth_compare: if writes {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::LessEqual
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrawKind::Flat(FlatBlend::Opaque) => "Opaque Render Pipeline",
            DrawKind::Flat(FlatBlend::Transparent) => "Transparent Render Pipeline",
            DrawKind::Subpixel3Pass(SubpixelChannel::Red) => "Subpixel R Render Pipeline",
            DrawKind::Subpixel3Pass(SubpixelChannel::Green) => "Subpixel G Render Pipeline",
            DrawKind::Subpixel3Pass(SubpixelChannel::Blue) => "Subpixel B Render Pipeline",
            DrawKind::Subpixel1Pass => "Subpixel Single Pass Render Pipeline",
            DrawKind::SubpixelDualSource => "Subpixel Dual Source Render Pipeline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_dual_source() {
        let caps = BackendCapabilities::from_features(wgpu::Features::DUAL_SOURCE_BLENDING);
        assert_eq!(
            select_strategy(caps, StrategyPreference::Auto),
            SubpixelStrategy::DualSource
        );
    }

    #[test]
    fn test_auto_without_dual_source_uses_three_pass() {
        let caps = BackendCapabilities::from_features(wgpu::Features::empty());
        assert_eq!(
            select_strategy(caps, StrategyPreference::Auto),
            SubpixelStrategy::ThreePass
        );
    }

    #[test]
    fn test_minimal_backend_uses_single_pass() {
        let caps = BackendCapabilities::minimal();
        assert_eq!(
            select_strategy(caps, StrategyPreference::Auto),
            SubpixelStrategy::SinglePass
        );
        assert_eq!(
            select_strategy(caps, StrategyPreference::ThreePass),
            SubpixelStrategy::SinglePass
        );
    }

    #[test]
    fn test_unsupported_preference_falls_back() {
        let caps = BackendCapabilities::from_features(wgpu::Features::empty());
        assert_eq!(
            select_strategy(caps, StrategyPreference::DualSource),
            SubpixelStrategy::ThreePass
        );
    }

    #[test]
    fn test_explicit_single_pass_is_always_honoured() {
        let caps = BackendCapabilities::from_features(wgpu::Features::DUAL_SOURCE_BLENDING);
        assert_eq!(
            select_strategy(caps, StrategyPreference::SinglePass),
            SubpixelStrategy::SinglePass
        );
    }

    #[test]
    fn test_three_pass_descriptors_with_depth_planes() {
        let passes = SubpixelStrategy::ThreePass.passes(PassOrdering::DepthPlanes);
        assert_eq!(passes.len(), 3);
        let planes: Vec<_> = passes.iter().map(|p| p.depth_plane).collect();
        assert_eq!(planes, vec![Some(0.3), Some(0.2), Some(0.1)]);
        for (i, pass) in passes.iter().enumerate() {
            assert_eq!(pass.index, i);
            assert_eq!(pass.write_mask, SubpixelChannel::ALL[i].write_mask());
        }
    }

    #[test]
    fn test_three_pass_descriptors_by_submission() {
        let passes = SubpixelStrategy::ThreePass.passes(PassOrdering::Submission);
        assert!(passes.iter().all(|p| p.depth_plane.is_none()));
        assert_eq!(
            passes[0].kind.vertex_variant(PassOrdering::Submission),
            VertexVariant::Flat
        );
    }

    #[test]
    fn test_write_masks_isolate_channels() {
        let red = SubpixelChannel::Red.write_mask();
        assert!(red.contains(wgpu::ColorWrites::RED | wgpu::ColorWrites::ALPHA));
        assert!(!red.intersects(wgpu::ColorWrites::GREEN | wgpu::ColorWrites::BLUE));
        assert_eq!(DrawKind::Subpixel1Pass.write_mask(), wgpu::ColorWrites::ALL);
    }

    #[test]
    fn test_depth_planes_are_strictly_ordered() {
        let depths: Vec<f32> = SubpixelChannel::ALL.iter().map(|c| c.fixed_depth()).collect();
        assert!(depths.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_fidelity() {
        assert_eq!(SubpixelStrategy::ThreePass.fidelity(), Fidelity::Exact);
        assert_eq!(SubpixelStrategy::DualSource.fidelity(), Fidelity::Exact);
        assert_eq!(SubpixelStrategy::SinglePass.fidelity(), Fidelity::Approximate);
    }

    #[test]
    fn test_depth_state_by_kind() {
        let format = wgpu::TextureFormat::Depth32Float;
        let flat = DrawKind::Flat(FlatBlend::Opaque).depth_stencil(format);
        assert!(flat.depth_write_enabled);
        assert_eq!(flat.depth_compare, wgpu::CompareFunction::Less);

        for kind in DrawKind::ALL.into_iter().filter(|k| k.is_subpixel()) {
            let state = kind.depth_stencil(format);
            assert!(!state.depth_write_enabled, "{:?}", kind);
            assert_eq!(state.depth_compare, wgpu::CompareFunction::LessEqual);
        }
    }

    #[test]
    fn test_default_ordering_is_submission() {
        assert_eq!(PassOrdering::default(), PassOrdering::Submission);
    }

    /// Replays one pixel through the depth test: each glyph runs every pass
    /// of the three-pass strategy, in submission order. Returns how many
    /// channel passes of each glyph survived.
    fn surviving_passes(ordering: PassOrdering, glyph_depths: &[f32], flat_depth: f32) -> Vec<usize> {
        let format = wgpu::TextureFormat::Depth32Float;
        let mut depth_buffer = flat_depth;
        glyph_depths
            .iter()
            .map(|&glyph_z| {
                let mut survived = 0;
                for pass in SubpixelStrategy::ThreePass.passes(ordering) {
                    let state = pass.kind.depth_stencil(format);
                    let z = pass
                        .kind
                        .vertex_variant(ordering)
                        .fixed_depth()
                        .unwrap_or(glyph_z);
                    assert_eq!(pass.depth_plane, pass.kind.vertex_variant(ordering).fixed_depth());
                    let passed = match state.depth_compare {
                        wgpu::CompareFunction::Less => z < depth_buffer,
                        wgpu::CompareFunction::LessEqual => z <= depth_buffer,
                        other => panic!("unexpected compare {:?}", other),
                    };
                    if passed {
                        survived += 1;
                        if state.depth_write_enabled {
                            depth_buffer = z;
                        }
                    }
                }
                survived
            })
            .collect()
    }

    #[test]
    fn test_overlapping_glyphs_keep_every_channel() {
        for ordering in [PassOrdering::DepthPlanes, PassOrdering::Submission] {
            // Two quads of one batch, then a third from a later batch.
            let survived = surviving_passes(ordering, &[0.5, 0.5, 0.5], 1.0);
            assert_eq!(survived, vec![3, 3, 3], "{:?}", ordering);
        }
    }

    #[test]
    fn test_glyph_behind_flat_geometry_is_hidden_by_submission_ordering() {
        let survived = surviving_passes(PassOrdering::Submission, &[0.5], 0.4);
        assert_eq!(survived, vec![0]);
        let survived = surviving_passes(PassOrdering::Submission, &[0.3], 0.4);
        assert_eq!(survived, vec![3]);
    }
}

//! Blend state presets used by the compositor pipelines.

/// Predefined blend modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// No blending - source completely replaces destination.
    Replace,

    /// Straight alpha blending.
    ///
    /// Formula: `src.rgb * src.a + dst.rgb * (1 - src.a)`
    ///
    /// Used by transparent UI geometry and each channel pass of the
    /// three-pass subpixel strategy (the write mask limits it to one channel).
    #[default]
    Alpha,

    /// Premultiplied alpha blending.
    ///
    /// Formula: `src.rgb + dst.rgb * (1 - src.a)`
    ///
    /// Used by the single-pass subpixel strategy, whose color output is
    /// already multiplied by the per-channel alphas.
    PremultipliedAlpha,

    /// Per-channel alpha from the second blend source.
    ///
    /// Formula: `src0.rgb * src1.rgb + dst.rgb * (1 - src1.rgb)`
    ///
    /// Requires `wgpu::Features::DUAL_SOURCE_BLENDING`.
    DualSourceSubpixel,
}

impl BlendMode {
    /// Convert to wgpu BlendState.
    pub fn to_blend_state(self) -> Option<wgpu::BlendState> {
        match self {
            BlendMode::Replace => Some(wgpu::BlendState::REPLACE),
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            BlendMode::PremultipliedAlpha => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            BlendMode::DualSourceSubpixel => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Src1,
                    dst_factor: wgpu::BlendFactor::OneMinusSrc1,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
        }
    }

    /// Whether the blend state references the second blend source.
    pub fn uses_dual_source(self) -> bool {
        let Some(state) = self.to_blend_state() else {
            return false;
        };
        [state.color, state.alpha].iter().any(|component| {
            [component.src_factor, component.dst_factor]
                .iter()
                .any(|factor| {
                    matches!(
                        factor,
                        wgpu::BlendFactor::Src1
                            | wgpu::BlendFactor::OneMinusSrc1
                            | wgpu::BlendFactor::Src1Alpha
                            | wgpu::BlendFactor::OneMinusSrc1Alpha
                    )
                })
        })
    }

    /// Create a color target state with this blend mode.
    pub fn to_color_target_state(
        self,
        format: wgpu::TextureFormat,
        write_mask: wgpu::ColorWrites,
    ) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.to_blend_state(),
            write_mask,
        }
    }
}

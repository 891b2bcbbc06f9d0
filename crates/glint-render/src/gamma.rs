//! Gamma-correct subpixel alpha resolution.
//!
//! Turns one coverage sample from a glyph atlas into three independently
//! gamma-corrected alphas, one per LCD subpixel. The exponent and contrast
//! boost are picked from the ink's luminance so that dark-on-light and
//! light-on-dark text both keep their perceived weight.
//!
//! This module is the CPU definition of the math in
//! `shaders/compositor.wgsl`; the two are kept in lockstep (the WGSL
//! constants are checked against these in the integration tests).
//!
//! ```
//! use glint_render::{Color, CoverageMask, gamma::subpixel_gamma};
//!
//! let alpha = subpixel_gamma(Color::BLACK, CoverageMask::uniform(1.0));
//! assert!(alpha.r > 0.99);
//! ```

use glint_core::math::lerp;

use crate::color::Color;
use crate::strategy::SubpixelChannel;

/// Luma weights for (r, g, b). They sum to 1.045, so a white ink has a
/// luminance slightly above one. Only used to pick gamma and contrast.
pub const LUMA_WEIGHTS: [f32; 3] = [0.25, 0.72, 0.075];

/// Exponent for a light ink (`inverse_luma == 0`), i.e. 1 / 1.2.
pub const GAMMA_LIGHT_INK: f32 = 1.0 / 1.2;
/// Exponent for a dark ink (`inverse_luma == 1`), i.e. 1 / 2.4.
pub const GAMMA_DARK_INK: f32 = 1.0 / 2.4;
/// Contrast boost for a light ink.
pub const CONTRAST_LIGHT_INK: f32 = 0.1;
/// Contrast boost for a dark ink.
pub const CONTRAST_DARK_INK: f32 = 0.8;

/// Half-width of the band around `luma == 0.5` where the correction is
/// undefined (`luma - inverse_luma` vanishes). Inside the band the raw
/// coverage is used in place of the corrected value.
pub const LUMA_SINGULARITY_EPSILON: f32 = 1e-3;

/// A coverage sample from the glyph atlas.
///
/// `r`, `g`, `b` are the fractions of each physical subpixel covered by the
/// glyph. `a` is carried along with the texel and ignored by the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageMask {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl CoverageMask {
    pub const EMPTY: CoverageMask = CoverageMask::new(0.0, 0.0, 0.0);
    pub const FULL: CoverageMask = CoverageMask::new(1.0, 1.0, 1.0);

    /// Per-subpixel coverage with the texel alpha set to 1.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same coverage on all three subpixels (a grayscale mask).
    pub const fn uniform(coverage: f32) -> Self {
        Self::new(coverage, coverage, coverage)
    }

    pub fn channel(&self, channel: SubpixelChannel) -> f32 {
        match channel {
            SubpixelChannel::Red => self.r,
            SubpixelChannel::Green => self.g,
            SubpixelChannel::Blue => self.b,
        }
    }
}

impl From<[f32; 4]> for CoverageMask {
    fn from(arr: [f32; 4]) -> Self {
        Self {
            r: arr[0],
            g: arr[1],
            b: arr[2],
            a: arr[3],
        }
    }
}

/// Three gamma-corrected alphas, one per display subpixel, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubpixelAlpha {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl SubpixelAlpha {
    pub fn channel(&self, channel: SubpixelChannel) -> f32 {
        match channel {
            SubpixelChannel::Red => self.r,
            SubpixelChannel::Green => self.g,
            SubpixelChannel::Blue => self.b,
        }
    }

    /// Mean of the three alphas, the single-pass approximation.
    pub fn average(&self) -> f32 {
        (self.r + self.g + self.b) / 3.0
    }

    /// `[r, g, b, 1.0]`, the layout the fragment stage produces. The fourth
    /// slot is a sentinel and carries no meaning.
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}

/// Luminance of an ink color, used only for parameter selection.
#[inline]
pub fn luminance(color: Color) -> f32 {
    LUMA_WEIGHTS[0] * color.r + LUMA_WEIGHTS[1] * color.g + LUMA_WEIGHTS[2] * color.b
}

/// Gamma exponent and contrast boost chosen for one ink color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    pub luma: f32,
    pub inverse_luma: f32,
    pub gamma: f32,
    pub contrast: f32,
}

impl GammaParams {
    pub fn from_luminance(luma: f32) -> Self {
        let inverse_luma = 1.0 - luma;
        Self {
            luma,
            inverse_luma,
            gamma: lerp(GAMMA_LIGHT_INK, GAMMA_DARK_INK, inverse_luma),
            contrast: lerp(CONTRAST_LIGHT_INK, CONTRAST_DARK_INK, inverse_luma),
        }
    }

    pub fn for_color(color: Color) -> Self {
        Self::from_luminance(luminance(color))
    }

    /// True when `luma` sits inside the singular band around 0.5.
    pub fn is_singular(&self) -> bool {
        (self.luma - self.inverse_luma).abs() < LUMA_SINGULARITY_EPSILON
    }
}

/// Gamma-correct a single coverage value.
///
/// `alpha_in` is the subpixel coverage already multiplied by the ink alpha.
/// The result is always finite and within `[0, 1]`:
///
/// - zero (or negative) coverage resolves to 0 for every ink;
/// - the base of the power is floored at 0, since inks brighter than the
///   luma weights' unit range make `inverse_luma` negative;
/// - inside the singular band ([`LUMA_SINGULARITY_EPSILON`]) the uncorrected
///   coverage stands in for the corrected value before the contrast boost.
pub fn gamma_correct(params: &GammaParams, alpha_in: f32) -> f32 {
    if alpha_in.is_nan() || alpha_in <= 0.0 {
        return 0.0;
    }

    let inverse_alpha = 1.0 - alpha_in;
    let base = params.luma * alpha_in + params.inverse_luma * inverse_alpha;
    let g = base.max(0.0).powf(params.gamma);

    let a = if params.is_singular() {
        alpha_in
    } else {
        (g - params.inverse_luma) / (params.luma - params.inverse_luma)
    };
    let boosted = a + (1.0 - a) * params.contrast * a;

    boosted.clamp(0.0, 1.0)
}

/// Resolve all three subpixel alphas for an ink color and coverage sample.
pub fn subpixel_gamma(color: Color, mask: CoverageMask) -> SubpixelAlpha {
    let params = GammaParams::for_color(color);
    subpixel_gamma_with(&params, color.a, mask)
}

/// Same as [`subpixel_gamma`] with parameters computed once per ink, for
/// callers resolving many samples of the same color.
pub fn subpixel_gamma_with(params: &GammaParams, ink_alpha: f32, mask: CoverageMask) -> SubpixelAlpha {
    SubpixelAlpha {
        r: gamma_correct(params, mask.r * ink_alpha),
        g: gamma_correct(params, mask.g * ink_alpha),
        b: gamma_correct(params, mask.b * ink_alpha),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_luminance_of_primaries() {
        assert_eq!(luminance(Color::BLACK), 0.0);
        assert!((luminance(Color::rgb(1.0, 0.0, 0.0)) - 0.25).abs() < EPS);
        assert!((luminance(Color::rgb(0.0, 1.0, 0.0)) - 0.72).abs() < EPS);
        assert!((luminance(Color::rgb(0.0, 0.0, 1.0)) - 0.075).abs() < EPS);
        assert!((luminance(Color::WHITE) - 1.045).abs() < EPS);
    }

    #[test]
    fn test_luminance_ignores_alpha() {
        let c = Color::rgb(0.3, 0.6, 0.9);
        assert_eq!(luminance(c), luminance(c.with_alpha(0.1)));
    }

    #[test]
    fn test_params_at_endpoints() {
        let dark = GammaParams::from_luminance(0.0);
        assert!((dark.gamma - GAMMA_DARK_INK).abs() < EPS);
        assert!((dark.contrast - CONTRAST_DARK_INK).abs() < EPS);

        let light = GammaParams::from_luminance(1.0);
        assert!((light.gamma - GAMMA_LIGHT_INK).abs() < EPS);
        assert!((light.contrast - CONTRAST_LIGHT_INK).abs() < EPS);
    }

    #[test]
    fn test_params_monotonic_in_inverse_luma() {
        let mut prev = GammaParams::from_luminance(1.0);
        for step in 1..=100 {
            let inverse_luma = step as f32 / 100.0;
            let params = GammaParams::from_luminance(1.0 - inverse_luma);
            assert!(params.gamma < prev.gamma, "gamma must fall toward 1/2.4");
            assert!(params.contrast > prev.contrast, "contrast must rise toward 0.8");
            prev = params;
        }
    }

    #[test]
    fn test_zero_coverage_is_transparent_for_any_ink() {
        for step in 0..=20 {
            let v = step as f32 / 20.0;
            for ink in [Color::rgb(v, v, v), Color::rgb(v, 0.0, 1.0 - v)] {
                let params = GammaParams::for_color(ink);
                assert_eq!(gamma_correct(&params, 0.0), 0.0, "ink {:?}", ink);
            }
        }
    }

    #[test]
    fn test_singular_luminance_is_finite() {
        let params = GammaParams::from_luminance(0.5);
        assert!(params.is_singular());
        for step in 0..=10 {
            let alpha = step as f32 / 10.0;
            let a = gamma_correct(&params, alpha);
            assert!(a.is_finite());
            assert!((0.0..=1.0).contains(&a));
        }
        // Inside the band the boost is applied to the raw coverage.
        let half = gamma_correct(&params, 0.5);
        let expected = 0.5 + 0.5 * params.contrast * 0.5;
        assert!((half - expected).abs() < EPS);
    }

    #[test]
    fn test_just_outside_singular_band_uses_formula() {
        let params = GammaParams::from_luminance(0.5 + LUMA_SINGULARITY_EPSILON);
        assert!(!params.is_singular());
        assert!(gamma_correct(&params, 0.5).is_finite());
    }

    #[test]
    fn test_bright_ink_does_not_produce_nan() {
        // inverse_luma is negative for white ink; small coverage would take
        // a negative number to a fractional power without the floor.
        let params = GammaParams::for_color(Color::WHITE);
        assert!(params.inverse_luma < 0.0);
        for step in 1..=10 {
            let a = gamma_correct(&params, step as f32 / 1000.0);
            assert!(a.is_finite() && (0.0..=1.0).contains(&a));
        }
    }

    #[test]
    fn test_nan_coverage_resolves_to_zero() {
        let params = GammaParams::for_color(Color::BLACK);
        assert_eq!(gamma_correct(&params, f32::NAN), 0.0);
    }

    #[test]
    fn test_ink_alpha_scales_coverage() {
        let opaque = subpixel_gamma(Color::BLACK, CoverageMask::uniform(0.5));
        let faded = subpixel_gamma(Color::BLACK.with_alpha(0.5), CoverageMask::uniform(1.0));
        assert!((opaque.r - faded.r).abs() < EPS);
    }

    #[test]
    fn test_channels_are_independent() {
        let alpha = subpixel_gamma(Color::BLACK, CoverageMask::new(1.0, 0.5, 0.0));
        assert!(alpha.r > alpha.g);
        assert!(alpha.g > alpha.b);
        assert_eq!(alpha.b, 0.0);
    }

    #[test]
    fn test_average_and_array() {
        let alpha = SubpixelAlpha {
            r: 0.3,
            g: 0.6,
            b: 0.9,
        };
        assert!((alpha.average() - 0.6).abs() < EPS);
        assert_eq!(alpha.to_array(), [0.3, 0.6, 0.9, 1.0]);
        assert_eq!(alpha.channel(SubpixelChannel::Green), 0.6);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Maps a height sample to a vertex colour.
//!
//! Every kind uses the same three bands: points that never escaped get
//! an interior colour, points that escaped almost at once get a
//! "fast escape" colour, and everything between is quantised through
//! (h² + h) mod 256 into a kind-specific ramp.

use params::FractalKind;

/// An RGB triple, each channel in [0, 1].
pub type Rgb = [f32; 3];

/// The colour bands for one fractal kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Palette {
    /// Colour of points that never escaped.
    pub interior: Rgb,
    /// Heights within this many iterations of the cap also count as
    /// interior.  Zero means only the cap itself.
    pub interior_band: u32,
    /// Colour of points that escaped quickly.
    pub fast_escape: Rgb,
    /// Heights below this are fast escapes.
    pub fast_escape_below: u32,
    /// Added to the quantised value for each channel; `None` leaves the
    /// channel dark.
    ramp: [Option<f32>; 3],
}

const MANDELBROT: Palette = Palette {
    interior: [0.2, 0.4, 0.8],
    interior_band: 0,
    fast_escape: [0.0, 0.0, 0.0],
    fast_escape_below: 12,
    ramp: [Some(0.3), Some(0.3), None],
};

const GREEN_ON_RED: Palette = Palette {
    interior: [0.0, 0.0, 0.0],
    interior_band: 12,
    fast_escape: [1.0, 0.0, 0.0],
    fast_escape_below: 30,
    ramp: [None, Some(-0.3), None],
};

impl Palette {
    /// The palette a fractal kind is drawn with.
    pub fn for_kind(kind: FractalKind) -> Palette {
        match kind {
            FractalKind::Mandelbrot => MANDELBROT,
            FractalKind::Julia | FractalKind::Tree => GREEN_ON_RED,
        }
    }

    /// Colour of one height.  The interior check comes first, so the
    /// cap always gets the interior colour even when the cap is below
    /// the fast-escape threshold.
    pub fn color(&self, height: u32, max_iterations: u32) -> Rgb {
        let interior_from = max_iterations.saturating_sub(self.interior_band);
        if height >= max_iterations || (self.interior_band > 0 && height > interior_from) {
            return self.interior;
        }
        if height < self.fast_escape_below {
            return self.fast_escape;
        }
        let h = u64::from(height);
        let c = ((h * h + h) % 256) as f32 / 255.0;
        let mut rgb = [0.0; 3];
        for (channel, offset) in rgb.iter_mut().zip(self.ramp.iter()) {
            if let Some(offset) = *offset {
                *channel = clamp_unit(c + offset);
            }
        }
        rgb
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v < 0.0 {
        0.0
    } else if v > 1.0 {
        1.0
    } else {
        v
    }
}

/// Colour of a height for a fractal kind.  Stateless: the same
/// arguments always give the same colour.
pub fn color_for(height: u32, max_iterations: u32, kind: FractalKind) -> Rgb {
    Palette::for_kind(kind).color(height, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_is_always_interior() {
        for kind in FractalKind::ALL.iter() {
            let palette = Palette::for_kind(*kind);
            for &max in &[1, 5, 29, 250, 255, 1000] {
                assert_eq!(color_for(max, max, *kind), palette.interior);
            }
        }
    }

    #[test]
    fn mandelbrot_bands() {
        assert_eq!(color_for(250, 250, FractalKind::Mandelbrot), [0.2, 0.4, 0.8]);
        assert_eq!(color_for(11, 250, FractalKind::Mandelbrot), [0.0, 0.0, 0.0]);
        // 12² + 12 = 156
        let c = 156.0 / 255.0 + 0.3;
        assert_eq!(color_for(12, 250, FractalKind::Mandelbrot), [c, c, 0.0]);
        // 249 is not interior for the Mandelbrot palette
        assert_ne!(color_for(249, 250, FractalKind::Mandelbrot), [0.2, 0.4, 0.8]);
    }

    #[test]
    fn julia_bands() {
        assert_eq!(color_for(0, 255, FractalKind::Julia), [1.0, 0.0, 0.0]);
        assert_eq!(color_for(29, 255, FractalKind::Julia), [1.0, 0.0, 0.0]);
        assert_eq!(color_for(244, 255, FractalKind::Julia), [0.0, 0.0, 0.0]);
        // 30² + 30 = 930, mod 256 = 162
        let g = 162.0 / 255.0 - 0.3;
        assert_eq!(color_for(30, 255, FractalKind::Julia), [0.0, g, 0.0]);
        assert_eq!(color_for(243, 255, FractalKind::Tree), color_for(243, 255, FractalKind::Julia));
    }

    #[test]
    fn channels_stay_in_unit_range() {
        for kind in FractalKind::ALL.iter() {
            for h in 0..=300 {
                for channel in color_for(h, 255, *kind).iter() {
                    assert!(*channel >= 0.0 && *channel <= 1.0, "{} {} {}", kind, h, channel);
                }
            }
        }
    }

    #[test]
    fn color_is_deterministic() {
        for h in 0..256 {
            assert_eq!(
                color_for(h, 255, FractalKind::Julia),
                color_for(h, 255, FractalKind::Julia)
            );
        }
    }
}

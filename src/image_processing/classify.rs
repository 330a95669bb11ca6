//! Pixel classification strategies.
//!
//! Every strategy answers the same question for a single pixel: how much of
//! it belongs to the background? The answer is an alpha weight in [0,255]
//! where 0 removes the pixel entirely and 255 keeps it unchanged. Boolean
//! strategies only ever return the two extremes; the feathering strategy
//! ramps between them so anti-aliased sprite edges fade instead of leaving a
//! hard halo.
//!
//! Classification is a pure function of the pixel's own RGB (plus the
//! resolved reference color), so results do not depend on neighbors or scan
//! order.

use image::{Rgb, Rgba, RgbaImage};

use super::sampler;
use crate::error::{Error, Result};

/// Closed per-channel band over [0,255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBand {
    pub lo: u8,
    pub hi: u8,
}

impl ChannelBand {
    pub fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: u8) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// Closed band over a normalized [0,1] HSV component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBand {
    pub lo: f32,
    pub hi: f32,
}

impl UnitBand {
    pub fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// How the background reference color is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceColor {
    /// Average the four inset corner pixels of each frame.
    Auto,
    /// Fixed RGB triple shared by every frame in the batch.
    Fixed(Rgb<u8>),
}

/// Strategy selection plus its parameter set, as configured by the caller.
///
/// The reference color may still be `Auto` here; `resolve` turns the spec
/// into a concrete [`Classifier`] once the per-frame background color is
/// known. `validate` runs once at startup so a malformed parameter set never
/// reaches per-pixel code.
#[derive(Debug, Clone)]
pub enum ClassifierSpec {
    ExactTolerance {
        reference: ReferenceColor,
        tolerance: u8,
    },
    ChannelRange {
        red: ChannelBand,
        green: ChannelBand,
        blue: ChannelBand,
    },
    DistanceFeather {
        reference: ReferenceColor,
        inner: f32,
        outer: f32,
    },
    HsvRange {
        hue: UnitBand,
        saturation: UnitBand,
        value: UnitBand,
    },
}

impl ClassifierSpec {
    /// Reject parameter sets that would silently misclassify every pixel.
    pub fn validate(&self) -> Result<()> {
        match self {
            ClassifierSpec::ExactTolerance { .. } => Ok(()),
            ClassifierSpec::ChannelRange { red, green, blue } => {
                for (name, band) in [("red", red), ("green", green), ("blue", blue)] {
                    if band.lo > band.hi {
                        return Err(Error::InvalidConfiguration(format!(
                            "{} range {}-{} is inverted",
                            name, band.lo, band.hi
                        )));
                    }
                }
                Ok(())
            }
            ClassifierSpec::DistanceFeather { inner, outer, .. } => {
                if !inner.is_finite() || !outer.is_finite() || *inner < 0.0 {
                    return Err(Error::InvalidConfiguration(format!(
                        "feather thresholds must be finite and non-negative, got inner={} outer={}",
                        inner, outer
                    )));
                }
                if inner >= outer {
                    return Err(Error::InvalidConfiguration(format!(
                        "inner threshold {} must be below outer threshold {}",
                        inner, outer
                    )));
                }
                Ok(())
            }
            ClassifierSpec::HsvRange {
                hue,
                saturation,
                value,
            } => {
                for (name, band) in [("hue", hue), ("saturation", saturation), ("value", value)] {
                    if band.lo > band.hi {
                        return Err(Error::InvalidConfiguration(format!(
                            "{} range {}-{} is inverted",
                            name, band.lo, band.hi
                        )));
                    }
                    if band.lo < 0.0 || band.hi > 1.0 {
                        return Err(Error::InvalidConfiguration(format!(
                            "{} range {}-{} is outside [0,1]",
                            name, band.lo, band.hi
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Whether resolving this spec samples the frame corners.
    pub fn samples_reference(&self) -> bool {
        matches!(
            self,
            ClassifierSpec::ExactTolerance {
                reference: ReferenceColor::Auto,
                ..
            } | ClassifierSpec::DistanceFeather {
                reference: ReferenceColor::Auto,
                ..
            }
        )
    }

    /// Build the concrete per-pixel classifier for one frame, sampling the
    /// background color from the frame corners when the reference is `Auto`.
    pub fn resolve(&self, img: &RgbaImage, sample_inset: u32) -> Result<Classifier> {
        let resolve_reference = |reference: &ReferenceColor| -> Result<Rgb<u8>> {
            match reference {
                ReferenceColor::Fixed(rgb) => Ok(*rgb),
                ReferenceColor::Auto => sampler::sample_background(img, sample_inset),
            }
        };

        Ok(match self {
            ClassifierSpec::ExactTolerance {
                reference,
                tolerance,
            } => Classifier::ExactTolerance {
                reference: resolve_reference(reference)?,
                tolerance: *tolerance,
            },
            ClassifierSpec::ChannelRange { red, green, blue } => Classifier::ChannelRange {
                red: *red,
                green: *green,
                blue: *blue,
            },
            ClassifierSpec::DistanceFeather {
                reference,
                inner,
                outer,
            } => Classifier::DistanceFeather {
                reference: resolve_reference(reference)?,
                inner: *inner,
                outer: *outer,
            },
            ClassifierSpec::HsvRange {
                hue,
                saturation,
                value,
            } => Classifier::HsvRange {
                hue: *hue,
                saturation: *saturation,
                value: *value,
            },
        })
    }
}

/// A fully-resolved per-pixel background predicate.
#[derive(Debug, Clone)]
pub enum Classifier {
    /// Background iff every channel is within `tolerance` of the reference.
    ExactTolerance { reference: Rgb<u8>, tolerance: u8 },
    /// Background iff each channel falls inside its own closed band.
    ChannelRange {
        red: ChannelBand,
        green: ChannelBand,
        blue: ChannelBand,
    },
    /// Euclidean RGB distance with a linear feathering band between the
    /// inner and outer thresholds.
    DistanceFeather {
        reference: Rgb<u8>,
        inner: f32,
        outer: f32,
    },
    /// Background iff normalized hue, saturation and value each fall inside
    /// their configured band. Robust to exposure drift across frames because
    /// the chroma-key hue band barely moves with brightness.
    HsvRange {
        hue: UnitBand,
        saturation: UnitBand,
        value: UnitBand,
    },
}

impl Classifier {
    /// Alpha weight for one pixel: 0 removes it, 255 keeps it unchanged,
    /// intermediate values feather. Never fails for any in-range pixel.
    pub fn classify(&self, pixel: Rgba<u8>) -> u8 {
        let Rgba([r, g, b, _]) = pixel;
        match self {
            Classifier::ExactTolerance {
                reference,
                tolerance,
            } => {
                let Rgb([br, bg, bb]) = *reference;
                let t = *tolerance as i16;
                let matches = (r as i16 - br as i16).abs() <= t
                    && (g as i16 - bg as i16).abs() <= t
                    && (b as i16 - bb as i16).abs() <= t;
                if matches {
                    0
                } else {
                    255
                }
            }
            Classifier::ChannelRange { red, green, blue } => {
                if red.contains(r) && green.contains(g) && blue.contains(b) {
                    0
                } else {
                    255
                }
            }
            Classifier::DistanceFeather {
                reference,
                inner,
                outer,
            } => {
                let d = color_distance(Rgb([r, g, b]), *reference);
                if d < *inner {
                    0
                } else if d >= *outer {
                    255
                } else {
                    let ramp = 255.0 * (d - inner) / (outer - inner);
                    ramp.round().clamp(0.0, 255.0) as u8
                }
            }
            Classifier::HsvRange {
                hue,
                saturation,
                value,
            } => {
                let (h, s, v) = rgb_to_hsv(r, g, b);
                if hue.contains(h) && saturation.contains(s) && value.contains(v) {
                    0
                } else {
                    255
                }
            }
        }
    }

    /// The resolved reference color, for per-frame reporting. `None` for
    /// strategies that match against bands rather than a single color.
    pub fn reference(&self) -> Option<Rgb<u8>> {
        match self {
            Classifier::ExactTolerance { reference, .. }
            | Classifier::DistanceFeather { reference, .. } => Some(*reference),
            Classifier::ChannelRange { .. } | Classifier::HsvRange { .. } => None,
        }
    }
}

/// Euclidean distance between two RGB colors.
fn color_distance(a: Rgb<u8>, b: Rgb<u8>) -> f32 {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Convert 8-bit RGB to normalized HSV with every component in [0,1] and
/// the hue wrapped to [0,1).
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let sector = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta) % 6.0
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    let mut h = sector / 6.0;
    if h < 0.0 {
        h += 1.0;
    }

    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(r: u8, g: u8, b: u8) -> Rgba<u8> {
        Rgba([r, g, b, 255])
    }

    #[test]
    fn test_exact_tolerance_matches_reference() {
        let classifier = Classifier::ExactTolerance {
            reference: Rgb([71, 99, 109]),
            tolerance: 5,
        };
        assert_eq!(classifier.classify(opaque(71, 99, 109)), 0);
        assert_eq!(classifier.classify(opaque(76, 104, 114)), 0);
        assert_eq!(classifier.classify(opaque(77, 99, 109)), 255);
    }

    #[test]
    fn test_channel_range_requires_all_channels() {
        let classifier = Classifier::ChannelRange {
            red: ChannelBand::new(68, 74),
            green: ChannelBand::new(96, 101),
            blue: ChannelBand::new(106, 111),
        };
        assert_eq!(classifier.classify(opaque(71, 99, 109)), 0);
        assert_eq!(classifier.classify(opaque(68, 96, 106)), 0);
        assert_eq!(classifier.classify(opaque(74, 101, 111)), 0);
        // One channel out of band keeps the pixel.
        assert_eq!(classifier.classify(opaque(75, 99, 109)), 255);
        assert_eq!(classifier.classify(opaque(71, 95, 109)), 255);
    }

    #[test]
    fn test_feather_ramp_values() {
        let classifier = Classifier::DistanceFeather {
            reference: Rgb([71, 99, 109]),
            inner: 10.0,
            outer: 40.0,
        };
        // On the reference: removed.
        assert_eq!(classifier.classify(opaque(71, 99, 109)), 0);
        // sqrt(3 * 10^2) ~= 17.32 falls inside the band.
        assert_eq!(classifier.classify(opaque(81, 109, 119)), 62);
        // Far from the reference: untouched.
        assert_eq!(classifier.classify(opaque(200, 50, 50)), 255);
    }

    #[test]
    fn test_feather_is_monotonic_in_distance() {
        let classifier = Classifier::DistanceFeather {
            reference: Rgb([0, 0, 0]),
            inner: 10.0,
            outer: 200.0,
        };
        // Walking the grey axis away from the reference never lowers alpha.
        let mut previous = 0u8;
        for value in 0..=255u8 {
            let alpha = classifier.classify(opaque(value, value, value));
            assert!(
                alpha >= previous,
                "alpha dropped from {} to {} at grey {}",
                previous,
                alpha,
                value
            );
            previous = alpha;
        }
    }

    #[test]
    fn test_hsv_range_keeps_warm_red() {
        let classifier = Classifier::HsvRange {
            hue: UnitBand::new(0.45, 0.55),
            saturation: UnitBand::new(0.0, 1.0),
            value: UnitBand::new(0.0, 1.0),
        };
        // Warm red sits at hue ~0, far outside the cyan band.
        assert_eq!(classifier.classify(opaque(200, 50, 50)), 255);
    }

    #[test]
    fn test_hsv_range_removes_teal_background() {
        let classifier = Classifier::HsvRange {
            hue: UnitBand::new(0.45, 0.55),
            saturation: UnitBand::new(0.25, 0.45),
            value: UnitBand::new(0.35, 0.50),
        };
        // RGB(71,99,109) converts to roughly H=0.54, S=0.35, V=0.43.
        assert_eq!(classifier.classify(opaque(71, 99, 109)), 0);
    }

    #[test]
    fn test_rgb_to_hsv_known_values() {
        let (h, s, v) = rgb_to_hsv(255, 0, 0);
        assert!(h.abs() < 1e-6);
        assert!((s - 1.0).abs() < 1e-6);
        assert!((v - 1.0).abs() < 1e-6);

        let (h, _, _) = rgb_to_hsv(0, 255, 0);
        assert!((h - 1.0 / 3.0).abs() < 1e-6);

        let (h, _, _) = rgb_to_hsv(0, 0, 255);
        assert!((h - 2.0 / 3.0).abs() < 1e-6);

        // Hue must wrap into [0,1) when green < blue at a red maximum.
        let (h, _, _) = rgb_to_hsv(255, 0, 128);
        assert!((0.0..1.0).contains(&h));
        assert!(h > 0.9);

        // Greys carry no hue or saturation.
        let (h, s, v) = rgb_to_hsv(128, 128, 128);
        assert_eq!(h, 0.0);
        assert_eq!(s, 0.0);
        assert!((v - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let spec = ClassifierSpec::ChannelRange {
            red: ChannelBand::new(74, 68),
            green: ChannelBand::new(96, 101),
            blue: ChannelBand::new(106, 111),
        };
        assert!(matches!(
            spec.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_feather_thresholds() {
        let spec = ClassifierSpec::DistanceFeather {
            reference: ReferenceColor::Fixed(Rgb([71, 99, 109])),
            inner: 40.0,
            outer: 10.0,
        };
        assert!(spec.validate().is_err());

        let spec = ClassifierSpec::DistanceFeather {
            reference: ReferenceColor::Fixed(Rgb([71, 99, 109])),
            inner: 30.0,
            outer: 30.0,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_hsv_band_outside_unit_interval() {
        let spec = ClassifierSpec::HsvRange {
            hue: UnitBand::new(0.45, 1.2),
            saturation: UnitBand::new(0.0, 1.0),
            value: UnitBand::new(0.0, 1.0),
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_resolve_samples_auto_reference_from_corners() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([71, 99, 109, 255]));
        let spec = ClassifierSpec::ExactTolerance {
            reference: ReferenceColor::Auto,
            tolerance: 10,
        };
        let classifier = spec.resolve(&img, 10).unwrap();
        assert_eq!(classifier.reference(), Some(Rgb([71, 99, 109])));
    }

    #[test]
    fn test_resolve_propagates_sample_geometry_error() {
        let img = RgbaImage::from_pixel(12, 12, Rgba([0, 0, 0, 255]));
        let spec = ClassifierSpec::DistanceFeather {
            reference: ReferenceColor::Auto,
            inner: 10.0,
            outer: 40.0,
        };
        assert!(matches!(
            spec.resolve(&img, 10),
            Err(Error::InvalidSampleGeometry { .. })
        ));
    }
}

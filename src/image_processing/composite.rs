use image::{Rgba, RgbaImage};

use super::classify::Classifier;

/// Apply a classifier to every pixel of a frame, producing a new buffer with
/// identical dimensions.
///
/// Only the alpha channel changes: the new alpha is the minimum of the
/// existing alpha and the classifier's weight, so a weight of 255 leaves the
/// pixel untouched and a fully transparent pixel stays transparent no matter
/// what its RGB would classify as. RGB bytes pass through unmodified, even
/// under partial transparency.
///
/// Returns the composited frame and the number of pixels whose alpha was
/// lowered.
pub fn apply(img: &RgbaImage, classifier: &Classifier) -> (RgbaImage, usize) {
    let mut cleared = 0usize;
    let output = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let pixel = *img.get_pixel(x, y);
        let Rgba([r, g, b, a]) = pixel;
        let alpha = a.min(classifier.classify(pixel));
        if alpha < a {
            cleared += 1;
        }
        Rgba([r, g, b, alpha])
    });
    (output, cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn tolerance_classifier() -> Classifier {
        Classifier::ExactTolerance {
            reference: Rgb([71, 99, 109]),
            tolerance: 10,
        }
    }

    #[test]
    fn test_apply_clears_background_and_counts() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([71, 99, 109, 255]));
        img.put_pixel(1, 1, Rgba([200, 50, 50, 255]));
        img.put_pixel(2, 2, Rgba([200, 50, 50, 255]));

        let (out, cleared) = apply(&img, &tolerance_classifier());
        assert_eq!(cleared, 14);
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 1)[3], 255);
    }

    #[test]
    fn test_apply_preserves_rgb_channels() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([71, 99, 109, 255]));
        img.put_pixel(0, 2, Rgba([12, 34, 56, 200]));

        let (out, _) = apply(&img, &tolerance_classifier());
        for (x, y, pixel) in img.enumerate_pixels() {
            let processed = out.get_pixel(x, y);
            assert_eq!(&pixel.0[..3], &processed.0[..3], "RGB drifted at {x},{y}");
        }
    }

    #[test]
    fn test_apply_is_idempotent_on_transparent_pixels() {
        // A pixel that was already cleared must stay cleared even though its
        // RGB no longer matches the background.
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([200, 50, 50, 255]));
        img.put_pixel(0, 0, Rgba([200, 50, 50, 0]));

        let (out, cleared) = apply(&img, &tolerance_classifier());
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(cleared, 0);

        let (again, cleared_again) = apply(&out, &tolerance_classifier());
        assert_eq!(again.get_pixel(0, 0)[3], 0);
        assert_eq!(cleared_again, 0);
    }

    #[test]
    fn test_apply_keeps_partial_alpha_below_weight() {
        // Feathering never raises alpha above what the source already had.
        let classifier = Classifier::DistanceFeather {
            reference: Rgb([71, 99, 109]),
            inner: 10.0,
            outer: 40.0,
        };
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 50, 50, 128]));
        let (out, cleared) = apply(&img, &classifier);
        assert_eq!(out.get_pixel(0, 0)[3], 128);
        assert_eq!(cleared, 0);
    }

    #[test]
    fn test_apply_dimensions_match_input() {
        let img = RgbaImage::from_pixel(7, 3, Rgba([0, 0, 0, 255]));
        let (out, _) = apply(&img, &tolerance_classifier());
        assert_eq!(out.dimensions(), (7, 3));
    }
}

use image::{Rgb, RgbaImage};

use crate::error::{Error, Result};

/// Inset used by corner sampling when none is configured.
pub const DEFAULT_SAMPLE_INSET: u32 = 10;

/// Estimate the background color of a frame by averaging its four corner
/// pixels, each read `inset` pixels in from the corner: (m,m), (w−m,m),
/// (m,h−m) and (w−m,h−m).
///
/// The average is a per-channel arithmetic mean with integer truncation.
/// Sampling fails with `InvalidSampleGeometry` when the inset does not leave
/// four distinct in-bounds sample points (`width <= 2*inset`,
/// `height <= 2*inset`, or a zero inset, which would put the far coordinates
/// outside the pixel grid).
pub fn sample_background(img: &RgbaImage, inset: u32) -> Result<Rgb<u8>> {
    let (width, height) = img.dimensions();
    if inset == 0 || width <= 2 * inset || height <= 2 * inset {
        return Err(Error::InvalidSampleGeometry {
            width,
            height,
            inset,
        });
    }

    let corners = [
        (inset, inset),
        (width - inset, inset),
        (inset, height - inset),
        (width - inset, height - inset),
    ];

    let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
    for (x, y) in corners {
        let pixel = img.get_pixel(x, y);
        sum_r += pixel[0] as u32;
        sum_g += pixel[1] as u32;
        sum_b += pixel[2] as u32;
    }

    Ok(Rgb([(sum_r / 4) as u8, (sum_g / 4) as u8, (sum_b / 4) as u8]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn uniform_image(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_sample_uniform_background() {
        let img = uniform_image(64, 64, [71, 99, 109, 255]);
        let sampled = sample_background(&img, 10).unwrap();
        assert_eq!(sampled, Rgb([71, 99, 109]));
    }

    #[test]
    fn test_sample_averages_corners_with_truncation() {
        let mut img = uniform_image(32, 32, [0, 0, 0, 255]);
        // Three black corners and one bright one: mean truncates per channel.
        img.put_pixel(2, 2, Rgba([103, 41, 7, 255]));
        let sampled = sample_background(&img, 2).unwrap();
        assert_eq!(sampled, Rgb([103 / 4, 41 / 4, 7 / 4]));
    }

    #[test]
    fn test_sample_rejects_oversized_inset() {
        let img = uniform_image(20, 64, [0, 0, 0, 255]);
        let err = sample_background(&img, 10).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSampleGeometry {
                width: 20,
                height: 64,
                inset: 10
            }
        ));
    }

    #[test]
    fn test_sample_rejects_zero_inset() {
        let img = uniform_image(64, 64, [0, 0, 0, 255]);
        assert!(sample_background(&img, 0).is_err());
    }

    #[test]
    fn test_sample_rejects_tiny_image() {
        let img = uniform_image(8, 8, [0, 0, 0, 255]);
        assert!(sample_background(&img, 10).is_err());
    }
}

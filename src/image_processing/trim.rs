//! Bounding-box trimming of composited frames.
//!
//! After background removal the sprite usually floats in a sea of
//! fully-transparent pixels. Trimming crops each frame to the minimal
//! rectangle that still contains every visible pixel, which keeps the
//! exported assets tight. A frame with nothing removable passes through
//! unchanged; callers compare output dimensions against input dimensions to
//! decide whether a rewrite is needed.

use image::imageops;
use image::RgbaImage;
use imageproc::rect::Rect;

/// Minimal rectangle containing every pixel with alpha > 0, or `None` when
/// the frame has no visible pixel at all.
pub fn alpha_extent(img: &RgbaImage) -> Option<Rect> {
    extent_of(img, |pixel| pixel[3] > 0)
}

/// Minimal rectangle containing every pixel whose RGB differs from a uniform
/// reference synthesized from the top-left pixel. Used when the alpha
/// channel carries no information yet.
pub fn difference_extent(img: &RgbaImage) -> Option<Rect> {
    if img.width() == 0 || img.height() == 0 {
        return None;
    }
    let reference = *img.get_pixel(0, 0);
    extent_of(img, |pixel| {
        pixel[0] != reference[0] || pixel[1] != reference[1] || pixel[2] != reference[2]
    })
}

fn extent_of(img: &RgbaImage, is_content: impl Fn(&image::Rgba<u8>) -> bool) -> Option<Rect> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in img.enumerate_pixels() {
        if is_content(pixel) {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !found {
        return None;
    }
    Some(Rect::at(min_x as i32, min_y as i32).of_size(max_x - min_x + 1, max_y - min_y + 1))
}

/// Crop a frame to `extent`.
///
/// Returns the input unchanged when the extent is `None` (no visible
/// content) or when it already spans the whole frame, so trimming never
/// produces a zero-area crop and never grows a frame.
pub fn trim(img: &RgbaImage, extent: Option<Rect>) -> RgbaImage {
    let (width, height) = img.dimensions();
    let rect = match extent {
        Some(rect) => rect,
        None => return img.clone(),
    };
    if rect.left() == 0 && rect.top() == 0 && rect.width() == width && rect.height() == height {
        return img.clone();
    }
    imageops::crop_imm(
        img,
        rect.left() as u32,
        rect.top() as u32,
        rect.width(),
        rect.height(),
    )
    .to_image()
}

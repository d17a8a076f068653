//! Gaussian blur for noise reduction before thresholding.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`], which only accepts
//! single-channel images, so the color channels are split, blurred
//! independently, and reassembled. Alpha is carried through untouched
//! since luminance ignores it.
//!
//! The blur radius is the kernel's standard deviation in working
//! pixels. A radius of zero returns the input unchanged.

use image::GrayImage;

use crate::types::RgbaImage;

/// Apply Gaussian blur to the R, G, and B channels of `image`.
///
/// Non-positive radii return the image unchanged, since `imageproc`'s
/// underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred RGBA image"]
pub fn gaussian_blur_rgba(image: &RgbaImage, radius: f32) -> RgbaImage {
    if radius <= 0.0 {
        return image.clone();
    }

    let (w, h) = (image.width(), image.height());

    let channels: [GrayImage; 3] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });

    let blurred: [GrayImage; 3] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], radius));

    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
            image.get_pixel(x, y).0[3],
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half black, right half white, boundary at x=5.
    fn sharp_edge_image() -> RgbaImage {
        RgbaImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn zero_radius_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(gaussian_blur_rgba(&img, 0.0), img);
    }

    #[test]
    fn negative_radius_returns_identical_image() {
        let img = sharp_edge_image();
        assert_eq!(gaussian_blur_rgba(&img, -1.0), img);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = RgbaImage::new(17, 31);
        let blurred = gaussian_blur_rgba(&img, 2.0);
        assert_eq!(blurred.width(), 17);
        assert_eq!(blurred.height(), 31);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur_rgba(&sharp_edge_image(), 2.0);

        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];
        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn alpha_is_preserved() {
        let img = RgbaImage::from_fn(6, 6, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let alpha = (x * 40 + y) as u8;
            image::Rgba([200, 100, 50, alpha])
        });
        let blurred = gaussian_blur_rgba(&img, 1.5);
        for (x, y, p) in blurred.enumerate_pixels() {
            assert_eq!(p.0[3], img.get_pixel(x, y).0[3], "alpha changed at ({x},{y})");
        }
    }

    #[test]
    fn uniform_image_unchanged_by_blur() {
        let img = RgbaImage::from_pixel(10, 10, image::Rgba([100, 150, 200, 255]));
        let blurred = gaussian_blur_rgba(&img, 3.0);
        let expected: [u8; 3] = [100, 150, 200];
        for pixel in blurred.pixels() {
            for (c, &exp) in expected.iter().enumerate() {
                let diff = i16::from(pixel.0[c]) - i16::from(exp);
                assert!(
                    diff.abs() <= 1,
                    "channel {c}: expected ~{exp}, got {}",
                    pixel.0[c],
                );
            }
        }
    }
}

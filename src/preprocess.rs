// This file is part of facecascade, a multi-cascade face detection engine combining
// an ensemble of Haar cascade classifiers as described in:
//
//      A comparison of face and facial feature detectors based on the Viola-Jones
//      general object detection framework,
//      Modesto Castrillón, Oscar Déniz, Daniel Hernández, Javier Lorenzo.
//      In Machine Vision and Applications, 2011
//
// You can redistribute facecascade source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Turns arbitrary input images into the equalized grayscale buffers the cascades expect.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contrast::equalize_histogram;
use log::debug;

/// Larger inputs are downscaled to about this many pixels (1024x768).
pub const MAX_INPUT_AREA: u64 = 1024 * 768;

/// Downscales `image` to at most [`MAX_INPUT_AREA`] pixels, converts it to 8-bit
/// luma and equalizes its histogram.
///
/// An empty image gives an empty buffer.
pub fn prepare(image: &DynamicImage) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(0, 0);
    }

    let area = u64::from(width) * u64::from(height);
    let gray = if area > MAX_INPUT_AREA {
        let z = (MAX_INPUT_AREA as f64 / area as f64).sqrt();
        let scaled_width = ((f64::from(width) * z) as u32).max(1);
        let scaled_height = ((f64::from(height) * z) as u32).max(1);
        debug!(
            "Scaling {}x{} input to {}x{} for detection",
            width, height, scaled_width, scaled_height
        );
        image
            .resize_exact(scaled_width, scaled_height, FilterType::Triangle)
            .to_luma8()
    } else {
        image.to_luma8()
    };

    equalize_histogram(&gray)
}

/// Shrinks `image` so that its longer side is at most `recommended` pixels,
/// keeping the aspect ratio. Smaller images are returned as they are.
///
/// Detection on a 800px image is typically as good as on the full-size original
/// and much faster; see [`Detector::recommended_image_size`](crate::Detector::recommended_image_size).
pub fn scale_for_detection(image: &DynamicImage, recommended: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if recommended == 0 || width.max(height) <= recommended {
        return image.clone();
    }
    image.resize(recommended, recommended, FilterType::Triangle)
}

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

use crate::common::ImageData;
use crate::feat::FeatureMap;
use crate::math;

/// Integral and squared integral images of one pyramid level.
///
/// Haar features are sums of rectangles, which the integral image answers in
/// constant time; the squared integral gives the window variance used to
/// normalize feature responses against lighting.
pub struct HaarFeatureMap {
    width: u32,
    int_img: Vec<u32>,
    square_int_img: Vec<u64>,
}

impl FeatureMap for HaarFeatureMap {
    fn compute(&mut self, image: &ImageData) {
        self.width = image.width();
        math::integral_image(image, &mut self.int_img, u32::from);
        math::integral_image(image, &mut self.square_int_img, |v| {
            u64::from(v) * u64::from(v)
        });
    }
}

impl HaarFeatureMap {
    #[inline]
    pub fn new() -> Self {
        HaarFeatureMap {
            width: 0,
            int_img: Vec::new(),
            square_int_img: Vec::new(),
        }
    }

    #[inline]
    pub fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        f64::from(math::rect_sum(
            &self.int_img,
            self.width as usize + 1,
            x as usize,
            y as usize,
            w as usize,
            h as usize,
        ))
    }

    /// Standard deviation of the pixels in the window at `(x, y)`.
    pub fn get_std_dev(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let stride = self.width as usize + 1;
        let area = f64::from(w) * f64::from(h);
        let sum = self.rect_sum(x, y, w, h);
        let square_sum = math::rect_sum(
            &self.square_int_img,
            stride,
            x as usize,
            y as usize,
            w as usize,
            h as usize,
        ) as f64;

        let mean = sum / area;
        let variance = square_sum / area - mean * mean;
        if variance > 0.0 {
            variance.sqrt()
        } else {
            0.0
        }
    }
}

impl Default for HaarFeatureMap {
    fn default() -> Self {
        Self::new()
    }
}

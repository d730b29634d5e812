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

use image::GrayImage;
use imageproc::edges::canny;

use crate::common::ImageData;
use crate::feat::FeatureMap;
use crate::math;

const CANNY_LOW_THRESHOLD: f32 = 10.0;
const CANNY_HIGH_THRESHOLD: f32 = 50.0;

/// Integral image of Canny edge pixels, used to skip featureless windows cheaply.
pub struct EdgeFeatureMap {
    width: u32,
    edge_int_img: Vec<u32>,
}

impl FeatureMap for EdgeFeatureMap {
    fn compute(&mut self, image: &ImageData) {
        self.width = image.width();
        let gray = match GrayImage::from_raw(image.width(), image.height(), image.to_vec()) {
            Some(gray) => gray,
            None => {
                self.edge_int_img.clear();
                return;
            }
        };
        let edges = canny(&gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
        math::integral_image(&ImageData::from(&edges), &mut self.edge_int_img, |v| {
            u32::from(v > 0)
        });
    }
}

impl EdgeFeatureMap {
    pub fn new() -> Self {
        EdgeFeatureMap {
            width: 0,
            edge_int_img: Vec::new(),
        }
    }

    /// Number of edge pixels inside the window at `(x, y)`.
    #[inline]
    pub fn edge_count(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        if self.edge_int_img.is_empty() {
            return 0;
        }
        math::rect_sum(
            &self.edge_int_img,
            self.width as usize + 1,
            x as usize,
            y as usize,
            w as usize,
            h as usize,
        )
    }
}

impl Default for EdgeFeatureMap {
    fn default() -> Self {
        Self::new()
    }
}

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

use std::path::Path;

use log::trace;

use crate::classifier::{group_rectangles, DetectionParameters, HaarClassifier, ObjectDetector, GROUP_EPS};
use crate::common::{ImageData, ImagePyramid, Rectangle, Seq, Size};
use crate::error::Result;
use crate::feat::{EdgeFeatureMap, FeatureMap, HaarFeatureMap};
use crate::model::{load_model, CascadeModel};

/// Windows with fewer edge pixels than `area / K_MIN_EDGE_DENSITY_INV` are pruned.
const K_MIN_EDGE_DENSITY_INV: u32 = 100;

/// Multi-scale Viola-Jones detector over a single Haar cascade.
///
/// The image is scanned on a pyramid whose levels shrink by `1 / scan_step`; the
/// trained window slides over every level and hits are mapped back to the input.
pub struct HaarDetector {
    classifier: HaarClassifier,
    image_pyramid: ImagePyramid,
    haar_map: HaarFeatureMap,
    edge_map: EdgeFeatureMap,
}

impl HaarDetector {
    pub fn new(model: CascadeModel) -> Self {
        HaarDetector {
            classifier: HaarClassifier::new(model),
            image_pyramid: ImagePyramid::new(),
            haar_map: HaarFeatureMap::new(),
            edge_map: EdgeFeatureMap::new(),
        }
    }

    /// Creates a detector from a model file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(load_model(path)?))
    }

    fn detect_raw(&mut self, image: &ImageData, params: &DetectionParameters) -> Vec<Rectangle> {
        let window = self.classifier.model().window_size();
        if image.width() < window.width || image.height() < window.height {
            return vec![];
        }

        let min_size = if params.min_size.is_empty() || params.min_size.less_than(window) {
            window
        } else {
            params.min_size
        };

        // scales above this one would find objects smaller than `min_size`
        let max_scale = f32::min(
            window.width as f32 / min_size.width as f32,
            window.height as f32 / min_size.height as f32,
        );
        let min_scale = f32::max(
            window.width as f32 / image.width() as f32,
            window.height as f32 / image.height() as f32,
        );

        self.image_pyramid.set_image_1x(image);
        self.image_pyramid.set_scale_step((1.0 / params.scan_step) as f32);
        self.image_pyramid.set_min_scale(min_scale);
        self.image_pyramid.skip_to_scale(max_scale);

        let mut hits = Vec::new();
        while let Some((level, scale_factor)) = self.image_pyramid.get_next_scale_image() {
            if level.width() < window.width || level.height() < window.height {
                break;
            }

            self.haar_map.compute(&level);
            if params.pruning {
                self.edge_map.compute(&level);
            }

            let step = if scale_factor < 0.5 { 1 } else { 2 };
            let max_x = level.width() - window.width;
            let max_y = level.height() - window.height;
            let min_edges = (window.width * window.height / K_MIN_EDGE_DENSITY_INV).max(1);
            let bbox_width = (window.width as f32 / scale_factor + 0.5) as u32;
            let bbox_height = (window.height as f32 / scale_factor + 0.5) as u32;

            for y in Seq::new(0, move |n| n + step).take_while(move |n| *n <= max_y) {
                for x in Seq::new(0, move |n| n + step).take_while(move |n| *n <= max_x) {
                    if params.pruning
                        && self.edge_map.edge_count(x, y, window.width, window.height) < min_edges
                    {
                        continue;
                    }

                    if self.classifier.classify(&self.haar_map, x, y).is_positive() {
                        hits.push(Rectangle::new(
                            (x as f32 / scale_factor + 0.5) as i32,
                            (y as f32 / scale_factor + 0.5) as i32,
                            bbox_width,
                            bbox_height,
                        ));
                    }
                }
            }
        }
        hits
    }
}

impl ObjectDetector for HaarDetector {
    fn classify(&mut self, image: &ImageData, params: &DetectionParameters) -> Vec<Rectangle> {
        let hits = self.detect_raw(image, params);
        let raw_count = hits.len();
        let grouped = group_rectangles(hits, params.min_neighbors, GROUP_EPS);
        trace!(
            "haar scan {}x{}: {} raw hits, {} after grouping",
            image.width(),
            image.height(),
            raw_count,
            grouped.len()
        );
        grouped
    }

    fn window_size(&self) -> Size {
        self.classifier.model().window_size()
    }
}

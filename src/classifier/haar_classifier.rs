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

use super::Score;
use crate::feat::HaarFeatureMap;
use crate::model::{CascadeModel, Stage, WeakClassifier};

/// Evaluates a boosted Haar cascade on windows of a [`HaarFeatureMap`].
#[derive(Clone)]
pub struct HaarClassifier {
    model: CascadeModel,
}

impl HaarClassifier {
    pub fn new(model: CascadeModel) -> Self {
        HaarClassifier { model }
    }

    pub fn model(&self) -> &CascadeModel {
        &self.model
    }

    /// Runs every stage on the training-size window with top-left corner `(x, y)`.
    ///
    /// Rejects as soon as one stage sum falls below its threshold.
    pub fn classify(&self, feature_map: &HaarFeatureMap, x: u32, y: u32) -> Score {
        let window = self.model.window_size();
        let area = f64::from(window.width) * f64::from(window.height);
        let mut std_dev = feature_map.get_std_dev(x, y, window.width, window.height);
        if std_dev < 1.0 {
            std_dev = 1.0;
        }

        let mut score = 0.0;
        for stage in self.model.stages() {
            score = Self::stage_sum(stage, feature_map, x, y, area, std_dev);
            if score < stage.threshold {
                return Score {
                    positive: false,
                    score,
                };
            }
        }

        Score {
            positive: true,
            score,
        }
    }

    fn stage_sum(
        stage: &Stage,
        feature_map: &HaarFeatureMap,
        x: u32,
        y: u32,
        area: f64,
        std_dev: f64,
    ) -> f32 {
        stage
            .classifiers
            .iter()
            .map(|weak| {
                let value = Self::feature_value(weak, feature_map, x, y) / area;
                if value < f64::from(weak.threshold) * std_dev {
                    weak.left_val
                } else {
                    weak.right_val
                }
            })
            .sum()
    }

    #[inline]
    fn feature_value(weak: &WeakClassifier, feature_map: &HaarFeatureMap, x: u32, y: u32) -> f64 {
        weak.rects
            .iter()
            .map(|r| f64::from(r.weight) * feature_map.rect_sum(x + r.x, y + r.y, r.width, r.height))
            .sum()
    }
}

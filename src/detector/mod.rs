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

mod haar_detector;
pub mod merge;
pub mod scanner;
pub mod verify;

use std::sync::{Mutex, PoisonError};

use image::DynamicImage;
use log::debug;

use crate::cascade::CascadeSet;
use crate::common::{ImageData, Rectangle, Size};
use crate::preprocess;
use crate::tuning::{self, Tuning};
use crate::Detector;

pub use self::haar_detector::HaarDetector;

/// Images are best scaled so that their longer side is about this long before detection.
pub const RECOMMENDED_IMAGE_SIZE: u32 = 800;

/// Ensemble face detector: primary cascades propose candidates, duplicates are
/// merged and the remaining candidates are confirmed by the verifying cascades.
pub struct CascadeDetector {
    cascades: CascadeSet,
    tuning: Mutex<Tuning>,
}

impl CascadeDetector {
    pub fn new(cascades: CascadeSet) -> Self {
        Self::with_tuning(cascades, Tuning::default())
    }

    pub fn with_tuning(cascades: CascadeSet, tuning: Tuning) -> Self {
        CascadeDetector {
            cascades,
            tuning: Mutex::new(tuning),
        }
    }

    pub fn cascades(&self) -> &CascadeSet {
        &self.cascades
    }

    /// Current tuning knobs.
    pub fn tuning(&self) -> Tuning {
        *self.tuning.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_tuning<F: FnOnce(&mut Tuning)>(&self, f: F) {
        f(&mut self.tuning.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl Detector for CascadeDetector {
    fn detect(&self, image: &DynamicImage, original_size: Option<Size>) -> Vec<Rectangle> {
        let prepared = preprocess::prepare(image);
        self.detect_prepared(&ImageData::from(&prepared), original_size)
    }

    fn detect_prepared(&self, image: &ImageData, original_size: Option<Size>) -> Vec<Rectangle> {
        if image.is_empty() {
            debug!("Invalid image given, not detecting faces");
            return vec![];
        }

        let scaled_size = Size::new(image.width(), image.height());
        let params = tuning::tune(
            &self.tuning(),
            scaled_size,
            original_size.unwrap_or(scaled_size),
        );

        let found = scanner::scan(image, &self.cascades, &params.primary);
        if found.iter().all(Vec::is_empty) {
            return vec![];
        }

        let candidates = merge::merge(
            found,
            self.cascades.primary_count(),
            params.max_merge_distance,
            params.min_duplicate_votes,
        );

        candidates
            .into_iter()
            .filter(|face| verify::verify(image, face, &self.cascades, &params.verifying))
            .collect()
    }

    fn recommended_image_size(&self) -> u32 {
        RECOMMENDED_IMAGE_SIZE
    }

    fn accuracy(&self) -> f64 {
        self.tuning().accuracy()
    }

    fn set_accuracy(&self, speed_vs_accuracy: f64) {
        self.update_tuning(|tuning| tuning.set_accuracy(speed_vs_accuracy));
    }

    fn specificity(&self) -> f64 {
        self.tuning().specificity()
    }

    fn set_specificity(&self, sensitivity_vs_specificity: f64) {
        self.update_tuning(|tuning| tuning.set_specificity(sensitivity_vs_specificity));
    }
}

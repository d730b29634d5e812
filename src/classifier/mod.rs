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

mod grouping;
mod haar_classifier;

pub use self::grouping::{group_rectangles, GROUP_EPS};
pub use self::haar_classifier::HaarClassifier;

use crate::common::{ImageData, Rectangle, Size};

pub struct Score {
    positive: bool,
    score: f32,
}

impl Score {
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    #[inline]
    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Parameters of a single multi-scale detection run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParameters {
    /// Factor between consecutive scan scales, greater than 1.
    pub scan_step: f64,
    /// Raw hits are dropped unless more than this many of them overlap.
    /// Zero disables grouping.
    pub min_neighbors: u32,
    /// Skip windows with hardly any edges.
    pub pruning: bool,
    /// Smallest object to look for. `0x0` means the detector's own window size.
    pub min_size: Size,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        DetectionParameters {
            scan_step: 1.1,
            min_neighbors: 3,
            pruning: false,
            min_size: Size::default(),
        }
    }
}

/// A trained sliding-window object detector.
///
/// Implementations are free to keep scratch buffers between calls, hence `&mut self`;
/// callers sharing one instance across threads must serialize access.
pub trait ObjectDetector: Send {
    /// Finds objects in `image`, returning rectangles in `image` coordinates.
    ///
    /// Never fails: a detector without a usable model returns an empty list.
    fn classify(&mut self, image: &ImageData, params: &DetectionParameters) -> Vec<Rectangle>;

    /// Size of the window the detector was trained on, `0x0` if unknown.
    fn window_size(&self) -> Size;
}

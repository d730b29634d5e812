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

mod classifier;
mod common;
mod feat;
mod math;

pub mod cascade;
pub mod detector;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod preprocess;
pub mod tuning;

pub use crate::cascade::{default_cascade_specs, find_file_in_dirs, Cascade, CascadeKind, CascadeSet, CascadeSpec};
pub use crate::classifier::{DetectionParameters, ObjectDetector};
pub use crate::common::{FractionalRoi, ImageData, Rectangle, Size};
pub use crate::detector::{CascadeDetector, HaarDetector};
pub use crate::error::{Error, Result};
pub use crate::model::{load_model, read_model, CascadeModel};
pub use crate::preprocess::scale_for_detection;
pub use crate::tuning::Tuning;

use std::path::Path;

use image::DynamicImage;

/// Create a face detector from the stock cascades, looked up in `dirs` in order.
///
/// Cascades that cannot be found or read are logged and left out; see
/// [`CascadeSet::loaded_count`].
pub fn create_detector<P: AsRef<Path>>(dirs: &[P]) -> Box<dyn Detector> {
    create_detector_with_cascades(CascadeSet::with_default_cascades(dirs))
}

/// Create a face detector from an already assembled ensemble.
pub fn create_detector_with_cascades(cascades: CascadeSet) -> Box<dyn Detector> {
    Box::new(CascadeDetector::new(cascades))
}

/// Face detector.
///
/// # Examples
///
/// ```rust,no_run
/// use facecascade::{scale_for_detection, Detector};
///
/// let detector = facecascade::create_detector(&["/usr/share/facecascade"]);
/// detector.set_accuracy(0.8);
/// detector.set_specificity(0.8);
///
/// let image = image::open("/path/to/image.jpg").unwrap();
/// let image = scale_for_detection(&image, detector.recommended_image_size());
/// for face in detector.detect(&image, None) {
///     println!("found face: {:?}", face);
/// }
/// ```
pub trait Detector: Send + Sync {
    /// Detect faces on `image`.
    ///
    /// The image is downscaled to at most 1024x768 pixels, converted to grayscale
    /// and equalized first; the returned rectangles refer to that prepared buffer.
    /// `original_size` is the size of the image before any scaling done by the
    /// caller and defaults to the size of the prepared buffer.
    fn detect(&self, image: &DynamicImage, original_size: Option<Size>) -> Vec<Rectangle>;

    /// Detect faces on an already prepared, equalized grayscale buffer.
    ///
    /// An empty buffer gives no faces.
    fn detect_prepared(&self, image: &ImageData, original_size: Option<Size>) -> Vec<Rectangle>;

    /// Length of the longer image side that gives the best trade-off between
    /// speed and detection quality.
    fn recommended_image_size(&self) -> u32;

    fn accuracy(&self) -> f64;

    /// Set the speed vs. accuracy trade-off.
    ///
    /// Values lie in `[0, 1]`, higher values scan more thoroughly and slower.
    /// Out of range values are clamped. Takes effect on the next detection.
    fn set_accuracy(&self, speed_vs_accuracy: f64);

    fn specificity(&self) -> f64;

    /// Set the sensitivity vs. specificity trade-off.
    ///
    /// Values lie in `[0, 1]`. Smaller values find more faces, possibly increasing
    /// the number of false positives; larger values find fewer false positives,
    /// possibly missing faces. Out of range values are clamped.
    fn set_specificity(&self, sensitivity_vs_specificity: f64);
}

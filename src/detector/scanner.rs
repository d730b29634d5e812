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

use crate::cascade::CascadeSet;
use crate::classifier::DetectionParameters;
use crate::common::{ImageData, Rectangle};

/// Runs every primary cascade over the whole image.
///
/// Returns one list per primary cascade, in registration order. A cascade that
/// is not loaded contributes an empty list.
pub fn scan(image: &ImageData, cascades: &CascadeSet, params: &DetectionParameters) -> Vec<Vec<Rectangle>> {
    cascades
        .primary()
        .map(|cascade| cascade.classify(image, params))
        .collect()
}

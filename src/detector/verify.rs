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

use log::trace;

use crate::cascade::{Cascade, CascadeSet};
use crate::classifier::DetectionParameters;
use crate::common::{ImageData, Rectangle};

/// Upper bound of the margin added around a candidate for frontal verification.
pub const MAX_VERIFY_MARGIN: u32 = 40;

/// Candidates up to this width are rejected unless a facial feature was found.
pub const SMALL_FACE_WIDTH: u32 = 50;

const FEATURE_MIN_NEIGHBORS: u32 = 2;
const FRONTAL_MIN_NEIGHBORS: u32 = 3;

/// Verification votes collected for one candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Votes {
    pub frontal: u32,
    pub feature: u32,
}

impl Votes {
    /// Decides whether a candidate of `width` pixels with these votes is a face.
    pub fn is_face(&self, width: u32) -> bool {
        if width <= SMALL_FACE_WIDTH && self.feature == 0 {
            return false;
        }
        (self.frontal > 0 && self.feature > 0) || self.frontal >= 2 || self.feature >= 2
    }
}

/// The candidate grown by `min(40, max(w, h))` on every side, clipped to the image.
pub fn extended_region(face: &Rectangle, image_width: u32, image_height: u32) -> Option<Rectangle> {
    let margin = MAX_VERIFY_MARGIN.min(face.width().max(face.height()));
    let extended = Rectangle::new(
        (face.x() - margin as i32).max(0),
        (face.y() - margin as i32).max(0),
        face.width() + 2 * margin,
        face.height() + 2 * margin,
    );
    extended.clip_to(image_width, image_height)
}

/// Asks every verifying cascade about `face` and counts the answers.
pub fn collect_votes(
    image: &ImageData,
    face: &Rectangle,
    cascades: &CascadeSet,
    template: &DetectionParameters,
) -> Votes {
    let mut votes = Votes::default();
    let extended = extended_region(face, image.width(), image.height())
        .and_then(|region| image.sub_image(region));

    for cascade in cascades.verifying() {
        trace!("Verifying face {:?} using cascade {}", face, cascade.name());
        if cascade.kind().is_facial_feature() {
            if confirms(cascade, feature_region(image, cascade, face), face, template, FEATURE_MIN_NEIGHBORS) {
                votes.feature += 1;
            }
        } else if confirms(cascade, extended, face, template, FRONTAL_MIN_NEIGHBORS) {
            votes.frontal += 1;
        }
    }
    votes
}

/// Returns whether `face` survives verification. Without verifying cascades
/// every candidate does.
pub fn verify(
    image: &ImageData,
    face: &Rectangle,
    cascades: &CascadeSet,
    template: &DetectionParameters,
) -> bool {
    if !cascades.has_verifying() {
        return true;
    }

    let votes = collect_votes(image, face, cascades, template);
    let verified = votes.is_face(face.width());
    trace!(
        "Verification of {:?}: frontal {} features {}, verified {}",
        face,
        votes.frontal,
        votes.feature,
        verified
    );
    verified
}

fn feature_region<'a>(image: &ImageData<'a>, cascade: &Cascade, face: &Rectangle) -> Option<ImageData<'a>> {
    cascade
        .face_roi(face)
        .clip_to(image.width(), image.height())
        .and_then(|roi| image.sub_image(roi))
}

fn confirms(
    cascade: &Cascade,
    region: Option<ImageData>,
    face: &Rectangle,
    template: &DetectionParameters,
    min_neighbors: u32,
) -> bool {
    let region = match region {
        Some(region) => region,
        None => return false,
    };

    let params = DetectionParameters {
        min_neighbors,
        min_size: cascade.min_size_for_face(face.size()),
        ..*template
    };
    !cascade.classify(&region, &params).is_empty()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::cascade::CascadeKind;
    use crate::classifier::ObjectDetector;
    use crate::common::{FractionalRoi, Size};

    /// Reports one hit when `hit` is set and records what it was asked.
    struct Scripted {
        hit: bool,
        calls: Arc<Mutex<Vec<(Size, DetectionParameters)>>>,
    }

    impl ObjectDetector for Scripted {
        fn classify(&mut self, image: &ImageData, params: &DetectionParameters) -> Vec<Rectangle> {
            self.calls
                .lock()
                .unwrap()
                .push((Size::new(image.width(), image.height()), *params));
            if self.hit {
                vec![Rectangle::new(0, 0, 10, 10)]
            } else {
                vec![]
            }
        }

        fn window_size(&self) -> Size {
            Size::new(20, 20)
        }
    }

    type Calls = Arc<Mutex<Vec<(Size, DetectionParameters)>>>;

    fn scripted(kind: CascadeKind, hit: bool, calls: &Calls) -> Cascade {
        Cascade::new(
            "scripted",
            kind,
            Box::new(Scripted {
                hit,
                calls: Arc::clone(calls),
            }),
        )
    }

    fn eye() -> CascadeKind {
        CascadeKind::FeatureVerifying(FractionalRoi::new(0.0, 0.0, 0.6, 0.6))
    }

    fn template() -> DetectionParameters {
        DetectionParameters {
            scan_step: 1.1,
            min_neighbors: 0,
            pruning: false,
            min_size: Size::default(),
        }
    }

    #[test]
    fn test_voting_rules() {
        let votes = |frontal, feature| Votes { frontal, feature };
        assert!(!votes(5, 0).is_face(50));
        assert!(votes(5, 0).is_face(51));
        assert!(votes(1, 1).is_face(40));
        assert!(votes(0, 2).is_face(40));
        assert!(!votes(0, 1).is_face(100));
        assert!(!votes(1, 0).is_face(100));
        assert!(votes(2, 0).is_face(100));
        assert!(!votes(0, 0).is_face(100));
    }

    #[test]
    fn test_extended_region() {
        assert_eq!(
            Some(Rectangle::new(60, 60, 130, 130)),
            extended_region(&Rectangle::new(100, 100, 50, 50), 1000, 1000)
        );
        // margin is bounded by the face size
        assert_eq!(
            Some(Rectangle::new(0, 0, 30, 30)),
            extended_region(&Rectangle::new(10, 10, 10, 10), 1000, 1000)
        );
        // clamped at the origin without shrinking, then clipped on the far side
        assert_eq!(
            Some(Rectangle::new(0, 0, 130, 120)),
            extended_region(&Rectangle::new(20, 30, 50, 50), 1000, 120)
        );
    }

    #[test]
    fn test_no_verifying_cascades_accepts() {
        let calls = Calls::default();
        let cascades = CascadeSet::new(vec![scripted(CascadeKind::Primary, false, &calls)]);
        let data = vec![0u8; 200 * 200];
        let image = ImageData::new(&data, 200, 200);
        assert!(verify(&image, &Rectangle::new(10, 10, 20, 20), &cascades, &template()));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_small_candidate_without_features_is_rejected() {
        let calls = Calls::default();
        let cascades = CascadeSet::new(vec![
            scripted(CascadeKind::FrontalVerifying, true, &calls),
            scripted(CascadeKind::FrontalVerifying, true, &calls),
            scripted(CascadeKind::FrontalVerifying, true, &calls),
            scripted(eye(), false, &calls),
        ]);
        let data = vec![0u8; 200 * 200];
        let image = ImageData::new(&data, 200, 200);
        assert!(!verify(&image, &Rectangle::new(50, 50, 40, 40), &cascades, &template()));
        assert!(verify(&image, &Rectangle::new(50, 50, 60, 60), &cascades, &template()));
    }

    #[test]
    fn test_verifying_parameters() {
        let calls = Calls::default();
        let cascades = CascadeSet::new(vec![
            scripted(CascadeKind::Primary, true, &calls),
            scripted(CascadeKind::FrontalVerifying, true, &calls),
            scripted(eye(), true, &calls),
        ]);
        let data = vec![0u8; 400 * 400];
        let image = ImageData::new(&data, 400, 400);
        let face = Rectangle::new(100, 100, 250, 250);

        let votes = collect_votes(&image, &face, &cascades, &template());
        assert_eq!(Votes { frontal: 1, feature: 1 }, votes);

        let calls = calls.lock().unwrap();
        assert_eq!(2, calls.len());

        let (frontal_region, frontal) = calls[0];
        assert_eq!(Size::new(330, 330), frontal_region);
        assert_eq!(3, frontal.min_neighbors);
        assert_eq!(Size::new(150, 150), frontal.min_size);
        assert!(!frontal.pruning);
        assert_eq!(1.1, frontal.scan_step);

        let (feature_region, feature) = calls[1];
        assert_eq!(Size::new(150, 150), feature_region);
        assert_eq!(2, feature.min_neighbors);
        assert_eq!(Size::new(25, 25), feature.min_size);
    }
}

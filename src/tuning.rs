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

use log::debug;

use crate::classifier::DetectionParameters;
use crate::common::Size;

/// Centers of two faces closer than this many pixels describe the same face.
pub const DEFAULT_MAX_MERGE_DISTANCE: i32 = 15;

/// Primary candidates need at least this many duplicates to survive merging.
pub const DEFAULT_MIN_DUPLICATE_VOTES: u32 = 0;

/// Scan step of the verifying pass.
pub const VERIFYING_SCAN_STEP: f64 = 1.1;

/// The two user-facing knobs of the detector, both in `[0, 1]`.
///
/// `speed_vs_accuracy` trades scan density for speed (higher is more accurate);
/// `sensitivity_vs_specificity` trades found faces for false positives
/// (higher rejects more).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    speed_vs_accuracy: f64,
    sensitivity_vs_specificity: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            speed_vs_accuracy: 0.8,
            sensitivity_vs_specificity: 0.8,
        }
    }
}

impl Tuning {
    pub fn new(speed_vs_accuracy: f64, sensitivity_vs_specificity: f64) -> Self {
        let mut tuning = Tuning::default();
        tuning.set_accuracy(speed_vs_accuracy);
        tuning.set_specificity(sensitivity_vs_specificity);
        tuning
    }

    pub fn accuracy(&self) -> f64 {
        self.speed_vs_accuracy
    }

    /// Clamped to `[0, 1]`; NaN is treated as `0`.
    pub fn set_accuracy(&mut self, speed_vs_accuracy: f64) {
        self.speed_vs_accuracy = clamp_unit(speed_vs_accuracy);
    }

    pub fn specificity(&self) -> f64 {
        self.sensitivity_vs_specificity
    }

    /// Clamped to `[0, 1]`; NaN is treated as `0`.
    pub fn set_specificity(&mut self, sensitivity_vs_specificity: f64) {
        self.sensitivity_vs_specificity = clamp_unit(sensitivity_vs_specificity);
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        num::clamp(value, 0.0, 1.0)
    }
}

/// Everything one detection call needs, derived from a [`Tuning`] snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TunedParameters {
    pub primary: DetectionParameters,
    /// Template for the verifying pass; `min_neighbors` and `min_size` are set
    /// per cascade and candidate.
    pub verifying: DetectionParameters,
    pub max_merge_distance: i32,
    pub min_duplicate_votes: u32,
}

/// Maps the tuning knobs to scan parameters.
///
/// `original` is the size of the image before any downscaling and lowers the
/// minimum face size for small originals. The scaled size is accepted for
/// symmetry with the detection call but does not influence the result.
pub fn tune(tuning: &Tuning, _scaled: Size, original: Size) -> TunedParameters {
    let accuracy = tuning.accuracy();
    let specificity = tuning.specificity();

    let scan_step = if accuracy <= 0.159 {
        1.5
    } else if accuracy >= 0.8 {
        1.1
    } else {
        (100.0 * (1.1 - 0.5 * accuracy.log10())).round() / 100.0
    };

    let min_neighbors = if specificity < 0.25 {
        1
    } else if specificity < 0.5 {
        2
    } else {
        3
    };

    let pruning = specificity > 0.1 || accuracy < 0.9;

    let original_extent = f64::from(original.width.max(original.height)) / 1000.0;
    let mut min_size = 32.0 * specificity;
    min_size -= 10.0 * (1.0 - original_extent.min(1.0));
    if accuracy < 0.75 {
        min_size += 100.0 * (0.75 - accuracy);
    }
    if min_size < 20.0 {
        min_size = 0.0;
    }
    let min_size = min_size.round() as u32;

    let params = TunedParameters {
        primary: DetectionParameters {
            scan_step,
            min_neighbors,
            pruning,
            min_size: Size::new(min_size, min_size),
        },
        verifying: DetectionParameters {
            scan_step: VERIFYING_SCAN_STEP,
            min_neighbors: 0,
            pruning: false,
            min_size: Size::default(),
        },
        max_merge_distance: DEFAULT_MAX_MERGE_DISTANCE,
        min_duplicate_votes: DEFAULT_MIN_DUPLICATE_VOTES,
    };

    debug!(
        "accuracy {} specificity {}: scan step {} min neighbors {} pruning {} min size {}",
        accuracy, specificity, scan_step, min_neighbors, pruning, min_size
    );
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALED: Size = Size::new(800, 600);
    const LARGE: Size = Size::new(3000, 2000);

    fn primary(accuracy: f64, specificity: f64, original: Size) -> DetectionParameters {
        tune(&Tuning::new(accuracy, specificity), SCALED, original).primary
    }

    #[test]
    fn test_setters_clamp() {
        let mut tuning = Tuning::default();
        tuning.set_accuracy(1.7);
        tuning.set_specificity(-0.2);
        assert_eq!(1.0, tuning.accuracy());
        assert_eq!(0.0, tuning.specificity());

        tuning.set_accuracy(f64::NAN);
        assert_eq!(0.0, tuning.accuracy());
    }

    #[test]
    fn test_default_tuning() {
        let params = tune(&Tuning::default(), SCALED, LARGE);
        assert_eq!(1.1, params.primary.scan_step);
        assert_eq!(3, params.primary.min_neighbors);
        assert!(params.primary.pruning);
        // 32 * 0.8 = 25.6
        assert_eq!(Size::new(26, 26), params.primary.min_size);
        assert_eq!(15, params.max_merge_distance);
        assert_eq!(0, params.min_duplicate_votes);
        assert_eq!(1.1, params.verifying.scan_step);
        assert!(!params.verifying.pruning);
    }

    #[test]
    fn test_scan_step() {
        assert_eq!(1.5, primary(0.0, 0.8, LARGE).scan_step);
        assert_eq!(1.5, primary(0.159, 0.8, LARGE).scan_step);
        assert_eq!(1.1, primary(0.8, 0.8, LARGE).scan_step);
        // 1.1 - 0.5 * log10(0.5) = 1.2505
        assert_eq!(1.25, primary(0.5, 0.8, LARGE).scan_step);
        assert_eq!(1.5, primary(0.16, 0.8, LARGE).scan_step);
    }

    #[test]
    fn test_scan_step_decreases_with_accuracy() {
        let mut previous = f64::MAX;
        for i in 0..=100 {
            let step = primary(f64::from(i) / 100.0, 0.8, LARGE).scan_step;
            assert!(step <= previous, "step {} after {} at {}", step, previous, i);
            assert!(step > 1.0);
            previous = step;
        }
    }

    #[test]
    fn test_min_neighbors() {
        assert_eq!(1, primary(0.8, 0.0, LARGE).min_neighbors);
        assert_eq!(1, primary(0.8, 0.24, LARGE).min_neighbors);
        assert_eq!(2, primary(0.8, 0.25, LARGE).min_neighbors);
        assert_eq!(2, primary(0.8, 0.49, LARGE).min_neighbors);
        assert_eq!(3, primary(0.8, 0.5, LARGE).min_neighbors);
        assert_eq!(3, primary(0.8, 1.0, LARGE).min_neighbors);
    }

    #[test]
    fn test_min_neighbors_increases_with_specificity() {
        let mut previous = 0;
        for i in 0..=100 {
            let n = primary(0.8, f64::from(i) / 100.0, LARGE).min_neighbors;
            assert!(n >= previous);
            previous = n;
        }
    }

    #[test]
    fn test_pruning() {
        assert!(!primary(0.9, 0.1, LARGE).pruning);
        assert!(!primary(1.0, 0.0, LARGE).pruning);
        assert!(primary(0.89, 0.0, LARGE).pruning);
        assert!(primary(1.0, 0.11, LARGE).pruning);
    }

    #[test]
    fn test_min_size() {
        // 32 - 10 * (1 - 0.5) = 27
        assert_eq!(Size::new(27, 27), primary(1.0, 1.0, Size::new(500, 300)).min_size);
        // below 20 falls back to the cascade minimum
        assert_eq!(Size::default(), primary(1.0, 0.5, LARGE).min_size);
        // 32 * 0.5 + 100 * (0.75 - 0.5) = 41
        assert_eq!(Size::new(41, 41), primary(0.5, 0.5, LARGE).min_size);
        assert_eq!(Size::default(), primary(0.8, 0.0, Size::default()).min_size);
    }

    #[test]
    fn test_min_size_grows_with_specificity() {
        let mut previous = 0;
        for i in 0..=100 {
            let size = primary(0.8, f64::from(i) / 100.0, LARGE).min_size;
            assert_eq!(size.width, size.height);
            assert!(size.width >= previous);
            previous = size.width;
        }
    }
}

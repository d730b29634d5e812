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

//! Measures detection quality against a collection of annotated images.

use std::fmt;

use image::{DynamicImage, GenericImageView};
use log::{debug, warn};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::common::{ImageData, Rectangle, Size};
use crate::preprocess;
use crate::Detector;

/// A detected face matches a true face if their intersection covers at least this
/// share of both rectangles.
pub const MIN_OVERLAP: f64 = 0.75;

/// Collections with fewer face-free images than this share give meaningless
/// specificity figures.
const MIN_NEGATIVE_SHARE: f64 = 0.2;

/// An image together with the faces it really shows, in image coordinates.
#[derive(Clone, Debug)]
pub struct Sample {
    pub image: DynamicImage,
    pub faces: Vec<Rectangle>,
}

/// Whether the intersection of `a` and `b` covers at least `min_overlap` of both.
pub fn overlaps(a: &Rectangle, b: &Rectangle, min_overlap: f64) -> bool {
    match a.intersection(b) {
        Some(common) => {
            let common = common.area() as f64;
            common >= min_overlap * a.area() as f64 && common >= min_overlap * b.area() as f64
        }
        None => false,
    }
}

/// Running counters of a benchmark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Benchmark {
    pub images: u64,
    pub faces: u64,
    pub face_pixels: u64,
    pub total_pixels: u64,

    pub true_negative_images: u64,
    pub false_positive_images: u64,

    pub true_positive_faces: u64,
    pub false_negative_faces: u64,
    pub false_positive_faces: u64,
}

impl Benchmark {
    pub fn new() -> Self {
        Benchmark::default()
    }

    /// Detects faces on every sample and accumulates the outcome.
    ///
    /// Detections are mapped back onto the sample's own coordinates before matching.
    pub fn run(detector: &dyn Detector, samples: &[Sample]) -> Benchmark {
        #[cfg(feature = "rayon")]
        let benchmark = samples
            .par_iter()
            .map(|sample| Benchmark::single(detector, sample))
            .reduce(Benchmark::default, Benchmark::combined);

        #[cfg(not(feature = "rayon"))]
        let benchmark = samples
            .iter()
            .map(|sample| Benchmark::single(detector, sample))
            .fold(Benchmark::default(), Benchmark::combined);

        benchmark
    }

    fn single(detector: &dyn Detector, sample: &Sample) -> Benchmark {
        let (width, height) = sample.image.dimensions();
        let prepared = preprocess::prepare(&sample.image);
        let sx = f64::from(width) / f64::from(prepared.width().max(1));
        let sy = f64::from(height) / f64::from(prepared.height().max(1));

        let tested: Vec<Rectangle> = detector
            .detect_prepared(&ImageData::from(&prepared), Some(Size::new(width, height)))
            .iter()
            .map(|face| face.scaled(sx, sy))
            .collect();

        let mut benchmark = Benchmark::default();
        benchmark.add(&sample.faces, &tested, Size::new(width, height));
        benchmark
    }

    /// Accounts for one image with the given true and detected faces.
    pub fn add(&mut self, ground_truth: &[Rectangle], tested: &[Rectangle], image_size: Size) {
        debug!(
            "There are {} faces to be detected, the detector found {}",
            ground_truth.len(),
            tested.len()
        );

        self.images += 1;
        self.faces += ground_truth.len() as u64;
        self.total_pixels += image_size.area();
        self.face_pixels += ground_truth.iter().map(Rectangle::area).sum::<u64>();

        let matched_true = ground_truth
            .iter()
            .filter(|truth| tested.iter().any(|face| overlaps(truth, face, MIN_OVERLAP)))
            .count() as u64;
        let matched_tested = tested
            .iter()
            .filter(|face| ground_truth.iter().any(|truth| overlaps(truth, face, MIN_OVERLAP)))
            .count() as u64;

        if ground_truth.is_empty() {
            if tested.is_empty() {
                self.true_negative_images += 1;
            } else {
                debug!("The image, truly without faces, is false-positive");
                self.false_positive_images += 1;
            }
        }

        self.true_positive_faces += matched_true;
        self.false_negative_faces += ground_truth.len() as u64 - matched_true;
        self.false_positive_faces += tested.len() as u64 - matched_tested;
    }

    /// Sum of two partial benchmarks.
    pub fn combined(self, other: Benchmark) -> Benchmark {
        Benchmark {
            images: self.images + other.images,
            faces: self.faces + other.faces,
            face_pixels: self.face_pixels + other.face_pixels,
            total_pixels: self.total_pixels + other.total_pixels,
            true_negative_images: self.true_negative_images + other.true_negative_images,
            false_positive_images: self.false_positive_images + other.false_positive_images,
            true_positive_faces: self.true_positive_faces + other.true_positive_faces,
            false_negative_faces: self.false_negative_faces + other.false_negative_faces,
            false_positive_faces: self.false_positive_faces + other.false_positive_faces,
        }
    }

    pub fn report(&self) -> Report {
        let mut warnings = Vec::new();

        let mut negative_images = self.true_negative_images + self.false_positive_images;
        if (negative_images as f64) < MIN_NEGATIVE_SHARE * self.images as f64 {
            let warning = format!(
                "only {} of the {} test images show no faces, specificity and false-positive rate have little meaning",
                negative_images, self.images
            );
            warn!("{}", warning);
            warnings.push(warning);
            negative_images = negative_images.max(1);
        }

        let mut true_faces = self.true_positive_faces + self.false_negative_faces;
        if true_faces == 0 {
            let warning =
                "no test image shows a face, sensitivity and positive predictive value are meaningless".to_string();
            warn!("{}", warning);
            warnings.push(warning);
            true_faces = 1;
        }

        let detected = self.true_positive_faces + self.false_positive_faces;

        Report {
            images: self.images,
            faces: self.faces,
            pixel_coverage: ratio(self.face_pixels, self.total_pixels),
            specificity: ratio(self.true_negative_images, negative_images),
            false_positive_rate: ratio(self.false_positive_images, negative_images),
            sensitivity: ratio(self.true_positive_faces, true_faces),
            positive_predictive_value: ratio(self.true_positive_faces, detected),
            warnings,
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Summary figures of a [`Benchmark`]; all rates are in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub images: u64,
    pub faces: u64,
    /// Share of all pixels that belong to a true face.
    pub pixel_coverage: f64,
    /// Share of face-free images on which nothing was detected.
    pub specificity: f64,
    pub false_positive_rate: f64,
    /// Share of true faces that were detected.
    pub sensitivity: f64,
    /// Share of detections that are true faces.
    pub positive_predictive_value: f64,
    pub warnings: Vec<String>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Collection properties:")?;
        writeln!(f, "  {} images", self.images)?;
        writeln!(f, "  {} faces", self.faces)?;
        writeln!(f, "  {:.2}% of pixels covered by faces", 100.0 * self.pixel_coverage)?;
        for warning in &self.warnings {
            writeln!(f, "Note: {}", warning)?;
        }
        writeln!(f, "Per-image performance:")?;
        writeln!(f, "  Specificity: {:.2}%", 100.0 * self.specificity)?;
        writeln!(f, "  False-positive rate: {:.2}%", 100.0 * self.false_positive_rate)?;
        writeln!(f, "Per-face performance:")?;
        writeln!(f, "  Sensitivity: {:.2}%", 100.0 * self.sensitivity)?;
        write!(
            f,
            "  Positive predictive value: {:.2}%",
            100.0 * self.positive_predictive_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CascadeSet;
    use crate::detector::CascadeDetector;

    const IMAGE: Size = Size::new(100, 100);

    #[test]
    fn test_overlap_requires_both_areas() {
        let face = Rectangle::new(0, 0, 10, 10);
        assert!(overlaps(&face, &face, MIN_OVERLAP));
        assert!(overlaps(&face, &Rectangle::new(1, 1, 10, 10), MIN_OVERLAP));
        assert!(!overlaps(&face, &Rectangle::new(0, 0, 20, 20), MIN_OVERLAP));
        assert!(!overlaps(&face, &Rectangle::new(50, 50, 10, 10), MIN_OVERLAP));
    }

    #[test]
    fn test_counters() {
        let mut benchmark = Benchmark::new();
        let truth = [Rectangle::new(10, 10, 20, 20), Rectangle::new(60, 60, 20, 20)];
        let tested = [Rectangle::new(11, 10, 20, 20), Rectangle::new(40, 0, 10, 10)];
        benchmark.add(&truth, &tested, IMAGE);
        benchmark.add(&[], &[], IMAGE);
        benchmark.add(&[], &[Rectangle::new(0, 0, 5, 5)], IMAGE);

        assert_eq!(3, benchmark.images);
        assert_eq!(2, benchmark.faces);
        assert_eq!(800, benchmark.face_pixels);
        assert_eq!(30_000, benchmark.total_pixels);
        assert_eq!(1, benchmark.true_negative_images);
        assert_eq!(1, benchmark.false_positive_images);
        assert_eq!(1, benchmark.true_positive_faces);
        assert_eq!(1, benchmark.false_negative_faces);
        assert_eq!(2, benchmark.false_positive_faces);

        let report = benchmark.report();
        assert!(report.warnings.is_empty());
        assert_eq!(0.5, report.specificity);
        assert_eq!(0.5, report.false_positive_rate);
        assert_eq!(0.5, report.sensitivity);
        assert!((report.positive_predictive_value - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_guards() {
        let mut benchmark = Benchmark::new();
        for _ in 0..10 {
            benchmark.add(&[Rectangle::new(0, 0, 10, 10)], &[Rectangle::new(0, 0, 10, 10)], IMAGE);
        }
        let report = benchmark.report();
        assert_eq!(1, report.warnings.len());
        assert_eq!(0.0, report.specificity);
        assert_eq!(1.0, report.sensitivity);

        let mut benchmark = Benchmark::new();
        benchmark.add(&[], &[], IMAGE);
        let report = benchmark.report();
        assert_eq!(1, report.warnings.len());
        assert_eq!(1.0, report.specificity);
        assert_eq!(0.0, report.sensitivity);
        assert_eq!(0.0, report.positive_predictive_value);
    }

    #[test]
    fn test_combined_adds_counters() {
        let mut a = Benchmark::new();
        a.add(&[Rectangle::new(0, 0, 10, 10)], &[], IMAGE);
        let mut b = Benchmark::new();
        b.add(&[], &[], IMAGE);

        let sum = a.combined(b);
        assert_eq!(2, sum.images);
        assert_eq!(1, sum.false_negative_faces);
        assert_eq!(1, sum.true_negative_images);
    }

    #[test]
    fn test_run_without_cascades() {
        let detector = CascadeDetector::new(CascadeSet::default());
        let samples = vec![
            Sample {
                image: DynamicImage::new_luma8(64, 64),
                faces: vec![Rectangle::new(10, 10, 30, 30)],
            },
            Sample {
                image: DynamicImage::new_luma8(64, 64),
                faces: vec![],
            },
        ];
        let benchmark = Benchmark::run(&detector, &samples);
        assert_eq!(2, benchmark.images);
        assert_eq!(1, benchmark.false_negative_faces);
        assert_eq!(1, benchmark.true_negative_images);
        assert_eq!(0, benchmark.false_positive_faces);
    }
}

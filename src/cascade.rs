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

//! The ensemble of cascades used by the detection pipeline.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::{debug, error, trace, warn};

use crate::classifier::{DetectionParameters, ObjectDetector};
use crate::common::{FractionalRoi, ImageData, Rectangle, Size};
use crate::detector::HaarDetector;
use crate::error::Error;

/// Size relation between a face and its features: a feature is at least this
/// many times smaller than the face it belongs to.
pub const FACE_TO_FEATURE_RELATION_MIN: f64 = 10.0;

/// Frontal verifying cascades start scanning slightly below the presumed face size.
pub const FRONTAL_MIN_SIZE_FACTOR: f64 = 0.6;

/// Role of a cascade in the ensemble.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CascadeKind {
    /// Scans the whole image for face candidates.
    Primary,
    /// Confirms a candidate by scanning an enlarged region around it.
    FrontalVerifying,
    /// Confirms a candidate by finding a facial feature inside part of it.
    FeatureVerifying(FractionalRoi),
}

impl CascadeKind {
    #[inline]
    pub fn is_primary(&self) -> bool {
        matches!(self, CascadeKind::Primary)
    }

    #[inline]
    pub fn is_verifying(&self) -> bool {
        !self.is_primary()
    }

    #[inline]
    pub fn is_facial_feature(&self) -> bool {
        matches!(self, CascadeKind::FeatureVerifying(_))
    }

    pub fn roi(&self) -> Option<FractionalRoi> {
        match self {
            CascadeKind::FeatureVerifying(roi) => Some(*roi),
            _ => None,
        }
    }
}

/// Describes a cascade to be loaded from a model file.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeSpec {
    pub file_name: String,
    pub kind: CascadeKind,
}

impl CascadeSpec {
    pub fn new(file_name: impl Into<String>, kind: CascadeKind) -> Self {
        CascadeSpec {
            file_name: file_name.into(),
            kind,
        }
    }
}

/// The stock ensemble: one primary frontal cascade, four frontal and profile
/// verifiers, and eye, nose and mouth verifiers with their face regions.
pub fn default_cascade_specs() -> Vec<CascadeSpec> {
    use CascadeKind::*;

    vec![
        CascadeSpec::new("haarcascade_frontalface_alt.fchc", FrontalVerifying),
        CascadeSpec::new("haarcascade_frontalface_default.fchc", FrontalVerifying),
        CascadeSpec::new("haarcascade_frontalface_alt2.fchc", Primary),
        CascadeSpec::new("haarcascade_frontalface_alt_tree.fchc", FrontalVerifying),
        CascadeSpec::new("haarcascade_profileface.fchc", FrontalVerifying),
        CascadeSpec::new(
            "haarcascade_mcs_lefteye.fchc",
            FeatureVerifying(FractionalRoi::new(0.0, 0.0, 0.6, 0.6)),
        ),
        CascadeSpec::new(
            "haarcascade_mcs_righteye.fchc",
            FeatureVerifying(FractionalRoi::new(0.4, 0.0, 0.6, 0.6)),
        ),
        CascadeSpec::new(
            "haarcascade_mcs_nose.fchc",
            FeatureVerifying(FractionalRoi::new(0.2, 0.25, 0.6, 0.6)),
        ),
        CascadeSpec::new(
            "haarcascade_mcs_mouth.fchc",
            FeatureVerifying(FractionalRoi::new(0.1, 0.4, 0.8, 0.6)),
        ),
    ]
}

/// Returns the first `dir/file_name` that exists.
pub fn find_file_in_dirs<P: AsRef<Path>>(dirs: &[P], file_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.as_ref().join(file_name))
        .find(|path| path.is_file())
}

/// One detector of the ensemble together with its role.
///
/// A cascade whose model could not be loaded stays in the ensemble but never
/// finds anything.
pub struct Cascade {
    name: String,
    kind: CascadeKind,
    window_size: Size,
    detector: Option<Mutex<Box<dyn ObjectDetector>>>,
    load_error: Option<String>,
}

impl fmt::Debug for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cascade")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("window_size", &self.window_size)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Cascade {
    pub fn new(name: impl Into<String>, kind: CascadeKind, detector: Box<dyn ObjectDetector>) -> Self {
        Cascade {
            name: name.into(),
            kind,
            window_size: detector.window_size(),
            detector: Some(Mutex::new(detector)),
            load_error: None,
        }
    }

    /// A cascade that failed to load and contributes nothing.
    pub fn unloaded(name: impl Into<String>, kind: CascadeKind, load_error: impl Into<String>) -> Self {
        Cascade {
            name: name.into(),
            kind,
            window_size: Size::default(),
            detector: None,
            load_error: Some(load_error.into()),
        }
    }

    /// Resolves `spec.file_name` against `dirs` and loads it as a Haar cascade.
    pub fn load<P: AsRef<Path>>(dirs: &[P], spec: &CascadeSpec) -> Self {
        let path = match find_file_in_dirs(dirs, &spec.file_name) {
            Some(path) => path,
            None => {
                let dirs: Vec<&Path> = dirs.iter().map(|dir| dir.as_ref()).collect();
                warn!("Failed to locate cascade {} in {:?}", spec.file_name, dirs);
                let err = Error::NotFound(spec.file_name.clone());
                return Cascade::unloaded(&spec.file_name, spec.kind, err.to_string());
            }
        };

        debug!("Loading cascade {}", path.display());
        match HaarDetector::load(&path) {
            Ok(detector) => Cascade::new(&spec.file_name, spec.kind, Box::new(detector)),
            Err(e) => {
                warn!("Failed to load cascade {}: {}", path.display(), e);
                Cascade::unloaded(&spec.file_name, spec.kind, e.to_string())
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CascadeKind {
        self.kind
    }

    /// Training window of the detector, `0x0` if unknown or not loaded.
    pub fn window_size(&self) -> Size {
        self.window_size
    }

    pub fn is_loaded(&self) -> bool {
        self.detector.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Region of `face` this cascade examines; the face itself for non-feature cascades.
    pub fn face_roi(&self, face: &Rectangle) -> Rectangle {
        match self.kind {
            CascadeKind::FeatureVerifying(roi) => roi.apply(face),
            _ => *face,
        }
    }

    /// Minimum object size when verifying a face of `face_size`.
    ///
    /// Frontal cascades start slightly below the face size, feature cascades at the
    /// smallest plausible feature size. Sizes below the training window become
    /// `0x0`, i.e. the detector's own minimum.
    pub fn min_size_for_face(&self, face_size: Size) -> Size {
        let factor = if self.kind.is_facial_feature() {
            1.0 / FACE_TO_FEATURE_RELATION_MIN
        } else {
            FRONTAL_MIN_SIZE_FACTOR
        };
        let min_size = Size::new(
            (f64::from(face_size.width) * factor).round() as u32,
            (f64::from(face_size.height) * factor).round() as u32,
        );

        if min_size.less_than(self.window_size) {
            Size::default()
        } else {
            min_size
        }
    }

    /// Runs the detector on `image`. Unloaded cascades return nothing.
    ///
    /// The detector is locked for the duration of the call.
    pub fn classify(&self, image: &ImageData, params: &DetectionParameters) -> Vec<Rectangle> {
        let detector = match &self.detector {
            Some(detector) => detector,
            None => {
                debug!("Cascade {} is not loaded", self.name);
                return vec![];
            }
        };

        let mut detector = detector.lock().unwrap_or_else(PoisonError::into_inner);
        trace!(
            "{}: image size {}x{} scan step {} min neighbors {} pruning {} min size {}x{}",
            self.name,
            image.width(),
            image.height(),
            params.scan_step,
            params.min_neighbors,
            params.pruning,
            params.min_size.width,
            params.min_size.height
        );
        let found = detector.classify(image, params);
        trace!("{} gave {:?}", self.name, found);
        found
    }
}

/// A fixed collection of cascades, populated once.
#[derive(Debug, Default)]
pub struct CascadeSet {
    cascades: Vec<Cascade>,
}

impl CascadeSet {
    pub fn new(cascades: Vec<Cascade>) -> Self {
        CascadeSet { cascades }
    }

    /// Loads every spec from the first directory containing it.
    ///
    /// Missing or broken files are logged and leave that cascade unloaded.
    pub fn load<P: AsRef<Path>>(dirs: &[P], specs: &[CascadeSpec]) -> Self {
        if dirs.is_empty() {
            error!("No cascade directories given, face detection is disabled");
            return CascadeSet::default();
        }

        let set = CascadeSet::new(specs.iter().map(|spec| Cascade::load(dirs, spec)).collect());
        debug!(
            "Loaded {} of {} cascades",
            set.loaded_count(),
            set.len()
        );
        set
    }

    /// Loads [`default_cascade_specs`].
    pub fn with_default_cascades<P: AsRef<Path>>(dirs: &[P]) -> Self {
        Self::load(dirs, &default_cascade_specs())
    }

    pub fn cascades(&self) -> &[Cascade] {
        &self.cascades
    }

    pub fn primary(&self) -> impl Iterator<Item = &Cascade> {
        self.cascades.iter().filter(|c| c.kind.is_primary())
    }

    pub fn verifying(&self) -> impl Iterator<Item = &Cascade> {
        self.cascades.iter().filter(|c| c.kind.is_verifying())
    }

    pub fn primary_count(&self) -> usize {
        self.primary().count()
    }

    pub fn has_verifying(&self) -> bool {
        self.verifying().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.cascades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cascades.is_empty()
    }

    /// Number of cascades whose model loaded; zero means detection always comes up empty.
    pub fn loaded_count(&self) -> usize {
        self.cascades.iter().filter(|c| c.is_loaded()).count()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;
    use crate::model::{write_model, CascadeModel, HaarRect, Stage, WeakClassifier};

    struct Fixed(Size);

    impl ObjectDetector for Fixed {
        fn classify(&mut self, _: &ImageData, _: &DetectionParameters) -> Vec<Rectangle> {
            vec![Rectangle::new(1, 2, 3, 4)]
        }

        fn window_size(&self) -> Size {
            self.0
        }
    }

    fn tiny_model() -> CascadeModel {
        CascadeModel::new(
            Size::new(20, 20),
            vec![Stage {
                threshold: 0.0,
                classifiers: vec![WeakClassifier {
                    rects: vec![HaarRect { x: 0, y: 0, width: 20, height: 20, weight: 1.0 }],
                    threshold: 0.0,
                    left_val: 0.0,
                    right_val: 1.0,
                }],
            }],
        )
    }

    #[test]
    fn test_default_specs_have_one_primary() {
        let specs = default_cascade_specs();
        assert_eq!(9, specs.len());
        assert_eq!(1, specs.iter().filter(|s| s.kind.is_primary()).count());
        assert_eq!(CascadeKind::Primary, specs[2].kind);
        assert_eq!(4, specs.iter().filter(|s| s.kind.is_facial_feature()).count());
    }

    #[test]
    fn test_find_file_in_dirs_takes_first_match() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        File::create(second.path().join("a.fchc")).unwrap();
        File::create(first.path().join("b.fchc")).unwrap();
        File::create(second.path().join("b.fchc")).unwrap();

        let dirs = [first.path(), second.path()];
        assert_eq!(Some(second.path().join("a.fchc")), find_file_in_dirs(&dirs, "a.fchc"));
        assert_eq!(Some(first.path().join("b.fchc")), find_file_in_dirs(&dirs, "b.fchc"));
        assert_eq!(None, find_file_in_dirs(&dirs, "c.fchc"));
    }

    #[test]
    fn test_load_degrades_per_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let mut good = File::create(dir.path().join("good.fchc")).unwrap();
        write_model(&tiny_model(), &mut good).unwrap();
        std::fs::write(dir.path().join("broken.fchc"), b"nonsense").unwrap();

        let specs = [
            CascadeSpec::new("good.fchc", CascadeKind::Primary),
            CascadeSpec::new("broken.fchc", CascadeKind::FrontalVerifying),
            CascadeSpec::new("missing.fchc", CascadeKind::FrontalVerifying),
        ];
        let set = CascadeSet::load(&[dir.path()], &specs);

        assert_eq!(3, set.len());
        assert_eq!(1, set.loaded_count());
        assert_eq!(Size::new(20, 20), set.cascades()[0].window_size());
        assert!(set.cascades()[1].load_error().is_some());
        assert_eq!(
            Some("cascade model file not found: missing.fchc"),
            set.cascades()[2].load_error()
        );
    }

    #[test]
    fn test_no_dirs_gives_empty_set() {
        let dirs: [&Path; 0] = [];
        let set = CascadeSet::with_default_cascades(&dirs);
        assert!(set.is_empty());
        assert_eq!(0, set.loaded_count());
    }

    #[test]
    fn test_unloaded_cascade_finds_nothing() {
        let cascade = Cascade::unloaded("x", CascadeKind::Primary, "gone");
        let data = vec![0u8; 100];
        let found = cascade.classify(&ImageData::new(&data, 10, 10), &DetectionParameters::default());
        assert!(found.is_empty());
    }

    #[test]
    fn test_classify_delegates_to_detector() {
        let cascade = Cascade::new("x", CascadeKind::Primary, Box::new(Fixed(Size::new(20, 20))));
        let data = vec![0u8; 100];
        let found = cascade.classify(&ImageData::new(&data, 10, 10), &DetectionParameters::default());
        assert_eq!(vec![Rectangle::new(1, 2, 3, 4)], found);
    }

    #[test]
    fn test_min_size_for_face() {
        let frontal = Cascade::new("f", CascadeKind::FrontalVerifying, Box::new(Fixed(Size::new(20, 20))));
        assert_eq!(Size::new(60, 48), frontal.min_size_for_face(Size::new(100, 80)));
        assert_eq!(Size::default(), frontal.min_size_for_face(Size::new(30, 30)));

        let roi = FractionalRoi::new(0.0, 0.0, 0.6, 0.6);
        let eye = Cascade::new("e", CascadeKind::FeatureVerifying(roi), Box::new(Fixed(Size::new(18, 12))));
        assert_eq!(Size::new(20, 15), eye.min_size_for_face(Size::new(200, 150)));
        assert_eq!(Size::default(), eye.min_size_for_face(Size::new(100, 100)));
    }

    #[test]
    fn test_face_roi() {
        let face = Rectangle::new(100, 100, 50, 50);
        let frontal = Cascade::unloaded("f", CascadeKind::FrontalVerifying, "");
        assert_eq!(face, frontal.face_roi(&face));

        let nose = Cascade::unloaded(
            "n",
            CascadeKind::FeatureVerifying(FractionalRoi::new(0.2, 0.25, 0.6, 0.6)),
            "",
        );
        assert_eq!(Rectangle::new(110, 113, 30, 30), nose.face_roi(&face));
    }
}

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, GrayImage, Luma};

use facecascade::detector::merge::merge;
use facecascade::model::{HaarRect, Stage, WeakClassifier};
use facecascade::tuning::{tune, Tuning};
use facecascade::{
    preprocess, CascadeDetector, CascadeKind, CascadeModel, Cascade, CascadeSet, DetectionParameters, Detector,
    HaarDetector, ImageData, ObjectDetector, Rectangle, Size,
};

/// A bright square on a dark background, the shape the blob model fires on.
fn blob_model() -> CascadeModel {
    CascadeModel::new(
        Size::new(20, 20),
        vec![Stage {
            threshold: 0.5,
            classifiers: vec![WeakClassifier {
                rects: vec![
                    HaarRect { x: 0, y: 0, width: 20, height: 20, weight: -1.0 },
                    HaarRect { x: 5, y: 5, width: 10, height: 10, weight: 4.0 },
                ],
                threshold: 0.9,
                left_val: 0.0,
                right_val: 1.0,
            }],
        }],
    )
}

fn get_test_image() -> GrayImage {
    GrayImage::from_fn(640, 480, |x, y| {
        if (x / 40 + y / 40) % 5 == 0 {
            Luma([220])
        } else {
            Luma([30])
        }
    })
}

fn haar_classify(c: &mut Criterion) {
    let gray = get_test_image();
    let image = ImageData::from(&gray);
    let mut detector = HaarDetector::new(blob_model());
    let params = DetectionParameters {
        pruning: true,
        ..DetectionParameters::default()
    };

    let mut group = c.benchmark_group("haar_classify");
    group.measurement_time(Duration::new(20, 0)).sample_size(20);
    group.bench_function("640x480", |b| b.iter(|| detector.classify(black_box(&image), &params)));
    group.finish();
}

fn detect_single_image(c: &mut Criterion) {
    let cascades = CascadeSet::new(vec![
        Cascade::new("primary", CascadeKind::Primary, Box::new(HaarDetector::new(blob_model()))),
        Cascade::new("second", CascadeKind::Primary, Box::new(HaarDetector::new(blob_model()))),
        Cascade::new(
            "frontal",
            CascadeKind::FrontalVerifying,
            Box::new(HaarDetector::new(blob_model())),
        ),
    ]);
    let detector = CascadeDetector::new(cascades);
    let gray = get_test_image();
    let image = ImageData::from(&gray);

    let mut group = c.benchmark_group("detect_single_image");
    // Limit the measurement time and the sample size
    // to make sure the benchmark finishes in a feasible amount of time.
    group.measurement_time(Duration::new(60, 0)).sample_size(20);
    group.bench_function("detect", |b| b.iter(|| detector.detect_prepared(black_box(&image), None)));
    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let image = DynamicImage::new_rgb8(2048, 1536);
    c.bench_function("preprocess_prepare", |b| b.iter(|| preprocess::prepare(black_box(&image))));
}

fn bench_merge(c: &mut Criterion) {
    let lists: Vec<Vec<Rectangle>> = (0..3)
        .map(|k| {
            (0..100)
                .map(|i| Rectangle::new((i % 10) * 30 + k, (i / 10) * 30, 40, 40))
                .collect()
        })
        .collect();
    c.bench_function("merge_300", |b| b.iter(|| merge(black_box(lists.clone()), 3, 15, 0)));
}

fn bench_tune(c: &mut Criterion) {
    let tuning = Tuning::new(0.5, 0.5);
    c.bench_function("tune", |b| {
        b.iter(|| tune(black_box(&tuning), Size::new(800, 600), Size::new(4000, 3000)))
    });
}

criterion_group!(detection_perf, haar_classify, detect_single_image);
criterion_group!(pipeline, bench_prepare, bench_merge, bench_tune);
criterion_main!(detection_perf, pipeline);

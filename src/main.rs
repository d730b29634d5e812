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

use std::env::Args;
use std::time::Instant;

use image::{DynamicImage, GenericImageView, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::{error, info};

use facecascade::{preprocess, Detector, ImageData, Rectangle, Size};

const OUTPUT_FILE: &str = "test.png";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match Options::parse(std::env::args()) {
        Ok(options) => options,
        Err(message) => {
            error!("Failed to parse program arguments: {}", message);
            std::process::exit(1)
        }
    };

    let detector = facecascade::create_detector(&[options.cascade_dir()]);

    let image: DynamicImage = match image::open(options.image_path()) {
        Ok(image) => image,
        Err(message) => {
            error!("Failed to read image: {}", message);
            std::process::exit(1)
        }
    };

    let mut rgb = image.to_rgb8();
    for face in detect_faces(&*detector, &image) {
        let rect = Rect::at(face.x(), face.y()).of_size(face.width().max(1), face.height().max(1));
        draw_hollow_rect_mut(&mut rgb, rect, Rgb([255, 0, 0]));
    }

    match rgb.save(OUTPUT_FILE) {
        Ok(_) => info!("Saved result to {}", OUTPUT_FILE),
        Err(message) => error!("Failed to save result to a file. Reason: {}", message),
    }
}

/// Detects faces and maps them back onto `image`.
fn detect_faces(detector: &dyn Detector, image: &DynamicImage) -> Vec<Rectangle> {
    let (width, height) = image.dimensions();
    let prepared = preprocess::prepare(image);
    let sx = f64::from(width) / f64::from(prepared.width().max(1));
    let sy = f64::from(height) / f64::from(prepared.height().max(1));

    let now = Instant::now();
    let faces = detector.detect_prepared(&ImageData::from(&prepared), Some(Size::new(width, height)));
    info!("Found {} faces in {} ms", faces.len(), now.elapsed().as_millis());

    faces.iter().map(|face| face.scaled(sx, sy)).collect()
}

struct Options {
    image_path: String,
    cascade_dir: String,
}

impl Options {
    fn parse(args: Args) -> Result<Self, String> {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() != 3 {
            return Err(format!("Usage: {} <cascade-dir> <image-path>", args[0]));
        }

        let cascade_dir = args[1].clone();
        let image_path = args[2].clone();

        Ok(Options {
            image_path,
            cascade_dir,
        })
    }

    fn image_path(&self) -> &str {
        &self.image_path[..]
    }

    fn cascade_dir(&self) -> &str {
        &self.cascade_dir[..]
    }
}

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

//! Binary Haar cascade models.
//!
//! A model file is little endian:
//!
//! ```text
//! magic "FCHC", u32 version (1)
//! i32 window_width, i32 window_height, i32 num_stages
//! per stage:   f32 threshold, i32 num_weak
//! per weak:    i32 num_rects (1..=3), per rect: i32 x, y, w, h, f32 weight
//!              f32 node_threshold, f32 left_val, f32 right_val
//! ```

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::common::Size;
use crate::error::{Error, Result};

pub const MODEL_MAGIC: &[u8; 4] = b"FCHC";
pub const MODEL_VERSION: u32 = 1;

const MAX_RECTS_PER_FEATURE: i32 = 3;

/// Counts read from a file only reserve this much up front.
const MAX_RESERVED: usize = 1024;

/// One weighted rectangle of a Haar-like feature, in training-window coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct HaarRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f32,
}

/// Decision stump over a single Haar-like feature.
#[derive(Clone, Debug, PartialEq)]
pub struct WeakClassifier {
    pub rects: Vec<HaarRect>,
    pub threshold: f32,
    pub left_val: f32,
    pub right_val: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub threshold: f32,
    pub classifiers: Vec<WeakClassifier>,
}

/// A trained boosted cascade.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeModel {
    window_size: Size,
    stages: Vec<Stage>,
}

impl CascadeModel {
    pub fn new(window_size: Size, stages: Vec<Stage>) -> Self {
        CascadeModel { window_size, stages }
    }

    /// Size of the window the cascade was trained on.
    pub fn window_size(&self) -> Size {
        self.window_size
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// Loads a cascade model from a file.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<CascadeModel> {
    let file = File::open(path)?;
    read_model(BufReader::new(file))
}

/// Reads a cascade model from any byte source.
pub fn read_model<R: Read>(reader: R) -> Result<CascadeModel> {
    ModelReader::new(reader).read()
}

struct ModelReader<R> {
    reader: R,
}

impl<R: Read> ModelReader<R> {
    fn new(reader: R) -> Self {
        ModelReader { reader }
    }

    fn read(mut self) -> Result<CascadeModel> {
        let mut magic = [0u8; 4];
        self.reader.read_exact(&mut magic)?;
        if &magic != MODEL_MAGIC {
            return Err(Error::InvalidModel(format!("bad magic {:?}", magic)));
        }

        let version = self.reader.read_u32::<LittleEndian>()?;
        if version != MODEL_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let window_width = self.read_positive("window width")?;
        let window_height = self.read_positive("window height")?;
        let num_stages = self.read_count("stage count")?;

        let mut stages = Vec::with_capacity(num_stages.min(MAX_RESERVED));
        for _ in 0..num_stages {
            stages.push(self.read_stage(window_width, window_height)?);
        }

        Ok(CascadeModel::new(
            Size::new(window_width, window_height),
            stages,
        ))
    }

    fn read_stage(&mut self, window_width: u32, window_height: u32) -> Result<Stage> {
        let threshold = self.read_f32()?;
        let num_weak = self.read_count("weak classifier count")?;

        let mut classifiers = Vec::with_capacity(num_weak.min(MAX_RESERVED));
        for _ in 0..num_weak {
            let num_rects = self.read_i32()?;
            if num_rects < 1 || num_rects > MAX_RECTS_PER_FEATURE {
                return Err(Error::InvalidModel(format!(
                    "feature with {} rectangles",
                    num_rects
                )));
            }

            let mut rects = Vec::with_capacity(num_rects as usize);
            for _ in 0..num_rects {
                let rect = self.read_rect()?;
                if rect.x + rect.width > window_width || rect.y + rect.height > window_height {
                    return Err(Error::InvalidModel(format!(
                        "feature rectangle {:?} exceeds {}x{} window",
                        rect, window_width, window_height
                    )));
                }
                rects.push(rect);
            }

            classifiers.push(WeakClassifier {
                rects,
                threshold: self.read_f32()?,
                left_val: self.read_f32()?,
                right_val: self.read_f32()?,
            });
        }

        Ok(Stage {
            threshold,
            classifiers,
        })
    }

    fn read_rect(&mut self) -> Result<HaarRect> {
        let x = self.read_count("rectangle x")? as u32;
        let y = self.read_count("rectangle y")? as u32;
        let width = self.read_positive("rectangle width")?;
        let height = self.read_positive("rectangle height")?;
        let weight = self.read_f32()?;
        Ok(HaarRect {
            x,
            y,
            width,
            height,
            weight,
        })
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        let value = self.read_i32()?;
        if value < 0 {
            return Err(Error::InvalidModel(format!("negative {}: {}", what, value)));
        }
        Ok(value as usize)
    }

    fn read_positive(&mut self, what: &str) -> Result<u32> {
        let value = self.read_i32()?;
        if value <= 0 {
            return Err(Error::InvalidModel(format!("{} must be positive: {}", what, value)));
        }
        Ok(value as u32)
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.reader.read_i32::<LittleEndian>()?)
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(self.reader.read_f32::<LittleEndian>()?)
    }
}

/// Writes a model in the format understood by [`read_model`].
pub fn write_model<W: Write>(model: &CascadeModel, writer: &mut W) -> Result<()> {
    writer.write_all(MODEL_MAGIC)?;
    writer.write_u32::<LittleEndian>(MODEL_VERSION)?;
    writer.write_i32::<LittleEndian>(model.window_size.width as i32)?;
    writer.write_i32::<LittleEndian>(model.window_size.height as i32)?;
    writer.write_i32::<LittleEndian>(model.stages.len() as i32)?;

    for stage in &model.stages {
        writer.write_f32::<LittleEndian>(stage.threshold)?;
        writer.write_i32::<LittleEndian>(stage.classifiers.len() as i32)?;
        for weak in &stage.classifiers {
            writer.write_i32::<LittleEndian>(weak.rects.len() as i32)?;
            for rect in &weak.rects {
                writer.write_i32::<LittleEndian>(rect.x as i32)?;
                writer.write_i32::<LittleEndian>(rect.y as i32)?;
                writer.write_i32::<LittleEndian>(rect.width as i32)?;
                writer.write_i32::<LittleEndian>(rect.height as i32)?;
                writer.write_f32::<LittleEndian>(rect.weight)?;
            }
            writer.write_f32::<LittleEndian>(weak.threshold)?;
            writer.write_f32::<LittleEndian>(weak.left_val)?;
            writer.write_f32::<LittleEndian>(weak.right_val)?;
        }
    }
    Ok(())
}

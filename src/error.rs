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

use std::io;

use thiserror::Error;

/// Errors produced while locating or reading cascade models.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read cascade model: {0}")]
    Io(#[from] io::Error),

    #[error("cascade model file not found: {0}")]
    NotFound(String),

    #[error("invalid cascade model: {0}")]
    InvalidModel(String),

    #[error("unsupported cascade model version: {0}")]
    UnsupportedVersion(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

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

use crate::common::Rectangle;

/// Euclidean distance between the centers of two rectangles, rounded to the nearest pixel.
pub fn center_distance(a: &Rectangle, b: &Rectangle) -> i32 {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let dx = f64::from(ax - bx);
    let dy = f64::from(ay - by);
    (dx * dx + dy * dy).sqrt().round() as i32
}

/// Collapses detections of the same face found by different primary cascades.
///
/// The lists are concatenated in order. Walking from the front, each surviving
/// face removes every later face whose center lies closer than `max_distance`
/// and counts it as a duplicate; a face with fewer than `min_duplicates`
/// duplicates is dropped itself. Faces are never compared with earlier ones, so
/// the outcome depends on the input order.
///
/// With at most one primary cascade nothing is merged.
pub fn merge(
    lists: Vec<Vec<Rectangle>>,
    primary_cascades: usize,
    max_distance: i32,
    min_duplicates: u32,
) -> Vec<Rectangle> {
    let mut faces: Vec<Rectangle> = lists.into_iter().flatten().collect();
    if primary_cascades <= 1 {
        return faces;
    }

    let mut comparisons = 0;
    let mut i = 0;
    while i < faces.len() {
        let anchor = faces[i];
        let mut rest = faces.split_off(i + 1);
        let compared = rest.len();
        rest.retain(|face| center_distance(&anchor, face) >= max_distance);
        let duplicates = (compared - rest.len()) as u32;
        comparisons += compared;
        faces.append(&mut rest);

        if duplicates < min_duplicates {
            faces.remove(i);
        } else {
            i += 1;
        }
    }

    debug!("Faces parsed: {} number of final faces: {}", comparisons, faces.len());
    faces
}

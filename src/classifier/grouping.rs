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

use crate::common::Rectangle;

/// Relative tolerance when deciding that two raw hits describe the same object.
pub const GROUP_EPS: f64 = 0.2;

/// Clusters raw sliding-window hits and keeps the well supported clusters.
///
/// Hits are partitioned into classes of similar rectangles, each class is replaced
/// by its average rectangle, and classes with `min_neighbors` or fewer members are
/// dropped. A class lying inside a stronger neighbouring class is dropped as well.
/// With `min_neighbors == 0` the hits are returned untouched.
pub fn group_rectangles(rects: Vec<Rectangle>, min_neighbors: u32, eps: f64) -> Vec<Rectangle> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects;
    }

    let (labels, num_classes) = partition(&rects, |a, b| similar(a, b, eps));

    let mut sums = vec![[0i64; 4]; num_classes];
    let mut counts = vec![0u32; num_classes];
    for (rect, &label) in rects.iter().zip(labels.iter()) {
        let sum = &mut sums[label];
        sum[0] += i64::from(rect.x());
        sum[1] += i64::from(rect.y());
        sum[2] += i64::from(rect.width());
        sum[3] += i64::from(rect.height());
        counts[label] += 1;
    }

    let averages: Vec<Rectangle> = sums
        .iter()
        .zip(counts.iter())
        .map(|(sum, &n)| {
            let n = f64::from(n);
            Rectangle::new(
                (sum[0] as f64 / n).round() as i32,
                (sum[1] as f64 / n).round() as i32,
                (sum[2] as f64 / n).round() as u32,
                (sum[3] as f64 / n).round() as u32,
            )
        })
        .collect();

    let mut grouped = Vec::new();
    for (i, r1) in averages.iter().enumerate() {
        let n1 = counts[i];
        if n1 <= min_neighbors {
            continue;
        }

        let swallowed = averages.iter().enumerate().any(|(j, r2)| {
            let n2 = counts[j];
            if i == j || n2 <= min_neighbors {
                return false;
            }
            let dx = (f64::from(r2.width()) * eps).round() as i32;
            let dy = (f64::from(r2.height()) * eps).round() as i32;

            r1.x() >= r2.x() - dx
                && r1.y() >= r2.y() - dy
                && r1.right() <= r2.right() + dx
                && r1.bottom() <= r2.bottom() + dy
                && (n2 > n1.max(3) || n1 < 3)
        });

        if !swallowed {
            grouped.push(*r1);
        }
    }
    grouped
}

fn similar(a: &Rectangle, b: &Rectangle, eps: f64) -> bool {
    let delta = eps
        * f64::from(a.width().min(b.width()) + a.height().min(b.height()))
        * 0.5;
    let close = |p: i32, q: i32| f64::from((p - q).abs()) <= delta;

    close(a.x(), b.x())
        && close(a.y(), b.y())
        && close(a.right(), b.right())
        && close(a.bottom(), b.bottom())
}

/// Splits `items` into equivalence classes of the transitive closure of `equal`.
///
/// Returns one label per item and the number of classes. Labels are numbered in
/// order of first appearance.
fn partition<T, F>(items: &[T], equal: F) -> (Vec<usize>, usize)
where
    F: Fn(&T, &T) -> bool,
{
    let mut parent: Vec<usize> = (0..items.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if equal(&items[i], &items[j]) {
                let root_i = find(&mut parent, i);
                let root_j = find(&mut parent, j);
                if root_i != root_j {
                    parent[root_j] = root_i;
                }
            }
        }
    }

    let mut class_of_root = vec![usize::MAX; items.len()];
    let mut num_classes = 0;
    let mut labels = Vec::with_capacity(items.len());
    for i in 0..items.len() {
        let root = find(&mut parent, i);
        if class_of_root[root] == usize::MAX {
            class_of_root[root] = num_classes;
            num_classes += 1;
        }
        labels.push(class_of_root[root]);
    }
    (labels, num_classes)
}

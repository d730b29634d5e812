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

use num::PrimInt;

use crate::common::ImageData;

/// Fills `dest` with the `(width + 1) x (height + 1)` integral image of `src`,
/// mapping every pixel through `f` first. Row and column 0 are zero.
pub fn integral_image<T, F>(src: &ImageData, dest: &mut Vec<T>, f: F)
where
    T: PrimInt,
    F: Fn(u8) -> T,
{
    let stride = src.width() as usize + 1;
    dest.clear();
    dest.resize(stride * (src.height() as usize + 1), T::zero());

    for y in 0..src.height() as usize {
        let mut row_sum = T::zero();
        for (x, &value) in src.row(y as u32).iter().enumerate() {
            row_sum = row_sum + f(value);
            let idx = (y + 1) * stride + x + 1;
            dest[idx] = dest[idx - stride] + row_sum;
        }
    }
}

/// Sum of the `w x h` block at `(x, y)` of an integral image `stride` entries wide.
#[inline]
pub fn rect_sum<T: PrimInt>(integral: &[T], stride: usize, x: usize, y: usize, w: usize, h: usize) -> T {
    let top = y * stride;
    let bottom = (y + h) * stride;
    integral[bottom + x + w] + integral[top + x] - integral[bottom + x] - integral[top + x + w]
}

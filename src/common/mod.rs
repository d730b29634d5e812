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

mod image_pyramid;

use std::cmp;
use std::mem;

pub use self::image_pyramid::{ImageData, ImagePyramid};

/// Axis-aligned rectangle in pixel coordinates of a specific image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn set_x(&mut self, x: i32) {
        self.x = x;
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn set_y(&mut self, y: i32) {
        self.y = y;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = width;
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    /// First column to the right of the rectangle.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// First row below the rectangle.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Center pixel, rounded towards the top-left corner for even sizes.
    pub fn center(&self) -> (i32, i32) {
        let x2 = self.right() - 1;
        let y2 = self.bottom() - 1;
        ((self.x + x2) / 2, (self.y + y2) / 2)
    }

    /// Overlapping part of two rectangles, or `None` if they do not overlap.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let x = cmp::max(self.x, other.x);
        let y = cmp::max(self.y, other.y);
        let right = cmp::min(self.right(), other.right());
        let bottom = cmp::min(self.bottom(), other.bottom());

        if right <= x || bottom <= y {
            return None;
        }
        Some(Rectangle::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    /// Clips the rectangle to `[0, width) x [0, height)`.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Rectangle> {
        self.intersection(&Rectangle::new(0, 0, width, height))
    }

    /// Maps the rectangle into a coordinate space scaled by `(sx, sy)`.
    ///
    /// Used to bring detections found on a downscaled buffer back onto the original image.
    pub fn scaled(&self, sx: f64, sy: f64) -> Rectangle {
        Rectangle::new(
            (f64::from(self.x) * sx).round() as i32,
            (f64::from(self.y) * sy).round() as i32,
            (f64::from(self.width) * sx).round() as u32,
            (f64::from(self.height) * sy).round() as u32,
        )
    }
}

/// Width and height in pixels. `0x0` means "unknown" or "no constraint".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// True if either side is smaller than the corresponding side of `other`.
    #[inline]
    pub fn less_than(&self, other: Size) -> bool {
        self.width < other.width || self.height < other.height
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Size::new(width, height)
    }
}

/// Region of a face rectangle, given as fractions of the face's own width and height.
///
/// Feature cascades (eyes, nose, mouth) only look inside this part of a candidate face.
/// Widths may exceed what is left of the face on purpose; the resulting region is
/// clipped against the image, not against the face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalRoi {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FractionalRoi {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        FractionalRoi {
            x,
            y,
            width,
            height,
        }
    }

    /// Absolute rectangle of this region inside `face`.
    pub fn apply(&self, face: &Rectangle) -> Rectangle {
        let w = f64::from(face.width());
        let h = f64::from(face.height());
        Rectangle::new(
            (f64::from(face.x()) + self.x * w).round() as i32,
            (f64::from(face.y()) + self.y * h).round() as i32,
            (self.width * w).round() as u32,
            (self.height * h).round() as u32,
        )
    }
}

pub struct Seq<T, G>
where
    G: Fn(&T) -> T + Sized,
{
    generator: G,
    next: T,
}

impl<T, G> Seq<T, G>
where
    G: Fn(&T) -> T + Sized,
{
    pub fn new(first_element: T, generator: G) -> Self {
        Seq {
            generator,
            next: first_element,
        }
    }
}

impl<T, G> Iterator for Seq<T, G>
where
    G: Fn(&T) -> T + Sized,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let next = (self.generator)(&self.next);
        let current = mem::replace(&mut self.next, next);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_seq_take_while() {
        let seq = Seq::new(1.0, |x| x * 2.0);
        assert_eq!(
            vec![1.0, 2.0, 4.0, 8.0],
            seq.take_while(|x| *x < 10.0).collect::<Vec<f64>>()
        );
    }

    #[test]
    fn test_center_matches_inclusive_corners() {
        assert_eq!((124, 124), Rectangle::new(100, 100, 50, 50).center());
        assert_eq!((1, 1), Rectangle::new(0, 0, 3, 3).center());
    }

    #[test]
    fn test_intersection() {
        let a = Rectangle::new(0, 0, 10, 10);
        let b = Rectangle::new(5, 5, 10, 10);
        assert_eq!(Some(Rectangle::new(5, 5, 5, 5)), a.intersection(&b));
        assert_eq!(None, a.intersection(&Rectangle::new(10, 0, 5, 5)));
    }

    #[test]
    fn test_clip_to_image() {
        let r = Rectangle::new(-5, 90, 20, 20);
        assert_eq!(Some(Rectangle::new(0, 90, 15, 10)), r.clip_to(100, 100));
        assert_eq!(None, Rectangle::new(100, 0, 5, 5).clip_to(100, 100));
    }

    #[test]
    fn test_fractional_roi_apply() {
        let face = Rectangle::new(100, 100, 50, 50);
        let mouth = FractionalRoi::new(0.1, 0.4, 0.8, 0.6);
        assert_eq!(Rectangle::new(105, 120, 40, 30), mouth.apply(&face));
    }

    #[test]
    fn test_scaled() {
        let r = Rectangle::new(10, 20, 30, 40);
        assert_eq!(Rectangle::new(20, 40, 60, 80), r.scaled(2.0, 2.0));
    }
}

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

use std::cmp;

use image::GrayImage;

use super::Rectangle;

/// Borrowed view of a single-channel 8-bit image.
///
/// Rows are `stride` bytes apart, so a view can describe a sub-region of a larger
/// buffer without copying it.
#[derive(Clone, Copy, Debug)]
pub struct ImageData<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: u32,
}

impl<'a> ImageData<'a> {
    /// # Panics
    ///
    /// Panics if `data` holds fewer than `width * height` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        Self::with_stride(data, width, height, width)
    }

    /// # Panics
    ///
    /// Panics if `data` is too short for the requested geometry or `stride < width`.
    pub fn with_stride(data: &'a [u8], width: u32, height: u32, stride: u32) -> Self {
        assert!(stride >= width, "stride {} < width {}", stride, width);
        if width > 0 && height > 0 {
            let needed = (height as usize - 1) * stride as usize + width as usize;
            assert!(
                data.len() >= needed,
                "buffer of {} bytes is too small for {}x{} (stride {})",
                data.len(),
                width,
                height,
                stride
            );
        }
        ImageData {
            data,
            width,
            height,
            stride,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride as usize;
        &self.data[start..start + self.width as usize]
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.stride as usize + x as usize]
    }

    /// View of `roi`, or `None` if `roi` is empty or not fully inside the image.
    pub fn sub_image(&self, roi: Rectangle) -> Option<ImageData<'a>> {
        if roi.is_empty()
            || roi.x() < 0
            || roi.y() < 0
            || roi.right() > self.width as i32
            || roi.bottom() > self.height as i32
        {
            return None;
        }
        let offset = roi.y() as usize * self.stride as usize + roi.x() as usize;
        Some(ImageData::with_stride(
            &self.data[offset..],
            roi.width(),
            roi.height(),
            self.stride,
        ))
    }

    /// Copies the pixels into a tightly packed buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity((self.width * self.height) as usize);
        for y in 0..self.height {
            buf.extend_from_slice(self.row(y));
        }
        buf
    }
}

impl<'a> From<&'a GrayImage> for ImageData<'a> {
    fn from(image: &'a GrayImage) -> Self {
        let (width, height) = image.dimensions();
        ImageData::new(image.as_raw(), width, height)
    }
}

/// Successively downscaled copies of an image, one per detection scale.
pub struct ImagePyramid {
    min_scale: f32,
    scale_factor: f32,
    scale_step: f32,
    width1x: u32,
    height1x: u32,
    img_buf: Vec<u8>,
    img_buf_scaled: Vec<u8>,
}

impl ImagePyramid {
    pub fn new() -> Self {
        ImagePyramid {
            min_scale: 1.0,
            scale_factor: 1.0,
            scale_step: 0.8,
            width1x: 0,
            height1x: 0,
            img_buf: Vec::new(),
            img_buf_scaled: Vec::new(),
        }
    }

    pub fn set_min_scale(&mut self, min_scale: f32) {
        self.min_scale = min_scale;
    }

    pub fn set_scale_step(&mut self, scale_step: f32) {
        if scale_step > 0.0 && scale_step < 1.0 {
            self.scale_step = scale_step;
        }
    }

    pub fn set_image_1x(&mut self, image: &ImageData) {
        self.width1x = image.width();
        self.height1x = image.height();
        self.img_buf = image.to_vec();
        self.scale_factor = 1.0;
    }

    /// Skips levels until the scale factor drops to `max_scale` or below.
    pub fn skip_to_scale(&mut self, max_scale: f32) {
        while self.scale_factor > max_scale && self.scale_factor >= self.min_scale {
            self.scale_factor *= self.scale_step;
        }
    }

    /// Next pyramid level together with its scale factor relative to the 1x image.
    pub fn get_next_scale_image(&mut self) -> Option<(ImageData, f32)> {
        if self.width1x == 0 || self.height1x == 0 || self.scale_factor < self.min_scale {
            return None;
        }

        let scale_factor = self.scale_factor;
        let width_scaled = (self.width1x as f32 * scale_factor) as u32;
        let height_scaled = (self.height1x as f32 * scale_factor) as u32;
        if width_scaled == 0 || height_scaled == 0 {
            return None;
        }

        let src = ImageData::new(&self.img_buf, self.width1x, self.height1x);
        resize_image(&src, &mut self.img_buf_scaled, width_scaled, height_scaled);
        self.scale_factor *= self.scale_step;

        Some((
            ImageData::new(&self.img_buf_scaled, width_scaled, height_scaled),
            scale_factor,
        ))
    }
}

impl Default for ImagePyramid {
    fn default() -> Self {
        Self::new()
    }
}

/// Bilinear resize of `src` into `dest`, which is resized to `width * height` bytes.
pub fn resize_image(src: &ImageData, dest: &mut Vec<u8>, width: u32, height: u32) {
    dest.clear();
    if src.width() == width && src.height() == height {
        for y in 0..height {
            dest.extend_from_slice(src.row(y));
        }
        return;
    }
    dest.resize((width * height) as usize, 0);
    if src.is_empty() {
        return;
    }

    let lf_x_scl = f64::from(src.width()) / f64::from(width);
    let lf_y_scl = f64::from(src.height()) / f64::from(height);
    let max_x = src.width() - 1;
    let max_y = src.height() - 1;

    for y in 0..height {
        let lf_y_s = lf_y_scl * f64::from(y);
        let n_y_s = cmp::min(lf_y_s as u32, max_y.saturating_sub(1));
        let n_y_s1 = cmp::min(n_y_s + 1, max_y);
        let lf_weight_y = (lf_y_s - f64::from(n_y_s)).min(1.0);

        for x in 0..width {
            let lf_x_s = lf_x_scl * f64::from(x);
            let n_x_s = cmp::min(lf_x_s as u32, max_x.saturating_sub(1));
            let n_x_s1 = cmp::min(n_x_s + 1, max_x);
            let lf_weight_x = (lf_x_s - f64::from(n_x_s)).min(1.0);

            let d1 = f64::from(src.pixel(n_x_s, n_y_s));
            let d2 = f64::from(src.pixel(n_x_s1, n_y_s));
            let d3 = f64::from(src.pixel(n_x_s, n_y_s1));
            let d4 = f64::from(src.pixel(n_x_s1, n_y_s1));

            let dest_val = (1.0 - lf_weight_y) * ((1.0 - lf_weight_x) * d1 + lf_weight_x * d2)
                + lf_weight_y * ((1.0 - lf_weight_x) * d3 + lf_weight_x * d4);

            dest[(y * width + x) as usize] = dest_val as u8;
        }
    }
}

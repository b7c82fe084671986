extern crate image as image_rs;
extern crate nalgebra as na;

use image_rs::{GrayImage, DynamicImage, Pixel, Luma};
use na::DMatrix;

use crate::Float;
use self::image_encoding::ImageEncoding;

pub mod image_encoding;

/// Single channel floating point pixel grid. The buffer is addressed as (row, column),
/// i.e. (y, x). Values are expected to lie in [0,1] when the detector thresholds are
/// left at their defaults.
#[derive(Debug,Clone)]
pub struct Image {
    pub buffer: DMatrix<Float>,
    pub original_encoding: ImageEncoding
}

impl Image {

    pub fn width(&self) -> usize {
        self.buffer.ncols()
    }

    pub fn height(&self) -> usize {
        self.buffer.nrows()
    }

    pub fn empty(width: usize, height: usize, image_encoding: ImageEncoding) -> Image {
        let buffer = DMatrix::<Float>::zeros(height, width);
        Image{buffer, original_encoding: image_encoding}
    }

    pub fn from_matrix(matrix: &DMatrix<Float>, original_encoding: ImageEncoding, normalize: bool) -> Image {
        let mut buffer = matrix.clone();

        if normalize {
            let max = buffer.amax();
            if max > 0.0 {
                buffer /= max;
            }
        }

        Image{buffer, original_encoding}
    }

    pub fn from_gray_image(image: &GrayImage, normalize: bool) -> Image {
        let mut buffer = Image::image8_to_matrix(image);

        if normalize {
            let max = buffer.amax();
            if max > 0.0 {
                buffer /= max;
            }
        }

        Image{buffer, original_encoding: ImageEncoding::U8}
    }

    pub fn to_image(&self) -> GrayImage {
        Image::matrix_to_image(&self.buffer, self.original_encoding)
    }

    /// Plain 2x decimation. Anti-aliasing is the caller's concern, the pyramid
    /// downsamples a level that already carries twice the base blur.
    pub fn downsample_half(image: &Image) -> Image {
        let width = image.width();
        let height = image.height();
        assert!(width >= 2 && height >= 2);

        let new_width = width/2;
        let new_height = height/2;

        let mut new_buffer = DMatrix::<Float>::zeros(new_height, new_width);
        for y in 0..new_height {
            for x in 0..new_width {
                new_buffer[(y,x)] = image.buffer[(2*y,2*x)];
            }
        }

        Image{
            buffer: new_buffer,
            original_encoding: image.original_encoding
        }
    }

    /// Bilinear 2x upsampling, used to seed the pyramid when the initial image is doubled.
    pub fn upsample_double(image: &Image) -> Image {
        let width = image.width();
        let height = image.height();

        let new_width = width*2;
        let new_height = height*2;

        let old_buffer = &image.buffer;
        let mut new_buffer = DMatrix::<Float>::zeros(new_height, new_width);

        for y in 0..new_height {
            for x in 0..new_width {
                let x_source = (x as Float)/2.0;
                let y_source = (y as Float)/2.0;

                let x0 = x_source.trunc() as usize;
                let y0 = y_source.trunc() as usize;
                let x1 = std::cmp::min(x0 + 1, width - 1);
                let y1 = std::cmp::min(y0 + 1, height - 1);

                let x_frac = x_source.fract();
                let y_frac = y_source.fract();

                new_buffer[(y,x)] =
                    (1.0 - x_frac)*(1.0 - y_frac)*old_buffer[(y0,x0)] +
                    x_frac*(1.0 - y_frac)*old_buffer[(y0,x1)] +
                    (1.0 - x_frac)*y_frac*old_buffer[(y1,x0)] +
                    x_frac*y_frac*old_buffer[(y1,x1)];
            }
        }

        Image{
            buffer: new_buffer,
            original_encoding: image.original_encoding
        }
    }

    fn image8_to_matrix(gray_image: &GrayImage) -> DMatrix<Float> {
        let (width, height) = gray_image.dimensions();
        let size = (width*height) as usize;
        let mut vec_column_major: Vec<Float> = Vec::with_capacity(size);
        for x in 0..width {
            for y in 0..height {
                let pixel = gray_image.get_pixel(x, y);
                let pixel_value = pixel.channels()[0];
                vec_column_major.push(pixel_value as Float);
            }
        }
        DMatrix::<Float>::from_vec(height as usize, width as usize, vec_column_major)
    }

    fn matrix_to_image(matrix: &DMatrix<Float>, encoding: ImageEncoding) -> GrayImage {
        let (rows, cols) = matrix.shape();

        let mut gray_image = DynamicImage::new_luma8(cols as u32, rows as u32).to_luma8();
        let max = matrix.max();
        let min = matrix.min();
        for c in 0..cols {
            for r in 0..rows {
                let val = *matrix.index((r, c));
                let pixel_value = encoding.normalize_to_gray(max, min, val);
                gray_image.put_pixel(c as u32, r as u32, Luma([pixel_value]));
            }
        }
        gray_image
    }

}

use crate::image::Image;
use crate::{Float, GradientDirection};
use self::{kernel::Kernel, gauss_kernel::GaussKernel1D};

pub mod kernel;
pub mod gauss_kernel;
pub mod prewitt_kernel;
pub mod laplace_kernel;

/// Convolves a single image (HORIZONTAL/VERTICAL) or a stack of equally sized images
/// along the scale axis (SIGMA). Borders are clamped.
pub fn filter_1d_convolution(source_images: &Vec<&Image>, sigma_level: usize, filter_direction: GradientDirection, filter_kernel: &dyn Kernel, normalize: bool) -> Image {
    let kernel = filter_kernel.kernel();
    let kernel_radius = filter_kernel.radius();
    let kernel_radius_signed = kernel_radius as isize;

    let source = &source_images[sigma_level];
    let buffer = &source.buffer;
    let width = buffer.ncols();
    let height = buffer.nrows();
    let mut target = Image::empty(width, height, source.original_encoding);

    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for kernel_idx in -kernel_radius_signed..kernel_radius_signed+1 {

                let sample_value = match filter_direction {
                    GradientDirection::HORIZONTAL => {
                        let sample_idx = (x as isize) + kernel_idx;
                        match sample_idx {
                            idx if idx < 0 => buffer.index((y,0)),
                            idx if idx >= width as isize => buffer.index((y,width-1)),
                            idx => buffer.index((y,idx as usize))
                        }
                    },
                    GradientDirection::VERTICAL => {
                        let sample_idx = (y as isize) + kernel_idx;
                        match sample_idx {
                            idx if idx < 0 => buffer.index((0,x)),
                            idx if idx >= height as isize => buffer.index((height-1,x)),
                            idx => buffer.index((idx as usize,x))
                        }
                    },
                    GradientDirection::SIGMA => {
                        let sample_idx = sigma_level as isize + kernel_idx;
                        let sample_buffer = match sample_idx {
                            idx if idx < 0 => &source_images[0].buffer,
                            idx if idx >= source_images.len() as isize => &source_images[source_images.len()-1].buffer,
                            idx => &source_images[idx as usize].buffer
                        };
                        sample_buffer.index((y,x))
                    }
                };

                let kernel_value = kernel[(kernel_idx + kernel_radius_signed) as usize];
                acc += sample_value*kernel_value;
            }

            target.buffer[(y,x)] = acc/filter_kernel.normalizing_constant();
        }
    }

    if normalize {
        target.buffer.normalize_mut();
    }
    target
}

/// Convolved value at a single sample location. The caller has to guarantee that the
/// kernel fits, see Octave::within_range.
pub fn gradient_convolution_at_sample(source_images: &Vec<&Image>, x: usize, y: usize, sigma_level: usize, filter_kernel: &dyn Kernel, gradient_direction: GradientDirection) -> Float {
    let kernel = filter_kernel.kernel();
    let kernel_radius = filter_kernel.radius();
    let kernel_radius_signed = kernel_radius as isize;

    let buffer = &source_images[sigma_level].buffer;
    let width = buffer.ncols();
    let height = buffer.nrows();

    match gradient_direction {
        GradientDirection::HORIZONTAL => assert!(x >= kernel_radius && x + kernel_radius < width),
        GradientDirection::VERTICAL => assert!(y >= kernel_radius && y + kernel_radius < height),
        GradientDirection::SIGMA => assert!(sigma_level >= kernel_radius && sigma_level + kernel_radius < source_images.len())
    }

    let mut acc = 0.0;
    for kernel_idx in -kernel_radius_signed..kernel_radius_signed+1 {
        let kernel_value = kernel[(kernel_idx + kernel_radius_signed) as usize];

        let sample_value = match gradient_direction {
            GradientDirection::HORIZONTAL => {
                let sample_idx = (x as isize + kernel_idx) as usize;
                buffer[(y,sample_idx)]
            },
            GradientDirection::VERTICAL => {
                let sample_idx = (y as isize + kernel_idx) as usize;
                buffer[(sample_idx,x)]
            },
            GradientDirection::SIGMA => {
                let sample_idx = (sigma_level as isize + kernel_idx) as usize;
                source_images[sample_idx].buffer[(y,x)]
            }
        };

        acc += sample_value*kernel_value;
    }

    acc/filter_kernel.normalizing_constant()
}

pub fn gaussian_2_d_convolution(image: &Image, filter_kernel: &GaussKernel1D, normalize: bool) -> Image {
    let vec = vec![image];
    let blur_hor = filter_1d_convolution(&vec, 0, GradientDirection::HORIZONTAL, filter_kernel, false);
    let vec_2 = vec![&blur_hor];
    filter_1d_convolution(&vec_2, 0, GradientDirection::VERTICAL, filter_kernel, normalize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::image_encoding::ImageEncoding;
    use na::DMatrix;
    use nalgebra as na;

    #[test]
    fn gaussian_blur_preserves_constant_image() {
        let buffer = DMatrix::<Float>::from_element(16, 16, 0.5);
        let image = Image::from_matrix(&buffer, ImageEncoding::F64, false);
        let kernel = GaussKernel1D::new(0.0, 1.6, 4);
        let blurred = gaussian_2_d_convolution(&image, &kernel, false);

        for value in blurred.buffer.iter() {
            assert!((value - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn central_difference_of_ramp_is_slope() {
        let buffer = DMatrix::<Float>::from_fn(8, 8, |_, c| 0.25*(c as Float));
        let image = Image::from_matrix(&buffer, ImageEncoding::F64, false);
        let images = vec![&image];
        let kernel = super::prewitt_kernel::PrewittKernel::new();

        let dx = gradient_convolution_at_sample(&images, 4, 4, 0, &kernel, GradientDirection::HORIZONTAL);
        let dy = gradient_convolution_at_sample(&images, 4, 4, 0, &kernel, GradientDirection::VERTICAL);
        assert!((dx - 0.25).abs() < 1e-12);
        assert!(dy.abs() < 1e-12);
    }
}

use crate::image::{Image, image_encoding::ImageEncoding};
use crate::filter::{gauss_kernel::GaussKernel1D, prewitt_kernel::PrewittKernel, gaussian_2_d_convolution, filter_1d_convolution};
use crate::runtime_params::DetectorRuntimeParams;
use crate::{Float, GradientDirection};

/// One doubling of scale: s+3 progressively blurred images, their s+2 adjacent
/// differences, and the gradient planes needed later by orientation assignment,
/// descriptor sampling and sub-pixel refinement.
#[derive(Debug,Clone)]
pub struct Octave {
    pub images: Vec<Image>,
    pub x_gradient: Vec<Image>,
    pub y_gradient: Vec<Image>,
    pub difference_of_gaussians: Vec<Image>,
    pub dog_x_gradient: Vec<Image>,
    pub dog_y_gradient: Vec<Image>,
    pub dog_s_gradient: Vec<Image>,
    pub sigmas: Vec<Float>,
    pub octave_level: usize
}

impl Octave {

    pub fn build_octave(base_image: &Image, octave_level: usize, sigma_initial: Float, runtime_params: &DetectorRuntimeParams) -> Octave {
        let s = runtime_params.sigma_count;
        let image_count = s + 3;
        let range = 0..image_count;

        let prewitt_kernel = PrewittKernel::new();

        let sigmas: Vec<Float> = range.clone().map(|level| sigma_initial*Octave::generate_k(level as Float, s as Float)).collect();
        // The base image already carries sigma_initial of blur, so each level only adds
        // the difference in quadrature.
        let images: Vec<Image> = sigmas.iter().map(|&sigma| {
            let sigma_extra_squared = sigma.powi(2) - sigma_initial.powi(2);
            match sigma_extra_squared {
                v if v <= 0.0 => base_image.clone(),
                v => {
                    let sigma_extra = v.sqrt();
                    let half_width = GaussKernel1D::half_width_for_sigma(runtime_params.blur_half_factor, sigma_extra);
                    let kernel = GaussKernel1D::new(0.0, sigma_extra, half_width);
                    gaussian_2_d_convolution(base_image, &kernel, false)
                }
            }
        }).collect();

        let image_borrows: Vec<&Image> = images.iter().collect();
        let x_gradient: Vec<Image> = range.clone().map(|level| filter_1d_convolution(&image_borrows, level, GradientDirection::HORIZONTAL, &prewitt_kernel, false)).collect();
        let y_gradient: Vec<Image> = range.clone().map(|level| filter_1d_convolution(&image_borrows, level, GradientDirection::VERTICAL, &prewitt_kernel, false)).collect();

        let mut difference_of_gaussians: Vec<Image> = Vec::with_capacity(image_count-1);
        for i in 0..images.len()-1 {
            let difference_buffer = &images[i+1].buffer - &images[i].buffer;
            difference_of_gaussians.push(Image::from_matrix(&difference_buffer, ImageEncoding::F64, false));
        }

        let dog_borrows: Vec<&Image> = difference_of_gaussians.iter().collect();
        let dog_range = 0..difference_of_gaussians.len();

        let dog_x_gradient: Vec<Image> = dog_range.clone().map(|level| filter_1d_convolution(&dog_borrows, level, GradientDirection::HORIZONTAL, &prewitt_kernel, false)).collect();
        let dog_y_gradient: Vec<Image> = dog_range.clone().map(|level| filter_1d_convolution(&dog_borrows, level, GradientDirection::VERTICAL, &prewitt_kernel, false)).collect();
        let dog_s_gradient: Vec<Image> = dog_range.clone().map(|level| filter_1d_convolution(&dog_borrows, level, GradientDirection::SIGMA, &prewitt_kernel, false)).collect();

        Octave {images, x_gradient, y_gradient, difference_of_gaussians, dog_x_gradient, dog_y_gradient, dog_s_gradient, sigmas, octave_level}
    }

    fn generate_k(n: Float, s: Float) -> Float {
        assert!(n >= 0.0);
        (n/s).exp2()
    }

    /// Image seeding the next octave, blurred at twice the base sigma.
    pub fn base_image_for_next_octave(&self) -> &Image {
        &self.images[self.s()]
    }

    pub fn s(&self) -> usize {
        self.sigmas.len() - 3
    }

    pub fn width(&self) -> usize {
        self.images[0].width()
    }

    pub fn height(&self) -> usize {
        self.images[0].height()
    }

    /// Continuous octave-local sigma for a fractional DoG level.
    pub fn sigma_for_level(&self, sigma_level: Float) -> Float {
        self.sigmas[0]*Octave::generate_k(sigma_level.max(0.0), self.s() as Float)
    }

    pub fn within_range(&self, x: usize, y: usize, sigma_level: usize, kernel_radius: usize) -> bool {
        let height = self.height();
        let width = self.width();
        let sigma_size = self.difference_of_gaussians.len();
        y >= kernel_radius && y < height - kernel_radius &&
        x >= kernel_radius && x < width - kernel_radius &&
        sigma_level >= kernel_radius && sigma_level < sigma_size - kernel_radius
    }
}

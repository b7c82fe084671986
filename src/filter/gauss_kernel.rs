use crate::{Float,float};
use float::consts::PI;
use super::kernel::Kernel;

pub struct GaussKernel1D {
    kernel: Vec<Float>,
    normalizing_constant: Float
}

impl GaussKernel1D {
    fn sample(mean: Float, std: Float, x: Float) -> Float {
        let exponent = (-0.5*((x-mean)/std).powi(2)).exp();
        let factor = 1.0/(std*(2.0*PI).sqrt());
        factor*exponent
    }

    pub fn new(mean: Float, std: Float, half_width: usize) -> GaussKernel1D {
        assert!(std > 0.0);

        let start = -(half_width as isize);
        let end_exclusive = half_width as isize + 1;
        let kernel: Vec<Float> = (start..end_exclusive).map(|x| GaussKernel1D::sample(mean, std, x as Float)).collect();
        // normalized so that the discrete taps sum to one
        let normalizing_constant = kernel.iter().sum();
        GaussKernel1D {
            kernel,
            normalizing_constant
        }
    }

    pub fn half_width_for_sigma(blur_half_factor: Float, sigma: Float) -> usize {
        (blur_half_factor*sigma).ceil() as usize
    }
}

impl Kernel for GaussKernel1D {
    fn kernel(&self) -> &Vec<Float> {
        &self.kernel
    }

    fn normalizing_constant(&self) -> Float {
        self.normalizing_constant
    }
}

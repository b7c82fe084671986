extern crate nalgebra as na;

use na::{Matrix2, Matrix3, Matrix3x1};

use crate::{Float, GradientDirection};
use crate::image::Image;
use crate::pyramid::octave::Octave;
use crate::runtime_params::DetectorRuntimeParams;
use crate::filter::{kernel::Kernel, gradient_convolution_at_sample, prewitt_kernel::PrewittKernel, laplace_kernel::LaplaceKernel};
use crate::extrema::ExtremaParameters;

/// Iteratively fits a quadratic to the local DoG response and shifts the candidate
/// toward the fitted peak. Candidates that do not converge within the iteration
/// budget, wander off the image, or sit on a numerically unsolvable neighbourhood are
/// discarded. Returns the interpolated |DoG| contrast alongside the refined candidate.
pub fn subpixel_refinement(source_octave: &Octave, extremum: &ExtremaParameters, runtime_params: &DetectorRuntimeParams) -> Option<(Float, ExtremaParameters)> {
    let first_order_kernel = PrewittKernel::new();
    let kernel_radius = first_order_kernel.radius();

    let mut x = extremum.x_image();
    let mut y = extremum.y_image();
    let mut sigma_level = extremum.closest_sigma_level();

    for _ in 0..runtime_params.refinement_iterations {
        if !source_octave.within_range(x, y, sigma_level, kernel_radius) {
            return None;
        }

        let (perturb, gradient) = interpolate(source_octave, x, y, sigma_level)?;

        if perturb[0].abs() < 0.5 && perturb[1].abs() < 0.5 && perturb[2].abs() < 0.5 {
            let dog_sample = source_octave.difference_of_gaussians[sigma_level].buffer[(y,x)];
            let contrast = dog_sample + 0.5*gradient.dot(&perturb);
            let refined = ExtremaParameters {
                x: x as Float + perturb[0],
                y: y as Float + perturb[1],
                sigma_level: sigma_level as Float + perturb[2]
            };
            return Some((contrast.abs(), refined));
        }

        // re-base the integer sample point one step toward the fitted peak
        x = step_coordinate(x, perturb[0]);
        y = step_coordinate(y, perturb[1]);
        sigma_level = step_coordinate(sigma_level, perturb[2]);
    }

    None
}

fn step_coordinate(coordinate: usize, perturbation: Float) -> usize {
    let step = match perturbation {
        v if v >= 0.5 => 1isize,
        v if v <= -0.5 => -1isize,
        _ => 0isize
    };
    let moved = coordinate as isize + step;
    moved.max(0) as usize
}

// Solves -H^-1 * g for the 3D scale-space quadratic around the sample.
fn interpolate(source_octave: &Octave, x: usize, y: usize, sigma_level: usize) -> Option<(Matrix3x1<Float>, Matrix3x1<Float>)> {
    let first_order_kernel = PrewittKernel::new();
    let second_order_kernel = LaplaceKernel::new();

    let dog_borrows: Vec<&Image> = source_octave.difference_of_gaussians.iter().collect();
    let dog_x_borrows: Vec<&Image> = source_octave.dog_x_gradient.iter().collect();
    let dog_y_borrows: Vec<&Image> = source_octave.dog_y_gradient.iter().collect();

    let dx = source_octave.dog_x_gradient[sigma_level].buffer[(y,x)];
    let dy = source_octave.dog_y_gradient[sigma_level].buffer[(y,x)];
    let ds = source_octave.dog_s_gradient[sigma_level].buffer[(y,x)];

    let dxx = gradient_convolution_at_sample(&dog_borrows, x, y, sigma_level, &second_order_kernel, GradientDirection::HORIZONTAL);
    let dyy = gradient_convolution_at_sample(&dog_borrows, x, y, sigma_level, &second_order_kernel, GradientDirection::VERTICAL);
    let dss = gradient_convolution_at_sample(&dog_borrows, x, y, sigma_level, &second_order_kernel, GradientDirection::SIGMA);

    let dxy = gradient_convolution_at_sample(&dog_x_borrows, x, y, sigma_level, &first_order_kernel, GradientDirection::VERTICAL);
    let dxs = gradient_convolution_at_sample(&dog_x_borrows, x, y, sigma_level, &first_order_kernel, GradientDirection::SIGMA);
    let dys = gradient_convolution_at_sample(&dog_y_borrows, x, y, sigma_level, &first_order_kernel, GradientDirection::SIGMA);

    let hessian = Matrix3::new(dxx, dxy, dxs,
                               dxy, dyy, dys,
                               dxs, dys, dss);
    let gradient = Matrix3x1::new(dx, dy, ds);

    (-hessian).qr().solve(&gradient).map(|perturb| (perturb, gradient))
}

/// 2x2 spatial Hessian of the DoG response at the candidate.
pub fn spatial_hessian(source_octave: &Octave, extremum: &ExtremaParameters) -> Matrix2<Float> {
    let first_order_kernel = PrewittKernel::new();
    let second_order_kernel = LaplaceKernel::new();

    let x = extremum.x_image();
    let y = extremum.y_image();
    let sigma_level = extremum.closest_sigma_level();

    let dog_borrows: Vec<&Image> = source_octave.difference_of_gaussians.iter().collect();
    let dog_x_borrows: Vec<&Image> = source_octave.dog_x_gradient.iter().collect();

    let dxx = gradient_convolution_at_sample(&dog_borrows, x, y, sigma_level, &second_order_kernel, GradientDirection::HORIZONTAL);
    let dyy = gradient_convolution_at_sample(&dog_borrows, x, y, sigma_level, &second_order_kernel, GradientDirection::VERTICAL);
    let dxy = gradient_convolution_at_sample(&dog_x_borrows, x, y, sigma_level, &first_order_kernel, GradientDirection::VERTICAL);

    Matrix2::new(dxx, dxy,
                 dxy, dyy)
}

/// Rejects edge-like responses whose principal curvature ratio exceeds r, i.e. keeps
/// the candidate iff trace^2/det < (r+1)^2/r and det > 0.
pub fn accept_extremum_response(source_octave: &Octave, extremum: &ExtremaParameters, r: Float) -> bool {
    let first_order_kernel = PrewittKernel::new();
    let kernel_radius = first_order_kernel.radius();

    if !source_octave.within_range(extremum.x_image(), extremum.y_image(), extremum.closest_sigma_level(), kernel_radius) {
        return false;
    }

    let hessian = spatial_hessian(source_octave, extremum);
    let trace = hessian.trace();
    let determinant = hessian.determinant();
    let hessian_factor = trace.powi(2)/determinant;
    let r_factor = (r + 1.0).powi(2)/r;

    determinant > 0.0 && hessian_factor < r_factor
}

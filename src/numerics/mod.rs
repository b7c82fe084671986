extern crate nalgebra as na;

use na::{Matrix2, Matrix3};
use crate::image::Image;
use crate::{Float, float};

pub fn round(number: Float, dp: i32) -> Float {
    let n = (10.0 as Float).powi(dp);
    (number*n).round()/n
}

pub fn rotation_matrix_2d_from_orientation(orientation: Float) -> Matrix2<Float> {
    Matrix2::new(orientation.cos(), -orientation.sin(),
                 orientation.sin(), orientation.cos())
}

/// Gradient magnitude and orientation at a pixel, orientation in [0, 2pi).
pub fn gradient_and_orientation(x_gradient: &Image, y_gradient: &Image, x: usize, y: usize) -> (Float, Float) {
    let x_diff = x_gradient.buffer[(y,x)];
    let y_diff = y_gradient.buffer[(y,x)];

    let magnitude = (x_diff.powi(2) + y_diff.powi(2)).sqrt();
    let orientation = match y_diff.atan2(x_diff) {
        angle if angle < 0.0 => 2.0*float::consts::PI + angle,
        angle => angle
    };

    (magnitude, orientation)
}

/// Peak position of the parabola through three equidistant histogram samples, wrapped
/// back into [range_min, range_max) for circular domains.
// http://fourier.eng.hmc.edu/e176/lectures/NM/node25.html
pub fn lagrange_interpolation_quadratic(a: Float, b: Float, c: Float, f_a: Float, f_b: Float, f_c: Float, range_min: Float, range_max: Float) -> Float {
    let a_corrected = if a > b { a - range_max } else { a };
    let c_corrected = if b > c { c + range_max } else { c };

    assert!(a_corrected < b && b < c_corrected);
    assert!(f_b >= f_a && f_b >= f_c);

    let numerator = (f_a-f_b)*(c_corrected-b).powi(2) - (f_c-f_b)*(b-a_corrected).powi(2);
    let denominator = (f_a-f_b)*(c_corrected-b) + (f_c-f_b)*(b-a_corrected);

    let result = match denominator {
        d if d.abs() < 1e-12 => b,
        d => b + 0.5*(numerator/d)
    };

    match result {
        res if res < range_min => res + range_max,
        res if res >= range_max => res - range_max,
        res => res
    }
}

pub fn gauss_2d(x_center: Float, y_center: Float, x: Float, y: Float, sigma: Float) -> Float {
    let offset_squared = (x-x_center).powi(2) + (y-y_center).powi(2);
    let sigma_squared = sigma.powi(2);
    let exponent = -0.5*offset_squared/sigma_squared;
    exponent.exp()/(2.0*float::consts::PI*sigma_squared)
}

/// Ratio of the largest to the smallest singular value. Returns infinity for
/// numerically singular matrices.
pub fn condition_number(matrix: &Matrix3<Float>) -> Float {
    let svd = matrix.svd(false, false);
    let max_singular_value = svd.singular_values[0];
    let min_singular_value = svd.singular_values[2];
    match min_singular_value {
        v if v.abs() < 1e-32 => Float::INFINITY,
        v => max_singular_value/v
    }
}

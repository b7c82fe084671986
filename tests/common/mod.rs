use nalgebra as na;

use na::DMatrix;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use local_features::Float;
use local_features::image::{Image, image_encoding::ImageEncoding};
use local_features::runtime_params::DetectorRuntimeParams;

#[allow(dead_code)]
pub fn flat_image(width: usize, height: usize, value: Float) -> Image {
    let buffer = DMatrix::<Float>::from_element(height, width, value);
    Image::from_matrix(&buffer, ImageEncoding::F64, false)
}

/// Adds a Gaussian blob to the buffer, clamping the result into [0,1].
#[allow(dead_code)]
pub fn add_blob(buffer: &mut DMatrix<Float>, x_center: Float, y_center: Float, sigma: Float, amplitude: Float) {
    let height = buffer.nrows();
    let width = buffer.ncols();
    for y in 0..height {
        for x in 0..width {
            let distance_squared = (x as Float - x_center).powi(2) + (y as Float - y_center).powi(2);
            let value = buffer[(y,x)] + amplitude*(-0.5*distance_squared/sigma.powi(2)).exp();
            buffer[(y,x)] = value.min(1.0).max(0.0);
        }
    }
}

/// Deterministic smooth texture built from overlapping random blobs. Neighbouring
/// regions end up visually distinct, which keeps descriptors unambiguous.
#[allow(dead_code)]
pub fn texture_image(width: usize, height: usize, blob_count: usize, seed: u64) -> Image {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut buffer = DMatrix::<Float>::from_element(height, width, 0.5);

    for _ in 0..blob_count {
        let x_center = rng.gen_range(0.0..width as Float);
        let y_center = rng.gen_range(0.0..height as Float);
        let sigma = rng.gen_range(1.5..4.5);
        let amplitude = rng.gen_range(0.3..0.5)*(if rng.gen_bool(0.5) { 1.0 } else { -1.0 });
        add_blob(&mut buffer, x_center, y_center, sigma, amplitude);
    }

    Image::from_matrix(&buffer, ImageEncoding::F64, false)
}

/// Filled circle of the given radius on a black background.
#[allow(dead_code)]
pub fn circle_image(width: usize, height: usize, x_center: Float, y_center: Float, radius: Float) -> Image {
    let mut buffer = DMatrix::<Float>::zeros(height, width);
    for y in 0..height {
        for x in 0..width {
            let distance_squared = (x as Float - x_center).powi(2) + (y as Float - y_center).powi(2);
            if distance_squared <= radius.powi(2) {
                buffer[(y,x)] = 1.0;
            }
        }
    }
    Image::from_matrix(&buffer, ImageEncoding::F64, false)
}

/// Exact 90 degree counter-clockwise rotation of the pixel grid, a pure permutation.
/// A source pixel (x,y) lands on (y, width-1-x).
#[allow(dead_code)]
pub fn rotate_90(image: &Image) -> Image {
    let width = image.width();
    let height = image.height();
    let mut buffer = DMatrix::<Float>::zeros(width, height);
    for y in 0..height {
        for x in 0..width {
            buffer[(width - 1 - x, y)] = image.buffer[(y,x)];
        }
    }
    Image::from_matrix(&buffer, ImageEncoding::F64, false)
}

#[allow(dead_code)]
pub fn detector_params() -> DetectorRuntimeParams {
    DetectorRuntimeParams::default()
}

#[allow(dead_code)]
pub fn detector_params_without_orientation() -> DetectorRuntimeParams {
    let mut params = DetectorRuntimeParams::default();
    params.orientation_assignment = false;
    params
}

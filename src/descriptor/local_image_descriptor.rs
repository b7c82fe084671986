extern crate nalgebra as na;

use na::DVector;

use crate::{float, Float};
use crate::pyramid::octave::Octave;
use crate::runtime_params::DetectorRuntimeParams;
use crate::numerics::gradient_and_orientation;
use crate::descriptor::keypoint::OctaveKeypoint;
use crate::descriptor::normalize_and_clip;

const TWO_PI: Float = 2.0*float::consts::PI;

// Half width of the sampling window in octave-local pixels. One spatial bin spans
// magnification * sigma pixels and the window is padded by the oversampling margin so
// that edge bins receive their partial contributions.
fn sampling_half_width(keypoint: &OctaveKeypoint, runtime_params: &DetectorRuntimeParams) -> Float {
    let bin_width = runtime_params.magnification*keypoint.sigma;
    bin_width*(runtime_params.spatial_bins as Float/2.0 + runtime_params.oversampling_margin)
}

// The rotated square window is bounded by a circle of half_width * sqrt(2).
fn sampling_bound(keypoint: &OctaveKeypoint, runtime_params: &DetectorRuntimeParams) -> usize {
    (sampling_half_width(keypoint, runtime_params)*(2.0 as Float).sqrt()).ceil() as usize
}

/// True iff the full (rotated) sampling window lies inside the octave image. Keypoints
/// failing this test are dropped rather than sampled with a truncated patch.
pub fn is_keypoint_within_image(octave: &Octave, keypoint: &OctaveKeypoint, runtime_params: &DetectorRuntimeParams) -> bool {
    let bound = sampling_bound(keypoint, runtime_params);
    let x = keypoint.x_image();
    let y = keypoint.y_image();

    x >= bound && x + bound < octave.width() &&
    y >= bound && y + bound < octave.height() &&
    keypoint.closest_sigma_level() < octave.images.len()
}

/// Accumulates Gaussian-weighted gradient magnitudes into a spatial_bins^2 x
/// orientation_bins grid with trilinear soft binning, then normalises, clips and
/// renormalises the flattened vector. Returns None when the window leaves the image or
/// the patch carries no gradient energy at all.
pub fn sample_descriptor(octave: &Octave, keypoint: &OctaveKeypoint, runtime_params: &DetectorRuntimeParams) -> Option<DVector<Float>> {
    if !is_keypoint_within_image(octave, keypoint, runtime_params) {
        return None;
    }

    let spatial_bins = runtime_params.spatial_bins;
    let orientation_bins = runtime_params.orientation_bins;

    let half_width = sampling_half_width(keypoint, runtime_params);
    let bound = sampling_bound(keypoint, runtime_params) as isize;
    let sigma_level = keypoint.closest_sigma_level();

    let x_grad = &octave.x_gradient[sigma_level];
    let y_grad = &octave.y_gradient[sigma_level];

    let x_center_image = keypoint.x_image() as isize;
    let y_center_image = keypoint.y_image() as isize;

    let cos_orientation = keypoint.orientation.cos();
    let sin_orientation = keypoint.orientation.sin();

    // Gaussian weighting in window-normalised coordinates
    let weighting_sigma = runtime_params.descriptor_gaussian_sigma/(0.5*spatial_bins as Float);
    let weighting_sigma_sq2 = 2.0*weighting_sigma.powi(2);

    let mut bins = vec![0.0; runtime_params.descriptor_length()];

    for y_offset in -bound..=bound {
        for x_offset in -bound..=bound {
            let x_sample = (x_center_image + x_offset) as usize;
            let y_sample = (y_center_image + y_offset) as usize;

            let x_delta = x_sample as Float - keypoint.x;
            let y_delta = y_sample as Float - keypoint.y;

            // rotate into the patch frame and normalise to [0,1]
            let patch_x = (cos_orientation*x_delta + sin_orientation*y_delta)/(2.0*half_width) + 0.5;
            let patch_y = (-sin_orientation*x_delta + cos_orientation*y_delta)/(2.0*half_width) + 0.5;

            if patch_x < 0.0 || patch_x >= 1.0 || patch_y < 0.0 || patch_y >= 1.0 {
                continue;
            }

            let (magnitude, orientation) = gradient_and_orientation(x_grad, y_grad, x_sample, y_sample);
            let relative_orientation = (orientation - keypoint.orientation).rem_euclid(TWO_PI);

            let x_distance = 0.5 - patch_x;
            let y_distance = 0.5 - patch_y;
            let weight = (-(x_distance.powi(2) + y_distance.powi(2))/weighting_sigma_sq2).exp();

            interpolate_sample(&mut bins, patch_x, patch_y, weight*magnitude, relative_orientation, spatial_bins, orientation_bins);
        }
    }

    normalize_and_clip(&mut bins, runtime_params.value_threshold).map(|_| DVector::from_vec(bins))
}

// Spreads one weighted sample over the 2x2x2 cube of adjacent spatial and orientation
// bins. The orientation axis wraps, the spatial axes clip.
fn interpolate_sample(bins: &mut Vec<Float>, x: Float, y: Float, magnitude: Float, orientation: Float, spatial_bins: usize, orientation_bins: usize) {
    let px = spatial_bins as Float*x - 0.5;
    let py = spatial_bins as Float*y - 0.5;
    let po = orientation_bins as Float*orientation/TWO_PI;

    let xi = px.floor();
    let yi = py.floor();
    let oi = po.floor();

    let x_fraction = px - xi;
    let y_fraction = py - yi;
    let o_fraction = po - oi;

    for y_offset in 0..2 {
        let y_index = yi as isize + y_offset;
        if y_index < 0 || y_index >= spatial_bins as isize {
            continue;
        }
        let y_weight = magnitude*(if y_offset == 0 { 1.0 - y_fraction } else { y_fraction });

        for x_offset in 0..2 {
            let x_index = xi as isize + x_offset;
            if x_index < 0 || x_index >= spatial_bins as isize {
                continue;
            }
            let x_weight = y_weight*(if x_offset == 0 { 1.0 - x_fraction } else { x_fraction });

            for o_offset in 0..2 {
                // orientation wraps at 2 pi
                let o_index = (oi as usize + o_offset) % orientation_bins;
                let o_weight = x_weight*(if o_offset == 0 { 1.0 - o_fraction } else { o_fraction });

                let flat_index = spatial_bins*orientation_bins*(y_index as usize) + orientation_bins*(x_index as usize) + o_index;
                bins[flat_index] += o_weight;
            }
        }
    }
}

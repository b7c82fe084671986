extern crate nalgebra as na;

use na::DMatrix;
use std::fmt;

use crate::Float;
use crate::pyramid::octave::Octave;
use crate::runtime_params::DetectorRuntimeParams;

pub mod processing;

/// A localised scale-space extremum in octave-local coordinates. After refinement the
/// coordinates and the DoG level are continuous.
#[derive(Debug,Clone)]
pub struct ExtremaParameters {
    pub x: Float,
    pub y: Float,
    pub sigma_level: Float
}

impl fmt::Display for ExtremaParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}, s: {}", self.x, self.y, self.sigma_level)
    }
}

impl ExtremaParameters {
    pub fn x_image(&self) -> usize {
        self.x.round() as usize
    }

    pub fn y_image(&self) -> usize {
        self.y.round() as usize
    }

    pub fn closest_sigma_level(&self) -> usize {
        self.sigma_level.round() as usize
    }
}

/// Scans one DoG level for strict extrema of the 3x3x3 scale-space neighbourhood.
/// Candidates below 0.8x the contrast threshold are skipped before the neighbourhood
/// test, the full threshold is applied after sub-pixel refinement.
pub fn detect_extrema(source_octave: &Octave, dog_level: usize, runtime_params: &DetectorRuntimeParams) -> Vec<ExtremaParameters> {
    assert!(dog_level > 0);
    assert!(dog_level + 1 < source_octave.difference_of_gaussians.len());

    let mut extrema_vec: Vec<ExtremaParameters> = Vec::new();

    let image_buffer = &source_octave.difference_of_gaussians[dog_level].buffer;
    let prev_buffer = &source_octave.difference_of_gaussians[dog_level-1].buffer;
    let next_buffer = &source_octave.difference_of_gaussians[dog_level+1].buffer;

    let pre_threshold = 0.8*runtime_params.magnitude_threshold;
    let offset = 1;

    for y in offset..image_buffer.nrows()-offset {
        for x in offset..image_buffer.ncols()-offset {

            let sample_value = image_buffer[(y,x)];
            if sample_value.abs() < pre_threshold {
                continue;
            }

            let (is_smallest_curr, is_largest_curr) = is_sample_extreme_in_neighbourhood(sample_value, x, y, image_buffer, true);
            let (is_smallest_prev, is_largest_prev) = is_sample_extreme_in_neighbourhood(sample_value, x, y, prev_buffer, false);
            let (is_smallest_next, is_largest_next) = is_sample_extreme_in_neighbourhood(sample_value, x, y, next_buffer, false);

            let is_extremum = (is_smallest_curr && is_smallest_prev && is_smallest_next) ||
                              (is_largest_curr && is_largest_prev && is_largest_next);

            if is_extremum {
                extrema_vec.push(ExtremaParameters{x: x as Float, y: y as Float, sigma_level: dog_level as Float});
            }
        }
    }

    extrema_vec
}

fn is_sample_extreme_in_neighbourhood(sample: Float, x_sample: usize, y_sample: usize, neighbourhood_buffer: &DMatrix<Float>, skip_center: bool) -> (bool,bool) {
    let mut is_smallest = true;
    let mut is_largest = true;

    for y in y_sample-1..y_sample+2 {
        for x in x_sample-1..x_sample+2 {

            if x == x_sample && y == y_sample && skip_center {
                continue;
            }

            let value = neighbourhood_buffer[(y,x)];
            is_smallest &= sample < value;
            is_largest &= sample > value;

            if !(is_smallest || is_largest) {
                return (false,false);
            }
        }
    }

    (is_smallest, is_largest)
}

/// Sub-pixel localisation followed by the contrast and edge-response filters.
pub fn extrema_refinement(extrema: &Vec<ExtremaParameters>, source_octave: &Octave, runtime_params: &DetectorRuntimeParams) -> Vec<ExtremaParameters> {
    extrema.iter()
        .filter_map(|extremum| processing::subpixel_refinement(source_octave, extremum, runtime_params))
        .filter(|&(contrast, _)| contrast >= runtime_params.magnitude_threshold)
        .map(|(_, extremum)| extremum)
        .filter(|extremum| processing::accept_extremum_response(source_octave, extremum, runtime_params.eigenvalue_ratio))
        .collect()
}

use log::debug;

use crate::image::Image;
use crate::pyramid::{build_pyramid, Pyramid};
use crate::pyramid::octave::Octave;
use crate::runtime_params::{DetectorRuntimeParams, ParamsError};
use crate::extrema::{detect_extrema, extrema_refinement};
use crate::descriptor::orientation_histogram::assign_orientations;
use crate::descriptor::local_image_descriptor::{is_keypoint_within_image, sample_descriptor};
use crate::descriptor::keypoint::{Keypoint, OctaveKeypoint};

pub mod image;
pub mod filter;
pub mod numerics;
pub mod runtime_params;
pub mod pyramid;
pub mod extrema;
pub mod descriptor;
pub mod matching;
pub mod ransac;

macro_rules! define_float {
    ($f:tt) => {
        pub use std::$f as float;
        pub type Float = $f;
    }
}

define_float!(f64);

#[repr(u8)]
#[derive(Debug,Copy,Clone)]
pub enum GradientDirection {
    HORIZONTAL,
    VERTICAL,
    SIGMA
}

/// Runs the full detection pipeline: pyramid, extrema, orientation, descriptors.
/// Keypoint coordinates and sigmas are in original-image pixel space.
pub fn keypoints_from_image(image: &Image, runtime_params: &DetectorRuntimeParams) -> Result<Vec<Keypoint>, ParamsError> {
    runtime_params.validate()?;
    let pyramid = build_pyramid(image, runtime_params);
    Ok(keypoints_from_pyramid(&pyramid, runtime_params))
}

pub fn keypoints_from_pyramid(pyramid: &Pyramid, runtime_params: &DetectorRuntimeParams) -> Vec<Keypoint> {
    let mut all_keypoints = Vec::<Vec<Keypoint>>::with_capacity(pyramid.octaves.len());

    for octave_level in 0..pyramid.octaves.len() {
        all_keypoints.push(keypoints_from_octave(pyramid, octave_level, runtime_params));
    }

    all_keypoints.into_iter().flatten().collect()
}

pub fn keypoints_from_octave(pyramid: &Pyramid, octave_level: usize, runtime_params: &DetectorRuntimeParams) -> Vec<Keypoint> {
    let octave = &pyramid.octaves[octave_level];
    let pixel_scale = pyramid.pixel_scale(octave_level);

    octave_keypoints(octave, runtime_params).iter()
        .filter_map(|keypoint| {
            sample_descriptor(octave, keypoint, runtime_params)
                .map(|descriptor| Keypoint::from_octave_keypoint(keypoint, descriptor, pixel_scale))
        })
        .collect()
}

/// Colour variant: extrema are localised on the detection pyramid and the descriptor is
/// sampled once per band pyramid, concatenated and renormalised. All pyramids must have
/// been built from equally sized bands with the same runtime params.
pub fn keypoints_from_band_pyramids(detection: &Pyramid, bands: &Vec<&Pyramid>, runtime_params: &DetectorRuntimeParams) -> Result<Vec<Keypoint>, ParamsError> {
    runtime_params.validate()?;

    for band in bands {
        if !detection.same_geometry(band) {
            return Err(ParamsError::MismatchedBands);
        }
    }

    let mut all_keypoints = Vec::<Keypoint>::new();

    for octave_level in 0..detection.octaves.len() {
        let octave = &detection.octaves[octave_level];
        let pixel_scale = detection.pixel_scale(octave_level);

        for keypoint in octave_keypoints(octave, runtime_params) {
            let band_descriptors: Vec<_> = bands.iter()
                .filter_map(|band| sample_descriptor(&band.octaves[octave_level], &keypoint, runtime_params))
                .collect();

            if band_descriptors.len() == bands.len() {
                let descriptor = descriptor::concatenate_band_descriptors(&band_descriptors);
                all_keypoints.push(Keypoint::from_octave_keypoint(&keypoint, descriptor, pixel_scale));
            }
        }
    }

    Ok(all_keypoints)
}

// Detection and orientation assignment in octave-local coordinates. Keypoints whose
// sampling patch leaves the image are dropped here, before any descriptor read.
fn octave_keypoints(octave: &Octave, runtime_params: &DetectorRuntimeParams) -> Vec<OctaveKeypoint> {
    let mut keypoints = Vec::<OctaveKeypoint>::new();

    for dog_level in 1..=octave.s() {
        let extrema = detect_extrema(octave, dog_level, runtime_params);
        let refined = extrema_refinement(&extrema, octave, runtime_params);
        debug!("octave {}: dog level {}: {} candidates, {} refined", octave.octave_level, dog_level, extrema.len(), refined.len());

        let oriented = refined.iter()
            .flat_map(|extremum| assign_orientations(octave, extremum, runtime_params))
            .filter(|keypoint| is_keypoint_within_image(octave, keypoint, runtime_params));
        keypoints.extend(oriented);
    }

    keypoints
}

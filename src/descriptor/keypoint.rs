extern crate nalgebra as na;

use na::DVector;
use serde::{Serialize, Deserialize};

use crate::Float;
use crate::matching::Feature;

/// Keypoint in octave-local coordinates, after orientation assignment and before
/// descriptor sampling.
#[derive(Debug,Clone)]
pub struct OctaveKeypoint {
    pub x: Float,
    pub y: Float,
    pub sigma_level: Float,
    /// Octave-local sigma for the continuous level.
    pub sigma: Float,
    pub orientation: Float
}

impl OctaveKeypoint {
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

/// A detected, localised, scaled and oriented interest point with its descriptor.
/// Location and sigma are in original-image pixel space.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct Keypoint {
    pub x: Float,
    pub y: Float,
    pub sigma: Float,
    pub orientation: Float,
    pub descriptor: DVector<Float>
}

impl Keypoint {
    pub fn from_octave_keypoint(keypoint: &OctaveKeypoint, descriptor: DVector<Float>, pixel_scale: Float) -> Keypoint {
        Keypoint {
            x: keypoint.x*pixel_scale,
            y: keypoint.y*pixel_scale,
            sigma: keypoint.sigma*pixel_scale,
            orientation: keypoint.orientation,
            descriptor
        }
    }

    pub fn descriptor_distance(&self, other: &Keypoint) -> Float {
        (&self.descriptor - &other.descriptor).norm()
    }
}

impl Feature for Keypoint {
    fn get_x(&self) -> Float {
        self.x
    }

    fn get_y(&self) -> Float {
        self.y
    }
}

impl PartialEq for Keypoint {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.sigma == other.sigma &&
        self.orientation == other.orientation && self.descriptor == other.descriptor
    }
}

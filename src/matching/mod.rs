extern crate nalgebra as na;

use na::{Vector2, Vector3};
use serde::{Serialize, Deserialize};

use crate::Float;
use crate::descriptor::keypoint::Keypoint;

/// Anything with a 2D image location that can enter a correspondence.
pub trait Feature {
    fn get_x(&self) -> Float;
    fn get_y(&self) -> Float;

    fn get_as_2d_point(&self) -> Vector2<Float> {
        Vector2::<Float>::new(self.get_x(), self.get_y())
    }

    fn get_as_3d_point(&self, z: Float) -> Vector3<Float> {
        Vector3::<Float>::new(self.get_x(), self.get_y(), z)
    }
}

/// A plain 2D point feature, useful for synthetic correspondence sets.
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct ImageFeature {
    pub x: Float,
    pub y: Float
}

impl ImageFeature {
    pub fn new(x: Float, y: Float) -> ImageFeature {
        ImageFeature{x, y}
    }
}

impl Feature for ImageFeature {
    fn get_x(&self) -> Float {
        self.x
    }

    fn get_y(&self) -> Float {
        self.y
    }
}

/// A proposed pairing of one reference ("model") and one query feature together with
/// the descriptor distance that produced it.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct Match<T: Feature> {
    pub feature_one: T,
    pub feature_two: T,
    pub descriptor_distance: Float
}

impl<T: Feature> Match<T> {
    pub fn new(feature_one: T, feature_two: T, descriptor_distance: Float) -> Match<T> {
        Match{feature_one, feature_two, descriptor_distance}
    }
}

/// Acceptance policy for nearest-neighbour candidates.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub enum MatchingPolicy {
    /// Accept the nearest neighbour when its descriptor distance is below the threshold.
    AbsoluteDistance(Float),
    /// Accept the nearest neighbour when it is closer than ratio times the second
    /// nearest (Lowe's ambiguity rejection). Needs at least two reference keypoints.
    DistanceRatio(Float)
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct MatcherRuntimeParams {
    pub policy: MatchingPolicy,
    /// Optional cap on the number of returned matches, keeping the closest ones.
    pub max_matches: Option<usize>
}

impl Default for MatcherRuntimeParams {
    fn default() -> MatcherRuntimeParams {
        MatcherRuntimeParams {
            policy: MatchingPolicy::AbsoluteDistance(0.5),
            max_matches: None
        }
    }
}

/// Exhaustive nearest-neighbour matching from every query keypoint into the reference
/// list. Zero matches is a valid outcome, not an error.
pub fn match_keypoints(reference: &Vec<Keypoint>, query: &Vec<Keypoint>, runtime_params: &MatcherRuntimeParams) -> Vec<Match<Keypoint>> {
    let mut matches = Vec::<Match<Keypoint>>::new();

    for query_keypoint in query {
        if let Some((reference_index, distance)) = accept_nearest(reference, query_keypoint, &runtime_params.policy) {
            matches.push(Match::new(reference[reference_index].clone(), query_keypoint.clone(), distance));
        }
    }

    if let Some(max_matches) = runtime_params.max_matches {
        matches.sort_by(|a, b| a.descriptor_distance.partial_cmp(&b.descriptor_distance).unwrap());
        matches.truncate(max_matches);
    }

    matches
}

fn accept_nearest(reference: &Vec<Keypoint>, query: &Keypoint, policy: &MatchingPolicy) -> Option<(usize, Float)> {
    let mut nearest: Option<(usize, Float)> = None;
    let mut second_nearest_distance = Float::INFINITY;

    for (index, candidate) in reference.iter().enumerate() {
        let distance = query.descriptor_distance(candidate);
        match nearest {
            Some((_, nearest_distance)) if distance < nearest_distance => {
                second_nearest_distance = nearest_distance;
                nearest = Some((index, distance));
            },
            Some(_) if distance < second_nearest_distance => {
                second_nearest_distance = distance;
            },
            None => {
                nearest = Some((index, distance));
            },
            _ => ()
        }
    }

    let (nearest_index, nearest_distance) = nearest?;
    match *policy {
        MatchingPolicy::AbsoluteDistance(threshold) if nearest_distance < threshold => Some((nearest_index, nearest_distance)),
        MatchingPolicy::DistanceRatio(ratio) if reference.len() > 1 && nearest_distance < ratio*second_nearest_distance => Some((nearest_index, nearest_distance)),
        _ => None
    }
}

extern crate nalgebra as na;

use na::{Matrix3, Vector2};
use thiserror::Error;

use crate::Float;
use crate::matching::{Feature, Match};
use crate::numerics::condition_number;

pub mod homography;
pub mod affine;
pub mod fundamental;

pub use self::homography::Homography;
pub use self::affine::Affine;
pub use self::fundamental::Fundamental;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("need at least {required} correspondences, got {actual}")]
    NotEnoughSamples { required: usize, actual: usize },
    #[error("decomposition failed to converge")]
    DecompositionFailed,
    #[error("sample is degenerate")]
    DegenerateSample,
    #[error("fitted transform is singular")]
    SingularTransform,
}

/// A parametric geometric transform that can be estimated from a minimal
/// correspondence sample and scores correspondences through its own error functional.
/// The robust estimator is generic over this interface and never branches on the
/// concrete model.
pub trait TransformModel: Sized + Clone {
    fn minimum_sample_size() -> usize;

    /// Fits the model from a sample. Accepts more than the minimum sample size, in
    /// which case the fit is least squares over all given correspondences.
    fn estimate<T: Feature>(samples: &[&Match<T>]) -> Result<Self, ModelError>;

    /// True when the sample cannot constrain the model, e.g. collinear points.
    fn is_degenerate<T: Feature>(samples: &[&Match<T>]) -> bool;

    /// Geometric error of a correspondence under this model, in pixels.
    fn residual<T: Feature>(&self, correspondence: &Match<T>) -> Float;

    fn matrix(&self) -> &Matrix3<Float>;

    fn is_well_conditioned(&self, max_condition_number: Float) -> bool {
        let condition = condition_number(self.matrix());
        condition.is_finite() && condition <= max_condition_number
    }
}

/// Hartley normalisation: translate the centroid to the origin and scale the mean
/// distance to sqrt(2).
pub fn normalising_transform(points: &Vec<Vector2<Float>>) -> Matrix3<Float> {
    let n = points.len() as Float;
    let centroid = points.iter().fold(Vector2::<Float>::zeros(), |acc, p| acc + p)/n;
    let mean_distance = points.iter().map(|p| (p - centroid).norm()).sum::<Float>()/n;

    let scale = match mean_distance {
        d if d > 0.0 => (2.0 as Float).sqrt()/d,
        _ => 1.0
    };

    Matrix3::new(scale, 0.0, -scale*centroid[0],
                 0.0, scale, -scale*centroid[1],
                 0.0, 0.0, 1.0)
}

pub fn apply_homogeneous(matrix: &Matrix3<Float>, point: &Vector2<Float>) -> Option<Vector2<Float>> {
    let transformed = matrix*point.push(1.0);
    match transformed[2] {
        w if w.abs() < 1e-12 => None,
        w => Some(Vector2::new(transformed[0]/w, transformed[1]/w))
    }
}

const COLLINEARITY_EPS: Float = 1e-8;

fn triple_collinear(a: &Vector2<Float>, b: &Vector2<Float>, c: &Vector2<Float>) -> bool {
    let ab = b - a;
    let ac = c - a;
    (ab[0]*ac[1] - ab[1]*ac[0]).abs() < COLLINEARITY_EPS
}

/// True when any three of the points are (near) collinear. Intended for minimal
/// samples, the check is cubic in the point count.
pub fn contains_collinear_triple(points: &Vec<Vector2<Float>>) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in i+1..n {
            for k in j+1..n {
                if triple_collinear(&points[i], &points[j], &points[k]) {
                    return true;
                }
            }
        }
    }
    false
}

pub fn contains_coincident_points(points: &Vec<Vector2<Float>>) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in i+1..n {
            if (points[i] - points[j]).norm() < COLLINEARITY_EPS {
                return true;
            }
        }
    }
    false
}

pub fn all_collinear(points: &Vec<Vector2<Float>>) -> bool {
    let n = points.len();
    if n < 3 {
        return true;
    }

    let anchor = &points[0];
    let direction = match points.iter().find(|p| (*p - anchor).norm() >= COLLINEARITY_EPS) {
        Some(p) => p - anchor,
        None => return true
    };

    points.iter().all(|p| {
        let offset = p - anchor;
        (direction[0]*offset[1] - direction[1]*offset[0]).abs() < COLLINEARITY_EPS
    })
}

pub fn sample_points_one<T: Feature>(samples: &[&Match<T>]) -> Vec<Vector2<Float>> {
    samples.iter().map(|m| m.feature_one.get_as_2d_point()).collect()
}

pub fn sample_points_two<T: Feature>(samples: &[&Match<T>]) -> Vec<Vector2<Float>> {
    samples.iter().map(|m| m.feature_two.get_as_2d_point()).collect()
}

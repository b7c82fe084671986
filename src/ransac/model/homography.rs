extern crate nalgebra as na;

use na::{DMatrix, Matrix3};

use crate::Float;
use crate::matching::{Feature, Match};
use super::{ModelError, TransformModel, normalising_transform, apply_homogeneous,
            contains_collinear_triple, sample_points_one, sample_points_two};

/// 3x3 projective transform estimated with the normalised direct linear transform.
/// The inverse is computed once at fit time so the symmetric transfer error stays cheap.
#[derive(Debug,Clone)]
pub struct Homography {
    forward: Matrix3<Float>,
    inverse: Matrix3<Float>
}

impl Homography {
    pub fn from_matrix(forward: Matrix3<Float>) -> Result<Homography, ModelError> {
        let inverse = forward.try_inverse().ok_or(ModelError::SingularTransform)?;
        Ok(Homography{forward, inverse})
    }
}

impl TransformModel for Homography {

    fn minimum_sample_size() -> usize {
        4
    }

    fn estimate<T: Feature>(samples: &[&Match<T>]) -> Result<Homography, ModelError> {
        let n = samples.len();
        if n < Homography::minimum_sample_size() {
            return Err(ModelError::NotEnoughSamples { required: Homography::minimum_sample_size(), actual: n });
        }

        let points_one = sample_points_one(samples);
        let points_two = sample_points_two(samples);

        let normalisation_one = normalising_transform(&points_one);
        let normalisation_two = normalising_transform(&points_two);

        let mut coefficients = DMatrix::<Float>::zeros(2*n, 9);
        for i in 0..n {
            let p = apply_homogeneous(&normalisation_one, &points_one[i]).ok_or(ModelError::DegenerateSample)?;
            let q = apply_homogeneous(&normalisation_two, &points_two[i]).ok_or(ModelError::DegenerateSample)?;

            let x = p[0];
            let y = p[1];
            let u = q[0];
            let v = q[1];

            let r0 = 2*i;
            let r1 = 2*i + 1;

            coefficients[(r0,0)] = -x;
            coefficients[(r0,1)] = -y;
            coefficients[(r0,2)] = -1.0;
            coefficients[(r0,6)] = u*x;
            coefficients[(r0,7)] = u*y;
            coefficients[(r0,8)] = u;

            coefficients[(r1,3)] = -x;
            coefficients[(r1,4)] = -y;
            coefficients[(r1,5)] = -1.0;
            coefficients[(r1,6)] = v*x;
            coefficients[(r1,7)] = v*y;
            coefficients[(r1,8)] = v;
        }

        // h spans the null space of A: right singular vector of the smallest singular value
        let svd = coefficients.svd(false, true);
        let v_t = svd.v_t.ok_or(ModelError::DecompositionFailed)?;
        let h = v_t.row(v_t.nrows()-1);

        let normalised_homography = Matrix3::<Float>::new(h[0], h[1], h[2],
                                                          h[3], h[4], h[5],
                                                          h[6], h[7], h[8]);

        let denormalisation = normalisation_two.try_inverse().ok_or(ModelError::SingularTransform)?;
        let mut forward = denormalisation*normalised_homography*normalisation_one;

        let scale = forward[(2,2)];
        if scale.abs() > Float::EPSILON {
            forward /= scale;
        }

        Homography::from_matrix(forward)
    }

    fn is_degenerate<T: Feature>(samples: &[&Match<T>]) -> bool {
        contains_collinear_triple(&sample_points_one(samples)) ||
        contains_collinear_triple(&sample_points_two(samples))
    }

    fn residual<T: Feature>(&self, correspondence: &Match<T>) -> Float {
        let point_one = correspondence.feature_one.get_as_2d_point();
        let point_two = correspondence.feature_two.get_as_2d_point();

        let forward_error = match apply_homogeneous(&self.forward, &point_one) {
            Some(projected) => (projected - point_two).norm(),
            None => return Float::INFINITY
        };
        let backward_error = match apply_homogeneous(&self.inverse, &point_two) {
            Some(projected) => (projected - point_one).norm(),
            None => return Float::INFINITY
        };

        0.5*(forward_error + backward_error)
    }

    fn matrix(&self) -> &Matrix3<Float> {
        &self.forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::ImageFeature;

    fn matches_under_homography(homography: &Matrix3<Float>, points: &Vec<(Float,Float)>) -> Vec<Match<ImageFeature>> {
        points.iter().map(|&(x,y)| {
            let source = na::Vector2::new(x, y);
            let target = apply_homogeneous(homography, &source).unwrap();
            Match::new(ImageFeature::new(x, y), ImageFeature::new(target[0], target[1]), 0.0)
        }).collect()
    }

    #[test]
    fn exact_fit_from_minimal_sample() {
        let truth = Matrix3::<Float>::new(1.1, 0.02, 5.0,
                                          -0.01, 0.95, -3.0,
                                          1e-4, -2e-4, 1.0);
        let points = vec![(0.0,0.0), (100.0,10.0), (20.0,120.0), (150.0,140.0)];
        let matches = matches_under_homography(&truth, &points);
        let sample: Vec<&Match<ImageFeature>> = matches.iter().collect();

        let homography = Homography::estimate(&sample).unwrap();
        for m in &matches {
            assert!(homography.residual(m) < 1e-6);
        }
    }

    #[test]
    fn collinear_sample_is_degenerate() {
        let points = vec![(0.0,0.0), (10.0,10.0), (20.0,20.0), (5.0,80.0)];
        let matches: Vec<Match<ImageFeature>> = points.iter()
            .map(|&(x,y)| Match::new(ImageFeature::new(x,y), ImageFeature::new(x,y), 0.0))
            .collect();
        let sample: Vec<&Match<ImageFeature>> = matches.iter().collect();
        assert!(Homography::is_degenerate(&sample));
    }
}

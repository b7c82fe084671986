extern crate nalgebra as na;

use na::{DMatrix, DVector, Matrix3};

use crate::Float;
use crate::matching::{Feature, Match};
use super::{ModelError, TransformModel, apply_homogeneous, contains_collinear_triple,
            sample_points_one, sample_points_two};

/// Affine transform, least-squares fit of the six parameters.
#[derive(Debug,Clone)]
pub struct Affine {
    forward: Matrix3<Float>,
    inverse: Matrix3<Float>
}

impl Affine {
    pub fn from_matrix(forward: Matrix3<Float>) -> Result<Affine, ModelError> {
        let inverse = forward.try_inverse().ok_or(ModelError::SingularTransform)?;
        Ok(Affine{forward, inverse})
    }

    /// Rotation angle of the affine part, in radians.
    pub fn rotation_angle(&self) -> Float {
        self.forward[(1,0)].atan2(self.forward[(0,0)])
    }
}

impl TransformModel for Affine {

    fn minimum_sample_size() -> usize {
        3
    }

    fn estimate<T: Feature>(samples: &[&Match<T>]) -> Result<Affine, ModelError> {
        let n = samples.len();
        if n < Affine::minimum_sample_size() {
            return Err(ModelError::NotEnoughSamples { required: Affine::minimum_sample_size(), actual: n });
        }

        let points_one = sample_points_one(samples);
        let points_two = sample_points_two(samples);

        let mut coefficients = DMatrix::<Float>::zeros(2*n, 6);
        let mut observations = DVector::<Float>::zeros(2*n);
        for i in 0..n {
            let x = points_one[i][0];
            let y = points_one[i][1];

            let r0 = 2*i;
            let r1 = 2*i + 1;

            coefficients[(r0,0)] = x;
            coefficients[(r0,1)] = y;
            coefficients[(r0,2)] = 1.0;
            coefficients[(r1,3)] = x;
            coefficients[(r1,4)] = y;
            coefficients[(r1,5)] = 1.0;

            observations[r0] = points_two[i][0];
            observations[r1] = points_two[i][1];
        }

        let svd = coefficients.svd(true, true);
        let parameters = svd.solve(&observations, 1e-12).map_err(|_| ModelError::DecompositionFailed)?;

        let forward = Matrix3::<Float>::new(parameters[0], parameters[1], parameters[2],
                                            parameters[3], parameters[4], parameters[5],
                                            0.0, 0.0, 1.0);

        Affine::from_matrix(forward)
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
    use crate::float;

    #[test]
    fn recovers_rotation_angle() {
        let angle: Float = float::consts::FRAC_PI_6;
        let truth = Matrix3::<Float>::new(angle.cos(), -angle.sin(), 12.0,
                                          angle.sin(), angle.cos(), -7.0,
                                          0.0, 0.0, 1.0);

        let points = vec![(0.0,0.0), (50.0,5.0), (10.0,60.0), (80.0,90.0), (33.0,21.0)];
        let matches: Vec<Match<ImageFeature>> = points.iter().map(|&(x,y)| {
            let source = na::Vector2::new(x, y);
            let target = apply_homogeneous(&truth, &source).unwrap();
            Match::new(ImageFeature::new(x, y), ImageFeature::new(target[0], target[1]), 0.0)
        }).collect();
        let sample: Vec<&Match<ImageFeature>> = matches.iter().collect();

        let affine = Affine::estimate(&sample).unwrap();
        assert!((affine.rotation_angle() - angle).abs() < 1e-9);
        for m in &matches {
            assert!(affine.residual(m) < 1e-9);
        }
    }
}

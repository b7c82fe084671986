extern crate nalgebra as na;

use na::{DMatrix, Matrix3};

use crate::Float;
use crate::matching::{Feature, Match};
use super::{ModelError, TransformModel, normalising_transform, apply_homogeneous,
            contains_coincident_points, all_collinear, sample_points_one, sample_points_two};

/// Rank-2 fundamental matrix from the normalised eight-point algorithm, satisfying
/// x_two^T * F * x_one = 0 for ideal correspondences.
#[derive(Debug,Clone)]
pub struct Fundamental {
    matrix: Matrix3<Float>
}

impl Fundamental {
    pub fn epipolar_constraint<T: Feature>(&self, correspondence: &Match<T>) -> Float {
        let point_one = correspondence.feature_one.get_as_3d_point(1.0);
        let point_two = correspondence.feature_two.get_as_3d_point(1.0);
        (point_two.transpose()*self.matrix*point_one)[0]
    }
}

impl TransformModel for Fundamental {

    fn minimum_sample_size() -> usize {
        8
    }

    fn estimate<T: Feature>(samples: &[&Match<T>]) -> Result<Fundamental, ModelError> {
        let n = samples.len();
        if n < Fundamental::minimum_sample_size() {
            return Err(ModelError::NotEnoughSamples { required: Fundamental::minimum_sample_size(), actual: n });
        }

        let points_one = sample_points_one(samples);
        let points_two = sample_points_two(samples);

        let normalisation_one = normalising_transform(&points_one);
        let normalisation_two = normalising_transform(&points_two);

        let mut coefficients = DMatrix::<Float>::zeros(n, 9);
        for i in 0..n {
            let p = apply_homogeneous(&normalisation_one, &points_one[i]).ok_or(ModelError::DegenerateSample)?;
            let q = apply_homogeneous(&normalisation_two, &points_two[i]).ok_or(ModelError::DegenerateSample)?;

            let x_one = p[0];
            let y_one = p[1];
            let x_two = q[0];
            let y_two = q[1];

            coefficients[(i,0)] = x_two*x_one;
            coefficients[(i,1)] = x_two*y_one;
            coefficients[(i,2)] = x_two;
            coefficients[(i,3)] = y_two*x_one;
            coefficients[(i,4)] = y_two*y_one;
            coefficients[(i,5)] = y_two;
            coefficients[(i,6)] = x_one;
            coefficients[(i,7)] = y_one;
            coefficients[(i,8)] = 1.0;
        }

        let svd = coefficients.svd(false, true);
        let v_t = svd.v_t.ok_or(ModelError::DecompositionFailed)?;
        let f = v_t.row(v_t.nrows()-1);

        let unconstrained = Matrix3::<Float>::new(f[0], f[1], f[2],
                                                  f[3], f[4], f[5],
                                                  f[6], f[7], f[8]);

        // enforce the rank-2 constraint by zeroing the smallest singular value
        let mut svd_f = unconstrained.svd(true, true);
        svd_f.singular_values[2] = 0.0;
        let rank_two = svd_f.recompose().map_err(|_| ModelError::DecompositionFailed)?;

        let matrix = (normalisation_two.transpose()*rank_two*normalisation_one).normalize();

        Ok(Fundamental{matrix})
    }

    fn is_degenerate<T: Feature>(samples: &[&Match<T>]) -> bool {
        let points_one = sample_points_one(samples);
        let points_two = sample_points_two(samples);

        contains_coincident_points(&points_one) || contains_coincident_points(&points_two) ||
        all_collinear(&points_one) || all_collinear(&points_two)
    }

    /// First-order geometric (Sampson) distance to the epipolar constraint.
    fn residual<T: Feature>(&self, correspondence: &Match<T>) -> Float {
        let point_one = correspondence.feature_one.get_as_3d_point(1.0);
        let point_two = correspondence.feature_two.get_as_3d_point(1.0);

        let f_one = self.matrix*point_one;
        let f_t_two = self.matrix.transpose()*point_two;
        let constraint = (point_two.transpose()*self.matrix*point_one)[0];

        let denominator = f_one[0].powi(2) + f_one[1].powi(2) + f_t_two[0].powi(2) + f_t_two[1].powi(2);
        match denominator {
            d if d <= 0.0 => Float::INFINITY,
            d => (constraint.powi(2)/d).sqrt()
        }
    }

    fn matrix(&self) -> &Matrix3<Float> {
        &self.matrix
    }

    // F is rank 2 by construction, conditioning is judged on the two non-zero
    // singular values.
    fn is_well_conditioned(&self, max_condition_number: Float) -> bool {
        let svd = self.matrix.svd(false, false);
        let ratio = match svd.singular_values[1] {
            v if v.abs() < 1e-32 => Float::INFINITY,
            v => svd.singular_values[0]/v
        };
        ratio.is_finite() && ratio <= max_condition_number
    }
}

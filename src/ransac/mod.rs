extern crate rand;

use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::Float;
use crate::matching::{Feature, Match};
use self::model::TransformModel;

pub mod model;

#[derive(Debug, Error)]
pub enum RansacError {
    #[error("need at least {required} correspondences, got {actual}")]
    NotEnoughCorrespondences { required: usize, actual: usize },
    #[error("no non-degenerate, well-conditioned model could be fitted")]
    NoModelFound,
    #[error("stopping condition was not reached within the iteration budget")]
    TargetNotReached,
}

/// Controls when the sampling loop may stop early and whether exhausting the budget
/// counts as success.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub enum StoppingCondition {
    /// Run the full budget, the best model found is the result.
    FixedIterations,
    /// Stop as soon as an iteration reaches this many inliers. Failing to reach it
    /// within the budget is an error.
    NumberInliers(usize),
    /// Like NumberInliers with the limit expressed as a fraction of the data.
    PercentageInliers(Float),
    /// Run until the adaptive iteration bound N = log(1-confidence)/log(1-w^m) for the
    /// current best inlier ratio w is met; always succeeds if any model was fitted.
    AdaptiveBestFit { confidence: Float }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct RansacRuntimeParams {
    pub max_iterations: usize,
    /// Residual below which a correspondence counts as an inlier, in pixels.
    pub inlier_threshold: Float,
    pub stopping_condition: StoppingCondition,
    /// Refit the winning model on all of its inliers before returning.
    pub improve_estimate: bool,
    /// Fits with a worse transform condition number are discarded.
    pub max_condition_number: Float,
    /// Resampling budget per iteration when degenerate samples are drawn.
    pub max_degenerate_retries: usize,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>
}

impl Default for RansacRuntimeParams {
    fn default() -> RansacRuntimeParams {
        RansacRuntimeParams {
            max_iterations: 1000,
            inlier_threshold: 3.0,
            stopping_condition: StoppingCondition::FixedIterations,
            improve_estimate: true,
            max_condition_number: 1e8,
            max_degenerate_retries: 100,
            seed: None
        }
    }
}

/// Best model with its supporting correspondences. Inlier and outlier lists hold
/// indices into the input match list.
#[derive(Debug,Clone)]
pub struct RansacEstimate<M: TransformModel> {
    pub model: M,
    pub inliers: Vec<usize>,
    pub outliers: Vec<usize>,
    pub total_inlier_error: Float,
    pub iterations: usize
}

struct Score {
    inliers: Vec<usize>,
    outliers: Vec<usize>,
    total_inlier_error: Float
}

/// Generalised RANSAC over any TransformModel: sample, fit, score, keep the best.
/// Models are compared by inlier count with total inlier error as the deterministic
/// tie-break, so a fixed seed always reproduces the same estimate.
pub fn fit_transform<M: TransformModel, T: Feature + Clone>(matches: &Vec<Match<T>>, runtime_params: &RansacRuntimeParams) -> Result<RansacEstimate<M>, RansacError> {
    let minimum_sample_size = M::minimum_sample_size();
    let data_size = matches.len();

    if data_size < minimum_sample_size {
        return Err(RansacError::NotEnoughCorrespondences { required: minimum_sample_size, actual: data_size });
    }

    let inlier_target = match runtime_params.stopping_condition {
        StoppingCondition::NumberInliers(limit) => Some(limit.max(minimum_sample_size)),
        StoppingCondition::PercentageInliers(percentage) => Some(((percentage*data_size as Float).round() as usize).max(minimum_sample_size)),
        _ => None
    };
    if let Some(target) = inlier_target {
        if target > data_size {
            return Err(RansacError::TargetNotReached);
        }
    }

    let mut rng = match runtime_params.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy()
    };

    let mut best: Option<(M, Score)> = None;
    let mut adaptive_budget = runtime_params.max_iterations;
    let mut iterations = 0;

    for iteration in 0..runtime_params.max_iterations {
        iterations = iteration + 1;

        let sample = match draw_non_degenerate_sample::<M, T>(matches, minimum_sample_size, runtime_params.max_degenerate_retries, &mut rng) {
            Some(sample) => sample,
            None => continue
        };

        let model = match M::estimate(&sample) {
            Ok(model) => model,
            Err(_) => continue
        };
        if !model.is_well_conditioned(runtime_params.max_condition_number) {
            continue;
        }

        let score = score_model(&model, matches, runtime_params.inlier_threshold);
        let score_inlier_count = score.inliers.len();

        if is_better(&best, &score) {
            debug!("ransac: iteration {}: new best model with {} inliers", iteration, score_inlier_count);
            best = Some((model, score));
        }

        if let Some(target) = inlier_target {
            if score_inlier_count >= target {
                let survived = best.expect("ransac: target reached without a best model");
                return Ok(finalize(survived, matches, runtime_params, iterations));
            }
        }

        if let StoppingCondition::AdaptiveBestFit { confidence } = runtime_params.stopping_condition {
            let best_inlier_count = best.as_ref().map(|(_, s)| s.inliers.len()).unwrap_or(0);
            adaptive_budget = adaptive_iteration_bound(confidence, best_inlier_count, data_size, minimum_sample_size, runtime_params.max_iterations);
            if iterations >= adaptive_budget {
                break;
            }
        }
    }

    let survived = best.ok_or(RansacError::NoModelFound)?;

    match runtime_params.stopping_condition {
        StoppingCondition::NumberInliers(_) | StoppingCondition::PercentageInliers(_) => Err(RansacError::TargetNotReached),
        _ => Ok(finalize(survived, matches, runtime_params, iterations))
    }
}

fn draw_non_degenerate_sample<'a, M: TransformModel, T: Feature + Clone>(matches: &'a Vec<Match<T>>, sample_size: usize, max_retries: usize, rng: &mut SmallRng) -> Option<Vec<&'a Match<T>>> {
    for _ in 0..=max_retries {
        let indices = rand::seq::index::sample(rng, matches.len(), sample_size);
        let sample: Vec<&Match<T>> = indices.iter().map(|idx| &matches[idx]).collect();
        if !M::is_degenerate(&sample) {
            return Some(sample);
        }
    }
    None
}

fn score_model<M: TransformModel, T: Feature + Clone>(model: &M, matches: &Vec<Match<T>>, inlier_threshold: Float) -> Score {
    let mut inliers = Vec::<usize>::new();
    let mut outliers = Vec::<usize>::new();
    let mut total_inlier_error = 0.0;

    for (index, correspondence) in matches.iter().enumerate() {
        let error = model.residual(correspondence);
        if error < inlier_threshold {
            inliers.push(index);
            total_inlier_error += error;
        } else {
            outliers.push(index);
        }
    }

    Score{inliers, outliers, total_inlier_error}
}

// More inliers wins, lower total inlier error breaks ties. Strict comparison keeps the
// earliest iteration on exact ties, which makes runs reproducible.
fn is_better<M: TransformModel>(best: &Option<(M, Score)>, candidate: &Score) -> bool {
    match best {
        None => true,
        Some((_, best_score)) => {
            candidate.inliers.len() > best_score.inliers.len() ||
            (candidate.inliers.len() == best_score.inliers.len() && candidate.total_inlier_error < best_score.total_inlier_error)
        }
    }
}

fn adaptive_iteration_bound(confidence: Float, inlier_count: usize, data_size: usize, sample_size: usize, max_iterations: usize) -> usize {
    let inlier_ratio = inlier_count as Float/data_size as Float;
    if inlier_ratio <= 0.0 {
        return max_iterations;
    }
    if inlier_ratio >= 1.0 {
        return 1;
    }

    let failure_probability = 1.0 - confidence.min(1.0 - 1e-12).max(1e-12);
    let sample_all_inliers = inlier_ratio.powi(sample_size as i32);

    let bound = failure_probability.ln()/(1.0 - sample_all_inliers).max(1e-12).ln();
    match bound {
        b if b.is_finite() && b >= 0.0 => (b.ceil() as usize).min(max_iterations).max(1),
        _ => max_iterations
    }
}

// Optional non-minimal refit on all inliers of the winning model, rescored so the
// returned inlier set matches the returned transform.
fn finalize<M: TransformModel, T: Feature + Clone>(best: (M, Score), matches: &Vec<Match<T>>, runtime_params: &RansacRuntimeParams, iterations: usize) -> RansacEstimate<M> {
    let (mut model, mut score) = best;

    if runtime_params.improve_estimate && score.inliers.len() > M::minimum_sample_size() {
        let inlier_matches: Vec<&Match<T>> = score.inliers.iter().map(|&idx| &matches[idx]).collect();
        if let Ok(refitted) = M::estimate(&inlier_matches) {
            if refitted.is_well_conditioned(runtime_params.max_condition_number) {
                score = score_model(&refitted, matches, runtime_params.inlier_threshold);
                model = refitted;
            }
        }
    }

    RansacEstimate {
        model,
        inliers: score.inliers,
        outliers: score.outliers,
        total_inlier_error: score.total_inlier_error,
        iterations
    }
}

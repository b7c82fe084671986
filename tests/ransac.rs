use nalgebra as na;

use na::{Matrix3, Vector2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use local_features::Float;
use local_features::matching::{ImageFeature, Match};
use local_features::ransac::{fit_transform, RansacError, RansacRuntimeParams, StoppingCondition};
use local_features::ransac::model::{Affine, Fundamental, Homography, TransformModel, apply_homogeneous};

fn ransac_params(seed: u64) -> RansacRuntimeParams {
    let mut params = RansacRuntimeParams::default();
    params.seed = Some(seed);
    params
}

fn random_points(count: usize, rng: &mut SmallRng) -> Vec<Vector2<Float>> {
    (0..count).map(|_| Vector2::new(rng.gen_range(0.0..320.0), rng.gen_range(0.0..240.0))).collect()
}

fn matches_under_transform(transform: &Matrix3<Float>, points: &Vec<Vector2<Float>>) -> Vec<Match<ImageFeature>> {
    points.iter().map(|p| {
        let q = apply_homogeneous(transform, p).unwrap();
        Match::new(ImageFeature::new(p[0], p[1]), ImageFeature::new(q[0], q[1]), 0.0)
    }).collect()
}

fn test_homography() -> Matrix3<Float> {
    Matrix3::new(0.95, 0.05, 12.0,
                 -0.04, 1.05, -8.0,
                 1e-4, -5e-5, 1.0)
}

#[test]
fn recovers_exact_homography_from_pure_inliers() {
    let mut rng = SmallRng::seed_from_u64(99);
    let points = random_points(20, &mut rng);
    let truth = test_homography();
    let matches = matches_under_transform(&truth, &points);

    let estimate = fit_transform::<Homography, ImageFeature>(&matches, &ransac_params(1)).unwrap();

    assert_eq!(estimate.inliers.len(), matches.len());
    assert!(estimate.outliers.is_empty());

    // recovered up to scale, both are normalised to h33 = 1
    let recovered = estimate.model.matrix();
    for r in 0..3 {
        for c in 0..3 {
            assert!((recovered[(r,c)] - truth[(r,c)]).abs() < 1e-6,
                "homography entry ({},{}) differs: {} vs {}", r, c, recovered[(r,c)], truth[(r,c)]);
        }
    }
}

#[test]
fn separates_inliers_from_corrupted_correspondences() {
    let mut rng = SmallRng::seed_from_u64(7);
    let points = random_points(100, &mut rng);
    let truth = test_homography();
    let mut matches = matches_under_transform(&truth, &points);

    // corrupt 30% with large offsets
    let offset_distribution = Normal::<Float>::new(0.0, 60.0).unwrap();
    let corrupted_count = 30;
    for idx in 0..corrupted_count {
        let dx: Float = 25.0 + offset_distribution.sample(&mut rng).abs();
        let dy: Float = 25.0 + offset_distribution.sample(&mut rng).abs();
        matches[idx].feature_two.x += dx;
        matches[idx].feature_two.y += dy;
    }

    let mut params = ransac_params(2);
    params.inlier_threshold = 2.0;
    let estimate = fit_transform::<Homography, ImageFeature>(&matches, &params).unwrap();

    // every clean correspondence is recovered as an inlier
    for idx in corrupted_count..matches.len() {
        assert!(estimate.inliers.contains(&idx), "clean correspondence {} was not recovered", idx);
    }
    // the corrupted ones are flagged as outliers
    for idx in 0..corrupted_count {
        assert!(estimate.outliers.contains(&idx), "corrupted correspondence {} slipped through", idx);
    }

    // reprojection error of the recovered transform on the clean set stays below threshold
    for idx in corrupted_count..matches.len() {
        assert!(estimate.model.residual(&matches[idx]) < params.inlier_threshold);
    }
}

#[test]
fn affine_fit_recovers_known_rotation() {
    let angle: Float = 25.0_f64.to_radians();
    let truth = Matrix3::new(angle.cos(), -angle.sin(), 40.0,
                             angle.sin(), angle.cos(), -15.0,
                             0.0, 0.0, 1.0);

    let mut rng = SmallRng::seed_from_u64(21);
    let points = random_points(30, &mut rng);
    let matches = matches_under_transform(&truth, &points);

    let estimate = fit_transform::<Affine, ImageFeature>(&matches, &ransac_params(3)).unwrap();

    assert_eq!(estimate.inliers.len(), matches.len());
    assert!((estimate.model.rotation_angle() - angle).abs() < 2.0_f64.to_radians());
}

#[test]
fn fundamental_fit_satisfies_epipolar_constraint() {
    // two pinhole views separated by a lateral translation
    let focal = 400.0;
    let baseline = 0.3;
    let mut rng = SmallRng::seed_from_u64(17);

    let matches: Vec<Match<ImageFeature>> = (0..40).map(|_| {
        let x = rng.gen_range(-0.8..0.8);
        let y = rng.gen_range(-0.6..0.6);
        let z = rng.gen_range(1.5..4.0);
        let u_one = focal*x/z;
        let v_one = focal*y/z;
        let u_two = focal*(x - baseline)/z;
        let v_two = focal*y/z;
        Match::new(ImageFeature::new(u_one, v_one), ImageFeature::new(u_two, v_two), 0.0)
    }).collect();

    let mut params = ransac_params(5);
    params.inlier_threshold = 1.0;
    let estimate = fit_transform::<Fundamental, ImageFeature>(&matches, &params).unwrap();

    assert_eq!(estimate.inliers.len(), matches.len());
    for m in &matches {
        assert!(estimate.model.residual(m) < 1e-6);
    }
}

#[test]
fn too_few_correspondences_fail_explicitly() {
    let truth = test_homography();
    let points = vec![Vector2::new(10.0, 10.0), Vector2::new(100.0, 40.0), Vector2::new(60.0, 200.0)];
    let matches = matches_under_transform(&truth, &points);

    match fit_transform::<Homography, ImageFeature>(&matches, &ransac_params(1)) {
        Err(RansacError::NotEnoughCorrespondences { required: 4, actual: 3 }) => (),
        other => panic!("expected NotEnoughCorrespondences, got {:?}", other.map(|e| e.inliers.len()))
    }
}

#[test]
fn fully_collinear_data_reports_no_model() {
    // every sample that can be drawn is degenerate
    let matches: Vec<Match<ImageFeature>> = (0..12).map(|i| {
        let t = i as Float*10.0;
        Match::new(ImageFeature::new(t, 2.0*t), ImageFeature::new(t + 5.0, 2.0*t - 3.0), 0.0)
    }).collect();

    let mut params = ransac_params(4);
    params.max_iterations = 50;
    match fit_transform::<Homography, ImageFeature>(&matches, &params) {
        Err(RansacError::NoModelFound) => (),
        other => panic!("expected NoModelFound, got {:?}", other.map(|e| e.inliers.len()))
    }
}

#[test]
fn unreachable_inlier_percentage_reports_target_not_reached() {
    let mut rng = SmallRng::seed_from_u64(13);
    let points = random_points(40, &mut rng);
    let truth = test_homography();
    let mut matches = matches_under_transform(&truth, &points);

    for idx in 0..20 {
        matches[idx].feature_two.x += 40.0 + (idx as Float);
        matches[idx].feature_two.y -= 55.0;
    }

    let mut params = ransac_params(6);
    params.inlier_threshold = 2.0;
    params.max_iterations = 200;
    params.stopping_condition = StoppingCondition::PercentageInliers(0.99);

    match fit_transform::<Homography, ImageFeature>(&matches, &params) {
        Err(RansacError::TargetNotReached) => (),
        other => panic!("expected TargetNotReached, got {:?}", other.map(|e| e.inliers.len()))
    }
}

#[test]
fn percentage_target_stops_early_on_clean_data() {
    let mut rng = SmallRng::seed_from_u64(23);
    let points = random_points(50, &mut rng);
    let matches = matches_under_transform(&test_homography(), &points);

    let mut params = ransac_params(8);
    params.stopping_condition = StoppingCondition::PercentageInliers(0.9);
    let estimate = fit_transform::<Homography, ImageFeature>(&matches, &params).unwrap();

    assert!(estimate.iterations < params.max_iterations);
    assert!(estimate.inliers.len() >= 45);
}

#[test]
fn adaptive_stopping_shrinks_the_iteration_budget() {
    let mut rng = SmallRng::seed_from_u64(31);
    let points = random_points(60, &mut rng);
    let matches = matches_under_transform(&test_homography(), &points);

    let mut params = ransac_params(9);
    params.max_iterations = 5000;
    params.stopping_condition = StoppingCondition::AdaptiveBestFit { confidence: 0.99 };
    let estimate = fit_transform::<Homography, ImageFeature>(&matches, &params).unwrap();

    // all-inlier data collapses the adaptive bound almost immediately
    assert!(estimate.iterations < 100);
    assert_eq!(estimate.inliers.len(), matches.len());
}

#[test]
fn fixed_seed_reproduces_the_same_estimate() {
    let mut rng = SmallRng::seed_from_u64(41);
    let points = random_points(80, &mut rng);
    let mut matches = matches_under_transform(&test_homography(), &points);
    for idx in 0..20 {
        matches[idx].feature_two.x += 70.0;
    }

    let params = ransac_params(12);
    let first = fit_transform::<Homography, ImageFeature>(&matches, &params).unwrap();
    let second = fit_transform::<Homography, ImageFeature>(&matches, &params).unwrap();

    assert_eq!(first.inliers, second.inliers);
    assert_eq!(first.iterations, second.iterations);
    assert_eq!(first.model.matrix(), second.model.matrix());
}

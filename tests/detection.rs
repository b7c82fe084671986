use nalgebra as na;

use na::DMatrix;

use local_features::Float;
use local_features::keypoints_from_image;
use local_features::image::{Image, image_encoding::ImageEncoding};

mod common;

#[test]
fn flat_image_produces_no_keypoints() {
    let image = common::flat_image(64, 64, 0.5);
    let keypoints = keypoints_from_image(&image, &common::detector_params()).unwrap();
    assert!(keypoints.is_empty());
}

#[test]
fn blob_is_detected_near_its_center() {
    let mut buffer = DMatrix::<Float>::zeros(96, 96);
    common::add_blob(&mut buffer, 48.0, 48.0, 3.0, 1.0);
    let image = Image::from_matrix(&buffer, ImageEncoding::F64, false);

    let keypoints = keypoints_from_image(&image, &common::detector_params_without_orientation()).unwrap();
    assert!(!keypoints.is_empty());

    let closest_distance = keypoints.iter()
        .map(|k| ((k.x - 48.0).powi(2) + (k.y - 48.0).powi(2)).sqrt())
        .fold(Float::INFINITY, Float::min);
    assert!(closest_distance < 3.0, "no keypoint near the blob center, closest at {}", closest_distance);
}

#[test]
fn descriptors_have_constant_length_and_unit_norm() {
    let image = common::texture_image(128, 128, 40, 11);
    let params = common::detector_params();

    let keypoints = keypoints_from_image(&image, &params).unwrap();
    assert!(!keypoints.is_empty());

    for keypoint in &keypoints {
        assert_eq!(keypoint.descriptor.len(), params.descriptor_length());
        assert!((keypoint.descriptor.norm() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn detection_is_deterministic() {
    let image = common::texture_image(128, 128, 40, 11);
    let params = common::detector_params();

    let first = keypoints_from_image(&image, &params).unwrap();
    let second = keypoints_from_image(&image, &params).unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert!(a == b);
    }
}

#[test]
fn keypoints_too_close_to_the_border_are_discarded() {
    let mut buffer = DMatrix::<Float>::zeros(96, 96);
    common::add_blob(&mut buffer, 10.0, 10.0, 3.0, 1.0);
    common::add_blob(&mut buffer, 48.0, 48.0, 3.0, 1.0);
    let image = Image::from_matrix(&buffer, ImageEncoding::F64, false);

    let keypoints = keypoints_from_image(&image, &common::detector_params_without_orientation()).unwrap();
    assert!(!keypoints.is_empty());

    // the corner blob cannot carry a full sampling patch, only the center one survives
    for keypoint in &keypoints {
        assert!(keypoint.x >= 20.0 && keypoint.y >= 20.0,
            "keypoint at ({}, {}) would need samples outside the image", keypoint.x, keypoint.y);
    }
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let image = common::flat_image(64, 64, 0.5);
    let mut params = common::detector_params();
    params.sigma_initial = -1.0;
    assert!(keypoints_from_image(&image, &params).is_err());
}

use local_features::Float;
use local_features::pyramid::build_pyramid;

mod common;

#[test]
fn octave_structure_matches_configuration() {
    let image = common::texture_image(128, 128, 40, 11);
    let params = common::detector_params();

    let pyramid = build_pyramid(&image, &params);

    // 128 halves down to 8 before hitting the minimum dimension
    assert_eq!(pyramid.octaves.len(), 5);

    for (octave_level, octave) in pyramid.octaves.iter().enumerate() {
        let expected_dimension = 128/2usize.pow(octave_level as u32);
        assert_eq!(octave.width(), expected_dimension);
        assert_eq!(octave.height(), expected_dimension);

        assert_eq!(octave.images.len(), params.sigma_count + 3);
        assert_eq!(octave.difference_of_gaussians.len(), octave.images.len() - 1);
        assert_eq!(octave.sigmas.len(), octave.images.len());

        for image in octave.images.iter().chain(octave.difference_of_gaussians.iter()) {
            assert_eq!(image.width(), expected_dimension);
            assert_eq!(image.height(), expected_dimension);
        }

        // adjacent blur levels differ by the constant factor k = 2^(1/s)
        let k = (1.0/(params.sigma_count as Float)).exp2();
        for level in 0..octave.sigmas.len()-1 {
            assert!((octave.sigmas[level+1]/octave.sigmas[level] - k).abs() < 1e-12);
        }
        assert!((octave.sigmas[params.sigma_count]/octave.sigmas[0] - 2.0).abs() < 1e-12);
    }
}

#[test]
fn dog_is_the_difference_of_adjacent_blur_levels() {
    let image = common::texture_image(64, 64, 20, 3);
    let params = common::detector_params();

    let pyramid = build_pyramid(&image, &params);
    let octave = &pyramid.octaves[0];

    for level in 0..octave.difference_of_gaussians.len() {
        let expected = &octave.images[level+1].buffer - &octave.images[level].buffer;
        let difference = (&octave.difference_of_gaussians[level].buffer - expected).abs().max();
        assert!(difference < 1e-12);
    }
}

#[test]
fn octave_scale_doubles_per_level() {
    let image = common::texture_image(64, 64, 20, 3);
    let params = common::detector_params();

    let pyramid = build_pyramid(&image, &params);
    assert!((pyramid.pixel_scale(0) - 1.0).abs() < 1e-12);
    assert!((pyramid.pixel_scale(2) - 4.0).abs() < 1e-12);
}

#[test]
fn doubled_initial_image_halves_the_pixel_scale() {
    let image = common::texture_image(32, 32, 10, 5);
    let mut params = common::detector_params();
    params.double_initial_image = true;

    let pyramid = build_pyramid(&image, &params);
    assert_eq!(pyramid.octaves[0].width(), 64);
    assert!((pyramid.pixel_scale(0) - 0.5).abs() < 1e-12);
    assert!((pyramid.pixel_scale(1) - 1.0).abs() < 1e-12);
}

#[test]
fn too_small_input_yields_empty_pyramid() {
    let image = common::flat_image(6, 6, 0.5);
    let params = common::detector_params();

    let pyramid = build_pyramid(&image, &params);
    assert!(pyramid.octaves.is_empty());
}

#[test]
fn octave_count_is_honoured() {
    let image = common::texture_image(128, 128, 40, 11);
    let mut params = common::detector_params();
    params.octave_count = Some(2);

    let pyramid = build_pyramid(&image, &params);
    assert_eq!(pyramid.octaves.len(), 2);
}

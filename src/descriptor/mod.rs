extern crate nalgebra as na;

use na::DVector;

use crate::Float;

pub mod orientation_histogram;
pub mod local_image_descriptor;
pub mod keypoint;

/// Unit-normalises the histogram, clips large entries to reduce the influence of
/// strong gradients, and renormalises. Returns None for a zero vector.
pub fn normalize_and_clip(bins: &mut Vec<Float>, value_threshold: Float) -> Option<()> {
    normalize(bins)?;

    let mut clipped = false;
    for value in bins.iter_mut() {
        if *value > value_threshold {
            *value = value_threshold;
            clipped = true;
        }
    }

    if clipped {
        normalize(bins)?;
    }
    Some(())
}

fn normalize(bins: &mut Vec<Float>) -> Option<()> {
    let norm = bins.iter().map(|v| v.powi(2)).sum::<Float>().sqrt();
    if norm <= 0.0 {
        return None;
    }
    for value in bins.iter_mut() {
        *value /= norm;
    }
    Some(())
}

/// Joins per-band descriptors into one vector and renormalises it to unit length.
pub fn concatenate_band_descriptors(band_descriptors: &Vec<DVector<Float>>) -> DVector<Float> {
    let total_length: usize = band_descriptors.iter().map(|d| d.len()).sum();
    let mut joined = Vec::<Float>::with_capacity(total_length);
    for descriptor in band_descriptors {
        joined.extend(descriptor.iter());
    }

    let mut vector = DVector::from_vec(joined);
    let norm = vector.norm();
    if norm > 0.0 {
        vector /= norm;
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_and_clip_produces_unit_norm() {
        let mut bins = vec![3.0, 4.0, 0.1, 0.2];
        normalize_and_clip(&mut bins, 0.2).unwrap();
        let norm: Float = bins.iter().map(|v| v.powi(2)).sum::<Float>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        // clipping caps the dominant entries before the final renormalisation
        assert!(bins[0] < 0.9 && bins[1] < 0.9);
    }

    #[test]
    fn zero_vector_is_rejected() {
        let mut bins = vec![0.0; 8];
        assert!(normalize_and_clip(&mut bins, 0.2).is_none());
    }

    #[test]
    fn concatenated_bands_are_unit_norm() {
        let a = DVector::from_vec(vec![1.0, 0.0]);
        let b = DVector::from_vec(vec![0.0, 1.0]);
        let joined = concatenate_band_descriptors(&vec![a, b]);
        assert_eq!(joined.len(), 4);
        assert!((joined.norm() - 1.0).abs() < 1e-12);
    }
}

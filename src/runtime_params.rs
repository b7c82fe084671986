use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::Float;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("{name} must be positive, got {value}")]
    NonPositiveValue { name: &'static str, value: Float },
    #[error("{name} must be at least {minimum}, got {value}")]
    BelowMinimum { name: &'static str, minimum: usize, value: usize },
    #[error("band pyramids do not share the detection pyramid geometry")]
    MismatchedBands,
    #[error("failed to parse runtime params: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// All tunables of the detection pipeline, passed by reference through every stage.
/// Defaults follow Lowe's published values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorRuntimeParams {
    /// Octaves to build; None keeps going until `min_image_dimension` is reached.
    pub octave_count: Option<usize>,
    /// Scale samples per octave doubling (s). An octave holds s+3 blur levels.
    pub sigma_count: usize,
    /// Blur of the first level of the first octave.
    pub sigma_initial: Float,
    /// Blur assumed to be already present in the input image.
    pub sigma_in: Float,
    /// Bilinearly upsample the input 2x before building the pyramid.
    pub double_initial_image: bool,
    /// Octave generation stops when either dimension would drop below this.
    pub min_image_dimension: usize,
    /// Gaussian kernel half width as a multiple of sigma.
    pub blur_half_factor: Float,
    /// Contrast threshold on the interpolated |DoG| response, relative to a [0,1] range.
    pub magnitude_threshold: Float,
    /// Edge rejection threshold r on the spatial Hessian eigenvalue ratio.
    pub eigenvalue_ratio: Float,
    /// Sub-pixel localisation iteration bound.
    pub refinement_iterations: usize,
    /// Assign dominant gradient orientations. When off every keypoint has orientation 0
    /// and the descriptor sampling grid stays axis aligned.
    pub orientation_assignment: bool,
    /// Emit one keypoint per significant orientation peak instead of only the dominant one.
    pub multiple_orientation_peaks: bool,
    pub orientation_histogram_bins: usize,
    /// Gaussian window of the orientation histogram relative to the keypoint sigma.
    pub orientation_sigma_factor: Float,
    /// Half width of the orientation sampling window as a multiple of the window sigma.
    pub orientation_sampling_factor: Float,
    /// Orientation peaks below this fraction of the histogram maximum are ignored.
    pub peak_threshold: Float,
    pub smoothing_iterations: usize,
    /// Spatial bins per descriptor axis.
    pub spatial_bins: usize,
    /// Orientation bins per spatial bin.
    pub orientation_bins: usize,
    /// Size of one spatial bin in multiples of the keypoint sigma.
    pub magnification: Float,
    /// Descriptor values are clipped here after the first normalisation.
    pub value_threshold: Float,
    /// Width of the descriptor weighting Gaussian relative to the half window.
    pub descriptor_gaussian_sigma: Float,
    /// Extra sampling margin around the descriptor window, in spatial bins.
    pub oversampling_margin: Float,
}

impl Default for DetectorRuntimeParams {
    fn default() -> DetectorRuntimeParams {
        DetectorRuntimeParams {
            octave_count: None,
            sigma_count: 3,
            sigma_initial: 1.6,
            sigma_in: 0.5,
            double_initial_image: false,
            min_image_dimension: 8,
            blur_half_factor: 3.0,
            magnitude_threshold: 0.04,
            eigenvalue_ratio: 10.0,
            refinement_iterations: 5,
            orientation_assignment: true,
            multiple_orientation_peaks: true,
            orientation_histogram_bins: 36,
            orientation_sigma_factor: 1.5,
            orientation_sampling_factor: 3.0,
            peak_threshold: 0.8,
            smoothing_iterations: 6,
            spatial_bins: 4,
            orientation_bins: 8,
            magnification: 3.0,
            value_threshold: 0.2,
            descriptor_gaussian_sigma: 1.0,
            oversampling_margin: 0.5,
        }
    }
}

impl DetectorRuntimeParams {

    pub fn descriptor_length(&self) -> usize {
        self.spatial_bins*self.spatial_bins*self.orientation_bins
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        let positive_floats = [
            ("sigma_initial", self.sigma_initial),
            ("sigma_in", self.sigma_in),
            ("blur_half_factor", self.blur_half_factor),
            ("magnitude_threshold", self.magnitude_threshold),
            ("eigenvalue_ratio", self.eigenvalue_ratio),
            ("orientation_sigma_factor", self.orientation_sigma_factor),
            ("orientation_sampling_factor", self.orientation_sampling_factor),
            ("peak_threshold", self.peak_threshold),
            ("magnification", self.magnification),
            ("value_threshold", self.value_threshold),
            ("descriptor_gaussian_sigma", self.descriptor_gaussian_sigma),
        ];
        for &(name, value) in positive_floats.iter() {
            if value <= 0.0 {
                return Err(ParamsError::NonPositiveValue { name, value });
            }
        }
        if self.oversampling_margin < 0.0 {
            return Err(ParamsError::NonPositiveValue { name: "oversampling_margin", value: self.oversampling_margin });
        }

        if self.sigma_count < 1 {
            return Err(ParamsError::BelowMinimum { name: "sigma_count", minimum: 1, value: self.sigma_count });
        }
        if self.min_image_dimension < 2 {
            return Err(ParamsError::BelowMinimum { name: "min_image_dimension", minimum: 2, value: self.min_image_dimension });
        }
        if self.refinement_iterations < 1 {
            return Err(ParamsError::BelowMinimum { name: "refinement_iterations", minimum: 1, value: self.refinement_iterations });
        }
        if self.orientation_histogram_bins < 3 {
            return Err(ParamsError::BelowMinimum { name: "orientation_histogram_bins", minimum: 3, value: self.orientation_histogram_bins });
        }
        if self.spatial_bins < 1 {
            return Err(ParamsError::BelowMinimum { name: "spatial_bins", minimum: 1, value: self.spatial_bins });
        }
        if self.orientation_bins < 1 {
            return Err(ParamsError::BelowMinimum { name: "orientation_bins", minimum: 1, value: self.orientation_bins });
        }

        Ok(())
    }

    pub fn from_yaml(source: &str) -> Result<DetectorRuntimeParams, ParamsError> {
        let params: DetectorRuntimeParams = serde_yaml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }
}

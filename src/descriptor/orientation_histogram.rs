use crate::{float, Float};
use crate::pyramid::octave::Octave;
use crate::runtime_params::DetectorRuntimeParams;
use crate::numerics::{gauss_2d, gradient_and_orientation, lagrange_interpolation_quadratic};
use crate::extrema::ExtremaParameters;
use crate::descriptor::keypoint::OctaveKeypoint;

/// Circular histogram over [0, 2pi).
#[derive(Debug,Clone)]
pub struct OrientationHistogram {
    pub bin_range: Float,
    pub bins: Vec<Float>
}

impl OrientationHistogram {

    pub fn new(bin_len: usize) -> OrientationHistogram {
        OrientationHistogram{
            bin_range: 2.0*float::consts::PI/(bin_len as Float),
            bins: vec![0.0; bin_len]
        }
    }

    pub fn add_measurement(&mut self, orientation: Float, weight: Float) {
        let index = self.radian_to_index(orientation);
        self.bins[index] += weight;
    }

    pub fn radian_to_index(&self, orientation: Float) -> usize {
        ((orientation/self.bin_range).floor() as usize) % self.bins.len()
    }

    pub fn index_to_radian(&self, index: Float) -> Float {
        index*self.bin_range
    }

    fn get_value_circular(&self, i: isize) -> Float {
        let len = self.bins.len() as isize;
        self.bins[(i.rem_euclid(len)) as usize]
    }

    /// One pass of the [1 4 6 4 1]/16 smoothing kernel with circular wrapping.
    pub fn smooth(&mut self) {
        let smoothed: Vec<Float> = (0..self.bins.len() as isize).map(|idx| {
            (self.get_value_circular(idx-2) + self.get_value_circular(idx+2))/16.0 +
            (self.get_value_circular(idx-1) + self.get_value_circular(idx+1))*4.0/16.0 +
            self.get_value_circular(idx)*6.0/16.0
        }).collect();
        self.bins = smoothed;
    }

    fn adjacent_circular(&self, bin_idx: usize) -> (usize, usize, usize) {
        let bin_len = self.bins.len();
        assert!(bin_len >= 3);
        let left = (bin_idx + bin_len - 1) % bin_len;
        let right = (bin_idx + 1) % bin_len;
        (left, bin_idx, right)
    }

    fn is_local_peak(&self, bin_idx: usize) -> bool {
        let (left, center, right) = self.adjacent_circular(bin_idx);
        let center_value = self.bins[center];
        center_value > self.bins[left] && center_value > self.bins[right]
    }
}

/// Builds the gradient orientation histogram around a refined extremum and produces one
/// keypoint per accepted peak. Depending on the configured policy this is a single
/// dominant orientation, one keypoint per significant peak, or a fixed zero orientation
/// for the rotation-non-invariant variant.
pub fn assign_orientations(octave: &Octave, extremum: &ExtremaParameters, runtime_params: &DetectorRuntimeParams) -> Vec<OctaveKeypoint> {
    let sigma = octave.sigma_for_level(extremum.sigma_level);

    if !runtime_params.orientation_assignment {
        return vec![OctaveKeypoint{
            x: extremum.x,
            y: extremum.y,
            sigma_level: extremum.sigma_level,
            sigma,
            orientation: 0.0
        }];
    }

    let x = extremum.x_image();
    let y = extremum.y_image();
    let sigma_level = extremum.closest_sigma_level();

    let window_sigma = runtime_params.orientation_sigma_factor*sigma;
    let w = (runtime_params.orientation_sampling_factor*window_sigma).ceil() as usize;

    let width = octave.width();
    let height = octave.height();
    if x < w || x + w >= width || y < w || y + w >= height || sigma_level >= octave.images.len() {
        return Vec::new();
    }

    let x_grad = &octave.x_gradient[sigma_level];
    let y_grad = &octave.y_gradient[sigma_level];

    let mut histogram = OrientationHistogram::new(runtime_params.orientation_histogram_bins);

    for y_sample in y-w..=y+w {
        for x_sample in x-w..=x+w {
            let gauss_weight = gauss_2d(extremum.x, extremum.y, x_sample as Float, y_sample as Float, window_sigma);
            let (magnitude, orientation) = gradient_and_orientation(x_grad, y_grad, x_sample, y_sample);
            histogram.add_measurement(orientation, magnitude*gauss_weight);
        }
    }

    for _ in 0..runtime_params.smoothing_iterations {
        histogram.smooth();
    }

    peak_orientations(&histogram, runtime_params).into_iter().map(|orientation| OctaveKeypoint{
        x: extremum.x,
        y: extremum.y,
        sigma_level: extremum.sigma_level,
        sigma,
        orientation
    }).collect()
}

fn peak_orientations(histogram: &OrientationHistogram, runtime_params: &DetectorRuntimeParams) -> Vec<Float> {
    let bin_len = histogram.bins.len();

    let max_bin = (0..bin_len).fold(0, |acc, idx| {
        if histogram.bins[idx] > histogram.bins[acc] { idx } else { acc }
    });
    let max_value = histogram.bins[max_bin];
    if max_value <= 0.0 {
        return Vec::new();
    }

    let threshold = runtime_params.peak_threshold*max_value;
    let peak_indices: Vec<usize> = match runtime_params.multiple_orientation_peaks {
        true => (0..bin_len)
            .filter(|&idx| histogram.bins[idx] >= threshold && histogram.is_local_peak(idx))
            .collect(),
        false if histogram.is_local_peak(max_bin) => vec![max_bin],
        false => Vec::new()
    };

    peak_indices.into_iter().map(|idx| {
        let (left, center, right) = histogram.adjacent_circular(idx);
        let interpolated = lagrange_interpolation_quadratic(
            center as Float - 1.0, center as Float, center as Float + 1.0,
            histogram.bins[left], histogram.bins[center], histogram.bins[right],
            0.0, bin_len as Float);
        histogram.index_to_radian(interpolated)
    }).collect()
}

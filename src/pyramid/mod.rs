use log::debug;

use crate::image::Image;
use crate::filter::{gauss_kernel::GaussKernel1D, gaussian_2_d_convolution};
use crate::runtime_params::DetectorRuntimeParams;
use crate::Float;
use self::octave::Octave;

pub mod octave;

#[derive(Debug,Clone)]
pub struct Pyramid {
    pub octaves: Vec<Octave>,
    pub double_initial_image: bool
}

impl Pyramid {

    /// Factor mapping octave-local pixel coordinates back into original-image space.
    pub fn pixel_scale(&self, octave_level: usize) -> Float {
        let scale = (octave_level as Float).exp2();
        match self.double_initial_image {
            true => 0.5*scale,
            false => scale
        }
    }

    pub fn same_geometry(&self, other: &Pyramid) -> bool {
        self.double_initial_image == other.double_initial_image &&
        self.octaves.len() == other.octaves.len() &&
        self.octaves.iter().zip(other.octaves.iter()).all(|(a,b)| {
            a.width() == b.width() && a.height() == b.height() && a.s() == b.s()
        })
    }
}

/// Builds octaves until the configured count or the minimum image size is reached.
/// An input below the minimum size yields an empty octave list.
pub fn build_pyramid(raw_image: &Image, runtime_params: &DetectorRuntimeParams) -> Pyramid {
    let mut octaves = Vec::<Octave>::new();

    let mut octave_image = initial_image(raw_image, runtime_params);
    let mut sigma = runtime_params.sigma_initial;
    let s = runtime_params.sigma_count;

    let mut octave_level = 0;
    loop {
        if let Some(octave_count) = runtime_params.octave_count {
            if octave_level >= octave_count {
                break;
            }
        }
        if octave_image.width() < runtime_params.min_image_dimension || octave_image.height() < runtime_params.min_image_dimension {
            break;
        }

        let new_octave = Octave::build_octave(&octave_image, octave_level, sigma, runtime_params);
        debug!("octave {}: {}x{}, base sigma {}", octave_level, new_octave.width(), new_octave.height(), sigma);

        octave_image = Image::downsample_half(new_octave.base_image_for_next_octave());
        // decimation halves the per-pixel sigma again, landing back on sigma_initial
        sigma = new_octave.sigmas[s]/2.0;
        octaves.push(new_octave);
        octave_level += 1;
    }

    Pyramid{octaves, double_initial_image: runtime_params.double_initial_image}
}

// Optional 2x upsample followed by a blur topping the assumed input blur up to
// sigma_initial. Doubling also doubles the blur already present in the input.
fn initial_image(raw_image: &Image, runtime_params: &DetectorRuntimeParams) -> Image {
    let (base, sigma_present) = match runtime_params.double_initial_image {
        true => (Image::upsample_double(raw_image), 2.0*runtime_params.sigma_in),
        false => (raw_image.clone(), runtime_params.sigma_in)
    };

    let sigma_extra_squared = runtime_params.sigma_initial.powi(2) - sigma_present.powi(2);
    match sigma_extra_squared {
        v if v <= 0.0 => base,
        v => {
            let sigma_extra = v.sqrt();
            let half_width = GaussKernel1D::half_width_for_sigma(runtime_params.blur_half_factor, sigma_extra);
            let kernel = GaussKernel1D::new(0.0, sigma_extra, half_width);
            gaussian_2_d_convolution(&base, &kernel, false)
        }
    }
}

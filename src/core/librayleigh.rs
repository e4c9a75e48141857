//! Binding to the compiled rayleigh correction library.
//!
//! The subroutine is built with gfortran:
//!
//! ```text
//! subroutine rayleigh(nchans, lines, samples, sensor, platform, chan_names, jday, &
//!                     radiances, sat_zen, sun_zen, rel_azm, infrared, reflectances)
//! ```
//!
//! Every argument is passed by reference, character lengths follow as hidden
//! trailing arguments, and arrays are column-major. `chan_names` is a
//! character array, so all names are right-padded to one length.

use crate::core::correction::{CorrectionRequest, RayleighCorrector};
use crate::types::{Cube, MaskedField, RayleighError, RayleighResult, Sample};
use ndarray::{Array3, ShapeBuilder};
use std::ffi::{c_char, c_float, c_int};

#[link(name = "rayleigh")]
extern "C" {
    #[link_name = "rayleigh_"]
    fn rayleigh_f(
        nchans: *const c_int,
        lines: *const c_int,
        samples: *const c_int,
        sensor: *const c_char,
        platform: *const c_char,
        chan_names: *const c_char,
        jday: *const c_int,
        radiances: *const c_float,
        sat_zen: *const c_float,
        sun_zen: *const c_float,
        rel_azm: *const c_float,
        infrared: *const c_float,
        reflectances: *mut c_float,
        sensor_len: usize,
        platform_len: usize,
        chan_names_len: usize,
    );
}

/// Corrector backed by the linked `librayleigh`
#[derive(Debug, Default, Clone, Copy)]
pub struct LibRayleigh;

impl LibRayleigh {
    pub fn new() -> Self {
        Self
    }
}

/// Right-pad names with spaces to a common length and concatenate them
fn pack_names(names: &[String]) -> (Vec<u8>, usize) {
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    let mut packed = Vec::with_capacity(width * names.len());
    for name in names {
        packed.extend_from_slice(name.as_bytes());
        packed.resize(packed.len() + width - name.len(), b' ');
    }
    (packed, width)
}

fn fortran_order_2d(field: &MaskedField) -> Vec<Sample> {
    field.data.t().iter().copied().collect()
}

fn to_c_int(value: usize, what: &str) -> RayleighResult<c_int> {
    c_int::try_from(value)
        .map_err(|_| RayleighError::Correction(format!("{} {} exceeds the routine's integer range", what, value)))
}

impl RayleighCorrector for LibRayleigh {
    fn correct(&self, request: &CorrectionRequest) -> RayleighResult<Cube> {
        let (lines, samples, nchans) = request.radiances.dim();
        let n_lines = to_c_int(lines, "lines")?;
        let n_samples = to_c_int(samples, "samples")?;
        let n_chans = to_c_int(nchans, "nchans")?;
        let jday: c_int = request.jday;

        let (chan_names, chan_width) = pack_names(&request.chan_names);
        let sensor = request.sensor.as_bytes();
        let platform = request.platform.as_bytes();

        let radiances: Vec<Sample> = request.radiances.data.t().iter().copied().collect();
        let sat_zen = fortran_order_2d(&request.sat_zenith);
        let sun_zen = fortran_order_2d(&request.sun_zenith);
        let rel_azm = fortran_order_2d(&request.rel_azimuth);
        let infrared = request.infrared.as_ref().map(fortran_order_2d);

        let mut reflectances = vec![0.0 as Sample; lines * samples * nchans];

        log::debug!(
            "librayleigh: nchans={} lines={} samples={} chan_names={:?} infrared={}",
            nchans,
            lines,
            samples,
            request.chan_names,
            infrared.is_some()
        );

        // SAFETY: every buffer outlives the call and is sized from the same
        // (lines, samples, nchans) the routine receives. An absent optional
        // argument is passed as a null pointer.
        unsafe {
            rayleigh_f(
                &n_chans,
                &n_lines,
                &n_samples,
                sensor.as_ptr() as *const c_char,
                platform.as_ptr() as *const c_char,
                chan_names.as_ptr() as *const c_char,
                &jday,
                radiances.as_ptr(),
                sat_zen.as_ptr(),
                sun_zen.as_ptr(),
                rel_azm.as_ptr(),
                infrared.as_ref().map_or(std::ptr::null(), |ir| ir.as_ptr()),
                reflectances.as_mut_ptr(),
                sensor.len(),
                platform.len(),
                chan_width,
            );
        }

        Array3::from_shape_vec((lines, samples, nchans).f(), reflectances)
            .map_err(|e| RayleighError::Correction(format!("Invalid reflectance buffer: {}", e)))
    }
}

//! rayleigh: sensor channel marshalling for rayleigh-scattering correction
//!
//! Maps VIIRS, MODIS, AHI and ABI radiance datasets onto the calling
//! convention of the external rayleigh correction routine and reshapes its
//! reflectances back into per-channel masked fields. Also reformats the
//! legacy rayleigh coefficient tables shipped with the routine.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    Cube, Field, MaskedCube, MaskedField, RayleighError, RayleighResult, Sensor, VarKey,
};

pub use crate::core::{rayleigh, CorrectionRequest, RayleighCorrector, RayleighProcessor, Reflectances, SensorVarMap};
pub use io::{CoefficientReformatter, Dataset, LabeledDataset};

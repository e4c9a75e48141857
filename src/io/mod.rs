//! Dataset sources and ancillary coefficient files

pub mod dataset;
pub mod ancillary;
#[cfg(feature = "raster")]
pub mod raster;

pub use dataset::{Dataset, LabeledDataset};
pub use ancillary::{
    discover_coefficient_files, CoefficientFile, CoefficientReformatter, CoefficientSet, Instrument,
    RecordLayout, ReformatStats, ReformattedFile,
};
#[cfg(feature = "raster")]
pub use raster::RasterDatasetReader;

//! Channel marshalling for rayleigh correction

pub mod var_map;
pub mod resolver;
pub mod angles;
pub mod correction;
#[cfg(feature = "librayleigh")]
pub mod librayleigh;

// Re-export main types
pub use var_map::SensorVarMap;
pub use resolver::{ChannelResolver, ResolvedChannels};
pub use angles::{relative_azimuth, AngleRequirements, AngleResolver, ViewingGeometry};
pub use correction::{rayleigh, CorrectionRequest, RayleighCorrector, RayleighProcessor, Reflectances};
#[cfg(feature = "librayleigh")]
pub use librayleigh::LibRayleigh;

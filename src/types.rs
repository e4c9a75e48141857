use ndarray::{Array2, Array3, Axis, Zip};
use std::str::FromStr;

/// Radiance, reflectance or angle sample
pub type Sample = f32;

/// 2D field (lines x samples)
pub type Field = Array2<Sample>;

/// 3D channel cube (lines x samples x channels)
pub type Cube = Array3<Sample>;

/// Supported sensors. The identifiers match the `source_name` attribute
/// written by the upstream readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Viirs,
    Modis,
    Ahi,
    Abi,
}

impl Sensor {
    /// All supported sensors, in lookup order
    pub const ALL: [Sensor; 4] = [Sensor::Viirs, Sensor::Modis, Sensor::Ahi, Sensor::Abi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensor::Viirs => "viirs",
            Sensor::Modis => "modis",
            Sensor::Ahi => "ahi",
            Sensor::Abi => "abi",
        }
    }

    /// Comma separated list of accepted identifiers, used in error messages
    pub fn accepted() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sensor {
    type Err = RayleighError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|sensor| sensor.as_str() == s)
            .ok_or_else(|| RayleighError::UnrecognizedSensor {
                sensor: s.to_string(),
                accepted: Self::accepted(),
            })
    }
}

/// Canonical channel and geometry keys of a sensor variable map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKey {
    Blu,
    Grn,
    Red,
    Nir,
    Ir,
    SatZen,
    SunZen,
    SatAzm,
    SunAzm,
}

impl VarKey {
    /// Visible/near-infrared channels stacked into the radiance cube, in stacking order
    pub const CORRECTABLE: [VarKey; 4] = [VarKey::Red, VarKey::Grn, VarKey::Blu, VarKey::Nir];

    pub fn as_str(&self) -> &'static str {
        match self {
            VarKey::Blu => "BLU",
            VarKey::Grn => "GRN",
            VarKey::Red => "RED",
            VarKey::Nir => "NIR",
            VarKey::Ir => "IR",
            VarKey::SatZen => "SATZEN",
            VarKey::SunZen => "SUNZEN",
            VarKey::SatAzm => "SATAZM",
            VarKey::SunAzm => "SUNAZM",
        }
    }
}

impl std::fmt::Display for VarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 2D field with a validity mask. `true` in the mask marks an invalid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedField {
    pub data: Field,
    pub mask: Array2<bool>,
}

impl MaskedField {
    pub fn new(data: Field, mask: Array2<bool>) -> RayleighResult<Self> {
        if data.dim() != mask.dim() {
            return Err(RayleighError::ShapeMismatch(format!(
                "data {:?} vs mask {:?}",
                data.dim(),
                mask.dim()
            )));
        }
        Ok(Self { data, mask })
    }

    /// Field with nothing masked
    pub fn unmasked(data: Field) -> Self {
        let mask = Array2::from_elem(data.dim(), false);
        Self { data, mask }
    }

    /// Mask NaN samples and, if given, samples equal to `fill_value`
    pub fn from_fill(data: Field, fill_value: Option<Sample>) -> Self {
        let mask = data.mapv(|v| v.is_nan() || fill_value.map_or(false, |fill| v == fill));
        Self { data, mask }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn masked_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Stacked channels with a per-channel validity mask
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedCube {
    pub data: Cube,
    pub mask: Array3<bool>,
}

impl MaskedCube {
    /// Stack 2D fields depth-wise (third axis), keeping each field's mask
    pub fn dstack(fields: &[&MaskedField]) -> RayleighResult<Self> {
        let first = fields
            .first()
            .ok_or_else(|| RayleighError::ShapeMismatch("cannot stack zero fields".to_string()))?;
        let (lines, samples) = first.dim();

        let mut data = Cube::zeros((lines, samples, fields.len()));
        let mut mask = Array3::from_elem((lines, samples, fields.len()), false);

        for (i, field) in fields.iter().enumerate() {
            if field.dim() != (lines, samples) {
                return Err(RayleighError::ShapeMismatch(format!(
                    "field {} has shape {:?}, expected {:?}",
                    i,
                    field.dim(),
                    (lines, samples)
                )));
            }
            data.index_axis_mut(Axis(2), i).assign(&field.data);
            mask.index_axis_mut(Axis(2), i).assign(&field.mask);
        }

        Ok(Self { data, mask })
    }

    /// (lines, samples, channels)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn channel_count(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Copy out one channel as a 2D masked field
    pub fn channel(&self, index: usize) -> MaskedField {
        MaskedField {
            data: self.data.index_axis(Axis(2), index).to_owned(),
            mask: self.mask.index_axis(Axis(2), index).to_owned(),
        }
    }

    /// Replace the data with `data`, keeping this cube's mask
    pub fn with_data(&self, data: Cube) -> RayleighResult<Self> {
        if data.dim() != self.data.dim() {
            return Err(RayleighError::ShapeMismatch(format!(
                "returned cube {:?} does not match radiance cube {:?}",
                data.dim(),
                self.data.dim()
            )));
        }
        Ok(Self {
            data,
            mask: self.mask.clone(),
        })
    }
}

/// Union of two masks of identical shape
pub fn combine_masks(a: &Array2<bool>, b: &Array2<bool>) -> Array2<bool> {
    Zip::from(a).and(b).map_collect(|&x, &y| x || y)
}

/// Error types for rayleigh marshalling
#[derive(Debug, thiserror::Error)]
pub enum RayleighError {
    #[error("Unrecognized sensor {sensor}.  Accepted sensors include: {accepted}")]
    UnrecognizedSensor { sensor: String, accepted: String },

    #[error("No correctable fields found in input dataset.")]
    NoCorrectableFields,

    #[error("No path specified for azimuth angle data.")]
    NoAzimuthPath,

    #[error("{0} not found in input dataset and ephemeris-based angle calculation is not available")]
    AngleUnavailable(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Correction routine failed: {0}")]
    Correction(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "raster")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for rayleigh operations
pub type RayleighResult<T> = Result<T, RayleighError>;

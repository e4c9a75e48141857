use crate::types::{RayleighResult, Sensor, VarKey};

const SATZEN_NAME: &str = "satellite_zenith_angle";
const SUNZEN_NAME: &str = "solar_zenith_angle";
const SATAZM_NAME: &str = "satellite_azimuth_angle";
const SUNAZM_NAME: &str = "solar_azimuth_angle";

static VIIRS_VAR_MAP: &[(VarKey, &str)] = &[
    (VarKey::Blu, "M03Rad"),
    (VarKey::Grn, "M04Rad"),
    (VarKey::Red, "M05Rad"),
    (VarKey::Nir, "M07Rad"),
    (VarKey::SatZen, SATZEN_NAME),
    (VarKey::SunZen, SUNZEN_NAME),
    (VarKey::SatAzm, SATAZM_NAME),
    (VarKey::SunAzm, SUNAZM_NAME),
];

static MODIS_VAR_MAP: &[(VarKey, &str)] = &[
    (VarKey::Blu, "chan3.0Rad"),
    (VarKey::Grn, "chan4.0Rad"),
    (VarKey::Red, "chan1.0Rad"),
    (VarKey::Nir, "chan2.0Rad"),
    (VarKey::SatZen, SATZEN_NAME),
    (VarKey::SunZen, SUNZEN_NAME),
    (VarKey::SatAzm, SATAZM_NAME),
    (VarKey::SunAzm, SUNAZM_NAME),
];

static AHI_VAR_MAP: &[(VarKey, &str)] = &[
    (VarKey::Blu, "B01Rad"),
    (VarKey::Grn, "B02Rad"),
    (VarKey::Red, "B03Rad"),
    (VarKey::Nir, "B04Rad"),
    (VarKey::Ir, "B13BT"),
    (VarKey::SatZen, SATZEN_NAME),
    (VarKey::SunZen, SUNZEN_NAME),
    (VarKey::SatAzm, SATAZM_NAME),
    (VarKey::SunAzm, SUNAZM_NAME),
];

// ABI carries no green band.
static ABI_VAR_MAP: &[(VarKey, &str)] = &[
    (VarKey::Blu, "B01Rad"),
    (VarKey::Red, "B02Rad"),
    (VarKey::Nir, "B03Rad"),
    (VarKey::Ir, "B13BT"),
    (VarKey::SatZen, SATZEN_NAME),
    (VarKey::SunZen, SUNZEN_NAME),
    (VarKey::SatAzm, SATAZM_NAME),
    (VarKey::SunAzm, SUNAZM_NAME),
];

/// Per-sensor table translating canonical keys to dataset field names
#[derive(Debug, Clone, Copy)]
pub struct SensorVarMap {
    sensor: Sensor,
    entries: &'static [(VarKey, &'static str)],
}

impl SensorVarMap {
    pub fn for_sensor(sensor: Sensor) -> Self {
        let entries = match sensor {
            Sensor::Viirs => VIIRS_VAR_MAP,
            Sensor::Modis => MODIS_VAR_MAP,
            Sensor::Ahi => AHI_VAR_MAP,
            Sensor::Abi => ABI_VAR_MAP,
        };
        Self { sensor, entries }
    }

    /// Look up the map for a dataset's `source_name`
    pub fn for_source(source_name: &str) -> RayleighResult<Self> {
        let sensor: Sensor = source_name.parse()?;
        Ok(Self::for_sensor(sensor))
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    /// Dataset field name for `key`, if this sensor defines one
    pub fn get(&self, key: VarKey) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| *name)
    }

    pub fn contains(&self, key: VarKey) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> &'static [(VarKey, &'static str)] {
        self.entries
    }
}

impl std::fmt::Display for SensorVarMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {{", self.sensor)?;
        for (i, (key, name)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, name)?;
        }
        write!(f, "}}")
    }
}

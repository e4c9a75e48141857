use crate::core::var_map::SensorVarMap;
use crate::io::dataset::Dataset;
use crate::types::{combine_masks, MaskedField, RayleighError, RayleighResult, Sample, VarKey};
use ndarray::Zip;

/// Viewing geometry passed to the correction routine
#[derive(Debug, Clone)]
pub struct ViewingGeometry {
    pub sat_zenith: MaskedField,
    pub sun_zenith: MaskedField,
    pub rel_azimuth: MaskedField,
}

/// Which angles the dataset is missing and would need ephemeris derivation for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AngleRequirements {
    pub sat_zenith: bool,
    pub sun_zenith: bool,
    pub rel_azimuth: bool,
}

impl AngleRequirements {
    pub fn any(&self) -> bool {
        self.sat_zenith || self.sun_zenith || self.rel_azimuth
    }
}

/// Resolves zenith angles and relative azimuth from a dataset
pub struct AngleResolver {
    var_map: SensorVarMap,
}

impl AngleResolver {
    pub fn new(var_map: SensorVarMap) -> Self {
        Self { var_map }
    }

    /// Determine which angles are absent from the dataset. Relative azimuth
    /// needs calculating only when both azimuth fields are absent.
    pub fn requirements<D: Dataset + ?Sized>(&self, dataset: &D) -> AngleRequirements {
        let present = |key: VarKey| {
            self.var_map
                .get(key)
                .map_or(false, |name| dataset.contains(name))
        };

        let mut needs = AngleRequirements::default();
        if !present(VarKey::SatZen) {
            log::info!("    Going to calculate satellite_zenith_angle");
            needs.sat_zenith = true;
        }
        if !present(VarKey::SunZen) {
            log::info!("    Going to calculate solar_zenith_angle");
            needs.sun_zenith = true;
        }
        if self.var_map.contains(VarKey::SunAzm)
            && self.var_map.contains(VarKey::SatAzm)
            && !present(VarKey::SunAzm)
            && !present(VarKey::SatAzm)
        {
            log::info!("    Going to calculate RelAzimuth");
            needs.rel_azimuth = true;
        }
        needs
    }

    pub fn resolve<D: Dataset + ?Sized>(&self, dataset: &D) -> RayleighResult<ViewingGeometry> {
        let needs = self.requirements(dataset);

        if needs.sat_zenith {
            return Err(RayleighError::AngleUnavailable(
                self.name_of(VarKey::SatZen).to_string(),
            ));
        }
        log::info!("    Using satellite_zenith_angle from input dataset");
        let sat_zenith = self.field(dataset, VarKey::SatZen)?;

        if needs.sun_zenith {
            return Err(RayleighError::AngleUnavailable(
                self.name_of(VarKey::SunZen).to_string(),
            ));
        }
        log::info!("    Using solar_zenith_angle from input dataset");
        let sun_zenith = self.field(dataset, VarKey::SunZen)?;

        if needs.rel_azimuth {
            return Err(RayleighError::NoAzimuthPath);
        }
        let (Some(sun_name), Some(sat_name)) =
            (self.var_map.get(VarKey::SunAzm), self.var_map.get(VarKey::SatAzm))
        else {
            return Err(RayleighError::NoAzimuthPath);
        };
        let (Some(sun_azimuth), Some(sat_azimuth)) = (dataset.field(sun_name), dataset.field(sat_name))
        else {
            return Err(RayleighError::NoAzimuthPath);
        };
        log::info!(
            "    Using satellite_azimuth_angle and solar_azimuth_angle from input dataset to get RelAzimuth"
        );
        let rel_azimuth = relative_azimuth(sun_azimuth, sat_azimuth)?;

        Ok(ViewingGeometry {
            sat_zenith,
            sun_zenith,
            rel_azimuth,
        })
    }

    fn name_of(&self, key: VarKey) -> &'static str {
        self.var_map.get(key).unwrap_or(key.as_str())
    }

    fn field<D: Dataset + ?Sized>(&self, dataset: &D, key: VarKey) -> RayleighResult<MaskedField> {
        self.var_map
            .get(key)
            .and_then(|name| dataset.field(name))
            .cloned()
            .ok_or_else(|| RayleighError::AngleUnavailable(self.name_of(key).to_string()))
    }
}

/// Relative azimuth in [0, 180] degrees from solar and satellite azimuths.
/// The result is masked wherever either input is masked.
pub fn relative_azimuth(sun_azimuth: &MaskedField, sat_azimuth: &MaskedField) -> RayleighResult<MaskedField> {
    if sun_azimuth.dim() != sat_azimuth.dim() {
        return Err(RayleighError::ShapeMismatch(format!(
            "solar azimuth {:?} vs satellite azimuth {:?}",
            sun_azimuth.dim(),
            sat_azimuth.dim()
        )));
    }

    let data = Zip::from(&sun_azimuth.data)
        .and(&sat_azimuth.data)
        .map_collect(|&sun, &sat| relative_azimuth_value(sun, sat));
    let mask = combine_masks(&sun_azimuth.mask, &sat_azimuth.mask);

    MaskedField::new(data, mask)
}

fn relative_azimuth_value(sun: Sample, sat: Sample) -> Sample {
    let mut delta = sun - sat;
    if delta >= 360.0 {
        delta -= 360.0;
    }
    if delta < 0.0 {
        delta += 360.0;
    }
    (delta - 180.0).abs()
}

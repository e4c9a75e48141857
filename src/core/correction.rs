use crate::core::angles::{AngleResolver, ViewingGeometry};
use crate::core::resolver::{ChannelResolver, ResolvedChannels};
use crate::core::var_map::SensorVarMap;
use crate::io::dataset::Dataset;
use crate::types::{Cube, MaskedCube, MaskedField, RayleighError, RayleighResult, VarKey};
use chrono::Datelike;

/// Everything the rayleigh correction routine needs for one scene
#[derive(Debug, Clone)]
pub struct CorrectionRequest {
    pub sensor: String,
    pub platform: String,
    /// Dataset field names of the radiance cube channels, in cube order
    pub chan_names: Vec<String>,
    /// Day of year of the scene start, 1-based
    pub jday: i32,
    pub radiances: MaskedCube,
    pub sat_zenith: MaskedField,
    pub sun_zenith: MaskedField,
    pub rel_azimuth: MaskedField,
    pub infrared: Option<MaskedField>,
}

impl CorrectionRequest {
    pub fn new(
        sensor: &str,
        platform: &str,
        jday: i32,
        channels: ResolvedChannels,
        geometry: ViewingGeometry,
    ) -> RayleighResult<Self> {
        let (lines, samples, _) = channels.radiances.dim();
        for (name, angle) in [
            ("satellite zenith", &geometry.sat_zenith),
            ("solar zenith", &geometry.sun_zenith),
            ("relative azimuth", &geometry.rel_azimuth),
        ] {
            if angle.dim() != (lines, samples) {
                return Err(RayleighError::ShapeMismatch(format!(
                    "{} {:?} does not match radiance cube {:?}",
                    name,
                    angle.dim(),
                    channels.radiances.dim()
                )));
            }
        }

        Ok(Self {
            sensor: sensor.to_string(),
            platform: platform.to_string(),
            chan_names: channels.var_names,
            jday,
            radiances: channels.radiances,
            sat_zenith: geometry.sat_zenith,
            sun_zenith: geometry.sun_zenith,
            rel_azimuth: geometry.rel_azimuth,
            infrared: channels.infrared,
        })
    }

    pub fn nchans(&self) -> usize {
        self.radiances.channel_count()
    }
}

/// The external rayleigh-scattering correction routine. Implementations
/// return a reflectance cube shaped like `request.radiances`.
pub trait RayleighCorrector {
    fn correct(&self, request: &CorrectionRequest) -> RayleighResult<Cube>;
}

impl<F> RayleighCorrector for F
where
    F: Fn(&CorrectionRequest) -> RayleighResult<Cube>,
{
    fn correct(&self, request: &CorrectionRequest) -> RayleighResult<Cube> {
        self(request)
    }
}

/// Corrected reflectances keyed by channel, in radiance cube order
#[derive(Debug, Clone, Default)]
pub struct Reflectances {
    channels: Vec<(VarKey, MaskedField)>,
}

impl Reflectances {
    /// Split a masked cube into channels labelled by `color_names`
    pub fn from_cube(color_names: &[VarKey], cube: &MaskedCube) -> RayleighResult<Self> {
        if color_names.len() != cube.channel_count() {
            return Err(RayleighError::ShapeMismatch(format!(
                "{} channel names for a cube of {} channels",
                color_names.len(),
                cube.channel_count()
            )));
        }
        let channels = color_names
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, cube.channel(index)))
            .collect();
        Ok(Self { channels })
    }

    pub fn get(&self, key: VarKey) -> Option<&MaskedField> {
        self.channels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, field)| field)
    }

    pub fn keys(&self) -> Vec<VarKey> {
        self.channels.iter().map(|(k, _)| *k).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarKey, &MaskedField)> {
        self.channels.iter().map(|(k, field)| (*k, field))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn into_inner(self) -> Vec<(VarKey, MaskedField)> {
        self.channels
    }
}

/// Marshals datasets into correction requests and reshapes the results
pub struct RayleighProcessor<C> {
    corrector: C,
}

impl<C: RayleighCorrector> RayleighProcessor<C> {
    pub fn new(corrector: C) -> Self {
        Self { corrector }
    }

    /// Build the correction request for `dataset` without invoking the corrector
    pub fn prepare<D: Dataset + ?Sized>(&self, dataset: &D) -> RayleighResult<(Vec<VarKey>, CorrectionRequest)> {
        let source_name = dataset.source_name();
        let var_map = SensorVarMap::for_source(source_name)?;
        log::debug!("Selected variable map {}", var_map);

        let channels = ChannelResolver::new(var_map).resolve(dataset)?;
        let geometry = AngleResolver::new(var_map).resolve(dataset)?;

        let jday = dataset.start_datetime().ordinal() as i32;
        let color_names = channels.color_names.clone();
        let request = CorrectionRequest::new(
            source_name,
            dataset.platform_name(),
            jday,
            channels,
            geometry,
        )?;

        Ok((color_names, request))
    }

    /// Correct the visible/near-infrared channels of `dataset`
    pub fn process<D: Dataset + ?Sized>(&self, dataset: &D) -> RayleighResult<Reflectances> {
        let (color_names, request) = self.prepare(dataset)?;

        log::info!(
            "Calling rayleigh correction for {} {} day {} with {} channels",
            request.sensor,
            request.platform,
            request.jday,
            request.nchans()
        );
        let ref_data = self.corrector.correct(&request)?;

        let reflectances = request.radiances.with_data(ref_data)?;
        Reflectances::from_cube(&color_names, &reflectances)
    }

    pub fn corrector(&self) -> &C {
        &self.corrector
    }
}

/// Rayleigh-correct `dataset` with `corrector`
pub fn rayleigh<D, C>(dataset: &D, corrector: C) -> RayleighResult<Reflectances>
where
    D: Dataset + ?Sized,
    C: RayleighCorrector,
{
    RayleighProcessor::new(corrector).process(dataset)
}

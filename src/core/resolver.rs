use crate::core::var_map::SensorVarMap;
use crate::io::dataset::Dataset;
use crate::types::{MaskedCube, MaskedField, RayleighError, RayleighResult, VarKey};

/// Channels gathered from a dataset for one correction call
#[derive(Debug, Clone)]
pub struct ResolvedChannels {
    /// Canonical keys of the stacked channels, in cube order
    pub color_names: Vec<VarKey>,
    /// Dataset field names of the stacked channels, in cube order
    pub var_names: Vec<String>,
    /// Stacked radiances (lines x samples x channels)
    pub radiances: MaskedCube,
    /// Longwave infrared side channel, when the sensor and dataset carry one
    pub infrared: Option<MaskedField>,
}

/// Selects the correctable channels of a dataset through a sensor variable map
pub struct ChannelResolver {
    var_map: SensorVarMap,
}

impl ChannelResolver {
    pub fn new(var_map: SensorVarMap) -> Self {
        Self { var_map }
    }

    /// Gather RED, GRN, BLU and NIR (whichever are present) plus optional IR
    pub fn resolve<D: Dataset + ?Sized>(&self, dataset: &D) -> RayleighResult<ResolvedChannels> {
        let mut color_names = Vec::new();
        let mut var_names = Vec::new();
        let mut fields = Vec::new();

        for key in VarKey::CORRECTABLE {
            let Some(name) = self.var_map.get(key) else {
                continue;
            };
            match dataset.field(name) {
                Some(field) => {
                    color_names.push(key);
                    var_names.push(name.to_string());
                    fields.push(field);
                }
                None => log::debug!("    {} ({}) not in dataset, skipping", key, name),
            }
        }

        if fields.is_empty() {
            return Err(RayleighError::NoCorrectableFields);
        }

        let infrared = self
            .var_map
            .get(VarKey::Ir)
            .and_then(|name| dataset.field(name))
            .cloned();

        let radiances = MaskedCube::dstack(&fields)?;

        if let Some(ir) = &infrared {
            let (lines, samples, _) = radiances.dim();
            if ir.dim() != (lines, samples) {
                return Err(RayleighError::ShapeMismatch(format!(
                    "infrared field {:?} does not match radiance cube {:?}",
                    ir.dim(),
                    radiances.dim()
                )));
            }
        }

        log::info!("{:?} len(rad_data) {:?}", var_names, radiances.dim());

        Ok(ResolvedChannels {
            color_names,
            var_names,
            radiances,
            infrared,
        })
    }
}

//! Python bindings. The correction routine is supplied from Python as a
//! callable with the signature
//! `corrector(sensor, platform, chan_names, jday, radiances, sat_zen, sun_zen, rel_azm, infrared=None)`.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use numpy::{PyReadonlyArray2, PyReadonlyArray3, ToPyArray};

use crate::core::{CorrectionRequest, RayleighCorrector, RayleighProcessor, SensorVarMap};
use crate::io::dataset::{parse_start_datetime, LabeledDataset};
use crate::io::{CoefficientReformatter, Instrument};
use crate::types::{Cube, MaskedField, RayleighError, RayleighResult};

impl From<RayleighError> for PyErr {
    fn from(err: RayleighError) -> PyErr {
        match err {
            RayleighError::UnrecognizedSensor { .. }
            | RayleighError::NoCorrectableFields
            | RayleighError::NoAzimuthPath
            | RayleighError::AngleUnavailable(_)
            | RayleighError::ShapeMismatch(_)
            | RayleighError::InvalidFormat(_)
            | RayleighError::Metadata(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Corrector that calls back into Python
struct PyCorrector {
    callable: PyObject,
}

impl PyCorrector {
    fn call(&self, py: Python<'_>, request: &CorrectionRequest) -> PyResult<Cube> {
        let args = (
            request.sensor.clone(),
            request.platform.clone(),
            request.chan_names.clone(),
            request.jday,
            request.radiances.data.to_pyarray(py),
            request.sat_zenith.data.to_pyarray(py),
            request.sun_zenith.data.to_pyarray(py),
            request.rel_azimuth.data.to_pyarray(py),
        );
        let kwargs = PyDict::new(py);
        if let Some(infrared) = &request.infrared {
            kwargs.set_item("infrared", infrared.data.to_pyarray(py))?;
        }

        let result = self.callable.call(py, args, Some(kwargs))?;
        let ref_data: PyReadonlyArray3<f32> = result.extract(py)?;
        Ok(ref_data.as_array().to_owned())
    }
}

impl RayleighCorrector for PyCorrector {
    fn correct(&self, request: &CorrectionRequest) -> RayleighResult<Cube> {
        Python::with_gil(|py| self.call(py, request))
            .map_err(|e| RayleighError::Correction(e.to_string()))
    }
}

fn build_dataset(
    source_name: String,
    platform_name: String,
    start_datetime: &str,
    fields: &PyDict,
    masks: Option<&PyDict>,
) -> PyResult<LabeledDataset> {
    let start = parse_start_datetime(start_datetime)?;
    let mut dataset = LabeledDataset::new(source_name, platform_name, start);

    for (key, value) in fields.iter() {
        let name: String = key.extract()?;
        let data: PyReadonlyArray2<f32> = value.extract()?;
        let data = data.as_array().to_owned();

        let mask = match masks {
            Some(masks) => masks.get_item(name.as_str())?,
            None => None,
        };
        let field = match mask {
            Some(mask) => {
                let mask: PyReadonlyArray2<bool> = mask.extract()?;
                MaskedField::new(data, mask.as_array().to_owned())?
            }
            None => MaskedField::from_fill(data, None),
        };
        dataset.insert(name, field);
    }

    Ok(dataset)
}

/// Rayleigh-correct named fields; returns {channel: (reflectance, mask)}
#[pyfunction]
#[pyo3(signature = (source_name, platform_name, start_datetime, fields, corrector, masks=None))]
fn rayleigh(
    py: Python,
    source_name: String,
    platform_name: String,
    start_datetime: String,
    fields: &PyDict,
    corrector: PyObject,
    masks: Option<&PyDict>,
) -> PyResult<PyObject> {
    let dataset = build_dataset(source_name, platform_name, &start_datetime, fields, masks)?;
    let processor = RayleighProcessor::new(PyCorrector { callable: corrector });
    let reflectances = processor.process(&dataset)?;

    let result = PyDict::new(py);
    for (key, field) in reflectances.iter() {
        result.set_item(key.as_str(), (field.data.to_pyarray(py), field.mask.to_pyarray(py)))?;
    }
    Ok(result.into())
}

/// Variable map of a sensor as {key: field name}
#[pyfunction]
fn sensor_var_map(py: Python, sensor: String) -> PyResult<PyObject> {
    let var_map = SensorVarMap::for_source(&sensor)?;
    let result = PyDict::new(py);
    for (key, name) in var_map.entries() {
        result.set_item(key.as_str(), *name)?;
    }
    Ok(result.into())
}

/// Relative azimuth in degrees; NaN inputs come back masked
#[pyfunction]
fn relative_azimuth(
    py: Python,
    sun_azimuth: PyReadonlyArray2<f32>,
    sat_azimuth: PyReadonlyArray2<f32>,
) -> PyResult<PyObject> {
    let sun = MaskedField::from_fill(sun_azimuth.as_array().to_owned(), None);
    let sat = MaskedField::from_fill(sat_azimuth.as_array().to_owned(), None);
    let rel = crate::core::relative_azimuth(&sun, &sat)?;
    Ok((rel.data.to_pyarray(py), rel.mask.to_pyarray(py)).into_py(py))
}

/// Reformat an instrument's legacy coefficient files in `directory`
#[pyfunction]
fn reformat_coefficients(directory: String, instrument: String) -> PyResult<Vec<String>> {
    let instrument: Instrument = instrument.parse()?;
    let written = CoefficientReformatter::new()
        .reformat_set(&directory, &instrument.coefficient_set())?;
    Ok(written
        .into_iter()
        .map(|file| file.output.display().to_string())
        .collect())
}

/// Python module definition
#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rayleigh, m)?)?;
    m.add_function(wrap_pyfunction!(sensor_var_map, m)?)?;
    m.add_function(wrap_pyfunction!(relative_azimuth, m)?)?;
    m.add_function(wrap_pyfunction!(reformat_coefficients, m)?)?;
    Ok(())
}

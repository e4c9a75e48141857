use chrono::{DateTime, TimeZone, Utc};
use ndarray::{Array2, Axis};
use rayleigh::core::{CorrectionRequest, RayleighProcessor};
use rayleigh::io::Dataset;
use rayleigh::{Cube, Field, LabeledDataset, MaskedField, RayleighError, RayleighResult, Sensor, SensorVarMap, VarKey};
use std::cell::{Cell, RefCell};

const SHAPE: (usize, usize) = (3, 4);

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 2, 10, 4, 30, 0).unwrap()
}

fn field(value: f32) -> MaskedField {
    MaskedField::unmasked(Field::from_elem(SHAPE, value))
}

fn with_geometry(dataset: LabeledDataset) -> LabeledDataset {
    dataset
        .with_field("satellite_zenith_angle", field(30.0))
        .with_field("solar_zenith_angle", field(40.0))
        .with_field("satellite_azimuth_angle", field(100.0))
        .with_field("solar_azimuth_angle", field(250.0))
}

/// Full dataset for a sensor: every field its variable map names
fn full_dataset(sensor: Sensor) -> LabeledDataset {
    let mut dataset = LabeledDataset::new(sensor.as_str(), "test-platform", start());
    for (i, (_, name)) in SensorVarMap::for_sensor(sensor).entries().iter().enumerate() {
        dataset.insert(*name, field(i as f32 + 1.0));
    }
    dataset
}

/// Records every request and returns radiances scaled by 0.5
#[derive(Default)]
struct RecordingCorrector {
    requests: RefCell<Vec<CorrectionRequest>>,
}

impl rayleigh::RayleighCorrector for RecordingCorrector {
    fn correct(&self, request: &CorrectionRequest) -> RayleighResult<Cube> {
        self.requests.borrow_mut().push(request.clone());
        Ok(request.radiances.data.mapv(|v| v * 0.5))
    }
}

fn last_request(processor: &RayleighProcessor<RecordingCorrector>) -> CorrectionRequest {
    processor
        .corrector()
        .requests
        .borrow()
        .last()
        .cloned()
        .expect("corrector was called")
}

#[test]
fn test_selects_exactly_the_sensor_map_fields() {
    let _ = env_logger::builder().is_test(true).try_init();

    let expected: [(Sensor, Vec<&str>, bool); 4] = [
        (Sensor::Viirs, vec!["M05Rad", "M04Rad", "M03Rad", "M07Rad"], false),
        (Sensor::Modis, vec!["chan1.0Rad", "chan4.0Rad", "chan3.0Rad", "chan2.0Rad"], false),
        (Sensor::Ahi, vec!["B03Rad", "B02Rad", "B01Rad", "B04Rad"], true),
        (Sensor::Abi, vec!["B02Rad", "B01Rad", "B03Rad"], true),
    ];

    for (sensor, chan_names, has_infrared) in expected {
        // Decoy fields belonging to other sensors must be ignored
        let dataset = full_dataset(sensor)
            .with_field("M11Rad", field(99.0))
            .with_field("B05Rad", field(99.0));

        let processor = RayleighProcessor::new(RecordingCorrector::default());
        let reflectances = processor.process(&dataset).unwrap();
        let request = last_request(&processor);

        assert_eq!(request.sensor, sensor.as_str());
        assert_eq!(request.platform, "test-platform");
        assert_eq!(request.chan_names, chan_names, "{}", sensor);
        assert_eq!(request.radiances.channel_count(), chan_names.len());
        assert_eq!(request.infrared.is_some(), has_infrared, "{}", sensor);
        assert_eq!(reflectances.len(), chan_names.len());
    }
}

#[test]
fn test_output_keys_follow_cube_order() {
    let dataset = full_dataset(Sensor::Abi);
    let processor = RayleighProcessor::new(RecordingCorrector::default());
    let reflectances = processor.process(&dataset).unwrap();

    assert_eq!(reflectances.keys(), vec![VarKey::Red, VarKey::Blu, VarKey::Nir]);
    assert!(reflectances.get(VarKey::Grn).is_none());

    // ABI map: BLU=B01Rad inserted first (1.0), RED=B02Rad second (2.0)
    assert_eq!(reflectances.get(VarKey::Blu).unwrap().data[[0, 0]], 0.5);
    assert_eq!(reflectances.get(VarKey::Red).unwrap().data[[0, 0]], 1.0);
}

#[test]
fn test_day_of_year_and_geometry_passed_through() {
    let dataset = with_geometry(
        LabeledDataset::new("viirs", "noaa-20", start()).with_field("M05Rad", field(1.0)),
    );
    let processor = RayleighProcessor::new(RecordingCorrector::default());
    processor.process(&dataset).unwrap();
    let request = last_request(&processor);

    assert_eq!(request.jday, 41);
    assert_eq!(request.sat_zenith.data[[0, 0]], 30.0);
    assert_eq!(request.sun_zenith.data[[0, 0]], 40.0);
    // delta = 150, |150 - 180| = 30
    assert_eq!(request.rel_azimuth.data[[2, 3]], 30.0);
}

/// Dataset that counts field reads
struct CountingDataset {
    inner: LabeledDataset,
    reads: Cell<usize>,
}

impl Dataset for CountingDataset {
    fn source_name(&self) -> &str {
        self.inner.source_name()
    }

    fn platform_name(&self) -> &str {
        self.inner.platform_name()
    }

    fn start_datetime(&self) -> DateTime<Utc> {
        self.inner.start_datetime()
    }

    fn field(&self, name: &str) -> Option<&MaskedField> {
        self.reads.set(self.reads.get() + 1);
        self.inner.field(name)
    }

    fn field_names(&self) -> Vec<String> {
        self.inner.field_names()
    }
}

#[test]
fn test_unrecognized_sensor_fails_before_data_access() {
    let mut viirs = full_dataset(Sensor::Viirs);
    let inner = LabeledDataset::new("seviri", "msg-4", start())
        .with_field("M05Rad", viirs.remove("M05Rad").unwrap());
    let dataset = CountingDataset {
        inner,
        reads: Cell::new(0),
    };

    let processor = RayleighProcessor::new(RecordingCorrector::default());
    match processor.process(&dataset) {
        Err(RayleighError::UnrecognizedSensor { sensor, accepted }) => {
            assert_eq!(sensor, "seviri");
            assert_eq!(accepted, "viirs, modis, ahi, abi");
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.keys())),
    }
    assert_eq!(dataset.reads.get(), 0);
    assert!(processor.corrector().requests.borrow().is_empty());
}

#[test]
fn test_no_correctable_fields() {
    let dataset = with_geometry(
        LabeledDataset::new("ahi", "himawari-9", start()).with_field("B13BT", field(280.0)),
    );
    let processor = RayleighProcessor::new(RecordingCorrector::default());
    let err = processor.process(&dataset).unwrap_err();
    assert!(matches!(err, RayleighError::NoCorrectableFields));
    assert_eq!(err.to_string(), "No correctable fields found in input dataset.");
}

#[test]
fn test_missing_azimuths_fail() {
    let dataset = LabeledDataset::new("modis", "terra", start())
        .with_field("chan1.0Rad", field(1.0))
        .with_field("satellite_zenith_angle", field(30.0))
        .with_field("solar_zenith_angle", field(40.0));

    let processor = RayleighProcessor::new(RecordingCorrector::default());
    let err = processor.process(&dataset).unwrap_err();
    assert!(matches!(err, RayleighError::NoAzimuthPath));
    assert_eq!(err.to_string(), "No path specified for azimuth angle data.");
    assert!(processor.corrector().requests.borrow().is_empty());
}

#[test]
fn test_output_mask_matches_input_mask() {
    let mut red_mask = Array2::from_elem(SHAPE, false);
    red_mask[[0, 1]] = true;
    red_mask[[2, 3]] = true;
    let mut nir_mask = Array2::from_elem(SHAPE, false);
    nir_mask[[1, 0]] = true;

    let dataset = with_geometry(
        LabeledDataset::new("viirs", "npp", start())
            .with_field("M05Rad", MaskedField::new(Field::from_elem(SHAPE, 2.0), red_mask.clone()).unwrap())
            .with_field("M07Rad", MaskedField::new(Field::from_elem(SHAPE, 4.0), nir_mask.clone()).unwrap()),
    );

    // The corrector ignores masks and fills every sample
    let processor = RayleighProcessor::new(|request: &CorrectionRequest| -> RayleighResult<Cube> {
        Ok(Cube::from_elem(request.radiances.dim(), 0.1))
    });
    let reflectances = processor.process(&dataset).unwrap();

    assert_eq!(reflectances.get(VarKey::Red).unwrap().mask, red_mask);
    assert_eq!(reflectances.get(VarKey::Nir).unwrap().mask, nir_mask);
    for (_, channel) in reflectances.iter() {
        assert_eq!(channel.dim(), SHAPE);
    }
}

#[test]
fn test_corrector_shape_mismatch_is_rejected() {
    let dataset = full_dataset(Sensor::Viirs);
    let processor = RayleighProcessor::new(|request: &CorrectionRequest| -> RayleighResult<Cube> {
        // Drop the last channel
        let (lines, samples, nchans) = request.radiances.dim();
        Ok(Cube::zeros((lines, samples, nchans - 1)))
    });
    assert!(matches!(
        processor.process(&dataset),
        Err(RayleighError::ShapeMismatch(_))
    ));
}

#[test]
fn test_corrector_error_propagates() {
    let dataset = full_dataset(Sensor::Ahi);
    let result = rayleigh::rayleigh(&dataset, |_: &CorrectionRequest| -> RayleighResult<Cube> {
        Err(RayleighError::Correction("table not found".to_string()))
    });
    match result {
        Err(RayleighError::Correction(msg)) => assert_eq!(msg, "table not found"),
        other => panic!("unexpected result: {:?}", other.map(|r| r.keys())),
    }
}

#[test]
fn test_prepare_without_correction() {
    let dataset = full_dataset(Sensor::Ahi);
    let processor = RayleighProcessor::new(RecordingCorrector::default());
    let (color_names, request) = processor.prepare(&dataset).unwrap();

    assert_eq!(color_names, VarKey::CORRECTABLE.to_vec());
    let infrared = request.infrared.expect("AHI carries B13BT");
    // B13BT is the fifth AHI map entry
    assert_eq!(infrared.data[[0, 0]], 5.0);
    assert_eq!(
        request.radiances.data.index_axis(Axis(2), 0).to_owned(),
        Field::from_elem(SHAPE, 3.0)
    );
    assert!(processor.corrector().requests.borrow().is_empty());
}

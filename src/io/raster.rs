use crate::io::dataset::{parse_start_datetime, LabeledDataset};
use crate::types::{MaskedField, RayleighError, RayleighResult, Sample};
use gdal::{Dataset, Metadata};
use ndarray::Array2;
use std::path::Path;

/// Loads multi-band rasters written by sensor readers into a [`LabeledDataset`].
///
/// Each band's description names the field; samples equal to the band's
/// no-data value, or NaN, are masked. The dataset metadata items
/// `source_name`, `platform_name` and `start_datetime` supply the attributes.
pub struct RasterDatasetReader;

impl RasterDatasetReader {
    pub fn open<P: AsRef<Path>>(path: P) -> RayleighResult<LabeledDataset> {
        let path = path.as_ref();
        log::info!("Reading raster dataset: {}", path.display());

        let dataset = Dataset::open(path)?;
        let source_name = required_item(&dataset, "source_name")?;
        let platform_name = required_item(&dataset, "platform_name")?;
        let start_datetime = parse_start_datetime(&required_item(&dataset, "start_datetime")?)?;

        let (width, height) = dataset.raster_size();
        log::debug!("Raster size: {}x{}, {} bands", width, height, dataset.raster_count());

        let mut labeled = LabeledDataset::new(source_name, platform_name, start_datetime);

        for index in 1..=dataset.raster_count() {
            let band = dataset.rasterband(index)?;
            let name = band.description()?.trim().to_string();
            if name.is_empty() {
                log::warn!("Band {} has no description, skipping", index);
                continue;
            }

            let buffer = band.read_as::<Sample>((0, 0), (width, height), (width, height), None)?;
            let data = Array2::from_shape_vec((height, width), buffer.data)
                .map_err(|e| RayleighError::InvalidFormat(format!("Failed to reshape band {}: {}", name, e)))?;
            let fill = band.no_data_value().map(|v| v as Sample);

            let field = MaskedField::from_fill(data, fill);
            log::debug!("  band {} -> {} ({} masked)", index, name, field.masked_count());
            labeled.insert(name, field);
        }

        Ok(labeled)
    }
}

fn required_item(dataset: &Dataset, key: &str) -> RayleighResult<String> {
    dataset
        .metadata_item(key, "")
        .ok_or_else(|| RayleighError::Metadata(format!("Raster has no {} metadata item", key)))
}

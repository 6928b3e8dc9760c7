use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{ConversionError, Result};
use crate::record::{
    AcquisitionSummary, ChannelDetail, ExperimentConfig, ImmersionMedium, SegmentationConfig,
    StainChannels, TileLayout,
};
use crate::schema::dataset_validator;


const RESOLUTION_UNIT: &str = "nm";

#[derive(Debug, Serialize)]
struct ExperimentSection {
    #[serde(rename = "ImmersionMedium")]
    immersion_medium: ImmersionMedium,
    #[serde(rename = "NominalMagnification")]
    nominal_magnification: u32,
    #[serde(rename = "NumericalAperture")]
    numerical_aperture: Number,
    #[serde(rename = "ResolutionX")]
    resolution_x: Number,
    #[serde(rename = "ResolutionXUnit")]
    resolution_x_unit: &'static str,
    #[serde(rename = "ResolutionY")]
    resolution_y: Number,
    #[serde(rename = "ResolutionYUnit")]
    resolution_y_unit: &'static str,
    #[serde(rename = "ResolutionZ")]
    resolution_z: Number,
    #[serde(rename = "ResolutionZUnit")]
    resolution_z_unit: &'static str,
    #[serde(rename = "BitDepth")]
    bit_depth: u32,
    #[serde(rename = "NumRegions")]
    num_regions: u32,
    #[serde(rename = "NumCycles")]
    num_cycles: u32,
    #[serde(rename = "NumZPlanes")]
    num_z_planes: u32,
    #[serde(rename = "NumChannels")]
    num_channels: u32,
    #[serde(rename = "RegionWidth")]
    region_width: u32,
    #[serde(rename = "RegionHeight")]
    region_height: u32,
    #[serde(rename = "TileWidth")]
    tile_width: u32,
    #[serde(rename = "TileHeight")]
    tile_height: u32,
    #[serde(rename = "TileOverlapX")]
    tile_overlap_x: Number,
    #[serde(rename = "TileOverlapY")]
    tile_overlap_y: Number,
    #[serde(rename = "TileLayout")]
    tile_layout: TileLayout,
}

impl ExperimentSection {
    fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            immersion_medium: config.immersion_medium,
            nominal_magnification: config.magnification,
            numerical_aperture: config.numerical_aperture.clone(),
            resolution_x: config.resolution_xy_nm.clone(),
            resolution_x_unit: RESOLUTION_UNIT,
            resolution_y: config.resolution_xy_nm.clone(),
            resolution_y_unit: RESOLUTION_UNIT,
            resolution_z: config.resolution_z_nm.clone(),
            resolution_z_unit: RESOLUTION_UNIT,
            bit_depth: config.bit_depth,
            num_regions: config.num_regions,
            num_cycles: config.num_cycles,
            num_z_planes: config.num_z_planes,
            num_channels: config.num_channels,
            region_width: config.region_width,
            region_height: config.region_height,
            tile_width: config.tile_width,
            tile_height: config.tile_height,
            tile_overlap_x: config.tile_overlap_x.clone(),
            tile_overlap_y: config.tile_overlap_y.clone(),
            tile_layout: config.tile_layout,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChannelDetailsSection<'a> {
    #[serde(rename = "ChannelDetailsArray")]
    channel_details_array: &'a [ChannelDetail],
}

#[derive(Debug, Clone, Copy)]
pub struct AssemblyInputs<'a> {
    pub summary: &'a AcquisitionSummary,
    pub experiment: &'a ExperimentConfig,
    pub stains: &'a StainChannels,
    pub segmentation: &'a SegmentationConfig,
    pub channel_details: &'a [ChannelDetail],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedMetadata {
    pub(crate) document: Map<String, Value>,
}

impl ConsolidatedMetadata {
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(&self.document).map_err(|source| {
            ConversionError::Encode {
                what: "consolidated metadata",
                source,
            }
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

pub fn assemble(inputs: AssemblyInputs<'_>) -> Result<ConsolidatedMetadata> {
    let document = merge_sections(inputs)?;

    dataset_validator()?
        .validate(&Value::Object(document.clone()))
        .map_err(|violation| ConversionError::OutputSchemaValidation {
            path: violation.path,
            message: violation.message,
        })?;

    Ok(ConsolidatedMetadata { document })
}

fn merge_sections(inputs: AssemblyInputs<'_>) -> Result<Map<String, Value>> {
    let mut document = Map::new();

    merge_into(&mut document, encode("acquisition summary", inputs.summary)?);
    merge_into(
        &mut document,
        encode(
            "experiment section",
            &ExperimentSection::from_config(inputs.experiment),
        )?,
    );
    merge_into(&mut document, encode("stain channels", inputs.stains)?);
    merge_into(
        &mut document,
        encode("segmentation designations", inputs.segmentation)?,
    );

    let mut channel_details = Map::new();
    channel_details.insert(
        "ChannelDetails".to_string(),
        encode(
            "channel details",
            &ChannelDetailsSection {
                channel_details_array: inputs.channel_details,
            },
        )?,
    );
    merge_into(&mut document, Value::Object(channel_details));

    Ok(document)
}

fn merge_into(document: &mut Map<String, Value>, section: Value) {
    if let Value::Object(entries) = section {
        for (key, value) in entries {
            document.entry(key).or_insert(value);
        }
    }
}

fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|source| ConversionError::Encode { what, source })
}

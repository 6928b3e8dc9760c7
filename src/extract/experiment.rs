use serde_json::{Number, Value};

use super::{coerce_u32, exposure_table_from_rows, invalid_field};
use crate::error::{ConversionError, Result};
use crate::record::{ExperimentConfig, ImmersionMedium, TileLayout};
use crate::schema::Dialect;

const SOURCE: &str = "experiment metadata";

struct DialectFields {
    bit_depth: u32,
}

fn dialect_fields_1_5(document: &Value) -> Result<DialectFields> {
    Ok(DialectFields {
        bit_depth: read_u32(document, "bitness")?,
    })
}

fn dialect_fields_1_7(document: &Value) -> Result<DialectFields> {
    Ok(DialectFields {
        bit_depth: read_u32(document, "bitDepth")?,
    })
}

pub fn extract_experiment(
    document: &Value,
    version: &str,
    dialect: Dialect,
) -> Result<ExperimentConfig> {
    let dialect_fields = match dialect {
        Dialect::V1_5 => dialect_fields_1_5(document)?,
        Dialect::V1_7 => dialect_fields_1_7(document)?,
    };

    let exposure_times = match document
        .get("exposureTimes")
        .and_then(|section| section.get("exposureTimesArray"))
    {
        Some(Value::Array(rows)) => Some(exposure_table_from_rows(&json_rows(rows))?),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(invalid_field(
                SOURCE,
                "exposureTimes.exposureTimesArray",
                other,
                "expected an array of rows",
            ));
        }
    };

    Ok(ExperimentConfig {
        version: version.to_string(),
        dialect,
        immersion_medium: convert_immersion_medium(read_str(document, "objectiveType")?)?,
        magnification: read_u32(document, "magnification")?,
        numerical_aperture: read_number(document, "aperture")?,
        resolution_xy_nm: read_number(document, "xyResolution")?,
        resolution_z_nm: read_number(document, "zPitch")?,
        bit_depth: dialect_fields.bit_depth,
        num_regions: read_u32(document, "numRegions")?,
        num_cycles: read_u32(document, "numCycles")?,
        num_z_planes: read_u32(document, "numZPlanes")?,
        num_channels: read_u32(document, "numChannels")?,
        region_width: read_u32(document, "regionWidth")?,
        region_height: read_u32(document, "regionHeight")?,
        tile_width: read_u32(document, "tileWidth")?,
        tile_height: read_u32(document, "tileHeight")?,
        tile_overlap_x: read_number(document, "tileOverlapX")?,
        tile_overlap_y: read_number(document, "tileOverlapY")?,
        tile_layout: convert_tiling_mode(read_str(document, "tilingMode")?)?,
        exposure_times,
    })
}

pub fn convert_immersion_medium(label: &str) -> Result<ImmersionMedium> {
    let lowered = label.to_lowercase();
    ImmersionMedium::ALL
        .into_iter()
        .find(|medium| lowered.contains(medium.keyword()))
        .ok_or_else(|| ConversionError::UnrecognizedMedium {
            value: label.to_string(),
        })
}

pub fn convert_tiling_mode(label: &str) -> Result<TileLayout> {
    let lowered = label.to_lowercase();
    if lowered.contains("snake") {
        Ok(TileLayout::Snake)
    } else if lowered.contains("grid") {
        Ok(TileLayout::Grid)
    } else {
        Err(ConversionError::UnrecognizedTilingMode {
            value: label.to_string(),
        })
    }
}

fn field<'a>(document: &'a Value, name: &str) -> &'a Value {
    document.get(name).unwrap_or(&Value::Null)
}

fn read_u32(document: &Value, name: &str) -> Result<u32> {
    let value = field(document, name);
    coerce_u32(value).ok_or_else(|| invalid_field(SOURCE, name, value, "expected a non-negative integer"))
}

fn read_number(document: &Value, name: &str) -> Result<Number> {
    let value = field(document, name);
    value
        .as_number()
        .cloned()
        .ok_or_else(|| invalid_field(SOURCE, name, value, "expected a number"))
}

fn read_str<'a>(document: &'a Value, name: &str) -> Result<&'a str> {
    let value = field(document, name);
    value
        .as_str()
        .ok_or_else(|| invalid_field(SOURCE, name, value, "expected a string"))
}

fn json_rows(rows: &[Value]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| match row {
            Value::Array(cells) => cells.iter().map(json_cell).collect(),
            other => vec![json_cell(other)],
        })
        .collect()
}

fn json_cell(cell: &Value) -> String {
    match cell {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

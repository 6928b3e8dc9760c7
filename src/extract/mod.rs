use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{ConversionError, Result};

mod embedded;
mod experiment;
mod exposure;
mod qc_sheet;
mod segmentation;
mod summary_sheet;
mod table;
#[cfg(test)]
mod tests;

pub use embedded::extract_camera_settings;
pub use experiment::extract_experiment;
pub use exposure::{ExposureSource, exposure_table_from_rows, resolve_exposure_times};
pub use qc_sheet::{SOURCE as QC_SOURCE, extract_qc_records};
pub use segmentation::extract_segmentation;
pub use summary_sheet::extract_summary;
pub use table::{RawTable, read_table, read_table_text};

const STRIP_CHARS: &[char] = &[',', '.', '\r', '\n', '\t', ' ', '\'', '"'];

pub fn clean_text(raw: &str) -> String {
    raw.trim_matches(STRIP_CHARS).to_string()
}

pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

pub fn read_json_document(path: &Path) -> Result<Value> {
    let raw = fs::read(path).map_err(|source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| ConversionError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && *float >= 0.0)
                    .map(|float| float as u64)
            })
            .and_then(|wide| u32::try_from(wide).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

pub(crate) fn invalid_field(source_name: &str, field: &str, value: &Value, reason: &str) -> ConversionError {
    ConversionError::InvalidField {
        source_name: source_name.to_string(),
        field: field.to_string(),
        value: render_value(value),
        reason: reason.to_string(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "<missing>".to_string(),
        other => other.to_string(),
    }
}

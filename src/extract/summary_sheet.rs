use std::collections::HashMap;

use super::{RawTable, clean_text};
use crate::error::{ConversionError, Result};
use crate::record::AcquisitionSummary;

const SOURCE: &str = "summary sheet";

pub const SUMMARY_KEYS: [&str; 7] = [
    "Version",
    "AcquisitionDate",
    "AssayType",
    "AssaySpecificSoftware",
    "AcquisitionMode",
    "DatasetName",
    "MicroscopeName",
];

pub fn extract_summary(table: &RawTable) -> Result<AcquisitionSummary> {
    let mut values: HashMap<String, String> = HashMap::new();
    for row in &table.rows {
        let key = clean_text(row.first().map(String::as_str).unwrap_or(""));
        let value = row.get(1).map(|cell| cell.trim()).unwrap_or("");
        if key.is_empty() || value.is_empty() {
            continue;
        }
        values.entry(key).or_insert_with(|| value.to_string());
    }

    let missing = SUMMARY_KEYS
        .iter()
        .filter(|key| !values.contains_key(**key))
        .map(|key| key.to_string())
        .collect::<Vec<String>>();
    if !missing.is_empty() {
        return Err(ConversionError::MissingSummaryKeys {
            source_name: SOURCE.to_string(),
            keys: missing,
        });
    }

    let mut take = |key: &str| values.remove(key).unwrap_or_default();
    Ok(AcquisitionSummary {
        version: take("Version"),
        acquisition_date: take("AcquisitionDate"),
        assay_type: take("AssayType"),
        assay_specific_software: take("AssaySpecificSoftware"),
        acquisition_mode: take("AcquisitionMode"),
        dataset_name: take("DatasetName"),
        microscope_name: take("MicroscopeName"),
    })
}

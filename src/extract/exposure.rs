use std::path::Path;

use serde::Serialize;

use super::RawTable;
use crate::error::{ConversionError, Result};
use crate::record::ExposureTimeTable;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureSource {
    ExperimentMetadata,
    TextTable,
}

impl ExposureSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExperimentMetadata => "experiment_metadata",
            Self::TextTable => "text_table",
        }
    }
}

pub fn exposure_table_from_rows(rows: &[Vec<String>]) -> Result<ExposureTimeTable> {
    let mut cycles = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        let Some(label) = row.first() else {
            continue;
        };
        let label = label.trim();
        if label.is_empty() || label.parse::<f64>().is_err() {
            continue;
        }

        let mut cells = row[1..].iter().map(|cell| cell.trim()).collect::<Vec<&str>>();
        while cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }

        let mut times = Vec::with_capacity(cells.len());
        for (column_index, cell) in cells.iter().enumerate() {
            let invalid = || ConversionError::InvalidExposureTime {
                row: row_index + 1,
                column: column_index + 2,
                value: (*cell).to_string(),
            };
            let parsed = cell
                .parse::<f64>()
                .ok()
                .filter(|millis| millis.is_finite() && *millis >= 0.0)
                .ok_or_else(invalid)?;
            let rounded = parsed.round_ties_even();
            if rounded > f64::from(u32::MAX) {
                return Err(invalid());
            }
            times.push(rounded as u32);
        }
        cycles.push(times);
    }

    Ok(ExposureTimeTable::new(cycles))
}

pub fn resolve_exposure_times(
    embedded: Option<&ExposureTimeTable>,
    text_table: Option<&RawTable>,
    text_table_path: &Path,
) -> Result<(ExposureTimeTable, ExposureSource)> {
    if let Some(table) = embedded {
        return Ok((table.clone(), ExposureSource::ExperimentMetadata));
    }

    match text_table {
        Some(raw) => Ok((
            exposure_table_from_rows(&raw.rows)?,
            ExposureSource::TextTable,
        )),
        None => Err(ConversionError::MissingExposureTimes {
            table: text_table_path.to_path_buf(),
        }),
    }
}

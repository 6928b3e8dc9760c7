use super::{RawTable, clean_text, parse_flag};
use crate::error::{ConversionError, Result};
use crate::record::ChannelQcRecord;

pub const SOURCE: &str = "QC sheet";

pub const QC_COLUMNS: [&str; 8] = [
    "Marker",
    "Fluorophore",
    "PassedQC",
    "QCDetails",
    "ExcitationWavelength",
    "EmissionWavelength",
    "IsNuclearMarker",
    "IsMembraneMarker",
];

// Row `i` is channel `i mod channels + 1` of cycle `i div channels + 1`.
pub fn extract_qc_records(table: &RawTable, expected_rows: usize) -> Result<Vec<ChannelQcRecord>> {
    let mut indices = [0_usize; QC_COLUMNS.len()];
    let mut missing_columns = Vec::new();
    for (slot, column) in indices.iter_mut().zip(QC_COLUMNS) {
        match table.column_index(column) {
            Some(index) => *slot = index,
            None => missing_columns.push(column.to_string()),
        }
    }
    if !missing_columns.is_empty() {
        return Err(ConversionError::MissingColumns {
            source_name: SOURCE.to_string(),
            columns: missing_columns,
        });
    }

    if table.rows.len() < expected_rows {
        return Err(ConversionError::QcRowCount {
            source_name: SOURCE.to_string(),
            expected: expected_rows,
            actual: table.rows.len(),
        });
    }

    let rows_with_missing = (0..expected_rows)
        .filter(|row| {
            indices
                .iter()
                .any(|column| table.cell(*row, *column).trim().is_empty())
        })
        .map(|row| row + 1)
        .collect::<Vec<usize>>();
    if !rows_with_missing.is_empty() {
        return Err(ConversionError::MissingRowFields {
            source_name: SOURCE.to_string(),
            rows: rows_with_missing,
        });
    }

    (0..expected_rows)
        .map(|row| {
            let cells = indices.map(|column| clean_text(table.cell(row, column)));
            let [
                marker,
                fluorophore,
                passed_qc,
                qc_details,
                excitation,
                emission,
                is_nuclear,
                is_membrane,
            ] = cells;

            Ok(ChannelQcRecord {
                excitation_wavelength_nm: parse_wavelength(row, QC_COLUMNS[4], &excitation)?,
                emission_wavelength_nm: parse_wavelength(row, QC_COLUMNS[5], &emission)?,
                marker,
                fluorophore,
                passed_qc: parse_flag(&passed_qc),
                qc_details,
                is_nuclear_marker: parse_flag(&is_nuclear),
                is_membrane_marker: parse_flag(&is_membrane),
            })
        })
        .collect()
}

fn parse_wavelength(row: usize, column: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| ConversionError::InvalidField {
            source_name: SOURCE.to_string(),
            field: format!("{column} (row {})", row + 1),
            value: value.to_string(),
            reason: "expected an integer wavelength in nm".to_string(),
        })
}

use std::path::PathBuf;

use serde_json::{Number, json};

use super::*;
use crate::fixtures::keyence_image;
use crate::record::{ImmersionMedium, StainChannel, TileLayout};
use crate::schema::Dialect;

const QC_HEADER: &str = "Marker,Fluorophore,PassedQC,QCDetails,ExcitationWavelength,EmissionWavelength,IsNuclearMarker,IsMembraneMarker";

fn sheet(text: &str, has_header: bool) -> RawTable {
    table::parse_table(text, has_header, b',').expect("fixture table parses")
}

fn qc_sheet(rows: &[&str]) -> RawTable {
    let mut text = QC_HEADER.to_string();
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    sheet(&text, true)
}

fn experiment_document(version: &str) -> serde_json::Value {
    json!({
        "version": version,
        "objectiveType": "AIR IMMERSION",
        "magnification": 20,
        "aperture": 0.75,
        "xyResolution": 377.44,
        "zPitch": 1500,
        "bitness": 16,
        "bitDepth": 12,
        "numRegions": 2,
        "numCycles": 3,
        "numZPlanes": 5,
        "numChannels": 4,
        "regionWidth": 3,
        "regionHeight": 2,
        "tileWidth": 1920,
        "tileHeight": 1440,
        "tileOverlapX": 0.3,
        "tileOverlapY": 0.25,
        "tilingMode": "snakeRows"
    })
}

#[test]
fn clean_text_strips_quotes_punctuation_and_whitespace() {
    assert_eq!(clean_text("  'CD31', "), "CD31");
    assert_eq!(clean_text("\"DAPI-01\"\r\n"), "DAPI-01");
    assert_eq!(clean_text("Ki67."), "Ki67");
    assert_eq!(clean_text("CD-45 RO"), "CD-45 RO");
}

#[test]
fn parse_flag_accepts_only_true_in_any_case() {
    assert!(parse_flag("TRUE"));
    assert!(parse_flag(" true "));
    assert!(parse_flag("True"));
    assert!(!parse_flag("yes"));
    assert!(!parse_flag("1"));
    assert!(!parse_flag("false"));
}

#[test]
fn immersion_medium_matches_keyword_anywhere_in_label() {
    assert_eq!(
        experiment::convert_immersion_medium("AIR IMMERSION").expect("air recognized"),
        ImmersionMedium::Air
    );
    assert_eq!(
        experiment::convert_immersion_medium("Oil").expect("oil recognized"),
        ImmersionMedium::Oil
    );
    assert_eq!(
        experiment::convert_immersion_medium("silicone-glycerin mix").expect("glycerin recognized"),
        ImmersionMedium::Glycerin
    );

    let err = experiment::convert_immersion_medium("vacuum").unwrap_err();
    assert!(matches!(err, ConversionError::UnrecognizedMedium { ref value } if value == "vacuum"));
}

#[test]
fn tiling_mode_prefers_snake_then_grid() {
    assert_eq!(experiment::convert_tiling_mode("snakeRows").expect("snake"), TileLayout::Snake);
    assert_eq!(experiment::convert_tiling_mode("GRID").expect("grid"), TileLayout::Grid);
    assert_eq!(
        experiment::convert_tiling_mode("snake over grid").expect("snake wins"),
        TileLayout::Snake
    );

    let err = experiment::convert_tiling_mode("spiral").unwrap_err();
    assert!(matches!(err, ConversionError::UnrecognizedTilingMode { .. }));
}

#[test]
fn extract_experiment_reads_dialect_specific_bit_depth() {
    let document = experiment_document("1.5.0.38");
    let legacy = extract_experiment(&document, "1.5.0.38", Dialect::V1_5).expect("1.5 extracts");
    assert_eq!(legacy.bit_depth, 16);

    let current = extract_experiment(&document, "1.7.0.6", Dialect::V1_7).expect("1.7 extracts");
    assert_eq!(current.bit_depth, 12);
}

#[test]
fn extract_experiment_maps_counts_and_normalizes_labels() {
    let document = experiment_document("1.5.0.38");
    let config = extract_experiment(&document, "1.5.0.38", Dialect::V1_5).expect("extracts");

    assert_eq!(config.immersion_medium, ImmersionMedium::Air);
    assert_eq!(config.tile_layout, TileLayout::Snake);
    assert_eq!(config.num_cycles, 3);
    assert_eq!(config.num_channels, 4);
    assert_eq!(config.total_channels(), 12);
    assert_eq!(config.tiles_per_region(), 6);
    assert!(config.exposure_times.is_none());
}

#[test]
fn extract_experiment_keeps_number_form() {
    let document = experiment_document("1.7.0.6");
    let config = extract_experiment(&document, "1.7.0.6", Dialect::V1_7).expect("extracts");

    assert_eq!(config.resolution_z_nm, Number::from(1500));
    assert_eq!(json!(config.resolution_z_nm).to_string(), "1500");
    assert_eq!(json!(config.resolution_xy_nm).to_string(), "377.44");
    assert_eq!(json!(config.tile_overlap_y).to_string(), "0.25");
}

#[test]
fn extract_experiment_carries_embedded_exposure_times() {
    let mut document = experiment_document("1.7.0.6");
    document["exposureTimes"] = json!({
        "exposureTimesArray": [
            ["Cycle", "CH1", "CH2"],
            ["1", "10", "500"],
            ["2", "20", "350.4"]
        ]
    });

    let config = extract_experiment(&document, "1.7.0.6", Dialect::V1_7).expect("extracts");
    let table = config.exposure_times.expect("exposure table present");
    assert_eq!(table.cycle_count(), 2);
    assert_eq!(table.get(StainChannel::new(1, 2)), Some(500));
    assert_eq!(table.get(StainChannel::new(2, 1)), Some(20));
    assert_eq!(table.get(StainChannel::new(2, 2)), Some(350));
    assert_eq!(table.get(StainChannel::new(3, 1)), None);
}

#[test]
fn exposure_rows_reject_non_numeric_values() {
    let rows = vec![
        vec!["Cycle".to_string(), "CH1".to_string()],
        vec!["1".to_string(), "fast".to_string()],
    ];
    let err = exposure_table_from_rows(&rows).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::InvalidExposureTime { row: 2, column: 2, ref value } if value == "fast"
    ));
}

#[test]
fn exposure_text_table_without_header_is_read_by_position() {
    let raw = sheet("1,10,500,\n2,10,250,\n", false);
    let table = exposure_table_from_rows(&raw.rows).expect("parses");
    assert_eq!(table.cycle_count(), 2);
    assert_eq!(table.get(StainChannel::new(2, 2)), Some(250));
    assert_eq!(table.get(StainChannel::new(2, 3)), None);
}

#[test]
fn read_table_tolerates_ansi_bytes_and_byte_order_mark() {
    let temp = tempfile::TempDir::new().expect("tempdir");
    let ansi = temp.path().join("missing1.csv");
    let mut bytes = QC_HEADER.as_bytes().to_vec();
    bytes.extend_from_slice(b"\nDAPI,DAPI,TRUE,5 \xb5m bleed,358,461,TRUE,FALSE\n");
    std::fs::write(&ansi, &bytes).expect("write sheet");

    let table = read_table(&ansi, true).expect("reads non utf-8 sheet");
    let records = extract_qc_records(&table, 1).expect("extracts");
    assert_eq!(records[0].marker, "DAPI");
    assert!(records[0].qc_details.starts_with("5 "));
    assert!(records[0].qc_details.ends_with("m bleed"));

    let with_bom = temp.path().join("bom.csv");
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(b"InputDir,OutputDir\nraw,out\n");
    std::fs::write(&with_bom, &bytes).expect("write sheet");

    let table = read_table(&with_bom, true).expect("reads sheet");
    assert_eq!(table.column_index("InputDir"), Some(0));
}

#[test]
fn read_table_picks_workbook_reader_by_extension() {
    assert!(table::is_workbook(&PathBuf::from("missing1.xlsx")));
    assert!(table::is_workbook(&PathBuf::from("INPUT.XLSX")));
    assert!(!table::is_workbook(&PathBuf::from("missing1.csv")));
    assert!(!table::is_workbook(&PathBuf::from("exposure_times.txt")));

    let temp = tempfile::TempDir::new().expect("tempdir");
    let path = temp.path().join("missing1.xlsx");
    std::fs::write(&path, QC_HEADER).expect("write sheet");
    let err = read_table(&path, true).unwrap_err();
    assert!(matches!(err, ConversionError::Workbook { .. }));
}

#[test]
fn workbook_cells_render_like_text_cells() {
    use calamine::Data;

    assert_eq!(table::workbook_cell(&Data::Empty), "");
    assert_eq!(table::workbook_cell(&Data::String("CD31".to_string())), "CD31");
    assert_eq!(table::workbook_cell(&Data::Float(488.0)), "488");
    assert_eq!(table::workbook_cell(&Data::Int(650)), "650");
    assert!(parse_flag(&table::workbook_cell(&Data::Bool(true))));
    assert!(!parse_flag(&table::workbook_cell(&Data::Bool(false))));
}

#[test]
fn resolve_exposure_times_prefers_experiment_metadata() {
    let embedded = exposure_table_from_rows(&[vec!["1".to_string(), "7".to_string()]])
        .expect("embedded parses");
    let text = sheet("Cycle,CH1\n1,99\n", false);
    let path = PathBuf::from("exposure_times.txt");

    let (table, source) =
        resolve_exposure_times(Some(&embedded), Some(&text), &path).expect("resolves");
    assert_eq!(source, ExposureSource::ExperimentMetadata);
    assert_eq!(table.get(StainChannel::new(1, 1)), Some(7));

    let (table, source) = resolve_exposure_times(None, Some(&text), &path).expect("resolves");
    assert_eq!(source, ExposureSource::TextTable);
    assert_eq!(table.get(StainChannel::new(1, 1)), Some(99));

    let err = resolve_exposure_times(None, None, &path).unwrap_err();
    assert!(matches!(err, ConversionError::MissingExposureTimes { .. }));
}

#[test]
fn extract_segmentation_coerces_ids() {
    let document = json!({
        "nuclearStainCycle": 2,
        "nuclearStainChannel": "1",
        "membraneStainCycle": 3.0,
        "membraneStainChannel": 4
    });
    let config = extract_segmentation(&document).expect("extracts");
    assert_eq!(config.nuclear, StainChannel::new(2, 1));
    assert_eq!(config.membrane, StainChannel::new(3, 4));

    let err = extract_segmentation(&json!({
        "nuclearStainCycle": 2,
        "nuclearStainChannel": 1,
        "membraneStainCycle": "three",
        "membraneStainChannel": 4
    }))
    .unwrap_err();
    assert!(matches!(err, ConversionError::InvalidField { ref field, .. } if field == "membraneStainCycle"));
}

#[test]
fn extract_qc_records_cleans_strings_and_parses_flags() {
    let table = qc_sheet(&[
        "'DAPI-01',DAPI,TRUE,None,350,450,true,false",
        " CD31 ,Cy5,false,\"dim signal\",650,660,False,TRUE",
    ]);

    let records = extract_qc_records(&table, 2).expect("extracts");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].marker, "DAPI-01");
    assert!(records[0].passed_qc);
    assert!(records[0].is_nuclear_marker);
    assert!(!records[0].is_membrane_marker);
    assert_eq!(records[1].marker, "CD31");
    assert_eq!(records[1].qc_details, "dim signal");
    assert_eq!(records[1].excitation_wavelength_nm, 650);
    assert!(!records[1].passed_qc);
    assert!(records[1].is_membrane_marker);
}

#[test]
fn extract_qc_records_reads_only_expected_rows() {
    let table = qc_sheet(&[
        "DAPI,DAPI,true,ok,350,450,true,false",
        "CD31,Cy5,true,ok,650,660,false,true",
        "Notes,,,,,,,",
    ]);
    let records = extract_qc_records(&table, 2).expect("trailing rows ignored");
    assert_eq!(records.len(), 2);
}

#[test]
fn extract_qc_records_lists_every_row_with_blank_cells() {
    let mut rows = Vec::new();
    for index in 1..=8 {
        if index == 3 || index == 7 {
            rows.push(format!("M{index},,true,ok,350,450,false,false"));
        } else {
            rows.push(format!("M{index},FITC,true,ok,350,450,false,false"));
        }
    }
    let refs = rows.iter().map(String::as_str).collect::<Vec<&str>>();
    let table = qc_sheet(&refs);

    let err = extract_qc_records(&table, 8).unwrap_err();
    match err {
        ConversionError::MissingRowFields { rows, .. } => assert_eq!(rows, vec![3, 7]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extract_qc_records_requires_enough_rows_and_columns() {
    let table = qc_sheet(&["DAPI,DAPI,true,ok,350,450,true,false"]);
    let err = extract_qc_records(&table, 4).unwrap_err();
    assert!(matches!(err, ConversionError::QcRowCount { expected: 4, actual: 1, .. }));

    let table = sheet("Marker,Fluorophore\nDAPI,DAPI\n", true);
    let err = extract_qc_records(&table, 1).unwrap_err();
    match err {
        ConversionError::MissingColumns { columns, .. } => {
            assert_eq!(columns.len(), 6);
            assert!(columns.contains(&"PassedQC".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extract_qc_records_rejects_non_integer_wavelengths() {
    let table = qc_sheet(&["DAPI,DAPI,true,ok,blue,450,true,false"]);
    let err = extract_qc_records(&table, 1).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::InvalidField { ref field, ref value, .. }
            if field == "ExcitationWavelength (row 1)" && value == "blue"
    ));
}

#[test]
fn extract_summary_reads_trimmed_keys() {
    let table = sheet(
        "Version,1.0\n' DatasetName ',spleen A\nAcquisitionDate,2020-02-19\nAssayType,CODEX\n\
         AssaySpecificSoftware,\"Akoya CODEX Instrument Manager 1.29\"\nAcquisitionMode,Confocal\n\
         MicroscopeName,Keyence BZ-X710\nOperator,\n",
        false,
    );
    let summary = extract_summary(&table).expect("extracts");
    assert_eq!(summary.dataset_name, "spleen A");
    assert_eq!(summary.microscope_name, "Keyence BZ-X710");
    assert_eq!(summary.assay_specific_software, "Akoya CODEX Instrument Manager 1.29");
}

#[test]
fn extract_summary_lists_all_missing_keys() {
    let table = sheet("Version,1.0\nAssayType,CODEX\nDatasetName,\n", false);
    let err = extract_summary(&table).unwrap_err();
    match err {
        ConversionError::MissingSummaryKeys { keys, .. } => assert_eq!(
            keys,
            vec![
                "AcquisitionDate",
                "AssaySpecificSoftware",
                "AcquisitionMode",
                "DatasetName",
                "MicroscopeName"
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn extract_camera_settings_reads_gain_and_binning() {
    let image = PathBuf::from("1_00001_Z001_CH1.tif");
    let settings = extract_camera_settings(&image, &keyence_image("125", "Off")).expect("reads");
    assert_eq!(settings.binning, 1);
    assert_eq!(settings.gain, 4);

    let settings = extract_camera_settings(&image, &keyence_image("0", "2")).expect("reads");
    assert_eq!(settings.binning, 2);
    assert_eq!(settings.gain, 1);
}

#[test]
fn extract_camera_settings_rejects_unexpected_binning() {
    let image = PathBuf::from("1_00001_Z001_CH1.tif");
    let err = extract_camera_settings(&image, &keyence_image("60", "fast")).unwrap_err();
    assert!(matches!(err, ConversionError::UnexpectedBinningValue { ref value, .. } if value == "fast"));
}

#[test]
fn extract_camera_settings_requires_xml_declaration() {
    let image = PathBuf::from("plain.tif");
    let err = extract_camera_settings(&image, b"II*\x00 no metadata here").unwrap_err();
    assert!(matches!(err, ConversionError::NoEmbeddedMetadata { .. }));
}

#[test]
fn extract_camera_settings_reports_missing_parameter_block() {
    let image = PathBuf::from("partial.tif");
    let bytes = b"<?xml version=\"1.0\"?><Data><SingleFileProperty></SingleFileProperty></Data>";
    let err = extract_camera_settings(&image, bytes).unwrap_err();
    assert!(matches!(err, ConversionError::MalformedEmbeddedMetadata { .. }));
}

#[test]
fn gain_keeps_whole_decibels_before_conversion() {
    assert_eq!(embedded::gain_ratio("0"), Some(1));
    assert_eq!(embedded::gain_ratio("60"), Some(2));
    assert_eq!(embedded::gain_ratio("125"), Some(4));
    assert_eq!(embedded::gain_ratio("129"), Some(4));
    assert_eq!(embedded::gain_ratio("200"), Some(10));
    assert_eq!(embedded::gain_ratio("-5"), Some(1));
    assert_eq!(embedded::gain_ratio("-65"), Some(0));
    assert_eq!(embedded::gain_ratio("12.5"), None);
}

#[test]
fn binning_rounds_to_nearest_integer() {
    assert_eq!(embedded::binning_factor("Off"), Some(1));
    assert_eq!(embedded::binning_factor("2"), Some(2));
    assert_eq!(embedded::binning_factor("3.6"), Some(4));
    assert_eq!(embedded::binning_factor("2.5"), Some(2));
    assert_eq!(embedded::binning_factor("fast"), None);
    assert_eq!(embedded::binning_factor("off"), None);
}

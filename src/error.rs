use std::path::PathBuf;

use thiserror::Error;

use crate::listing::ListingLevel;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("required input files are absent: {}", join_paths(.paths))]
    MissingFile { paths: Vec<PathBuf> },

    #[error("found several experiment files in {}: {}", .dir.display(), .names.join(", "))]
    AmbiguousExperimentFile { dir: PathBuf, names: Vec<String> },

    #[error("no image directories matching cycNNN_regNNN found in {}", .dir.display())]
    NoImageDirectories { dir: PathBuf },

    #[error("could not find field `version` in the experiment metadata")]
    MissingVersion,

    #[error("experiment metadata version {version} is not supported; supported ranges are {supported}")]
    UnsupportedVersion { version: String, supported: String },

    #[error("experiment metadata ({dialect}) failed schema validation at {path}: {message}")]
    RawSchemaValidation {
        dialect: String,
        path: String,
        message: String,
    },

    #[error("immersion medium `{value}` is not recognized; expected one of air, water, oil, glycerin")]
    UnrecognizedMedium { value: String },

    #[error("tiling mode `{value}` is not recognized; expected a snake or grid layout")]
    UnrecognizedTilingMode { value: String },

    #[error("field `{field}` in {source_name} has an invalid value `{value}`: {reason}")]
    InvalidField {
        source_name: String,
        field: String,
        value: String,
        reason: String,
    },

    #[error("{source_name} is missing columns: {}", .columns.join(", "))]
    MissingColumns {
        source_name: String,
        columns: Vec<String>,
    },

    #[error("{source_name} has {actual} channel rows, expected {expected} (cycles x channels)")]
    QcRowCount {
        source_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("{source_name} contains empty or missing values; check rows {}", join_numbers(.rows))]
    MissingRowFields { source_name: String, rows: Vec<usize> },

    #[error("fields {} are absent in {source_name}", .keys.join(", "))]
    MissingSummaryKeys {
        source_name: String,
        keys: Vec<String>,
    },

    #[error("could not find an xml declaration in {}", .image.display())]
    NoEmbeddedMetadata { image: PathBuf },

    #[error("embedded metadata in {} is malformed: {message}", .image.display())]
    MalformedEmbeddedMetadata { image: PathBuf, message: String },

    #[error("unexpected binning value `{value}` in {}", .image.display())]
    UnexpectedBinningValue { image: PathBuf, value: String },

    #[error("gain value `{value}` in {} is not an integer number of decibels", .image.display())]
    UnexpectedGainValue { image: PathBuf, value: String },

    #[error("expected camera settings for {expected} channels, read {actual}")]
    CameraSettingsCount { expected: usize, actual: usize },

    #[error("no exposure times found in the experiment metadata or {}", .table.display())]
    MissingExposureTimes { table: PathBuf },

    #[error("exposure time table has no entry for cycle {cycle}, channel {channel}")]
    MissingExposureTime { cycle: u32, channel: u32 },

    #[error("exposure time `{value}` for cycle row {row}, column {column} is not a number")]
    InvalidExposureTime {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("no nuclear stain channel is marked in {source_name}")]
    NoNuclearStain { source_name: String },

    #[error("no membrane stain channel is marked in {source_name}")]
    NoMembraneStain { source_name: String },

    #[error("{role} stain for segmentation (cycle {cycle}, channel {channel}) is not marked as {role} in {source_name}")]
    SegmentationStainMismatch {
        role: &'static str,
        cycle: u32,
        channel: u32,
        source_name: String,
    },

    #[error("number of {} is different from the one specified in the metadata: {}", .level.plural(), join_mismatches(.mismatches))]
    ListingMismatch {
        level: ListingLevel,
        mismatches: Vec<CountMismatch>,
    },

    #[error("consolidated metadata failed schema validation at {path}: {message}")]
    OutputSchemaValidation { path: String, message: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse json {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse table {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no worksheets", .path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("failed to encode {what} as json: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema for {name} is invalid: {message}")]
    InvalidSchema { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    pub path: String,
    pub expected: usize,
    pub actual: usize,
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

fn join_numbers(values: &[usize]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

fn join_mismatches(mismatches: &[CountMismatch]) -> String {
    mismatches
        .iter()
        .map(|mismatch| {
            if mismatch.path.is_empty() {
                format!("expected {}, got {}", mismatch.expected, mismatch.actual)
            } else {
                format!(
                    "in {} expected {}, got {}",
                    mismatch.path, mismatch.expected, mismatch.actual
                )
            }
        })
        .collect::<Vec<String>>()
        .join("; ")
}

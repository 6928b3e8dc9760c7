use serde::Serialize;

use crate::pipeline::StageEvent;

#[derive(Debug, Clone, Serialize)]
pub struct SourceHash {
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionCounts {
    pub cycles: usize,
    pub channels: usize,
    pub images: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub report_version: u32,
    pub started_at: String,
    pub generated_at: String,
    pub status: String,
    pub dry_run: bool,
    pub dataset_dir: String,
    pub output_path: Option<String>,
    pub version: String,
    pub dialect: String,
    pub exposure_source: String,
    pub counts: ConversionCounts,
    pub source_hashes: Vec<SourceHash>,
    pub events: Vec<StageEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOutcome {
    pub input_dir: String,
    pub output_dir: String,
    pub status: String,
    pub channels: Option<usize>,
    pub error_chain: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub report_version: u32,
    pub started_at: String,
    pub generated_at: String,
    pub input_map: String,
    pub dry_run: bool,
    pub dataset_count: usize,
    pub converted_count: usize,
    pub failed_count: usize,
    pub datasets: Vec<DatasetOutcome>,
}

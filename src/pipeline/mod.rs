use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::assemble::{AssemblyInputs, ConsolidatedMetadata, assemble};
use crate::error::Result;
use crate::extract::{
    ExposureSource, RawTable, extract_camera_settings, extract_experiment, extract_qc_records,
    extract_segmentation, extract_summary, resolve_exposure_times,
};
use crate::listing::{ExpectedShape, Listing, check_listing};
use crate::reconcile::reconcile;
use crate::schema::{Dialect, validate_experiment_document};


#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VersionRegistry,
    Experiment,
    Segmentation,
    ExposureTimes,
    QcSheet,
    SummarySheet,
    ListingCheck,
    EmbeddedMetadata,
    Reconcile,
    Assemble,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VersionRegistry => "version_registry",
            Self::Experiment => "experiment",
            Self::Segmentation => "segmentation",
            Self::ExposureTimes => "exposure_times",
            Self::QcSheet => "qc_sheet",
            Self::SummarySheet => "summary_sheet",
            Self::ListingCheck => "listing_check",
            Self::EmbeddedMetadata => "embedded_metadata",
            Self::Reconcile => "reconcile",
            Self::Assemble => "assemble",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub message: String,
    pub details: Map<String, Value>,
}

impl StageEvent {
    fn new(stage: Stage, message: &str, details: Value) -> Self {
        let details = match details {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            stage,
            message: message.to_string(),
            details,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetSources {
    pub experiment: Value,
    pub segmentation: Value,
    pub qc_sheet: RawTable,
    pub summary_sheet: RawTable,
    pub exposure_table: Option<RawTable>,
    pub exposure_table_path: PathBuf,
    pub listing: Listing,
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub version: String,
    pub dialect: Dialect,
    pub exposure_source: ExposureSource,
    pub channel_count: usize,
    pub image_count: usize,
    pub metadata: ConsolidatedMetadata,
    pub events: Vec<StageEvent>,
}

pub fn convert_sources<F>(sources: &DatasetSources, mut load_image: F) -> Result<ConversionOutcome>
where
    F: FnMut(&Path) -> Result<Vec<u8>>,
{
    let mut events = Vec::new();

    let (version, dialect) = validate_experiment_document(&sources.experiment)?;
    events.push(StageEvent::new(
        Stage::VersionRegistry,
        "experiment metadata matched a supported dialect",
        json!({ "version": version, "dialect": dialect.label() }),
    ));

    let experiment = extract_experiment(&sources.experiment, &version, dialect)?;
    events.push(StageEvent::new(
        Stage::Experiment,
        "extracted experiment metadata",
        json!({
            "cycles": experiment.num_cycles,
            "channels": experiment.num_channels,
            "regions": experiment.num_regions,
            "tiles_per_region": experiment.tiles_per_region(),
            "z_planes": experiment.num_z_planes,
        }),
    ));

    let segmentation = extract_segmentation(&sources.segmentation)?;
    events.push(StageEvent::new(
        Stage::Segmentation,
        "extracted segmentation designations",
        json!({
            "nuclear": segmentation.nuclear,
            "membrane": segmentation.membrane,
        }),
    ));

    let (exposure, exposure_source) = resolve_exposure_times(
        experiment.exposure_times.as_ref(),
        sources.exposure_table.as_ref(),
        &sources.exposure_table_path,
    )?;
    events.push(StageEvent::new(
        Stage::ExposureTimes,
        "resolved exposure times",
        json!({ "source": exposure_source.as_str(), "cycles": exposure.cycle_count() }),
    ));

    let qc_records = extract_qc_records(&sources.qc_sheet, experiment.total_channels())?;
    events.push(StageEvent::new(
        Stage::QcSheet,
        "extracted channel QC rows",
        json!({ "rows": qc_records.len() }),
    ));

    let summary = extract_summary(&sources.summary_sheet)?;
    events.push(StageEvent::new(
        Stage::SummarySheet,
        "extracted acquisition summary",
        json!({ "dataset_name": summary.dataset_name }),
    ));

    let expected = ExpectedShape::from_config(&experiment);
    check_listing(&sources.listing, &expected)?;
    let image_count = sources.listing.image_count();
    events.push(StageEvent::new(
        Stage::ListingCheck,
        "image listing matches declared counts",
        json!({ "images": image_count, "expected": expected }),
    ));

    let mut camera = Vec::new();
    for image in sources.listing.representative_images() {
        let bytes = load_image(&image.path)?;
        camera.push(extract_camera_settings(&image.path, &bytes)?);
    }
    events.push(StageEvent::new(
        Stage::EmbeddedMetadata,
        "read camera settings from representative images",
        json!({ "images": camera.len() }),
    ));

    let reconciliation = reconcile(&qc_records, &experiment, &exposure, &camera, &segmentation)?;
    events.push(StageEvent::new(
        Stage::Reconcile,
        "reconciled channel details",
        json!({
            "channels": reconciliation.channel_details.len(),
            "nuclear_stains": reconciliation.stains.nuclear.len(),
            "membrane_stains": reconciliation.stains.membrane.len(),
        }),
    ));

    let metadata = assemble(AssemblyInputs {
        summary: &summary,
        experiment: &experiment,
        stains: &reconciliation.stains,
        segmentation: &segmentation,
        channel_details: &reconciliation.channel_details,
    })?;
    events.push(StageEvent::new(
        Stage::Assemble,
        "consolidated metadata passed schema validation",
        json!({}),
    ));

    Ok(ConversionOutcome {
        version,
        dialect,
        exposure_source,
        channel_count: reconciliation.channel_details.len(),
        image_count,
        metadata,
        events,
    })
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::cli::ConvertArgs;
use crate::commands::discover::{DatasetLayout, build_listing, discover_dataset, load_sources};
use crate::error::ConversionError;
use crate::model::{ConversionCounts, ConversionReport, SourceHash};
use crate::pipeline::{StageEvent, convert_sources};
use crate::util::{ensure_directory, now_utc_string, sha256_file, write_bytes, write_json_pretty};

pub const DATASET_FILE_NAME: &str = "dataset.json";
pub const REPORT_FILE_NAME: &str = "conversion_report.json";

pub fn run(args: ConvertArgs) -> Result<()> {
    let layout = DatasetLayout::new(&args.dataset, &args.files);
    let report = convert_dataset(&layout, &args.output, args.dry_run)?;

    info!(
        dataset = %report.dataset_dir,
        dialect = %report.dialect,
        channels = report.counts.channels,
        images = report.counts.images,
        status = %report.status,
        "conversion completed"
    );

    Ok(())
}

pub fn convert_dataset(
    layout: &DatasetLayout,
    output_dir: &Path,
    dry_run: bool,
) -> Result<ConversionReport> {
    let started_at = now_utc_string();
    info!(dataset = %layout.dataset_dir.display(), dry_run, "converting dataset");

    let files = discover_dataset(layout)?;
    let listing = build_listing(&layout.dataset_dir)?;
    let sources = load_sources(layout, &files, listing)?;

    let outcome = convert_sources(&sources, |path| {
        fs::read(path).map_err(|source| ConversionError::Io {
            path: path.to_path_buf(),
            source,
        })
    })
    .with_context(|| format!("failed to convert dataset {}", layout.dataset_dir.display()))?;

    for event in &outcome.events {
        log_event(event);
    }

    let document = outcome.metadata.to_pretty_bytes()?;

    let mut source_hashes = Vec::new();
    for path in files.all() {
        source_hashes.push(SourceHash {
            path: path.display().to_string(),
            sha256: sha256_file(path)?,
        });
    }

    let dataset_path = output_dir.join(DATASET_FILE_NAME);
    let mut report = ConversionReport {
        report_version: 1,
        started_at,
        generated_at: String::new(),
        status: if dry_run { "validated" } else { "converted" }.to_string(),
        dry_run,
        dataset_dir: layout.dataset_dir.display().to_string(),
        output_path: (!dry_run).then(|| dataset_path.display().to_string()),
        version: outcome.version.clone(),
        dialect: outcome.dialect.label().to_string(),
        exposure_source: outcome.exposure_source.as_str().to_string(),
        counts: ConversionCounts {
            cycles: sources.listing.cycle_count(),
            channels: outcome.channel_count,
            images: outcome.image_count,
        },
        source_hashes,
        events: outcome.events,
    };

    if dry_run {
        report.generated_at = now_utc_string();
        info!(dataset = %report.dataset_dir, "dry-run complete, nothing written");
        return Ok(report);
    }

    ensure_directory(output_dir)?;
    write_bytes(&dataset_path, &document)?;
    info!(path = %dataset_path.display(), "wrote consolidated metadata");

    report.generated_at = now_utc_string();
    let report_path = output_dir.join(REPORT_FILE_NAME);
    write_json_pretty(&report_path, &report)?;
    info!(path = %report_path.display(), "wrote conversion report");

    Ok(report)
}

fn log_event(event: &StageEvent) {
    let details = Value::Object(event.details.clone());
    info!(
        stage = event.stage.as_str(),
        details = %details,
        "{}",
        event.message
    );
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{error, info};

use crate::cli::BatchArgs;
use crate::commands::convert::convert_dataset;
use crate::commands::discover::DatasetLayout;
use crate::extract::read_table;
use crate::model::{BatchReport, DatasetOutcome};
use crate::util::{now_utc_string, write_json_pretty};

pub const INPUT_MAP_FILE_NAME: &str = "input.xlsx";
pub const BATCH_REPORT_FILE_NAME: &str = "batch_report.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

pub fn run(args: BatchArgs) -> Result<()> {
    let report = run_batch(&args)?;

    let report_path = args
        .report_path
        .unwrap_or_else(|| args.workdir.join(BATCH_REPORT_FILE_NAME));
    write_json_pretty(&report_path, &report)?;
    info!(path = %report_path.display(), "wrote batch report");

    info!(
        converted = report.converted_count,
        failed = report.failed_count,
        "converted {}/{}",
        report.converted_count,
        report.dataset_count
    );

    Ok(())
}

pub fn run_batch(args: &BatchArgs) -> Result<BatchReport> {
    let started_at = now_utc_string();
    let input_map = args
        .input_map
        .clone()
        .unwrap_or_else(|| args.workdir.join(INPUT_MAP_FILE_NAME));
    let entries = read_input_map(&input_map, &args.workdir)?;

    info!(
        input_map = %input_map.display(),
        datasets = entries.len(),
        "batch started"
    );

    let mut datasets = Vec::with_capacity(entries.len());
    for entry in &entries {
        let layout = DatasetLayout::new(&entry.input_dir, &args.files);
        let outcome = match convert_dataset(&layout, &entry.output_dir, args.dry_run) {
            Ok(report) => DatasetOutcome {
                input_dir: entry.input_dir.display().to_string(),
                output_dir: entry.output_dir.display().to_string(),
                status: report.status,
                channels: Some(report.counts.channels),
                error_chain: Vec::new(),
            },
            Err(err) => {
                error!(dataset = %entry.input_dir.display(), error = %err, "dataset failed");
                for cause in err.chain().skip(1) {
                    error!(cause = %cause, "caused by");
                }
                DatasetOutcome {
                    input_dir: entry.input_dir.display().to_string(),
                    output_dir: entry.output_dir.display().to_string(),
                    status: "failed".to_string(),
                    channels: None,
                    error_chain: err.chain().map(|cause| cause.to_string()).collect(),
                }
            }
        };
        datasets.push(outcome);
    }

    let converted_count = datasets
        .iter()
        .filter(|outcome| outcome.error_chain.is_empty())
        .count();

    Ok(BatchReport {
        report_version: 1,
        started_at,
        generated_at: now_utc_string(),
        input_map: input_map.display().to_string(),
        dry_run: args.dry_run,
        dataset_count: datasets.len(),
        converted_count,
        failed_count: datasets.len() - converted_count,
        datasets,
    })
}

pub fn read_input_map(path: &Path, workdir: &Path) -> Result<Vec<BatchEntry>> {
    let table = read_table(path, true)
        .with_context(|| format!("failed to read input map {}", path.display()))?;

    let column = |name: &str| {
        table
            .column_index(name)
            .with_context(|| format!("{} is missing column {name}", path.display()))
    };
    let input_column = column("InputDir")?;
    let output_column = column("OutputDir")?;

    let mut entries = Vec::new();
    for row in 0..table.rows.len() {
        let input_dir = table.cell(row, input_column).trim();
        let output_dir = table.cell(row, output_column).trim();
        if input_dir.is_empty() && output_dir.is_empty() {
            continue;
        }
        if input_dir.is_empty() || output_dir.is_empty() {
            bail!(
                "{} row {} needs both InputDir and OutputDir",
                path.display(),
                row + 1
            );
        }

        entries.push(BatchEntry {
            input_dir: workdir.join(input_dir),
            output_dir: workdir.join(output_dir),
        });
    }

    Ok(entries)
}

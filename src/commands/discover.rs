use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::cli::DatasetFileArgs;
use crate::error::ConversionError;
use crate::extract::{read_json_document, read_table};
use crate::listing::{ImageKey, Listing};
use crate::pipeline::DatasetSources;

const EXPERIMENT_FILE_NAMES: [&str; 2] = ["experiment.json", "Experiment.json"];
const SEGMENTATION_FILE_NAME: &str = "segmentation.json";

#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub dataset_dir: PathBuf,
    pub qc_sheet: PathBuf,
    pub summary_sheet: PathBuf,
    pub exposure_table: PathBuf,
}

impl DatasetLayout {
    pub fn new(dataset_dir: &Path, files: &DatasetFileArgs) -> Self {
        Self {
            dataset_dir: dataset_dir.to_path_buf(),
            qc_sheet: resolve(dataset_dir, &files.qc_sheet),
            summary_sheet: resolve(dataset_dir, &files.summary_sheet),
            exposure_table: resolve(dataset_dir, &files.exposure_table),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub experiment: PathBuf,
    pub segmentation: PathBuf,
    pub qc_sheet: PathBuf,
    pub summary_sheet: PathBuf,
    pub exposure_table: Option<PathBuf>,
}

impl DatasetFiles {
    pub fn all(&self) -> Vec<&Path> {
        let mut paths = vec![
            self.experiment.as_path(),
            self.segmentation.as_path(),
            self.qc_sheet.as_path(),
            self.summary_sheet.as_path(),
        ];
        if let Some(path) = &self.exposure_table {
            paths.push(path.as_path());
        }
        paths
    }
}

pub fn discover_dataset(layout: &DatasetLayout) -> Result<DatasetFiles> {
    if !layout.dataset_dir.is_dir() {
        return Err(ConversionError::MissingFile {
            paths: vec![layout.dataset_dir.clone()],
        }
        .into());
    }

    let names = file_names(&layout.dataset_dir)?;
    let mut missing = Vec::new();

    let experiment_names = EXPERIMENT_FILE_NAMES
        .iter()
        .filter(|name| names.contains(**name))
        .map(|name| name.to_string())
        .collect::<Vec<String>>();
    let experiment = match experiment_names.as_slice() {
        [name] => layout.dataset_dir.join(name),
        [] => {
            let path = layout.dataset_dir.join(EXPERIMENT_FILE_NAMES[0]);
            missing.push(path.clone());
            path
        }
        _ => {
            return Err(ConversionError::AmbiguousExperimentFile {
                dir: layout.dataset_dir.clone(),
                names: experiment_names,
            }
            .into());
        }
    };

    let segmentation = layout.dataset_dir.join(SEGMENTATION_FILE_NAME);
    for path in [&segmentation, &layout.qc_sheet, &layout.summary_sheet] {
        if !path.is_file() {
            missing.push(path.clone());
        }
    }
    if !missing.is_empty() {
        return Err(ConversionError::MissingFile { paths: missing }.into());
    }

    let exposure_table = layout.exposure_table.is_file().then(|| layout.exposure_table.clone());

    Ok(DatasetFiles {
        experiment,
        segmentation,
        qc_sheet: layout.qc_sheet.clone(),
        summary_sheet: layout.summary_sheet.clone(),
        exposure_table,
    })
}

pub fn build_listing(dataset_dir: &Path) -> Result<Listing> {
    let dir_pattern =
        Regex::new(r"^[Cc]yc(\d+)_[Rr]eg(\d+)$").context("failed to compile image directory regex")?;
    let file_pattern = Regex::new(r"^(\d+)_(\d+)_[Zz](\d+)_[Cc][Hh](\d+)\.(?i:tiff?)$")
        .context("failed to compile image filename regex")?;

    let mut listing = Listing::new();
    let mut image_dir_count = 0_usize;

    for name in dir_names(dataset_dir)? {
        let Some(captures) = dir_pattern.captures(&name) else {
            continue;
        };
        let cycle = parse_number(&captures[1], &name)?;
        let region = parse_number(&captures[2], &name)?;
        image_dir_count += 1;

        let image_dir = dataset_dir.join(&name);
        for file_name in file_names(&image_dir)? {
            let Some(captures) = file_pattern.captures(&file_name) else {
                debug!(dir = %image_dir.display(), file = %file_name, "skipping non-image file");
                continue;
            };
            let key = ImageKey {
                cycle,
                region,
                tile: parse_number(&captures[2], &file_name)?,
                z_plane: parse_number(&captures[3], &file_name)?,
                channel: parse_number(&captures[4], &file_name)?,
            };
            let path = image_dir.join(&file_name);
            if let Some(previous) = listing.insert(key, path.clone()) {
                warn!(
                    kept = %path.display(),
                    replaced = %previous.display(),
                    "two images map to the same cycle/region/channel/tile/z-plane"
                );
            }
        }
    }

    if image_dir_count == 0 {
        return Err(ConversionError::NoImageDirectories {
            dir: dataset_dir.to_path_buf(),
        }
        .into());
    }

    Ok(listing)
}

pub fn load_sources(
    layout: &DatasetLayout,
    files: &DatasetFiles,
    listing: Listing,
) -> Result<DatasetSources> {
    let exposure_table = files
        .exposure_table
        .as_deref()
        .map(|path| read_table(path, false))
        .transpose()?;

    Ok(DatasetSources {
        experiment: read_json_document(&files.experiment)?,
        segmentation: read_json_document(&files.segmentation)?,
        qc_sheet: read_table(&files.qc_sheet, true)?,
        summary_sheet: read_table(&files.summary_sheet, false)?,
        exposure_table,
        exposure_table_path: layout.exposure_table.clone(),
        listing,
    })
}

fn resolve(dataset_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dataset_dir.join(path)
    }
}

fn parse_number(raw: &str, name: &str) -> Result<u32> {
    raw.parse::<u32>()
        .with_context(|| format!("number `{raw}` in {name} is out of range"))
}

fn file_names(dir: &Path) -> Result<BTreeSet<String>> {
    entry_names(dir, false)
}

fn dir_names(dir: &Path) -> Result<BTreeSet<String>> {
    entry_names(dir, true)
}

fn entry_names(dir: &Path, want_dirs: bool) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?;
        let is_dir = file_type.is_dir() || (file_type.is_symlink() && path.is_dir());
        if is_dir != want_dirs {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(_) => warn!(path = %path.display(), "skipping entry with non UTF-8 name"),
        }
    }

    Ok(names)
}

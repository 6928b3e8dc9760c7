use anyhow::Result;
use tracing::{info, warn};

use crate::cli::InspectArgs;
use crate::commands::discover::{DatasetLayout, build_listing, discover_dataset};
use crate::extract::{extract_experiment, read_json_document};
use crate::listing::{ExpectedShape, check_listing};
use crate::schema::validate_experiment_document;

pub fn run(args: InspectArgs) -> Result<()> {
    let layout = DatasetLayout::new(&args.dataset, &args.files);
    info!(dataset = %layout.dataset_dir.display(), "inspect requested");

    let files = match discover_dataset(&layout) {
        Ok(files) => files,
        Err(err) => {
            warn!(error = %err, "dataset inputs incomplete");
            return Ok(());
        }
    };

    for path in files.all() {
        info!(path = %path.display(), "input present");
    }
    if files.exposure_table.is_none() {
        info!(
            path = %layout.exposure_table.display(),
            "exposure table absent; experiment metadata must carry exposure times"
        );
    }

    let document = read_json_document(&files.experiment)?;
    let expected = match validate_experiment_document(&document).and_then(|(version, dialect)| {
        extract_experiment(&document, &version, dialect)
    }) {
        Ok(experiment) => {
            info!(
                version = %experiment.version,
                dialect = %experiment.dialect,
                cycles = experiment.num_cycles,
                regions = experiment.num_regions,
                channels = experiment.num_channels,
                tiles_per_region = experiment.tiles_per_region(),
                z_planes = experiment.num_z_planes,
                "experiment metadata"
            );
            Some(ExpectedShape::from_config(&experiment))
        }
        Err(err) => {
            warn!(error = %err, "experiment metadata rejected");
            None
        }
    };

    let listing = match build_listing(&layout.dataset_dir) {
        Ok(listing) => listing,
        Err(err) => {
            warn!(error = %err, "image listing unavailable");
            return Ok(());
        }
    };
    if listing.is_empty() {
        warn!(dataset = %layout.dataset_dir.display(), "no images found in image directories");
    }
    info!(
        cycles = listing.cycle_count(),
        images = listing.image_count(),
        "image listing"
    );

    if let Some(expected) = expected {
        match check_listing(&listing, &expected) {
            Ok(()) => info!("image listing matches declared counts"),
            Err(err) => warn!(error = %err, "image listing does not match declared counts"),
        }
    }

    Ok(())
}

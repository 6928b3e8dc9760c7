use serde::Serialize;

use super::{Listing, ListingLevel};
use crate::error::{ConversionError, CountMismatch, Result};
use crate::record::ExperimentConfig;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ExpectedShape {
    pub cycles: usize,
    pub regions: usize,
    pub channels: usize,
    pub tiles: usize,
    pub z_planes: usize,
}

impl ExpectedShape {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            cycles: config.num_cycles as usize,
            regions: config.num_regions as usize,
            channels: config.num_channels as usize,
            tiles: config.tiles_per_region(),
            z_planes: config.num_z_planes as usize,
        }
    }

    pub fn at(&self, level: ListingLevel) -> usize {
        match level {
            ListingLevel::Cycles => self.cycles,
            ListingLevel::Regions => self.regions,
            ListingLevel::Channels => self.channels,
            ListingLevel::Tiles => self.tiles,
            ListingLevel::ZPlanes => self.z_planes,
        }
    }
}

// First level with any mismatching sibling fails; deeper levels are not visited.
pub fn check_listing(listing: &Listing, expected: &ExpectedShape) -> Result<()> {
    for level in ListingLevel::ALL {
        let want = expected.at(level);
        let mismatches = listing
            .child_counts(level)
            .into_iter()
            .filter(|(_, actual)| *actual != want)
            .map(|(path, actual)| CountMismatch {
                path,
                expected: want,
                actual,
            })
            .collect::<Vec<CountMismatch>>();

        if !mismatches.is_empty() {
            return Err(ConversionError::ListingMismatch { level, mismatches });
        }
    }

    Ok(())
}

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::record::StainChannel;

mod check;

pub use check::{ExpectedShape, check_listing};

type ZPlanes = BTreeMap<u32, PathBuf>;
type Tiles = BTreeMap<u32, ZPlanes>;
type Channels = BTreeMap<u32, Tiles>;
type Regions = BTreeMap<u32, Channels>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingLevel {
    Cycles,
    Regions,
    Channels,
    Tiles,
    ZPlanes,
}

impl ListingLevel {
    pub const ALL: [ListingLevel; 5] = [
        ListingLevel::Cycles,
        ListingLevel::Regions,
        ListingLevel::Channels,
        ListingLevel::Tiles,
        ListingLevel::ZPlanes,
    ];

    pub fn plural(self) -> &'static str {
        match self {
            Self::Cycles => "cycles",
            Self::Regions => "regions",
            Self::Channels => "channels",
            Self::Tiles => "tiles",
            Self::ZPlanes => "z-planes",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ImageKey {
    pub cycle: u32,
    pub region: u32,
    pub channel: u32,
    pub tile: u32,
    pub z_plane: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentativeImage {
    pub address: StainChannel,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    cycles: BTreeMap<u32, Regions>,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ImageKey, path: PathBuf) -> Option<PathBuf> {
        self.cycles
            .entry(key.cycle)
            .or_default()
            .entry(key.region)
            .or_default()
            .entry(key.channel)
            .or_default()
            .entry(key.tile)
            .or_default()
            .insert(key.z_plane, path)
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    pub fn image_count(&self) -> usize {
        self.cycles
            .values()
            .flat_map(|regions| regions.values())
            .flat_map(|channels| channels.values())
            .flat_map(|tiles| tiles.values())
            .map(|planes| planes.len())
            .sum()
    }

    pub fn representative_images(&self) -> Vec<RepresentativeImage> {
        let mut images = Vec::new();
        for (cycle, regions) in &self.cycles {
            let Some(channels) = regions.values().next() else {
                continue;
            };
            for (channel, tiles) in channels {
                let first = tiles
                    .values()
                    .next()
                    .and_then(|planes| planes.values().next());
                if let Some(path) = first {
                    images.push(RepresentativeImage {
                        address: StainChannel::new(*cycle, *channel),
                        path: path.clone(),
                    });
                }
            }
        }
        images
    }

    pub fn child_counts(&self, level: ListingLevel) -> Vec<(String, usize)> {
        if level == ListingLevel::Cycles {
            return vec![(String::new(), self.cycles.len())];
        }

        let mut counts = Vec::new();
        for (cycle, regions) in &self.cycles {
            let cycle_path = format!("cycle {cycle}");
            if level == ListingLevel::Regions {
                counts.push((cycle_path, regions.len()));
                continue;
            }
            for (region, channels) in regions {
                let region_path = format!("{cycle_path}, region {region}");
                if level == ListingLevel::Channels {
                    counts.push((region_path, channels.len()));
                    continue;
                }
                for (channel, tiles) in channels {
                    let channel_path = format!("{region_path}, channel {channel}");
                    if level == ListingLevel::Tiles {
                        counts.push((channel_path, tiles.len()));
                        continue;
                    }
                    for (tile, planes) in tiles {
                        counts.push((format!("{channel_path}, tile {tile}"), planes.len()));
                    }
                }
            }
        }
        counts
    }
}

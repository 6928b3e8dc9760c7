use serde::Serialize;
use serde_json::Number;

use crate::schema::Dialect;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum ImmersionMedium {
    Air,
    Water,
    Oil,
    Glycerin,
}

impl ImmersionMedium {
    pub const ALL: [ImmersionMedium; 4] = [
        ImmersionMedium::Air,
        ImmersionMedium::Water,
        ImmersionMedium::Oil,
        ImmersionMedium::Glycerin,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Water => "water",
            Self::Oil => "oil",
            Self::Glycerin => "glycerin",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum TileLayout {
    Snake,
    Grid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub version: String,
    pub dialect: Dialect,
    pub immersion_medium: ImmersionMedium,
    pub magnification: u32,
    pub numerical_aperture: Number,
    pub resolution_xy_nm: Number,
    pub resolution_z_nm: Number,
    pub bit_depth: u32,
    pub num_regions: u32,
    pub num_cycles: u32,
    pub num_z_planes: u32,
    pub num_channels: u32,
    pub region_width: u32,
    pub region_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_overlap_x: Number,
    pub tile_overlap_y: Number,
    pub tile_layout: TileLayout,
    pub exposure_times: Option<ExposureTimeTable>,
}

impl ExperimentConfig {
    pub fn total_channels(&self) -> usize {
        self.num_cycles as usize * self.num_channels as usize
    }

    pub fn tiles_per_region(&self) -> usize {
        self.region_width as usize * self.region_height as usize
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct StainChannel {
    #[serde(rename = "CycleID")]
    pub cycle_id: u32,
    #[serde(rename = "ChannelID")]
    pub channel_id: u32,
}

impl StainChannel {
    pub fn new(cycle_id: u32, channel_id: u32) -> Self {
        Self {
            cycle_id,
            channel_id,
        }
    }

    pub fn for_row(index: usize, channels_per_cycle: u32) -> Self {
        let per_cycle = channels_per_cycle as usize;
        Self {
            cycle_id: (index / per_cycle + 1) as u32,
            channel_id: (index % per_cycle + 1) as u32,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SegmentationConfig {
    #[serde(rename = "NuclearStainForSegmentation")]
    pub nuclear: StainChannel,
    #[serde(rename = "MembraneStainForSegmentation")]
    pub membrane: StainChannel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelQcRecord {
    pub marker: String,
    pub fluorophore: String,
    pub passed_qc: bool,
    pub qc_details: String,
    pub excitation_wavelength_nm: u32,
    pub emission_wavelength_nm: u32,
    pub is_nuclear_marker: bool,
    pub is_membrane_marker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionSummary {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "AcquisitionDate")]
    pub acquisition_date: String,
    #[serde(rename = "AssayType")]
    pub assay_type: String,
    #[serde(rename = "AssaySpecificSoftware")]
    pub assay_specific_software: String,
    #[serde(rename = "AcquisitionMode")]
    pub acquisition_mode: String,
    #[serde(rename = "DatasetName")]
    pub dataset_name: String,
    #[serde(rename = "Microscope")]
    pub microscope_name: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CameraSettings {
    pub binning: u32,
    pub gain: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureTimeTable {
    cycles: Vec<Vec<u32>>,
}

impl ExposureTimeTable {
    pub fn new(cycles: Vec<Vec<u32>>) -> Self {
        Self { cycles }
    }

    pub fn get(&self, address: StainChannel) -> Option<u32> {
        let cycle = address.cycle_id.checked_sub(1)? as usize;
        let channel = address.channel_id.checked_sub(1)? as usize;
        self.cycles.get(cycle)?.get(channel).copied()
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDetail {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CycleID")]
    pub cycle_id: u32,
    #[serde(rename = "ChannelID")]
    pub channel_id: u32,
    #[serde(rename = "Fluorophore")]
    pub fluorophore: String,
    #[serde(rename = "PassedQC")]
    pub passed_qc: bool,
    #[serde(rename = "QCDetails")]
    pub qc_details: String,
    #[serde(rename = "ExposureTimeMS")]
    pub exposure_time_ms: u32,
    #[serde(rename = "ExcitationWavelengthNM")]
    pub excitation_wavelength_nm: u32,
    #[serde(rename = "EmissionWavelengthNM")]
    pub emission_wavelength_nm: u32,
    #[serde(rename = "Binning")]
    pub binning: u32,
    #[serde(rename = "Gain")]
    pub gain: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StainChannels {
    #[serde(rename = "NuclearStain")]
    pub nuclear: Vec<StainChannel>,
    #[serde(rename = "MembraneStain")]
    pub membrane: Vec<StainChannel>,
}

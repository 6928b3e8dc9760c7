use serde_json::{Number, Value, json};

use crate::record::{ExperimentConfig, ImmersionMedium, TileLayout};
use crate::schema::Dialect;

pub const QC_SHEET_CSV: &str = "\
Marker,Fluorophore,PassedQC,QCDetails,ExcitationWavelength,EmissionWavelength,IsNuclearMarker,IsMembraneMarker
DAPI-01,DAPI,TRUE,None,358,461,TRUE,FALSE
CD31,Cy5,TRUE,None,650,670,FALSE,TRUE
CD4,FITC,TRUE,None,488,520,FALSE,FALSE
'CD8',Cy3,FALSE,weak signal.,550,570,FALSE,FALSE
";

pub const SUMMARY_SHEET_CSV: &str = "\
Version,1.0
AcquisitionDate,2020-02-19
AssayType,CODEX
AssaySpecificSoftware,Akoya CODEX Instrument Manager 1.29
AcquisitionMode,Confocal
DatasetName,spleen-A
MicroscopeName,Keyence BZ-X710
";

pub const EXPOSURE_TABLE_TXT: &str = "\
Cycle,CH1,CH2
1,10,250
2,10,350
";

pub fn experiment_document() -> Value {
    json!({
        "version": "1.7.0.6",
        "name": "spleen-A",
        "runName": "20200219_spleen",
        "dateProcessed": "2020-02-19T16:01:15.357-05:00",
        "objectiveType": "AIR IMMERSION",
        "magnification": 20,
        "aperture": 0.75,
        "xyResolution": 377.44,
        "zPitch": 1500,
        "wavelengths": [358, 650],
        "bitDepth": 16,
        "numRegions": 1,
        "numCycles": 2,
        "numZPlanes": 1,
        "numChannels": 2,
        "regionWidth": 1,
        "regionHeight": 1,
        "tileWidth": 1920,
        "tileHeight": 1440,
        "tileOverlapX": 0.3,
        "tileOverlapY": 0.3,
        "tilingMode": "snakeRows",
        "referenceCycle": 1,
        "referenceChannel": 1,
        "numSubTiles": 1,
        "channelNames": { "channelNamesArray": ["DAPI-01", "CD31", "CD4", "CD8"] },
        "exposureTimes": {
            "exposureTimesArray": [["Cycle", "CH1", "CH2"], ["1", "10", "500"], ["2", "10", "350"]]
        }
    })
}

pub fn segmentation_document() -> Value {
    json!({
        "nuclearStainCycle": 1,
        "nuclearStainChannel": 1,
        "membraneStainCycle": 1,
        "membraneStainChannel": 2
    })
}

pub fn keyence_image(gain: &str, binning: &str) -> Vec<u8> {
    let mut bytes = vec![0x49, 0x49, 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00, 0xff, 0x00];
    bytes.extend_from_slice(
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <Data><SingleFileProperty><Shooting>\
             <Parameter><Exposure Type=\"System.Int32\">10</Exposure>\
             <CameraGain Type=\"System.Int32\">{gain}</CameraGain>\
             <Binnin Type=\"System.String\">{binning}</Binnin></Parameter>\
             </Shooting></SingleFileProperty></Data>"
        )
        .as_bytes(),
    );
    bytes.extend_from_slice(&[0x00, 0x00]);
    bytes
}

pub fn sample_experiment(num_cycles: u32, num_channels: u32) -> ExperimentConfig {
    ExperimentConfig {
        version: "1.7.0.6".to_string(),
        dialect: Dialect::V1_7,
        immersion_medium: ImmersionMedium::Air,
        magnification: 20,
        numerical_aperture: decimal(0.75),
        resolution_xy_nm: decimal(377.44),
        resolution_z_nm: Number::from(1500),
        bit_depth: 16,
        num_regions: 1,
        num_cycles,
        num_z_planes: 1,
        num_channels,
        region_width: 1,
        region_height: 1,
        tile_width: 1920,
        tile_height: 1440,
        tile_overlap_x: decimal(0.3),
        tile_overlap_y: decimal(0.3),
        tile_layout: TileLayout::Snake,
        exposure_times: None,
    }
}

fn decimal(value: f64) -> Number {
    Number::from_f64(value).expect("finite fixture value")
}

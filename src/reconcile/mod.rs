use crate::error::{ConversionError, Result};
use crate::extract::QC_SOURCE;
use crate::record::{
    CameraSettings, ChannelDetail, ChannelQcRecord, ExperimentConfig, ExposureTimeTable,
    SegmentationConfig, StainChannel, StainChannels,
};


#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub channel_details: Vec<ChannelDetail>,
    pub stains: StainChannels,
}

// A row flagged both nuclear and membrane counts as nuclear only.
pub fn reconcile(
    qc_records: &[ChannelQcRecord],
    experiment: &ExperimentConfig,
    exposure: &ExposureTimeTable,
    camera: &[CameraSettings],
    segmentation: &SegmentationConfig,
) -> Result<Reconciliation> {
    let expected = experiment.total_channels();
    if qc_records.len() != expected {
        return Err(ConversionError::QcRowCount {
            source_name: QC_SOURCE.to_string(),
            expected,
            actual: qc_records.len(),
        });
    }
    if camera.len() != expected {
        return Err(ConversionError::CameraSettingsCount {
            expected,
            actual: camera.len(),
        });
    }

    let mut stains = StainChannels::default();
    let mut channel_details = Vec::with_capacity(expected);

    for (index, (record, settings)) in qc_records.iter().zip(camera).enumerate() {
        let address = StainChannel::for_row(index, experiment.num_channels);

        if record.is_nuclear_marker {
            stains.nuclear.push(address);
        } else if record.is_membrane_marker {
            stains.membrane.push(address);
        }

        let exposure_time_ms =
            exposure
                .get(address)
                .ok_or(ConversionError::MissingExposureTime {
                    cycle: address.cycle_id,
                    channel: address.channel_id,
                })?;

        channel_details.push(ChannelDetail {
            name: record.marker.clone(),
            cycle_id: address.cycle_id,
            channel_id: address.channel_id,
            fluorophore: record.fluorophore.clone(),
            passed_qc: record.passed_qc,
            qc_details: record.qc_details.clone(),
            exposure_time_ms,
            excitation_wavelength_nm: record.excitation_wavelength_nm,
            emission_wavelength_nm: record.emission_wavelength_nm,
            binning: settings.binning,
            gain: settings.gain,
        });
    }

    check_stains(&stains, segmentation)?;

    Ok(Reconciliation {
        channel_details,
        stains,
    })
}

fn check_stains(stains: &StainChannels, segmentation: &SegmentationConfig) -> Result<()> {
    if stains.nuclear.is_empty() {
        return Err(ConversionError::NoNuclearStain {
            source_name: QC_SOURCE.to_string(),
        });
    }
    if stains.membrane.is_empty() {
        return Err(ConversionError::NoMembraneStain {
            source_name: QC_SOURCE.to_string(),
        });
    }

    let designations = [
        ("nuclear", segmentation.nuclear, &stains.nuclear),
        ("membrane", segmentation.membrane, &stains.membrane),
    ];
    for (role, designated, classified) in designations {
        if !classified.contains(&designated) {
            return Err(ConversionError::SegmentationStainMismatch {
                role,
                cycle: designated.cycle_id,
                channel: designated.channel_id,
                source_name: QC_SOURCE.to_string(),
            });
        }
    }

    Ok(())
}

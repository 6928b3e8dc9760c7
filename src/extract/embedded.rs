use std::path::Path;

use serde::Deserialize;

use crate::error::{ConversionError, Result};
use crate::record::CameraSettings;

const XML_DECLARATION_OPEN: &[u8] = b"<?xml";
const XML_DECLARATION_CLOSE: &[u8] = b"?>";
const BINNING_OFF: &str = "Off";

#[derive(Debug, Deserialize)]
struct EmbeddedDocument {
    #[serde(rename = "SingleFileProperty")]
    single_file_property: Option<SingleFileProperty>,
}

#[derive(Debug, Deserialize)]
struct SingleFileProperty {
    #[serde(rename = "Shooting")]
    shooting: Option<Shooting>,
}

#[derive(Debug, Deserialize)]
struct Shooting {
    #[serde(rename = "Parameter")]
    parameter: Option<ShootingParameter>,
}

#[derive(Debug, Deserialize)]
struct ShootingParameter {
    #[serde(rename = "CameraGain")]
    camera_gain: Option<TextNode>,
    // The instrument writes this element name truncated.
    #[serde(rename = "Binnin")]
    binning: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

pub fn extract_camera_settings(image: &Path, bytes: &[u8]) -> Result<CameraSettings> {
    let xml = embedded_xml(bytes).ok_or_else(|| ConversionError::NoEmbeddedMetadata {
        image: image.to_path_buf(),
    })?;

    let malformed = |message: String| ConversionError::MalformedEmbeddedMetadata {
        image: image.to_path_buf(),
        message,
    };

    let document: EmbeddedDocument =
        quick_xml::de::from_str(&xml).map_err(|e| malformed(e.to_string()))?;
    let parameter = document
        .single_file_property
        .and_then(|property| property.shooting)
        .and_then(|shooting| shooting.parameter)
        .ok_or_else(|| malformed("missing SingleFileProperty/Shooting/Parameter".to_string()))?;

    let gain_text = parameter
        .camera_gain
        .ok_or_else(|| malformed("missing Parameter/CameraGain".to_string()))?
        .text;
    let binning_text = parameter
        .binning
        .ok_or_else(|| malformed("missing Parameter/Binnin".to_string()))?
        .text;

    let gain = gain_ratio(gain_text.trim()).ok_or_else(|| ConversionError::UnexpectedGainValue {
        image: image.to_path_buf(),
        value: gain_text.clone(),
    })?;
    let binning =
        binning_factor(binning_text.trim()).ok_or_else(|| ConversionError::UnexpectedBinningValue {
            image: image.to_path_buf(),
            value: binning_text.clone(),
        })?;

    Ok(CameraSettings { binning, gain })
}

// Raw gain is in tenths of decibels; whole decibels are kept, so 125 is 12 dB.
pub fn gain_ratio(raw: &str) -> Option<u32> {
    let tenths = raw.parse::<i64>().ok()?;
    let decibels = tenths.div_euclid(10);
    let ratio = 10_f64.powf(decibels as f64 / 20.0).round_ties_even();
    if ratio.is_finite() && ratio <= f64::from(u32::MAX) {
        Some(ratio as u32)
    } else {
        None
    }
}

pub fn binning_factor(raw: &str) -> Option<u32> {
    if raw == BINNING_OFF {
        return Some(1);
    }
    let value = raw.parse::<f64>().ok().filter(|value| value.is_finite())?;
    let rounded = value.round_ties_even();
    if rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return None;
    }
    Some(rounded as u32)
}

fn embedded_xml(bytes: &[u8]) -> Option<String> {
    let start = find(bytes, XML_DECLARATION_OPEN)?;
    find(&bytes[start..], XML_DECLARATION_CLOSE)?;
    let end = start + bytes[start..].iter().rposition(|byte| *byte == b'>')? + 1;
    Some(String::from_utf8_lossy(&bytes[start..end]).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

use serde_json::Value;

use super::{coerce_u32, invalid_field};
use crate::error::Result;
use crate::record::{SegmentationConfig, StainChannel};

const SOURCE: &str = "segmentation metadata";

pub fn extract_segmentation(document: &Value) -> Result<SegmentationConfig> {
    Ok(SegmentationConfig {
        nuclear: StainChannel::new(
            read_id(document, "nuclearStainCycle")?,
            read_id(document, "nuclearStainChannel")?,
        ),
        membrane: StainChannel::new(
            read_id(document, "membraneStainCycle")?,
            read_id(document, "membraneStainChannel")?,
        ),
    })
}

fn read_id(document: &Value, name: &str) -> Result<u32> {
    let value = document.get(name).unwrap_or(&Value::Null);
    coerce_u32(value).ok_or_else(|| invalid_field(SOURCE, name, value, "expected an integer"))
}

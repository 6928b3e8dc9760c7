use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ConversionError, Result};

mod validator;

pub use validator::SchemaValidator;

const EXPERIMENT_1_5_SCHEMA: &str = include_str!("experiment_1_5.schema.json");
const EXPERIMENT_1_7_SCHEMA: &str = include_str!("experiment_1_7.schema.json");
const DATASET_SCHEMA: &str = include_str!("dataset.schema.json");

// `1.7` and `1.7.0.0` compare equal.
#[derive(Debug, Clone, Eq)]
pub struct ConfigVersion {
    components: Vec<u64>,
}

impl ConfigVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let components = trimmed
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<u64>>>()?;

        Some(Self { components })
    }

    fn new(components: &[u64]) -> Self {
        Self {
            components: components.to_vec(),
        }
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for ConfigVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for ConfigVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.components.len().max(other.components.len());
        (0..width)
            .map(|index| self.component(index).cmp(&other.component(index)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ConfigVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .components
            .iter()
            .map(|component| component.to_string())
            .collect::<Vec<String>>()
            .join(".");
        f.write_str(&rendered)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Dialect {
    #[serde(rename = "1.5")]
    V1_5,
    #[serde(rename = "1.7")]
    V1_7,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::V1_5, Dialect::V1_7];

    pub fn label(self) -> &'static str {
        match self {
            Self::V1_5 => "experiment-1.5",
            Self::V1_7 => "experiment-1.7",
        }
    }

    pub fn range(self) -> (ConfigVersion, ConfigVersion) {
        match self {
            Self::V1_5 => (ConfigVersion::new(&[1, 5]), ConfigVersion::new(&[1, 7])),
            Self::V1_7 => (ConfigVersion::new(&[1, 7]), ConfigVersion::new(&[1, 8])),
        }
    }

    pub fn contains(self, version: &ConfigVersion) -> bool {
        let (lower, upper) = self.range();
        *version >= lower && *version < upper
    }

    fn schema_text(self) -> &'static str {
        match self {
            Self::V1_5 => EXPERIMENT_1_5_SCHEMA,
            Self::V1_7 => EXPERIMENT_1_7_SCHEMA,
        }
    }

    pub fn validator(self) -> Result<SchemaValidator> {
        compile(self.label(), self.schema_text())
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn supported_ranges() -> String {
    Dialect::ALL
        .iter()
        .map(|dialect| {
            let (lower, upper) = dialect.range();
            format!("[{lower}, {upper})")
        })
        .collect::<Vec<String>>()
        .join(", ")
}

pub fn select_dialect(document: &Value) -> Result<(String, Dialect)> {
    let raw = document
        .get("version")
        .and_then(Value::as_str)
        .ok_or(ConversionError::MissingVersion)?;

    let unsupported = || ConversionError::UnsupportedVersion {
        version: raw.to_string(),
        supported: supported_ranges(),
    };

    let version = ConfigVersion::parse(raw).ok_or_else(unsupported)?;
    let dialect = Dialect::ALL
        .into_iter()
        .find(|dialect| dialect.contains(&version))
        .ok_or_else(unsupported)?;

    Ok((raw.to_string(), dialect))
}

pub fn validate_experiment_document(document: &Value) -> Result<(String, Dialect)> {
    let (version, dialect) = select_dialect(document)?;

    dialect
        .validator()?
        .validate(document)
        .map_err(|violation| ConversionError::RawSchemaValidation {
            dialect: dialect.label().to_string(),
            path: violation.path,
            message: violation.message,
        })?;

    Ok((version, dialect))
}

pub fn dataset_validator() -> Result<SchemaValidator> {
    compile("dataset", DATASET_SCHEMA)
}

fn compile(name: &str, text: &str) -> Result<SchemaValidator> {
    SchemaValidator::compile(name, text).map_err(|violation| ConversionError::InvalidSchema {
        name: name.to_string(),
        message: violation.message,
    })
}

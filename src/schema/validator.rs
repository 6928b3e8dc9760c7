use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

#[derive(Debug)]
pub struct SchemaValidator {
    validator: jsonschema::Validator,
}

impl SchemaValidator {
    pub fn compile(name: &str, schema_text: &str) -> Result<Self, SchemaViolation> {
        let schema: Value = serde_json::from_str(schema_text).map_err(|e| SchemaViolation {
            path: "$".to_string(),
            message: format!("schema {name} is not valid json: {e}"),
        })?;

        let validator = jsonschema::options()
            .build(&schema)
            .map_err(|e| SchemaViolation {
                path: "$".to_string(),
                message: format!("schema {name} does not compile: {e}"),
            })?;

        Ok(Self { validator })
    }

    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.validator.validate(value).map_err(|error| {
            let path = error.instance_path().to_string();
            SchemaViolation {
                path: format_path(&path),
                message: error.to_string(),
            }
        })
    }
}

fn format_path(pointer: &str) -> String {
    if pointer.is_empty() {
        "$".to_string()
    } else {
        format!("${pointer}")
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// ParamDef
// ---------------------------------------------------------------------------

/// One parameter of a tool, as stored in registry metadata. `kind` is a
/// free-form semantic type tag normalized by [`input_schema`]; parameter
/// order is significant and preserved in the generated required list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParamDef {
    pub fn required(name: &str, kind: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            required: true,
            default: None,
            description: Some(description.to_string()),
        }
    }

    pub fn optional(name: &str, kind: &str, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

// ---------------------------------------------------------------------------
// Type tag normalization
// ---------------------------------------------------------------------------

/// Case-insensitive alias table from semantic type tags to the canonical
/// schema type set. Unrecognized tags degrade to "string" rather than
/// failing generation.
pub fn canonical_type(tag: &str) -> &'static str {
    match tag.to_ascii_lowercase().as_str() {
        "string" | "str" | "text" => "string",
        "integer" | "int" => "integer",
        "number" | "float" | "double" | "num" => "number",
        "boolean" | "bool" | "flag" => "boolean",
        "array" | "list" => "array",
        "object" | "dict" | "map" | "json" => "object",
        _ => "string",
    }
}

// ---------------------------------------------------------------------------
// Schema generation
// ---------------------------------------------------------------------------

/// Build the structural input schema for a tool from its ordered parameter
/// definitions. Pure and deterministic: identical input yields identical
/// output, with properties in stable (sorted) key order and the required
/// list in parameter order.
pub fn input_schema(params: &[ParamDef]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut prop = serde_json::Map::new();
        prop.insert("type".to_string(), json!(canonical_type(&param.kind)));
        if let Some(desc) = &param.description {
            prop.insert("description".to_string(), json!(desc));
        }
        if let Some(default) = &param.default {
            prop.insert("default".to_string(), default.clone());
        }
        properties.insert(param.name.clone(), Value::Object(prop));
        if param.required {
            required.push(param.name.clone());
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

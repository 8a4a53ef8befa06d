use crate::errors::McpError;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const LIST_SERVICES_TOOL: &str = "list_rest_services";
pub const CALL_SERVICE_TOOL: &str = "call_rest_service";
pub const RELOAD_SERVICES_TOOL: &str = "reload_rest_services";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    vec![
        ToolDef {
            name: LIST_SERVICES_TOOL.to_string(),
            description: "List every configured REST service with its method, path, \
                parameters (location, required flag, nested body schema) and headers."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: CALL_SERVICE_TOOL.to_string(),
            description: "Call a configured REST service by name. Put every parameter in \
                `arguments`, keyed by parameter name; path/query/body placement comes from \
                the service definition."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "service_name": {
                        "type": "string",
                        "minLength": 1,
                        "description": "Service name as returned by list_rest_services."
                    },
                    "arguments": {
                        "type": "object",
                        "description": "Parameter values keyed by parameter name."
                    }
                },
                "required": ["service_name"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: RELOAD_SERVICES_TOOL.to_string(),
            description: "Re-read the service catalog file. The previous catalog stays \
                active if the file cannot be loaded."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        },
    ]
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static [ToolDef] {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    let result = schema.validate(args);
    if let Err(errors) = result {
        let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
        for err in errors.take(10) {
            let path = err.instance_path.to_string();
            let path = if path.is_empty() { "(root)".to_string() } else { path };
            lines.push(format!("- {}: {}", path, err));
        }
        return Err(McpError::invalid_params(lines.join("\n")));
    }
    Ok(())
}

use crate::catalog::{ParamLocation, ServiceSpec};
use serde_json::{Map, Value};

/// Arguments placed into their declared locations.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments {
    /// Base URL plus path, placeholders substituted. No query string.
    pub url: String,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
}

/// Pure function of its inputs. Arguments that match no declared parameter are
/// ignored, and a path placeholder without an argument is left in place.
pub fn bind_arguments(
    service: &ServiceSpec,
    base_url: &str,
    arguments: &Map<String, Value>,
) -> BoundArguments {
    let mut url = format!("{}{}", base_url, service.path);
    let mut query = Map::new();
    let mut body = Map::new();

    for param in &service.params {
        let Some(value) = arguments.get(&param.name) else {
            continue;
        };
        match param.location {
            ParamLocation::Path => {
                let placeholder = format!("{{{}}}", param.name);
                url = url.replace(&placeholder, &scalar_text(value));
            }
            ParamLocation::Query => {
                query.insert(param.name.clone(), value.clone());
            }
            ParamLocation::Body => {
                body.insert(param.name.clone(), value.clone());
            }
        }
    }

    BoundArguments { url, query, body }
}

/// Text form of a value as it appears in a URL: strings unquoted, everything
/// else in its JSON rendering.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

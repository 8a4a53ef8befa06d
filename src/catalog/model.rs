use crate::constants::network::SUPPORTED_METHODS;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Where a bound argument lands in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

impl ParamLocation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "body" => Some(ParamLocation::Body),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a schema node. Nested structure lives inside the variant, so an
/// object can never carry an item and an array can never carry children.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Int,
    Number,
    Bool,
    Json,
    Object(Vec<SchemaField>),
    Array(Option<Box<SchemaField>>),
    Other(String),
}

impl FieldKind {
    /// Scalar kinds for a type tag. `object` and `array` come back empty and
    /// are filled in by the loader.
    pub fn from_tag(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "string" | "" => FieldKind::String,
            "int" => FieldKind::Int,
            "number" => FieldKind::Number,
            "bool" => FieldKind::Bool,
            "json" => FieldKind::Json,
            "object" => FieldKind::Object(Vec::new()),
            "array" => FieldKind::Array(None),
            _ => FieldKind::Other(trimmed.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Number => "number",
            FieldKind::Bool => "bool",
            FieldKind::Json => "json",
            FieldKind::Object(_) => "object",
            FieldKind::Array(_) => "array",
            FieldKind::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Absent for array item nodes.
    pub name: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
}

impl SchemaField {
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn children(&self) -> &[SchemaField] {
        match &self.kind {
            FieldKind::Object(children) => children,
            _ => &[],
        }
    }

    pub fn item(&self) -> Option<&SchemaField> {
        match &self.kind {
            FieldKind::Array(item) => item.as_deref(),
            _ => None,
        }
    }

    /// Number of nested levels below this node (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        match &self.kind {
            FieldKind::Object(children) => children
                .iter()
                .map(|child| child.depth() + 1)
                .max()
                .unwrap_or(0),
            FieldKind::Array(Some(item)) => item.depth() + 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSpec {
    pub name: String,
    pub literal: Option<String>,
    pub env_var: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub required: bool,
    pub location: ParamLocation,
    /// Descriptive type tag, not enforced.
    pub param_type: String,
    pub schema: Option<SchemaField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Other(String),
}

impl HttpMethod {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "" | "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            _ => HttpMethod::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Other(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_METHODS.contains(&self.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSpec {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    pub params: Vec<ParamSpec>,
    pub headers: Vec<HeaderSpec>,
    pub base_url_override: Option<String>,
}

impl ServiceSpec {
    pub fn new(name: &str, method: HttpMethod, path: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            params: Vec::new(),
            headers: Vec::new(),
            base_url_override: None,
        }
    }

    pub fn params_at(&self, location: ParamLocation) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(move |param| param.location == location)
    }

    /// Names of required parameters absent from `arguments`, in declaration order.
    pub fn missing_required(&self, arguments: &Map<String, Value>) -> Vec<String> {
        self.params
            .iter()
            .filter(|param| param.required && !arguments.contains_key(&param.name))
            .map(|param| param.name.clone())
            .collect()
    }

    pub fn base_url<'a>(&'a self, global: &'a str) -> &'a str {
        self.base_url_override.as_deref().unwrap_or(global)
    }
}

/// Point-in-time snapshot of the configured services. Document order is kept
/// for introspection; a duplicate name replaces the earlier entry in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    base_url: String,
    services: Vec<ServiceSpec>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            services: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Adds a service, returning the entry it replaced when the name was taken.
    pub fn insert(&mut self, service: ServiceSpec) -> Option<ServiceSpec> {
        if let Some(&slot) = self.index.get(&service.name) {
            return Some(std::mem::replace(&mut self.services[slot], service));
        }
        self.index.insert(service.name.clone(), self.services.len());
        self.services.push(service);
        None
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.index.get(name).map(|&slot| &self.services[slot])
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter()
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.services.iter().map(|svc| svc.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_field_tags_pass_through() {
        assert_eq!(FieldKind::from_tag("Decimal").type_name(), "Decimal");
        assert_eq!(FieldKind::from_tag("INT"), FieldKind::Int);
        assert_eq!(FieldKind::from_tag(""), FieldKind::String);
    }

    #[test]
    fn accessors_follow_the_kind() {
        let item = SchemaField {
            name: None,
            kind: FieldKind::Object(vec![SchemaField {
                name: Some("qty".to_string()),
                kind: FieldKind::Int,
                required: true,
            }]),
            required: false,
        };
        let lines = SchemaField {
            name: Some("lines".to_string()),
            kind: FieldKind::Array(Some(Box::new(item))),
            required: true,
        };
        assert!(lines.children().is_empty());
        let item = lines.item().expect("item");
        assert_eq!(item.children().len(), 1);
        assert!(item.item().is_none());
        assert_eq!(lines.depth(), 2);
        assert_eq!(item.children()[0].depth(), 0);
    }

    #[test]
    fn method_parse_uppercases_and_flags_unsupported() {
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Get);
        let patch = HttpMethod::parse("patch");
        assert_eq!(patch.as_str(), "PATCH");
        assert!(!patch.is_supported());
        assert!(HttpMethod::Delete.is_supported());
    }

    #[test]
    fn catalog_duplicate_replaces_in_place() {
        let mut catalog = Catalog::new("http://localhost:8001/");
        assert_eq!(catalog.base_url(), "http://localhost:8001");
        catalog.insert(ServiceSpec::new("a", HttpMethod::Get, "/a"));
        catalog.insert(ServiceSpec::new("b", HttpMethod::Get, "/b"));
        let replaced = catalog.insert(ServiceSpec::new("a", HttpMethod::Post, "/a2"));
        assert_eq!(replaced.map(|svc| svc.path), Some("/a".to_string()));
        assert_eq!(catalog.service_names(), vec!["a", "b"]);
        assert_eq!(catalog.get("a").map(|svc| svc.method.clone()), Some(HttpMethod::Post));
    }

    #[test]
    fn missing_required_reports_all_absent_names() {
        let mut svc = ServiceSpec::new("create_order", HttpMethod::Post, "/orders");
        for (name, required) in [("customer_code", true), ("note", false), ("lines", true)] {
            svc.params.push(ParamSpec {
                name: name.to_string(),
                required,
                location: ParamLocation::Body,
                param_type: "string".to_string(),
                schema: None,
            });
        }
        let args = json!({"note": "x"});
        let missing = svc.missing_required(args.as_object().expect("object"));
        assert_eq!(missing, vec!["customer_code", "lines"]);
    }
}

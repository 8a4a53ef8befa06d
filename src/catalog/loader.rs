use crate::catalog::model::{
    Catalog, FieldKind, HeaderSpec, HttpMethod, ParamLocation, ParamSpec, SchemaField, ServiceSpec,
};
use crate::constants::{limits::MAX_SCHEMA_DEPTH, xml};
use crate::errors::ConfigError;
use crate::services::logger::Logger;
use roxmltree::{Document, Node};
use serde_json::json;
use std::path::Path;

/// Builds a [`Catalog`] from the `<RestServices>` XML document. Only an
/// unreadable source, a wrong root element or a missing `baseUrl` abort the
/// load; every other malformed element is skipped with a warning.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    logger: Logger,
}

impl CatalogLoader {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("catalog"),
        }
    }

    pub fn load_from_path(&self, path: &Path) -> Result<Catalog, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = self.load_from_str(&text)?;
        self.logger.info(
            "Loaded service catalog",
            Some(&json!({
                "path": path.display().to_string(),
                "base_url": catalog.base_url(),
                "services": catalog.service_names(),
            })),
        );
        Ok(catalog)
    }

    pub fn load_from_str(&self, text: &str) -> Result<Catalog, ConfigError> {
        let doc = Document::parse(text)?;
        let root = doc.root_element();
        if root.tag_name().name() != xml::ROOT {
            return Err(ConfigError::InvalidRoot(root.tag_name().name().to_string()));
        }

        let base_url = root
            .attribute("baseUrl")
            .map(|raw| raw.trim().trim_end_matches('/'))
            .filter(|raw| !raw.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let mut catalog = Catalog::new(base_url);
        for node in elements(root, xml::SERVICE) {
            let Some(service) = self.parse_service(node) else {
                continue;
            };
            let name = service.name.clone();
            if catalog.insert(service).is_some() {
                self.logger.warn(
                    "Duplicate service name, replacing the earlier definition",
                    Some(&json!({ "service": name })),
                );
            }
        }

        if catalog.is_empty() {
            self.logger.warn("Service catalog defines no services", None);
        }
        Ok(catalog)
    }

    fn parse_service(&self, node: Node) -> Option<ServiceSpec> {
        let name = non_blank(node.attribute("name"));
        let path = non_blank(node.attribute("path"));
        let (Some(name), Some(path)) = (name, path) else {
            self.logger.warn(
                "Skipping service without name or path",
                Some(&json!({
                    "name": node.attribute("name"),
                    "path": node.attribute("path"),
                })),
            );
            return None;
        };

        let mut service = ServiceSpec::new(
            name,
            HttpMethod::parse(node.attribute("method").unwrap_or("GET")),
            path,
        );
        service.base_url_override = non_blank(
            node.attribute("baseUrlOverride")
                .or_else(|| node.attribute("baseUrl")),
        )
        .map(|raw| raw.trim_end_matches('/').to_string());

        for header in elements(node, xml::HEADER) {
            if let Some(spec) = self.parse_header(name, header) {
                service.headers.push(spec);
            }
        }
        for param in elements(node, xml::PARAM) {
            if let Some(spec) = self.parse_param(name, param) {
                if service.params.iter().any(|p| p.name == spec.name) {
                    self.logger.warn(
                        "Duplicate parameter name, replacing the earlier definition",
                        Some(&json!({ "service": name, "param": spec.name })),
                    );
                    service.params.retain(|p| p.name != spec.name);
                }
                service.params.push(spec);
            }
        }
        Some(service)
    }

    fn parse_header(&self, service: &str, node: Node) -> Option<HeaderSpec> {
        let Some(name) = non_blank(node.attribute("name")) else {
            self.logger.warn(
                "Skipping header without name",
                Some(&json!({ "service": service })),
            );
            return None;
        };
        Some(HeaderSpec {
            name: name.to_string(),
            literal: node.attribute("value").map(str::to_string),
            env_var: node.attribute("env").map(str::to_string),
        })
    }

    fn parse_param(&self, service: &str, node: Node) -> Option<ParamSpec> {
        let Some(name) = non_blank(node.attribute("name")) else {
            self.logger.warn(
                "Skipping parameter without name",
                Some(&json!({ "service": service })),
            );
            return None;
        };

        let raw_location = node.attribute("location").unwrap_or("query");
        let location = ParamLocation::parse(raw_location).unwrap_or_else(|| {
            self.logger.warn(
                "Invalid parameter location, using 'query'",
                Some(&json!({ "service": service, "param": name, "location": raw_location })),
            );
            ParamLocation::Query
        });

        let param_type = non_blank(node.attribute("type")).unwrap_or("string");
        let schema = self.parse_param_schema(service, name, param_type, node);

        Some(ParamSpec {
            name: name.to_string(),
            required: parse_flag(node.attribute("required")),
            location,
            param_type: param_type.to_string(),
            schema,
        })
    }

    fn parse_param_schema(
        &self,
        service: &str,
        name: &str,
        param_type: &str,
        node: Node,
    ) -> Option<SchemaField> {
        let has_fields = elements(node, xml::FIELD).next().is_some();
        let has_item = elements(node, xml::ITEM).next().is_some();
        if !has_fields && !has_item {
            return None;
        }

        let mut kind = FieldKind::from_tag(param_type);
        if !matches!(kind, FieldKind::Object(_) | FieldKind::Array(_)) {
            self.logger.warn(
                "Parameter declares nested fields but is not an object, treating it as one",
                Some(&json!({ "service": service, "param": name, "type": param_type })),
            );
            kind = FieldKind::Object(Vec::new());
        }

        let mut ctx = SchemaContext {
            loader: self,
            service,
            truncated: false,
        };
        let kind = ctx.fill_kind(kind, node, 0);
        if ctx.truncated {
            self.logger.warn(
                "Schema nesting exceeds the depth limit, deeper fields were dropped",
                Some(&json!({ "service": service, "param": name, "max_depth": MAX_SCHEMA_DEPTH })),
            );
        }
        let schema = SchemaField {
            name: Some(name.to_string()),
            kind,
            required: parse_flag(node.attribute("required")),
        };
        self.logger.debug(
            "Built parameter schema",
            Some(&json!({ "service": service, "param": name, "depth": schema.depth() })),
        );
        Some(schema)
    }
}

struct SchemaContext<'a> {
    loader: &'a CatalogLoader,
    service: &'a str,
    truncated: bool,
}

impl SchemaContext<'_> {
    /// Populates the nested part of `kind` from the element's children.
    fn fill_kind(&mut self, kind: FieldKind, node: Node, depth: usize) -> FieldKind {
        match kind {
            FieldKind::Object(_) => FieldKind::Object(self.fields(node, depth)),
            FieldKind::Array(_) => FieldKind::Array(self.item(node, depth).map(Box::new)),
            scalar => scalar,
        }
    }

    fn fields(&mut self, node: Node, depth: usize) -> Vec<SchemaField> {
        if depth >= MAX_SCHEMA_DEPTH {
            if elements(node, xml::FIELD).next().is_some() {
                self.truncated = true;
            }
            return Vec::new();
        }
        elements(node, xml::FIELD)
            .filter_map(|child| self.field(child, depth + 1))
            .collect()
    }

    fn field(&mut self, node: Node, depth: usize) -> Option<SchemaField> {
        let Some(name) = non_blank(node.attribute("name")) else {
            self.loader.logger.warn(
                "Skipping schema field without name",
                Some(&json!({ "service": self.service })),
            );
            return None;
        };
        let kind = FieldKind::from_tag(node.attribute("type").unwrap_or("string"));
        Some(SchemaField {
            name: Some(name.to_string()),
            kind: self.fill_kind(kind, node, depth),
            required: parse_flag(node.attribute("required")),
        })
    }

    fn item(&mut self, node: Node, depth: usize) -> Option<SchemaField> {
        let item = elements(node, xml::ITEM).next()?;
        if depth >= MAX_SCHEMA_DEPTH {
            self.truncated = true;
            return None;
        }
        let kind = FieldKind::from_tag(non_blank(item.attribute("type")).unwrap_or("object"));
        Some(SchemaField {
            name: None,
            kind: self.fill_kind(kind, item, depth + 1),
            required: false,
        })
    }
}

fn elements<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name(tag))
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "y" | "on")
    )
}

//! Read-only, serializable view of the catalog handed to calling agents.

use crate::catalog::model::{Catalog, HeaderSpec, ParamSpec, SchemaField, ServiceSpec};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub method: String,
    pub path: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url_override: Option<String>,
    pub params: Vec<ParamDescriptor>,
    pub headers: Vec<HeaderDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDescriptor {
    pub name: String,
    pub required: bool,
    pub location: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Box<FieldDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
}

pub fn describe_catalog(catalog: &Catalog) -> Vec<ServiceDescriptor> {
    catalog
        .services()
        .map(|svc| describe_service(svc, catalog.base_url()))
        .collect()
}

pub fn describe_service(service: &ServiceSpec, global_base_url: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        name: service.name.clone(),
        method: service.method.as_str().to_string(),
        path: service.path.clone(),
        base_url: service.base_url(global_base_url).to_string(),
        base_url_override: service.base_url_override.clone(),
        params: service.params.iter().map(describe_param).collect(),
        headers: service.headers.iter().map(describe_header).collect(),
    }
}

fn describe_param(param: &ParamSpec) -> ParamDescriptor {
    ParamDescriptor {
        name: param.name.clone(),
        required: param.required,
        location: param.location.as_str().to_string(),
        param_type: param.param_type.clone(),
        schema: param.schema.as_ref().map(describe_field),
    }
}

fn describe_field(field: &SchemaField) -> FieldDescriptor {
    FieldDescriptor {
        name: field.name.clone(),
        field_type: field.type_name().to_string(),
        required: field.required,
        children: field.children().iter().map(describe_field).collect(),
        item: field.item().map(|item| Box::new(describe_field(item))),
    }
}

// Only the env var name is exposed, never its value.
fn describe_header(header: &HeaderSpec) -> HeaderDescriptor {
    HeaderDescriptor {
        name: header.name.clone(),
        value: header.literal.clone(),
        env: header.env_var.clone(),
    }
}

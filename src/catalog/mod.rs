pub mod descriptor;
pub mod loader;
pub mod model;

pub use descriptor::{describe_catalog, ServiceDescriptor};
pub use loader::CatalogLoader;
pub use model::{
    Catalog, FieldKind, HeaderSpec, HttpMethod, ParamLocation, ParamSpec, SchemaField, ServiceSpec,
};

pub mod network {
    pub const TIMEOUT_CONNECT_MS: u64 = 5_000;
    pub const TIMEOUT_REQUEST_MS: u64 = 10_000;
    pub const SUPPORTED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
    pub const DEFAULT_ACCEPT: &str = "application/json";
    pub const USER_AGENT: &str = concat!("restmcp/", env!("CARGO_PKG_VERSION"));
}

pub mod limits {
    pub const LOG_PREVIEW_CHARS: usize = 2_000;
    pub const MAX_SCHEMA_DEPTH: usize = 32;
}

pub mod env {
    pub const SERVICES_XML: &str = "RESTMCP_SERVICES_XML";
    pub const SERVICES_XML_LEGACY: &str = "ORDERS_REST_XML_PATH";
    pub const CONNECT_TIMEOUT_MS: &str = "RESTMCP_CONNECT_TIMEOUT_MS";
    pub const REQUEST_TIMEOUT_MS: &str = "RESTMCP_REQUEST_TIMEOUT_MS";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const DEFAULT_SERVICES_XML: &str = "my_services.xml";
}

pub mod xml {
    pub const ROOT: &str = "RestServices";
    pub const SERVICE: &str = "Service";
    pub const HEADER: &str = "Header";
    pub const PARAM: &str = "Param";
    pub const FIELD: &str = "Field";
    pub const ITEM: &str = "Item";
}

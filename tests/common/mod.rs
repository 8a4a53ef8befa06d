#![allow(dead_code)]

use once_cell::sync::Lazy;
use restmcp::catalog::CatalogLoader;
use restmcp::managers::Dispatcher;
use restmcp::services::logger::{LogLevel, Logger};
use restmcp::services::transport::{HttpSettings, ReqwestTransport};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub fn quiet_logger() -> Logger {
    Logger::new("test").with_level(LogLevel::Error)
}

/// Catalog pointing every service at `base_url` (typically a mock server).
pub fn orders_xml(base_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<RestServices baseUrl="{base_url}">
  <Service name="get_price_list" method="GET" path="/prices">
    <Param name="customer_code" location="query" />
    <Param name="article_code" location="query" />
  </Service>
  <Service name="get_order" method="GET" path="/orders/{{id}}">
    <Header name="X-Token" env="RESTMCP_TEST_TOKEN" value="fallback" />
    <Param name="id" required="true" location="path" type="int" />
  </Service>
  <Service name="create_order" method="POST" path="/customers/{{customer_code}}/orders">
    <Param name="customer_code" required="true" location="path" />
    <Param name="lines" required="true" location="body" type="array">
      <Item type="object">
        <Field name="article_code" type="string" required="true" />
        <Field name="qty" type="int" />
      </Item>
    </Param>
  </Service>
</RestServices>
"#
    )
}

pub fn settings(request_timeout_ms: u64) -> HttpSettings {
    HttpSettings {
        connect_timeout: Duration::from_millis(1_000),
        request_timeout: Duration::from_millis(request_timeout_ms),
    }
}

pub fn dispatcher_with(xml: &str, settings: HttpSettings) -> Dispatcher {
    let logger = quiet_logger();
    let catalog = CatalogLoader::new(logger.clone())
        .load_from_str(xml)
        .expect("catalog");
    let transport = Arc::new(ReqwestTransport::new(settings).expect("client"));
    Dispatcher::new(catalog, transport, settings, logger)
}

pub fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("arguments object")
}

pub fn tmp_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}.xml", prefix, uuid::Uuid::new_v4()))
}

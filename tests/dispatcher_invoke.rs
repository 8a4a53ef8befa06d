mod common;
use common::{args, dispatcher_with, orders_xml, settings, ENV_LOCK};

use restmcp::errors::DispatchErrorKind;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn price_list_without_arguments_sends_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"price": 1.5}])))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher.invoke("get_price_list", &args(json!({}))).await;

    assert!(result.ok, "{:?}", result.error);
    assert_eq!(result.status_code, Some(200));
    assert_eq!(result.response_json, Some(json!([{"price": 1.5}])));
    let echo = result.request.expect("request echo");
    assert!(echo.request.query.is_empty());
    assert!(!echo.request.url.contains('{'));

    let received = server.received_requests().await.expect("recording on");
    assert_eq!(received[0].url.query(), None);
}

#[tokio::test]
async fn price_list_with_article_code_goes_to_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(query_param("article_code", "mela"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher
        .invoke("get_price_list", &args(json!({"article_code": "mela"})))
        .await;

    assert!(result.ok);
    let echo = result.request.expect("request echo");
    assert_eq!(serde_json::Value::Object(echo.request.query), json!({"article_code": "mela"}));
    assert!(echo.request.body.is_none());
}

#[tokio::test]
async fn path_parameter_is_substituted() {
    let _guard = ENV_LOCK.lock().await;
    std::env::remove_var("RESTMCP_TEST_TOKEN");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher.invoke("get_order", &args(json!({"id": 42}))).await;

    assert!(result.ok);
    assert!(result.request.expect("echo").request.url.ends_with("/orders/42"));
    assert_eq!(result.response_json, None);
    assert_eq!(result.response_text.as_deref(), Some("plain text"));
}

#[tokio::test]
async fn header_prefers_env_then_literal() {
    let _guard = ENV_LOCK.lock().await;

    let server = MockServer::start().await;
    Mock::given(path("/orders/1"))
        .and(header("x-token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "env"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/orders/1"))
        .and(header("x-token", "fallback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"from": "literal"})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));

    std::env::set_var("RESTMCP_TEST_TOKEN", "abc");
    let result = dispatcher.invoke("get_order", &args(json!({"id": 1}))).await;
    assert_eq!(result.response_json, Some(json!({"from": "env"})));
    let echoed = result.request.expect("echo").request.headers;
    assert_eq!(echoed.get("X-Token").map(String::as_str), Some("***REDACTED***"));

    std::env::remove_var("RESTMCP_TEST_TOKEN");
    let result = dispatcher.invoke("get_order", &args(json!({"id": 1}))).await;
    assert_eq!(result.response_json, Some(json!({"from": "literal"})));
}

#[tokio::test]
async fn body_parameters_are_sent_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/customers/C01/orders"))
        .and(body_json(json!({"lines": [{"article_code": "mela", "qty": 3}]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"order": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher
        .invoke(
            "create_order",
            &args(json!({
                "customer_code": "C01",
                "lines": [{"article_code": "mela", "qty": 3}],
                "ignored": true
            })),
        )
        .await;

    assert!(result.ok);
    assert_eq!(result.status_code, Some(201));
    let echo = result.request.expect("echo");
    assert!(echo.curl.contains("--data"));
}

#[tokio::test]
async fn http_error_keeps_backend_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "order not found"})),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher.invoke("get_order", &args(json!({"id": 9}))).await;

    assert!(!result.ok);
    assert_eq!(result.status_code, Some(404));
    assert_eq!(result.response_json, Some(json!({"detail": "order not found"})));
    assert_eq!(result.error.as_deref(), Some("HTTP 404"));
    assert_eq!(result.error_kind, None);
}

#[tokio::test]
async fn slow_backend_is_abandoned_within_timeout() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(300));
    let started = Instant::now();
    let result = dispatcher.invoke("get_price_list", &args(json!({}))).await;
    let elapsed = started.elapsed();

    assert!(!result.ok);
    assert_eq!(result.status_code, None);
    assert_eq!(result.error_kind, Some(DispatchErrorKind::NetworkError));
    assert!(result.error.expect("error").contains("timeout"));
    assert!(elapsed < Duration::from_millis(1_500), "took {:?}", elapsed);
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let uri = format!("http://127.0.0.1:{}", port);
    let dispatcher = dispatcher_with(&orders_xml(&uri), settings(2_000));
    let result = dispatcher.invoke("get_price_list", &args(json!({}))).await;

    assert!(!result.ok);
    assert_eq!(result.status_code, None);
    assert_eq!(result.error_kind, Some(DispatchErrorKind::NetworkError));
    assert!(result.request.is_some());
}

#[tokio::test]
async fn missing_required_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher
        .invoke("create_order", &args(json!({"customer_code": "C01"})))
        .await;

    assert!(!result.ok);
    assert_eq!(result.error_kind, Some(DispatchErrorKind::MissingRequiredParameters));
    assert!(result.error.expect("error").contains("lines"));
    assert!(result.request.is_none());

    let result = dispatcher.invoke("no_such_service", &args(json!({}))).await;
    assert_eq!(result.error_kind, Some(DispatchErrorKind::UnknownService));
    assert_eq!(result.service, "no_such_service");
}

#[tokio::test]
async fn concurrent_calls_do_not_interfere() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(8)
        .mount(&server)
        .await;

    let dispatcher = std::sync::Arc::new(dispatcher_with(
        &orders_xml(&server.uri()),
        settings(2_000),
    ));
    let mut handles = Vec::new();
    for idx in 0..8 {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            dispatcher
                .invoke("get_price_list", &args(json!({"customer_code": format!("C{idx}")})))
                .await
        }));
    }
    for handle in handles {
        let result = handle.await.expect("join");
        assert!(result.ok);
    }
}

#[tokio::test]
async fn redirects_are_reported_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"moved": true})))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_with(&orders_xml(&server.uri()), settings(2_000));
    let result = dispatcher.invoke("get_price_list", &args(json!({}))).await;

    assert!(!result.ok);
    assert_eq!(result.status_code, Some(302));
    assert_eq!(result.error.as_deref(), Some("HTTP 302"));
    assert_eq!(result.error_kind, None);
    let received = server.received_requests().await.expect("recording on");
    assert_eq!(received.len(), 1, "exactly one HTTP request per call");
}

//! End-to-end tests against the live echo server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread with its
//! own runtime, then drives the blocking builder over real HTTP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mock_server::{payload, Part};
use requests_core::{
    get, post, put, request, Error, MultipartForm, Transport, TransportConfig, Values,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Bound and immediately released, so nothing is listening there.
fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

#[test]
fn get_with_query_params_echoes_query() {
    let addr = start_server();

    let text = get(format!("http://{addr}/echo/query"))
        .params(Values::from([("a", "1"), ("b", "2")]))
        .send()
        .check_status_ok()
        .text()
        .unwrap();
    assert!(text.contains("a=1&b=2"), "got {text:?}");
}

#[test]
fn query_is_appended_to_existing_query() {
    let addr = start_server();

    let text = get(format!("http://{addr}/echo/query?x=0"))
        .params(Values::from([("q", "hello world"), ("tag", "1"), ("tag", "2")]))
        .send()
        .text()
        .unwrap();
    assert_eq!(text, "x=0&q=hello+world&tag=1&tag=2");
}

#[test]
fn post_json_roundtrips_through_echo() {
    let addr = start_server();

    let value: HashMap<String, serde_json::Value> = post(format!("http://{addr}/echo/body"))
        .json(&serde_json::json!({"x": 1}))
        .send()
        .check_status_2xx()
        .json()
        .unwrap();
    assert_eq!(value.len(), 1);
    assert_eq!(value["x"], 1);
}

#[test]
fn post_form_reaches_server_in_order() {
    let addr = start_server();

    let pairs: Vec<(String, String)> = post(format!("http://{addr}/echo/form"))
        .form(Values::from([("form1", "value 1"), ("form2", "123")]))
        .send()
        .check_status_ok()
        .json()
        .unwrap();
    assert_eq!(
        pairs,
        vec![
            ("form1".to_string(), "value 1".to_string()),
            ("form2".to_string(), "123".to_string()),
        ]
    );
}

#[test]
fn multipart_upload_delivers_file_and_fields() {
    let addr = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.bin");
    let content: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    std::fs::write(&path, &content).unwrap();

    let parts: Vec<Part> = post(format!("http://{addr}/echo/multipart"))
        .header("Content-Type", "text/plain")
        .multipart(
            MultipartForm::new()
                .file("file1", &path)
                .value("form1", "value1"),
        )
        .send()
        .check_status_ok()
        .json()
        .unwrap();

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].name, "file1");
    assert!(parts[0]
        .file_name
        .as_deref()
        .is_some_and(|name| name.ends_with("upload.bin")));
    assert_eq!(parts[0].data, content);
    assert_eq!(parts[1].name, "form1");
    assert_eq!(parts[1].file_name, None);
    assert_eq!(parts[1].data, b"value1");
}

#[test]
fn save_writes_identical_bytes() {
    let addr = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("download.bin");
    std::fs::write(&path, b"stale content that must be truncated").unwrap();

    get(format!("http://{addr}/bytes/70000"))
        .send()
        .check_status_ok()
        .save(&path)
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), payload(70000));
}

#[test]
fn raw_bytes_match_payload() {
    let addr = start_server();

    let bytes = get(format!("http://{addr}/bytes/10"))
        .send()
        .bytes()
        .unwrap();
    assert_eq!(bytes, payload(10));
}

#[test]
fn status_ok_check_turns_404_into_error() {
    let addr = start_server();

    let response = get(format!("http://{addr}/status/404")).send();
    assert_eq!(response.status().map(|s| s.as_u16()), Some(404));

    let err = response.check_status_ok().text().unwrap_err();
    assert!(matches!(err, Error::Status { status: 404, expected: "200" }));
}

#[test]
fn status_2xx_accepts_201_and_rejects_418() {
    let addr = start_server();

    let text = get(format!("http://{addr}/status/201"))
        .send()
        .check_status_2xx()
        .text()
        .unwrap();
    assert_eq!(text, "status 201");

    let err = get(format!("http://{addr}/status/201"))
        .send()
        .check_status_ok()
        .bytes()
        .unwrap_err();
    assert_eq!(err.status(), Some(201));

    let err = get(format!("http://{addr}/status/418"))
        .send()
        .check_status_2xx()
        .bytes()
        .unwrap_err();
    assert_eq!(err.status(), Some(418));
}

#[test]
fn unchecked_error_status_still_yields_body() {
    let addr = start_server();

    let text = get(format!("http://{addr}/status/500"))
        .send()
        .text()
        .unwrap();
    assert_eq!(text, "status 500");
}

#[test]
fn transport_error_reaches_every_decoder() {
    let url = format!("http://{}/", closed_port());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.bin");

    assert!(matches!(get(url.as_str()).send().bytes(), Err(Error::Transport(_))));
    assert!(matches!(get(url.as_str()).send().text(), Err(Error::Transport(_))));
    assert!(matches!(
        get(url.as_str()).send().json::<serde_json::Value>(),
        Err(Error::Transport(_))
    ));
    assert!(matches!(
        get(url.as_str()).send().check_status_ok().save(&path),
        Err(Error::Transport(_))
    ));
    assert!(!path.exists());
}

#[test]
fn custom_method_and_transport() {
    let addr = start_server();
    let transport = Transport::new(&TransportConfig::default().timeout(Duration::from_secs(5)));

    let text = request(format!("http://{addr}/echo/method"), "OPTIONS", Some(transport))
        .send()
        .text()
        .unwrap();
    assert_eq!(text, "OPTIONS");

    let text = put(format!("http://{addr}/echo/method"))
        .send()
        .text()
        .unwrap();
    assert_eq!(text, "PUT");
}

#[test]
fn user_agent_comes_from_config() {
    let addr = start_server();
    let transport = Transport::new(&TransportConfig::default().user_agent("echo-client/2"));

    let headers: Vec<(String, String)> = get(format!("http://{addr}/echo/headers"))
        .with_transport(transport)
        .header("X-Request-Id", "42")
        .send()
        .json()
        .unwrap();
    assert!(headers.contains(&("user-agent".to_string(), "echo-client/2".to_string())));
    assert!(headers.contains(&("x-request-id".to_string(), "42".to_string())));
}

#[test]
fn transport_interceptors_run_before_send() {
    let addr = start_server();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let transport = Transport::default().with_interceptor(move |req| {
        counter.fetch_add(1, Ordering::SeqCst);
        req.headers_mut()
            .insert("x-intercepted", "yes".parse().unwrap());
        Ok(())
    });

    let headers: Vec<(String, String)> = get(format!("http://{addr}/echo/headers"))
        .with_transport(transport.clone())
        .send()
        .json()
        .unwrap();
    assert!(headers.contains(&("x-intercepted".to_string(), "yes".to_string())));

    let rejecting = transport.with_interceptor(|req| {
        if req.uri().path().starts_with("/status") {
            Err("status routes are off limits".into())
        } else {
            Ok(())
        }
    });
    let err = get(format!("http://{addr}/status/200"))
        .with_transport(rejecting)
        .send()
        .text()
        .unwrap_err();
    assert!(matches!(err, Error::Interceptor(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn global_interceptor_applies_to_default_transport() {
    let addr = start_server();
    requests_core::add_request_interceptor(|req| {
        if req.headers().contains_key("x-block-me") {
            return Err("blocked by global interceptor".into());
        }
        Ok(())
    });

    let err = get(format!("http://{addr}/echo/query"))
        .header("X-Block-Me", "1")
        .send()
        .text()
        .unwrap_err();
    assert!(matches!(err, Error::Interceptor(e) if e.to_string() == "blocked by global interceptor"));

    let text = get(format!("http://{addr}/echo/query"))
        .param("ok", "1")
        .send()
        .text()
        .unwrap();
    assert_eq!(text, "ok=1");
}

#[test]
fn invalid_json_body_is_a_decode_error() {
    let addr = start_server();

    let err = post(format!("http://{addr}/echo/body"))
        .header("Content-Type", "text/plain")
        .send()
        .json::<serde_json::Value>()
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

fn framing_headers(headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers
        .into_iter()
        .filter(|(name, _)| name == "content-length" || name == "transfer-encoding")
        .collect()
}

#[test]
fn empty_body_framing_depends_on_method() {
    let addr = start_server();
    let url = format!("http://{addr}/echo/headers");
    let zero_length = vec![("content-length".to_string(), "0".to_string())];

    let headers: Vec<(String, String)> = get(url.as_str()).send().json().unwrap();
    assert!(framing_headers(headers).is_empty());

    let headers: Vec<(String, String)> = post(url.as_str()).send().json().unwrap();
    assert_eq!(framing_headers(headers), zero_length);

    let headers: Vec<(String, String)> = put(url.as_str()).send().json().unwrap();
    assert_eq!(framing_headers(headers), zero_length);

    let headers: Vec<(String, String)> = post(url.as_str())
        .form(Values::new())
        .send()
        .json()
        .unwrap();
    assert_eq!(framing_headers(headers), zero_length);
}

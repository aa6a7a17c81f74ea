//! Common test utilities and helpers for ec2stack-api tests
//!
//! Requests are signed the way an EC2 client signs them, and the app runs
//! against an in-memory CloudStack with fast job polling.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chrono::Utc;
use ec2stack_api::{
    config::parse_credentials,
    signature::{self, SignatureMethod},
    AppState, Config,
};
use ec2stack_cloudstack::{CloudStackTransport, Ec2Request, InMemoryCloudStack};
use std::sync::Arc;
use tower::ServiceExt;

pub const ACCESS_KEY: &str = "AKIDEXAMPLE";
pub const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
pub const HOST: &str = "localhost:5000";

pub const VOLUME_ID: &str = "4f1d3e2a-7c1b-4f7e-9d61-2a3c5b0e8f10";

pub fn test_config() -> Config {
    Config {
        credentials: parse_credentials(&format!("{ACCESS_KEY}:{SECRET_KEY}")),
        api_version: "2013-10-15".to_string(),
        signature_window_secs: 900,
        job_poll_interval_ms: 1,
        job_max_polls: 20,
        sandbox_volumes: Vec::new(),
        ..Config::default()
    }
}

/// Backend with one data volume and a single pending poll per job.
pub fn test_backend() -> Arc<InMemoryCloudStack> {
    Arc::new(
        InMemoryCloudStack::new()
            .with_job_latency(1)
            .with_volume(VOLUME_ID, "data-disk"),
    )
}

/// Signed query string for `params`, using the test credentials.
pub fn signed_query(method: &str, params: &[(&str, &str)]) -> String {
    signed_query_with(method, SignatureMethod::HmacSha256, ACCESS_KEY, SECRET_KEY, params)
}

pub fn signed_query_with(
    method: &str,
    signature_method: SignatureMethod,
    access_key: &str,
    secret_key: &str,
    params: &[(&str, &str)],
) -> String {
    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let method_name = match signature_method {
        SignatureMethod::HmacSha1 => "HmacSHA1",
        SignatureMethod::HmacSha256 => "HmacSHA256",
    };

    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (k, v) in [
        ("AWSAccessKeyId", access_key),
        ("SignatureMethod", method_name),
        ("SignatureVersion", "2"),
        ("Version", "2013-10-15"),
    ] {
        if !pairs.iter().any(|(name, _)| name == k) {
            pairs.push((k.to_string(), v.to_string()));
        }
    }
    if !pairs.iter().any(|(name, _)| name == "Timestamp" || name == "Expires") {
        pairs.push(("Timestamp".to_string(), timestamp));
    }

    let request = Ec2Request::from_pairs(pairs.clone());
    let to_sign = signature::string_to_sign(method, HOST, "/", &request);
    let sig = signature::sign(signature_method, secret_key, &to_sign).unwrap();

    pairs.push(("Signature".to_string(), sig));
    encode_pairs(&pairs)
}

pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Text of the first `<tag>` element in `xml`.
pub fn xml_value(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].to_string())
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// TestClient to encapsulate API interaction logic
pub struct TestClient {
    pub app: Router,
    pub backend: Arc<InMemoryCloudStack>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_backend(test_backend())
    }

    pub fn with_backend(backend: Arc<InMemoryCloudStack>) -> Self {
        let state = AppState::with_transport(test_config(), backend.clone());
        Self {
            app: ec2stack_api::create_app(state),
            backend,
        }
    }

    /// Client whose backend is `transport`; `backend` stays unused.
    pub fn with_transport(transport: Arc<dyn CloudStackTransport>) -> Self {
        let state = AppState::with_transport(test_config(), transport);
        Self {
            app: ec2stack_api::create_app(state),
            backend: test_backend(),
        }
    }

    /// Send a request to the API
    pub async fn send_request(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Signed GET with `params` in the query string
    pub async fn get(&self, params: &[(&str, &str)]) -> Response<Body> {
        let request = Request::builder()
            .method("GET")
            .uri(format!("/?{}", signed_query("GET", params)))
            .header("host", HOST)
            .body(Body::empty())
            .unwrap();
        self.send_request(request).await
    }

    /// Signed form POST with `params` in the body
    pub async fn post_form(&self, params: &[(&str, &str)]) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("host", HOST)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(signed_query("POST", params)))
            .unwrap();
        self.send_request(request).await
    }

    /// Signed GET returning the status and body text
    pub async fn call(&self, params: &[(&str, &str)]) -> (axum::http::StatusCode, String) {
        let response = self.get(params).await;
        let status = response.status();
        (status, body_string(response).await)
    }
}

use crate::error::ApiError;
use crate::signature::{self, SignatureMethod};
use crate::state::AppState;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use ec2stack_cloudstack::{Ec2Error, Ec2Request};
use tracing::debug;

const MAX_BODY_BYTES: usize = 1024 * 1024;

const SIGNATURE_PARAMETERS: &[&str] = &[
    "AWSAccessKeyId",
    "Signature",
    "SignatureMethod",
    "SignatureVersion",
];

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub access_key: String,
}

/// Auth middleware - verifies the EC2 version 2 signature
///
/// Parameters are collected from the query string and, for form posts, the
/// body. The decoded [`Ec2Request`] and the [`AuthenticatedUser`] are handed
/// to the action handler through request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = req.into_parts();
    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| Ec2Error::InvalidParameterValue(format!("Unreadable request body: {e}")))?;

    let request = collect_parameters(&parts, &body);
    let user = authenticate(&state, &parts, &request, Utc::now())?;
    debug!(access_key = %user.access_key, action = ?request.get("Action"), "Request authenticated");

    parts.extensions.insert(request);
    parts.extensions.insert(user);

    Ok(next.run(Request::from_parts(parts, Body::from(body))).await)
}

/// Query string parameters, overridden by form-encoded body parameters.
fn collect_parameters(parts: &Parts, body: &[u8]) -> Ec2Request {
    let query = parts.uri.query().unwrap_or_default();
    let query_pairs = url::form_urlencoded::parse(query.as_bytes());

    let is_form = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    let body_pairs = url::form_urlencoded::parse(if is_form { body } else { &[] });

    Ec2Request::from_pairs(query_pairs.chain(body_pairs))
}

fn authenticate(
    state: &AppState,
    parts: &Parts,
    request: &Ec2Request,
    now: DateTime<Utc>,
) -> Result<AuthenticatedUser, Ec2Error> {
    request.require_parameters(SIGNATURE_PARAMETERS)?;

    let version = request.require("SignatureVersion")?;
    if version != "2" {
        return Err(Ec2Error::AuthFailure(format!(
            "unsupported SignatureVersion {version}"
        )));
    }
    let method = SignatureMethod::parse(request.require("SignatureMethod")?)?;

    let access_key = request.require("AWSAccessKeyId")?;
    let secret_key = state
        .config
        .secret_key(access_key)
        .ok_or_else(|| Ec2Error::AuthFailure(format!("unknown access key {access_key}")))?;

    let window = Duration::try_seconds(state.config.signature_window_secs).ok_or_else(|| {
        Ec2Error::Backend(format!(
            "signature window of {}s is out of range",
            state.config.signature_window_secs
        ))
    })?;
    check_freshness(request, now, window)?;

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();
    let to_sign = signature::string_to_sign(parts.method.as_str(), host, parts.uri.path(), request);
    signature::verify(method, secret_key, &to_sign, request.require("Signature")?)?;

    Ok(AuthenticatedUser {
        access_key: access_key.to_string(),
    })
}

/// A request carries either `Expires` or a `Timestamp` within `window` of `now`.
fn check_freshness(
    request: &Ec2Request,
    now: DateTime<Utc>,
    window: Duration,
) -> Result<(), Ec2Error> {
    if let Some(expires) = request.get("Expires") {
        if parse_timestamp("Expires", expires)? < now {
            return Err(Ec2Error::RequestExpired);
        }
        return Ok(());
    }

    let timestamp = parse_timestamp("Timestamp", request.require("Timestamp")?)?;
    if (now - timestamp).abs() > window {
        return Err(Ec2Error::RequestExpired);
    }
    Ok(())
}

fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, Ec2Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|t| t.and_utc()))
        .map_err(|_| {
            Ec2Error::InvalidParameterValue(format!("Invalid value {value} for parameter {name}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_credentials, Config};
    use axum::http::Request as HttpRequest;

    fn state() -> AppState {
        AppState::new(Config {
            credentials: parse_credentials("AKID:secret"),
            signature_window_secs: 900,
            ..Config::default()
        })
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2014-01-01T00:05:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn parts(uri: &str) -> Parts {
        HttpRequest::builder()
            .method("GET")
            .uri(uri)
            .header("host", "localhost:5000")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn signed(mut params: Vec<(&str, String)>, secret: &str) -> Ec2Request {
        let unsigned = Ec2Request::from_pairs(params.clone());
        let to_sign = signature::string_to_sign("GET", "localhost:5000", "/", &unsigned);
        let sig = signature::sign(SignatureMethod::HmacSha256, secret, &to_sign).unwrap();
        params.push(("Signature", sig));
        Ec2Request::from_pairs(params)
    }

    fn base_params(timestamp: &str) -> Vec<(&'static str, String)> {
        vec![
            ("Action", "DescribeSnapshots".to_string()),
            ("AWSAccessKeyId", "AKID".to_string()),
            ("SignatureMethod", "HmacSHA256".to_string()),
            ("SignatureVersion", "2".to_string()),
            ("Timestamp", timestamp.to_string()),
        ]
    }

    #[test]
    fn test_valid_signature_authenticates() {
        let request = signed(base_params("2014-01-01T00:00:00Z"), "secret");

        let user = authenticate(&state(), &parts("/"), &request, now()).unwrap();

        assert_eq!(user.access_key, "AKID");
    }

    #[test]
    fn test_wrong_secret_does_not_match() {
        let request = signed(base_params("2014-01-01T00:00:00Z"), "wrong");

        let err = authenticate(&state(), &parts("/"), &request, now()).unwrap_err();

        assert!(matches!(err, Ec2Error::SignatureDoesNotMatch));
    }

    #[test]
    fn test_missing_signature_parameter() {
        let request = Ec2Request::from_pairs(base_params("2014-01-01T00:00:00Z"));

        let err = authenticate(&state(), &parts("/"), &request, now()).unwrap_err();

        assert!(matches!(err, Ec2Error::MissingParameter(ref p) if p == "Signature"));
    }

    #[test]
    fn test_unsupported_signature_version() {
        let mut params = base_params("2014-01-01T00:00:00Z");
        params[3].1 = "1".to_string();
        let request = signed(params, "secret");

        let err = authenticate(&state(), &parts("/"), &request, now()).unwrap_err();

        assert!(matches!(err, Ec2Error::AuthFailure(_)));
    }

    #[test]
    fn test_stale_timestamp_expires() {
        let request = signed(base_params("2013-12-31T23:00:00Z"), "secret");

        let err = authenticate(&state(), &parts("/"), &request, now()).unwrap_err();

        assert!(matches!(err, Ec2Error::RequestExpired));
    }

    #[test]
    fn test_out_of_range_window_is_an_error() {
        let state = AppState::new(Config {
            credentials: parse_credentials("AKID:secret"),
            signature_window_secs: i64::MAX,
            ..Config::default()
        });
        let request = signed(base_params("2014-01-01T00:00:00Z"), "secret");

        let err = authenticate(&state, &parts("/"), &request, now()).unwrap_err();

        assert!(matches!(err, Ec2Error::Backend(_)));
    }

    #[test]
    fn test_expires_parameter() {
        let future = Ec2Request::from_pairs([("Expires", "2014-01-01T01:00:00Z")]);
        let past = Ec2Request::from_pairs([("Expires", "2014-01-01T00:00:00Z")]);
        let window = Duration::seconds(900);

        assert!(check_freshness(&future, now(), window).is_ok());
        assert!(matches!(
            check_freshness(&past, now(), window),
            Err(Ec2Error::RequestExpired)
        ));
    }

    #[test]
    fn test_timestamp_without_zone_is_utc() {
        let request = Ec2Request::from_pairs([("Timestamp", "2014-01-01T00:01:00")]);

        assert!(check_freshness(&request, now(), Duration::seconds(900)).is_ok());
    }

    #[test]
    fn test_unparsable_timestamp() {
        let request = Ec2Request::from_pairs([("Timestamp", "yesterday")]);

        let err = check_freshness(&request, now(), Duration::seconds(900)).unwrap_err();

        assert!(matches!(err, Ec2Error::InvalidParameterValue(_)));
    }

    #[test]
    fn test_form_body_overrides_query() {
        let parts = HttpRequest::builder()
            .method("POST")
            .uri("/?Action=DescribeSnapshots&VolumeId=vol-1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let request = collect_parameters(&parts, b"VolumeId=vol-2&Description=a+b");

        assert_eq!(request.get("Action"), Some("DescribeSnapshots"));
        assert_eq!(request.get("VolumeId"), Some("vol-2"));
        assert_eq!(request.get("Description"), Some("a b"));
    }
}

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// EC2 access key id to secret key.
    #[serde(default = "default_credentials")]
    pub credentials: HashMap<String, String>,

    /// Version advertised in response namespaces.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// How old a signed `Timestamp` may be before the request is rejected.
    #[serde(default = "default_signature_window")]
    pub signature_window_secs: i64,

    #[serde(default = "default_job_poll_interval")]
    pub job_poll_interval_ms: u64,

    #[serde(default = "default_job_max_polls")]
    pub job_max_polls: u32,

    /// Volume ids seeded into the in-memory CloudStack.
    #[serde(default = "default_sandbox_volumes")]
    pub sandbox_volumes: Vec<String>,
}

fn default_bind_addr() -> String {
    std::env::var("EC2STACK_BIND").unwrap_or_else(|_| "0.0.0.0:5000".to_string())
}

fn default_credentials() -> HashMap<String, String> {
    std::env::var("EC2STACK_CREDENTIALS")
        .map(|s| parse_credentials(&s))
        .unwrap_or_default()
}

fn default_api_version() -> String {
    std::env::var("EC2STACK_API_VERSION").unwrap_or_else(|_| "2013-10-15".to_string())
}

const MAX_SIGNATURE_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

fn default_signature_window() -> i64 {
    std::env::var("EC2STACK_SIGNATURE_WINDOW")
        .ok()
        .and_then(|s| parse_signature_window(&s))
        .unwrap_or(900) // 15 minutes
}

/// Seconds between 1 and one week; anything else is ignored.
pub fn parse_signature_window(raw: &str) -> Option<i64> {
    raw.trim()
        .parse()
        .ok()
        .filter(|secs| (1..=MAX_SIGNATURE_WINDOW_SECS).contains(secs))
}

fn default_job_poll_interval() -> u64 {
    std::env::var("EC2STACK_JOB_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000)
}

fn default_job_max_polls() -> u32 {
    std::env::var("EC2STACK_JOB_MAX_POLLS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1800)
}

fn default_sandbox_volumes() -> Vec<String> {
    std::env::var("EC2STACK_SANDBOX_VOLUMES")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse `ACCESS:SECRET` pairs separated by commas; malformed entries are skipped.
pub fn parse_credentials(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.trim().split_once(':'))
        .filter(|(access, secret)| !access.is_empty() && !secret.is_empty())
        .map(|(access, secret)| (access.to_string(), secret.to_string()))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            credentials: default_credentials(),
            api_version: default_api_version(),
            signature_window_secs: default_signature_window(),
            job_poll_interval_ms: default_job_poll_interval(),
            job_max_polls: default_job_max_polls(),
            sandbox_volumes: default_sandbox_volumes(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn job_poll_interval(&self) -> Duration {
        Duration::from_millis(self.job_poll_interval_ms)
    }

    pub fn secret_key(&self, access_key: &str) -> Option<&str> {
        self.credentials.get(access_key).map(String::as_str)
    }
}

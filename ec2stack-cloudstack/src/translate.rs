//! Mapping CloudStack error texts onto EC2 errors.
//!
//! CloudStack reports failures as free text, so classification is a substring
//! match. Each operation declares its rules as a table of [`ErrorRule`]s; the
//! first matching rule wins.

use crate::error::Ec2Error;
use crate::result::BackendResult;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct ErrorRule {
    pub substring: &'static str,
    pub error: fn() -> Ec2Error,
}

impl ErrorRule {
    pub const fn new(substring: &'static str, error: fn() -> Ec2Error) -> Self {
        Self { substring, error }
    }
}

/// Classify a backend error text against `rules`.
///
/// Text that no rule recognises becomes `UnclassifiedBackend`.
pub fn classify_error(text: &str, rules: &[ErrorRule]) -> Ec2Error {
    match rules.iter().find(|rule| text.contains(rule.substring)) {
        Some(rule) => (rule.error)(),
        None => {
            warn!(errortext = text, "Unclassified CloudStack error");
            Ec2Error::UnclassifiedBackend(text.to_string())
        }
    }
}

/// `Err` with the classified error when the result carries `errortext`.
pub fn check_backend_error(result: &BackendResult, rules: &[ErrorRule]) -> Result<(), Ec2Error> {
    match result.error_text() {
        Some(text) => Err(classify_error(text, rules)),
        None if result.is_error() => Err(Ec2Error::UnclassifiedBackend(
            "CloudStack returned a non-text errortext".to_string(),
        )),
        None => Ok(()),
    }
}

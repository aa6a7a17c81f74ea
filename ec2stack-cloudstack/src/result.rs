use crate::error::{Ec2Error, Result};
use serde_json::{Map, Value};

/// The inner object of a CloudStack answer.
///
/// Either a failure carrying `errortext`, or a success payload keyed by
/// resource name. `errortext` always wins over any payload next to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendResult(Map<String, Value>);

impl BackendResult {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Ec2Error::Backend(format!(
                "expected a JSON object from CloudStack, got {other}"
            ))),
        }
    }

    /// Strip the single `<command>response` wrapper CloudStack puts around
    /// every answer.
    pub fn from_response(raw: Value) -> Result<Self> {
        let outer = match raw {
            Value::Object(outer) => outer,
            other => {
                return Err(Ec2Error::Backend(format!(
                    "expected a JSON object from CloudStack, got {other}"
                )))
            }
        };
        match outer.into_iter().next() {
            Some((_, inner)) => Self::from_value(inner),
            None => Ok(Self::default()),
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        self.0.get("errortext").and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.0.contains_key("errortext")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn job_id(&self) -> Option<&str> {
        self.0.get("jobid").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

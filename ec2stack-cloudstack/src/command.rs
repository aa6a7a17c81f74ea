use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// A CloudStack API call: the `command` name plus its parameters.
///
/// Built by value and never mutated once handed to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    command: String,
    params: BTreeMap<String, String>,
}

impl BackendCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Flattened `name=value` pairs including `command`, sorted by name.
    pub fn to_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.push(("command", self.command.as_str()));
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}

impl Serialize for BackendCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len() + 1))?;
        map.serialize_entry("command", &self.command)?;
        for (name, value) in &self.params {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

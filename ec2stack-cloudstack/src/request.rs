use crate::error::{Ec2Error, Result};
use std::collections::BTreeMap;

/// Parameters of one incoming EC2 query request.
///
/// Parameter names are case-sensitive, as in the EC2 query protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ec2Request {
    params: BTreeMap<String, String>,
}

impl Ec2Request {
    pub fn new(params: BTreeMap<String, String>) -> Self {
        Self { params }
    }

    /// Build a request from decoded `name=value` pairs.
    ///
    /// A later pair wins over an earlier pair with the same name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a parameter or fail with `MissingParameter`.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Ec2Error::MissingParameter(name.to_string()))
    }

    /// Fail with `MissingParameter` for the first absent name.
    pub fn require_parameters(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }

    pub fn action(&self) -> Result<&str> {
        self.require("Action")
    }

    /// Whether `prefix` or any `prefix.N` parameter is present.
    pub fn contains_parameter_with_prefix(&self, prefix: &str) -> bool {
        self.params.keys().any(|key| matches_prefix(key, prefix))
    }

    /// Values of `prefix` and `prefix.N` parameters.
    ///
    /// The bare name comes first, indexed names follow in numeric index order.
    /// A non-numeric suffix is an `InvalidParameterValue`.
    pub fn indexed_values(&self, prefix: &str) -> Result<Vec<&str>> {
        let mut indexed: Vec<(u32, &str)> = Vec::new();
        for (key, value) in &self.params {
            if !matches_prefix(key, prefix) {
                continue;
            }
            let index = match key.strip_prefix(prefix).and_then(|s| s.strip_prefix('.')) {
                None => 0,
                Some(suffix) => suffix.parse::<u32>().map_err(|_| {
                    Ec2Error::InvalidParameterValue(format!(
                        "Invalid index in parameter name {key}"
                    ))
                })?,
            };
            indexed.push((index, value.as_str()));
        }
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, value)| value).collect())
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

fn matches_prefix(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

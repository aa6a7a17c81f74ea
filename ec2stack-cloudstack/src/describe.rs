use crate::backend::Requester;
use crate::command::BackendCommand;
use crate::error::{Ec2Error, Result};
use crate::request::Ec2Request;
use serde_json::{json, Value};
use tracing::debug;

/// Generic lookup for `Describe*` actions.
///
/// When the request names resources through `id_param` (or `id_param.N`),
/// each one is fetched with an `id` filter and a miss raises `not_found()`.
/// The found items are returned as `{result_key: [...], "count": n}`.
/// Without identifiers the list command runs once and its unwrapped answer
/// is returned unchanged.
pub async fn describe_item(
    requester: &Requester,
    request: &Ec2Request,
    command: BackendCommand,
    result_key: &str,
    not_found: fn() -> Ec2Error,
    id_param: &str,
) -> Result<Value> {
    if !request.contains_parameter_with_prefix(id_param) {
        let result = requester.make_request(&command).await?;
        if let Some(text) = result.error_text() {
            return Err(Ec2Error::UnclassifiedBackend(text.to_string()));
        }
        return Ok(result.into_value());
    }

    let ids = request.indexed_values(id_param)?;
    debug!(command = command.command(), ?ids, "Describing resources by id");

    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        let lookup = command.clone().with_param("id", id);
        let mut result = requester.make_request(&lookup).await?;
        if result.is_error() || result.get("count").is_none() {
            return Err(not_found());
        }
        match result.take(result_key) {
            Some(Value::Array(found)) => items.extend(found),
            _ => return Err(not_found()),
        }
    }

    let count = items.len();
    Ok(json!({
        result_key: items,
        "count": count,
    }))
}

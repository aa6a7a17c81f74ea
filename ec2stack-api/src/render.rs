//! EC2 XML documents rendered from response envelopes.

use ec2stack_cloudstack::{EnvelopeBody, ResponseEnvelope};
use serde_json::Value;
use std::sync::OnceLock;
use tera::{Context as TeraContext, Tera};

/// Shared template engine for EC2 response documents
static RESPONSE_TERA: OnceLock<Tera> = OnceLock::new();

pub(crate) fn get_response_tera() -> &'static Tera {
    RESPONSE_TERA.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("create_snapshot.xml", include_str!("templates/create_snapshot.xml")),
            ("status.xml", include_str!("templates/status.xml")),
            ("snapshots.xml", include_str!("templates/snapshots.xml")),
            ("error.xml", include_str!("templates/error.xml")),
        ])
        .expect("Failed to add response templates");
        tera
    })
}

/// Render a success document for `envelope`.
pub fn render_envelope(
    envelope: &ResponseEnvelope,
    api_version: &str,
    request_id: &str,
) -> tera::Result<String> {
    let mut context = TeraContext::new();
    context.insert("response_type", envelope.response_type);
    context.insert("api_version", api_version);
    context.insert("request_id", request_id);
    match &envelope.body {
        EnvelopeBody::Response(response) => {
            context.insert("response", response);
            if let Some(key) = collection_key(envelope.template_name_or_list) {
                context.insert("items", &collection_items(response, key));
            }
        }
        EnvelopeBody::Return(status) => context.insert("return", status),
    }

    get_response_tera().render(envelope.template_name_or_list, &context)
}

/// Key of the repeated element in list templates.
fn collection_key(template: &str) -> Option<&'static str> {
    match template {
        "snapshots.xml" => Some("snapshot"),
        _ => None,
    }
}

/// CloudStack may answer with a single object where a list is expected.
fn collection_items<'a>(response: &'a Value, key: &str) -> Vec<&'a Value> {
    match response.get(key) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

/// Render an EC2 error document.
pub fn render_error(code: &str, message: &str, request_id: &str) -> tera::Result<String> {
    let mut context = TeraContext::new();
    context.insert("code", code);
    context.insert("message", message);
    context.insert("request_id", request_id);

    get_response_tera().render("error.xml", &context)
}

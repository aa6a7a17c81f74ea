use serde::Serialize;
use serde_json::Value;

/// What the EC2 renderer needs to produce a response document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub template_name_or_list: &'static str,
    pub response_type: &'static str,
    #[serde(flatten)]
    pub body: EnvelopeBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeBody {
    /// Payload substituted into the template.
    Response(Value),
    /// Literal status, e.g. `"true"` for deletes.
    Return(&'static str),
}

impl ResponseEnvelope {
    pub fn with_response(
        template_name_or_list: &'static str,
        response_type: &'static str,
        response: Value,
    ) -> Self {
        Self {
            template_name_or_list,
            response_type,
            body: EnvelopeBody::Response(response),
        }
    }

    pub fn with_return(
        template_name_or_list: &'static str,
        response_type: &'static str,
        status: &'static str,
    ) -> Self {
        Self {
            template_name_or_list,
            response_type,
            body: EnvelopeBody::Return(status),
        }
    }

    pub fn response(&self) -> Option<&Value> {
        match &self.body {
            EnvelopeBody::Response(value) => Some(value),
            EnvelopeBody::Return(_) => None,
        }
    }
}

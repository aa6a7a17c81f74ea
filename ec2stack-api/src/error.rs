use crate::render::render_error;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use ec2stack_cloudstack::Ec2Error;
use tracing::{error, warn};
use uuid::Uuid;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ec2(#[from] Ec2Error),

    #[error("Template error: {0}")]
    Render(#[from] tera::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ec2(Ec2Error::AuthFailure(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Ec2(Ec2Error::SignatureDoesNotMatch) => StatusCode::FORBIDDEN,
            ApiError::Ec2(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Ec2(_) | ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Ec2(err) => err.code(),
            ApiError::Render(_) => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = Uuid::new_v4().to_string();

        if status.is_server_error() {
            error!(%request_id, code = self.code(), "Request failed: {}", self);
        } else {
            warn!(%request_id, code = self.code(), "Request rejected: {}", self);
        }

        match render_error(self.code(), &self.to_string(), &request_id) {
            Ok(body) => (status, [(header::CONTENT_TYPE, "text/xml")], body).into_response(),
            Err(e) => {
                error!("Failed to render error document: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_error_kind() {
        let cases = [
            (Ec2Error::MissingParameter("VolumeId".into()), StatusCode::BAD_REQUEST),
            (Ec2Error::InvalidVolumeId, StatusCode::BAD_REQUEST),
            (Ec2Error::InvalidSnapshotId, StatusCode::BAD_REQUEST),
            (Ec2Error::InvalidAction("Nope".into()), StatusCode::BAD_REQUEST),
            (Ec2Error::AuthFailure("unknown key".into()), StatusCode::UNAUTHORIZED),
            (Ec2Error::SignatureDoesNotMatch, StatusCode::FORBIDDEN),
            (Ec2Error::RequestExpired, StatusCode::BAD_REQUEST),
            (
                Ec2Error::UnclassifiedBackend("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Ec2Error>;

/// Failures surfaced to EC2 callers.
///
/// Every variant maps to exactly one EC2 error code, see [`Ec2Error::code`].
#[derive(Error, Debug)]
pub enum Ec2Error {
    #[error("The request must contain the parameter {0}")]
    MissingParameter(String),

    #[error("{0}")]
    InvalidParameterValue(String),

    #[error("The action {0} is not valid for this web service.")]
    InvalidAction(String),

    #[error("The specified volume does not exist.")]
    InvalidVolumeId,

    #[error("The specified snapshot does not exist.")]
    InvalidSnapshotId,

    #[error("AWS was not able to validate the provided access credentials: {0}")]
    AuthFailure(String),

    #[error("The request signature we calculated does not match the signature you provided.")]
    SignatureDoesNotMatch,

    #[error("Request has expired.")]
    RequestExpired,

    /// Backend error text that no translation rule recognised.
    #[error("CloudStack error: {0}")]
    UnclassifiedBackend(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Ec2Error {
    pub fn code(&self) -> &'static str {
        match self {
            Ec2Error::MissingParameter(_) => "MissingParameter",
            Ec2Error::InvalidParameterValue(_) => "InvalidParameterValue",
            Ec2Error::InvalidAction(_) => "InvalidAction",
            Ec2Error::InvalidVolumeId => "InvalidVolume.NotFound",
            Ec2Error::InvalidSnapshotId => "InvalidSnapshot.NotFound",
            Ec2Error::AuthFailure(_) => "AuthFailure",
            Ec2Error::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Ec2Error::RequestExpired => "RequestExpired",
            Ec2Error::UnclassifiedBackend(_)
            | Ec2Error::Backend(_)
            | Ec2Error::Serialization(_) => "InternalError",
        }
    }

    /// Whether the caller is at fault, as opposed to the shim or the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Ec2Error::UnclassifiedBackend(_) | Ec2Error::Backend(_) | Ec2Error::Serialization(_)
        )
    }

    /// Constructor for the not-found handler of snapshot lookups.
    pub fn invalid_snapshot_id() -> Self {
        Ec2Error::InvalidSnapshotId
    }

    /// Constructor for the not-found handler of volume lookups.
    pub fn invalid_volume_id() -> Self {
        Ec2Error::InvalidVolumeId
    }
}

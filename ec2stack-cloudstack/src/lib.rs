//! EC2 to CloudStack translation
//!
//! This crate turns EC2 query requests into CloudStack commands and turns
//! CloudStack answers back into EC2 response envelopes. It is consumed by the
//! ec2stack-api HTTP service; the transport to CloudStack is pluggable through
//! [`CloudStackTransport`].

pub mod backend;
pub mod command;
pub mod describe;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod request;
pub mod result;
pub mod snapshots;
pub mod translate;

pub use backend::{CloudStackTransport, Requester, RequesterConfig};
pub use command::BackendCommand;
pub use envelope::{EnvelopeBody, ResponseEnvelope};
pub use error::{Ec2Error, Result};
pub use memory::InMemoryCloudStack;
pub use request::Ec2Request;
pub use result::BackendResult;

//! EC2 snapshot actions on top of CloudStack volume snapshots.
//!
//! Every action runs the same pipeline: check required parameters, build the
//! CloudStack command, invoke it, translate the answer into an envelope.

use crate::backend::Requester;
use crate::command::BackendCommand;
use crate::describe::describe_item;
use crate::envelope::ResponseEnvelope;
use crate::error::{Ec2Error, Result};
use crate::request::Ec2Request;
use crate::result::BackendResult;
use crate::translate::{check_backend_error, ErrorRule};
use serde_json::Value;
use tracing::info;

pub const CREATE_SNAPSHOT_ERRORS: &[ErrorRule] = &[ErrorRule::new(
    "Invalid parameter volumeid",
    Ec2Error::invalid_volume_id,
)];

pub const DELETE_SNAPSHOT_ERRORS: &[ErrorRule] = &[ErrorRule::new(
    "Invalid parameter id",
    Ec2Error::invalid_snapshot_id,
)];

const CREATE_SNAPSHOT_REQUIRED: &[&str] = &["VolumeId"];
const DELETE_SNAPSHOT_REQUIRED: &[&str] = &["SnapshotId"];

// Command builders

pub fn create_snapshot_command(volume_id: &str) -> BackendCommand {
    BackendCommand::new("createSnapshot").with_param("volumeid", volume_id)
}

pub fn delete_snapshot_command(snapshot_id: &str) -> BackendCommand {
    BackendCommand::new("deleteSnapshot").with_param("id", snapshot_id)
}

pub fn describe_snapshots_command() -> BackendCommand {
    BackendCommand::new("listSnapshots")
}

// Translators

pub fn create_snapshot_response(mut result: BackendResult) -> Result<ResponseEnvelope> {
    check_backend_error(&result, CREATE_SNAPSHOT_ERRORS)?;

    let snapshot = result.take("snapshot").ok_or_else(|| {
        Ec2Error::UnclassifiedBackend("createSnapshot result has no snapshot".to_string())
    })?;
    Ok(ResponseEnvelope::with_response(
        "create_snapshot.xml",
        "CreateSnapshotResponse",
        snapshot,
    ))
}

pub fn delete_snapshot_response(result: BackendResult) -> Result<ResponseEnvelope> {
    check_backend_error(&result, DELETE_SNAPSHOT_ERRORS)?;

    Ok(ResponseEnvelope::with_return(
        "status.xml",
        "DeleteSnapshotResponse",
        "true",
    ))
}

pub fn describe_snapshots_response(payload: Value) -> ResponseEnvelope {
    ResponseEnvelope::with_response("snapshots.xml", "DescribeSnapshotsResponse", payload)
}

// Actions

pub async fn create_snapshot(
    requester: &Requester,
    request: &Ec2Request,
) -> Result<ResponseEnvelope> {
    request.require_parameters(CREATE_SNAPSHOT_REQUIRED)?;
    let volume_id = request.require("VolumeId")?;

    let result = requester
        .make_request_async(&create_snapshot_command(volume_id))
        .await?;
    let envelope = create_snapshot_response(result)?;

    info!(volume_id, "Snapshot created");
    Ok(envelope)
}

pub async fn delete_snapshot(
    requester: &Requester,
    request: &Ec2Request,
) -> Result<ResponseEnvelope> {
    request.require_parameters(DELETE_SNAPSHOT_REQUIRED)?;
    let snapshot_id = request.require("SnapshotId")?;

    let result = requester
        .make_request_async(&delete_snapshot_command(snapshot_id))
        .await?;
    let envelope = delete_snapshot_response(result)?;

    info!(snapshot_id, "Snapshot deleted");
    Ok(envelope)
}

pub async fn describe_snapshots(
    requester: &Requester,
    request: &Ec2Request,
) -> Result<ResponseEnvelope> {
    let payload = describe_item(
        requester,
        request,
        describe_snapshots_command(),
        "snapshot",
        Ec2Error::invalid_snapshot_id,
        "SnapshotId",
    )
    .await?;

    Ok(describe_snapshots_response(payload))
}

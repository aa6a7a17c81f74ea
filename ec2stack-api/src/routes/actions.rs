use crate::{
    auth::AuthenticatedUser,
    error::ApiResult,
    render::render_envelope,
    state::AppState,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use ec2stack_cloudstack::{snapshots, Ec2Error, Ec2Request, ResponseEnvelope};
use tracing::info;
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(dispatch).post(dispatch))
}

async fn dispatch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Extension(request): Extension<Ec2Request>,
) -> ApiResult<Response> {
    let action = request.action()?;
    info!(access_key = %user.access_key, action, "Handling EC2 action");

    let envelope = execute(&state, action, &request).await?;

    let request_id = Uuid::new_v4().to_string();
    let body = render_envelope(&envelope, &state.config.api_version, &request_id)?;

    Ok(([(header::CONTENT_TYPE, "text/xml")], body).into_response())
}

async fn execute(
    state: &AppState,
    action: &str,
    request: &Ec2Request,
) -> Result<ResponseEnvelope, Ec2Error> {
    let requester = &state.requester;
    match action {
        "CreateSnapshot" => snapshots::create_snapshot(requester, request).await,
        "DeleteSnapshot" => snapshots::delete_snapshot(requester, request).await,
        "DescribeSnapshots" => snapshots::describe_snapshots(requester, request).await,
        other => Err(Ec2Error::InvalidAction(other.to_string())),
    }
}

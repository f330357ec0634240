use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::common::GroupId;
use crate::domains::hotels::{DispatchError, PollResponse, SearchQuery};
use crate::kernel::jobs::GroupStatus;
use crate::server::app::AppState;
use crate::server::middleware::Actor;

/// Submit a search. Responds as soon as the crawl jobs are queued.
pub async fn submit_search_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Json(query) = match payload {
        Ok(query) => query,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
        }
    };

    match state.dispatcher.dispatch(query).await {
        Ok(group_id) => (StatusCode::ACCEPTED, Json(json!({ "group_id": group_id }))),
        Err(e) => {
            warn!(error = %e, "search rejected");
            let status = match e {
                DispatchError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// Poll a search group. Always answers with a full poll body.
pub async fn search_status_handler(
    Extension(state): Extension<AppState>,
    actor: Option<Extension<Actor>>,
    Path(group_id): Path<String>,
) -> (StatusCode, Json<PollResponse>) {
    let group_id = match GroupId::parse(&group_id) {
        Ok(group_id) => group_id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PollResponse {
                    status: GroupStatus::Failure,
                    hotels: Vec::new(),
                    error: Some(format!("invalid search group id '{}'", group_id)),
                }),
            )
        }
    };

    let actor = actor.map(|Extension(Actor(actor))| actor);
    let response = state.poller.poll(group_id, actor.as_ref()).await;
    (StatusCode::OK, Json(response))
}

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::common::GroupId;
use crate::server::app::AppState;

/// Most results the listing page returns.
pub const RECENT_RESULTS_LIMIT: i64 = 100;

/// Newest stored hotels across all searches.
pub async fn recent_results_handler(Extension(state): Extension<AppState>) -> Response {
    match state.store.list_recent(RECENT_RESULTS_LIMIT).await {
        Ok(hotels) => Json(hotels).into_response(),
        Err(e) => {
            error!(error = %e, "failed to list results");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Stored hotels last tagged with one search group.
pub async fn group_results_handler(
    Extension(state): Extension<AppState>,
    Path(group_id): Path<String>,
) -> Response {
    let Ok(group_id) = GroupId::parse(&group_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid search group id '{}'", group_id) })),
        )
            .into_response();
    };

    match state.store.find_by_group(group_id).await {
        Ok(hotels) => Json(hotels).into_response(),
        Err(e) => {
            error!(group_id = %group_id, error = %e, "failed to load group results");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

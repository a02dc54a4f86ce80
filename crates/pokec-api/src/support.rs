use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use pokec_types::api::{Claims, UpgradeRequest};

use crate::error::ApiError;
use crate::{AppState, run_engine};

/// File a tier-upgrade ticket. Resolution happens out of band; the engine
/// records it and surfaces a system announcement.
pub async fn request_upgrade(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpgradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let ticket =
        run_engine(move || engine.request_upgrade(&claims.sub, &req.requested_tier)).await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

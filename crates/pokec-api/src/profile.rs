use axum::{Extension, Json, extract::State, response::IntoResponse};

use pokec_engine::ProfileUpdate;
use pokec_types::api::{Claims, UpdateProfileRequest};

use crate::error::ApiError;
use crate::{AppState, run_engine};

/// Self-service profile update: only the fields present in the request
/// change, everything else is left alone.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let user = run_engine(move || {
        engine.update_profile(
            &claims.sub,
            ProfileUpdate {
                bio: req.bio,
                status: req.status,
                avatar: req.avatar,
            },
        )
    })
    .await?;

    Ok(Json(user))
}

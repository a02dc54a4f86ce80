use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use pokec_engine::{ClearScope, ModAction};
use pokec_types::api::{Claims, ClearRoomRequest};
use pokec_types::events::GatewayEvent;

use crate::error::ApiError;
use crate::{AppState, run_engine};

/// All handlers here re-resolve the actor's admin flag inside the engine on
/// every call; nothing is trusted from the token.
pub async fn ban_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    moderate(&state, claims, ModAction::Ban { target: email }).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mute_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    moderate(&state, claims, ModAction::Mute { target: email }).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unmute_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    moderate(&state, claims, ModAction::Unmute { target: email }).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn grant_vip(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    moderate(&state, claims, ModAction::GrantVip { target: email }).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    moderate(&state, claims, ModAction::DeleteMessage { id }).await?;

    state.dispatcher.broadcast(GatewayEvent::MessageDelete { id });
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_room(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ClearRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // What actually got cleared depends on the configured scope.
    let cleared = match state.engine.policy().clear_scope {
        ClearScope::Global => None,
        ClearScope::Room => req.room.clone(),
    };

    moderate(&state, claims, ModAction::ClearRoom { room: req.room }).await?;

    state
        .dispatcher
        .broadcast(GatewayEvent::RoomCleared { room: cleared });
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let users = run_engine(move || engine.list_users(&claims.sub)).await?;
    Ok(Json(users))
}

async fn moderate(state: &AppState, claims: Claims, action: ModAction) -> Result<(), ApiError> {
    let engine = state.engine.clone();
    run_engine(move || engine.moderate(&claims.sub, action)).await
}

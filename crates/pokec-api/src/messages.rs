use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use pokec_engine::NewPost;
use pokec_types::api::{Claims, SendMessageRequest};
use pokec_types::events::GatewayEvent;

use crate::error::ApiError;
use crate::{AppState, run_engine};

/// Room history: the newest page, oldest-first. Reads are open to any
/// authenticated caller except the DM pseudo-room, which the engine filters
/// to the requester's own conversations.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let messages = run_engine(move || engine.room_history(&claims.sub, &room)).await?;

    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let message = run_engine(move || {
        engine.post(NewPost {
            sender_email: claims.sub,
            room,
            recipient_email: req.recipient_email,
            text: req.text,
            image_url: req.image_url,
            announcement: req.announcement,
            client_key: req.client_key,
        })
    })
    .await?;

    // Real-time delivery; the gateway filters DMs per connection.
    state.dispatcher.broadcast(GatewayEvent::MessageCreate {
        message: message.clone(),
    });

    Ok((StatusCode::CREATED, Json(message)))
}

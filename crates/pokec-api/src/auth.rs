use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use pokec_types::api::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

use crate::error::ApiError;
use crate::{AppState, run_engine};

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let user =
        run_engine(move || engine.register(&req.email, &req.username, &req.password)).await?;

    let token = create_token(&state.jwt_secret, &user.email, &user.username)
        .map_err(pokec_engine::EngineError::Persistence)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.clone();
    let user = run_engine(move || engine.login(&req.email, &req.password)).await?;

    let token = create_token(&state.jwt_secret, &user.email, &user.username)
        .map_err(pokec_engine::EngineError::Persistence)?;

    Ok(Json(LoginResponse { token, user }))
}

fn create_token(secret: &str, email: &str, username: &str) -> anyhow::Result<String> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = Claims {
        sub: email.to_string(),
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::{CurrentSession, MaybeToken, SessionUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub token: Uuid,
    pub user: SessionUser,
    pub label: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    /// False means the client should show the setup notice instead of any domain UI.
    pub configured: bool,
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_in_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    MaybeToken(token): MaybeToken,
) -> Result<Json<SessionStatusResponse>, AppError> {
    let signed_out = SessionStatusResponse {
        configured: state.sessions.is_configured(),
        signed_in: false,
        user: None,
        label: None,
        signed_in_at: None,
    };

    let Some(token) = token.filter(|_| state.sessions.is_configured()) else {
        return Ok(Json(signed_out));
    };

    match state.sessions.resolve(token).await {
        Ok(session) => {
            let user = session.user().clone();
            Ok(Json(SessionStatusResponse {
                configured: true,
                signed_in: true,
                label: Some(user.label().to_string()),
                signed_in_at: Some(session.signed_in_at()),
                user: Some(user),
            }))
        }
        Err(AppError::Unauthorized) => Ok(Json(signed_out)),
        Err(e) => Err(e),
    }
}

/// POST /api/v1/session
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    state.sessions.ensure_configured()?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let (token, user) = state.sessions.sign_in(req.email.trim(), &req.password).await?;
    Ok(Json(SignInResponse {
        token,
        label: user.label().to_string(),
        user,
    }))
}

/// DELETE /api/v1/session
pub async fn handle_sign_out(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<StatusCode, AppError> {
    state.sessions.sign_out(current.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

fn presence_event(user: Option<SessionUser>) -> Option<Event> {
    let payload = PresenceEvent {
        signed_in: user.is_some(),
        user,
    };
    match Event::default().event("presence").json_data(&payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to encode presence event: {e}");
            None
        }
    }
}

/// GET /api/v1/session/events
///
/// Server-sent presence notifications: the current state first, then every change.
/// The stream ends after the signed-out event.
pub async fn handle_session_events(
    current: CurrentSession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let mut presence = current.session.observe();
    let initial = presence.borrow_and_update().clone();

    let stream = stream! {
        let mut user = initial;
        loop {
            let signed_in = user.is_some();
            if let Some(event) = presence_event(user) {
                yield Ok(event);
            }
            if !signed_in || presence.changed().await.is_err() {
                break;
            }
            user = presence.borrow_and_update().clone();
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::domains::{Domain, Profile};
use crate::errors::AppError;
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::workspace::{CommandOutcome, DomainView, Overview};

#[derive(Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

#[derive(Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}

/// GET /api/v1/domains
pub async fn handle_list_domains(current: CurrentSession) -> Json<Overview> {
    let overview = current.session.workspace().await.overview();
    Json(overview)
}

/// POST /api/v1/command
pub async fn handle_command(
    current: CurrentSession,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandOutcome>, AppError> {
    if req.command.trim().is_empty() {
        return Err(AppError::Validation("Command must not be empty".to_string()));
    }
    let outcome = current.session.workspace().await.command(req.command.trim());
    Ok(Json(outcome))
}

/// GET /api/v1/domains/:domain
pub async fn handle_select_domain(
    current: CurrentSession,
    Path(domain): Path<String>,
) -> Result<Json<DomainView>, AppError> {
    let domain: Domain = domain.parse()?;
    let view = current.session.workspace().await.select(domain);
    Ok(Json(view))
}

/// PATCH /api/v1/domains/:domain/profile
pub async fn handle_update_field(
    current: CurrentSession,
    Path(domain): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<DomainView>, AppError> {
    let domain: Domain = domain.parse()?;
    let view = current
        .session
        .workspace()
        .await
        .set_field(domain, &update.field, &update.value)?;
    Ok(Json(view))
}

/// POST /api/v1/domains/:domain/generate
/// An optional JSON body carrying a complete profile replaces the draft before submitting.
pub async fn handle_generate(
    State(state): State<AppState>,
    current: CurrentSession,
    Path(domain): Path<String>,
    body: Bytes,
) -> Result<Json<DomainView>, AppError> {
    let domain: Domain = domain.parse()?;

    let replacement = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?;
        Some(Profile::from_value(domain, value)?)
    };

    let view = current
        .session
        .generate(state.llm.clone(), domain, replacement)
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/domains/:domain/reset
pub async fn handle_reset(
    current: CurrentSession,
    Path(domain): Path<String>,
) -> Result<Json<DomainView>, AppError> {
    let domain: Domain = domain.parse()?;
    let view = current.session.workspace().await.reset(domain)?;
    Ok(Json(view))
}

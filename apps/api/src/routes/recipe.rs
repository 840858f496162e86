use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::session::CurrentSession;
use crate::state::AppState;
use crate::workspace::{MealRef, RecipeView};

/// POST /api/v1/recipe
pub async fn handle_open_recipe(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(key): Json<MealRef>,
) -> Result<Json<RecipeView>, AppError> {
    let view = current
        .session
        .open_recipe(state.llm.clone(), key)
        .await?;
    Ok(Json(view))
}

/// GET /api/v1/recipe
pub async fn handle_get_recipe(current: CurrentSession) -> Result<Json<RecipeView>, AppError> {
    let view = current.session.workspace().await.recipe_view();
    view.map(Json)
        .ok_or_else(|| AppError::NotFound("No recipe is open".to_string()))
}

/// DELETE /api/v1/recipe
pub async fn handle_close_recipe(current: CurrentSession) -> StatusCode {
    current.session.workspace().await.close_recipe();
    StatusCode::NO_CONTENT
}

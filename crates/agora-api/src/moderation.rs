use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use agora_types::Id;
use agora_types::api::{CreateCategoryRequest, WordRequest};

use crate::error::AppError;
use crate::state::{AppState, blocking};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CheckTextResponse {
    pub censored: Vec<String>,
}

// -- Censored word lists --

pub async fn create_list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let list = blocking(&state, |s| s.word_lists.create()).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn get_list(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let list = blocking(&state, move |s| s.word_lists.get_list(id)).await?;
    Ok(Json(list))
}

pub async fn delete_list(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    blocking(&state, move |s| s.word_lists.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_word(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<WordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let list = blocking(&state, move |s| s.word_lists.add_word(id, &req.word)).await?;
    Ok(Json(list))
}

pub async fn delete_word(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<WordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let list = blocking(&state, move |s| s.word_lists.delete_word(id, &req.word)).await?;
    Ok(Json(list))
}

pub async fn check_text(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Json(req): Json<CheckTextRequest>,
) -> Result<impl IntoResponse, AppError> {
    let censored = blocking(&state, move |s| s.word_lists.find_censored(id, &req.text)).await?;
    Ok(Json(CheckTextResponse { censored }))
}

// -- Categories --

pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category =
        blocking(&state, move |s| s.categories.create_category(&req.label, req.items)).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let category = blocking(&state, move |s| s.categories.get_category(id)).await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    blocking(&state, move |s| s.categories.delete_category(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_element(
    State(state): State<AppState>,
    Path((id, item)): Path<(Id, Id)>,
) -> Result<impl IntoResponse, AppError> {
    let category = blocking(&state, move |s| s.categories.add_element(id, item)).await?;
    Ok(Json(category))
}

pub async fn delete_element(
    State(state): State<AppState>,
    Path((id, item)): Path<(Id, Id)>,
) -> Result<impl IntoResponse, AppError> {
    let category = blocking(&state, move |s| s.categories.delete_element(id, item)).await?;
    Ok(Json(category))
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use agora_types::UserId;

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::{AppState, blocking};

pub async fn get_friends(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let friends = blocking(&state, move |s| s.friends.get_friends(user)).await?;
    Ok(Json(friends))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path(friend): Path<UserId>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    blocking(&state, move |s| s.friends.remove_friend(user, friend)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_requests(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let requests = blocking(&state, move |s| s.friends.get_requests(user)).await?;
    Ok(Json(requests))
}

pub async fn send_request(
    State(state): State<AppState>,
    Path(to): Path<UserId>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let request = blocking(&state, move |s| s.friends.send_request(user, to)).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// The caller withdraws a request they sent.
pub async fn remove_request(
    State(state): State<AppState>,
    Path(to): Path<UserId>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    blocking(&state, move |s| s.friends.remove_request(user, to)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn accept_request(
    State(state): State<AppState>,
    Path(from): Path<UserId>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let request = blocking(&state, move |s| s.friends.accept_request(from, user)).await?;
    Ok(Json(request))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(from): Path<UserId>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    blocking(&state, move |s| s.friends.reject_request(from, user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

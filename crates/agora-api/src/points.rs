use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use agora_concepts::InitialPoints;
use agora_types::api::{InitializePointsRequest, TransferPointsRequest};
use agora_types::{ConceptError, UserId};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::{AppState, blocking};

pub async fn initialize_points(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
    Json(req): Json<InitializePointsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let defaults = InitialPoints::default();
    let initial = InitialPoints {
        balance: req.balance.unwrap_or(defaults.balance),
        streak: req.streak.unwrap_or(defaults.streak),
    };

    let account = blocking(&state, move |s| s.points.initialize_points(user, initial)).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_points(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let account = blocking(&state, move |s| s.points.get_points(user)).await?;
    Ok(Json(account))
}

/// Positive amounts credit the caller, negative amounts debit them.
pub async fn update_points(
    State(state): State<AppState>,
    Path(amount): Path<i64>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let account = blocking(&state, move |s| {
        if amount >= 0 {
            return s.points.add_points(user, amount);
        }
        let debit = amount
            .checked_neg()
            .ok_or_else(|| ConceptError::invalid("Amount out of range"))?;
        s.points.sub_points(user, debit)
    })
    .await?;

    Ok(Json(account))
}

pub async fn send_points(
    State(state): State<AppState>,
    Path(to): Path<UserId>,
    Extension(Caller(user)): Extension<Caller>,
    Json(req): Json<TransferPointsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = blocking(&state, move |s| s.points.send_points(user, to, req.amount)).await?;
    Ok(Json(transfer))
}

/// Called on login: extends or resets the caller's streak.
pub async fn refresh_streak(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let now = chrono::Utc::now();
    let account = blocking(&state, move |s| s.points.refresh_streak(user, now)).await?;
    Ok(Json(account))
}

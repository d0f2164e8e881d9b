use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use agora_concepts::NewVote;
use agora_types::Id;
use agora_types::api::{CreateVoteRequest, VoteQuery};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::{AppState, blocking};

pub async fn create_vote(
    State(state): State<AppState>,
    Json(req): Json<CreateVoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = chrono::Utc::now();
    let new = NewVote {
        scope: req.scope,
        title: req.title,
        reason: req.reason,
        vote_type: req.vote_type,
        electorate: req.electorate.into_iter().collect(),
        start_time: req.start_time,
        end_time: req.end_time,
    };

    let vote = blocking(&state, move |s| s.votes.create_vote(new, now)).await?;
    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn get_all_votes(
    State(state): State<AppState>,
    Query(query): Query<VoteQuery>,
) -> Result<impl IntoResponse, AppError> {
    let votes = blocking(&state, move |s| s.votes.get_all_votes(query.scope)).await?;
    Ok(Json(votes))
}

pub async fn get_vote(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let vote = blocking(&state, move |s| s.votes.get_vote(id)).await?;
    Ok(Json(vote))
}

pub async fn vote_yes(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let vote = blocking(&state, move |s| s.votes.vote_yes(id, user)).await?;
    Ok(Json(vote))
}

/// Resolves the vote if it is due. Approved and expired votes are deleted
/// as part of this call.
pub async fn check_vote(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let now = chrono::Utc::now();
    let outcome = blocking(&state, move |s| s.votes.check_vote(id, now)).await?;
    Ok(Json(outcome))
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use agora_concepts::Invited;
use agora_types::api::{ChangePrivacyRequest, CreateGroupRequest, InviteResponse};
use agora_types::{Id, UserId};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::{AppState, blocking};

/// Creates the group's word list first, then the group pointing at it. If
/// the group cannot be created the fresh list is removed again.
pub async fn create_group(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = blocking(&state, move |s| {
        let list = s.word_lists.create()?;
        match s.groups.create_group(user, req.private, list.id) {
            Ok(group) => Ok(group),
            Err(e) => {
                if let Err(cleanup) = s.word_lists.delete(list.id) {
                    warn!("Orphaned word list {}: {}", list.id, cleanup);
                }
                Err(e)
            }
        }
    })
    .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_all_groups(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let groups = blocking(&state, |s| s.groups.get_all_groups()).await?;
    Ok(Json(groups))
}

/// Groups the caller lives in.
pub async fn get_user_groups(
    State(state): State<AppState>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let groups = blocking(&state, move |s| s.groups.get_groups_by_resident(user)).await?;
    Ok(Json(groups))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, AppError> {
    let group = blocking(&state, move |s| s.groups.get_group(id)).await?;
    Ok(Json(group))
}

/// Deletes the group, then its word list. A list that is already gone is
/// only logged: the group itself is what the caller asked to remove.
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    blocking(&state, move |s| {
        let group = s.groups.delete_group(id, user)?;
        if let Err(e) = s.word_lists.delete(group.censored_word_list) {
            warn!("Word list of deleted group {} not removed: {}", id, e);
        }
        Ok(())
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn invite(
    State(state): State<AppState>,
    Path((id, invitee)): Path<(Id, UserId)>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let invited = blocking(&state, move |s| s.groups.invite(id, user, invitee)).await?;
    Ok(Json(InviteResponse {
        added: invited == Invited::Added,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path((id, resident)): Path<(Id, UserId)>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let group = blocking(&state, move |s| s.groups.delete_user(id, user, resident)).await?;
    Ok(Json(group))
}

pub async fn give_ownership(
    State(state): State<AppState>,
    Path((id, new_owner)): Path<(Id, UserId)>,
    Extension(Caller(user)): Extension<Caller>,
) -> Result<impl IntoResponse, AppError> {
    let group = blocking(&state, move |s| s.groups.give_ownership(id, user, new_owner)).await?;
    Ok(Json(group))
}

pub async fn change_privacy(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    Extension(Caller(user)): Extension<Caller>,
    Json(req): Json<ChangePrivacyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let group = blocking(&state, move |s| s.groups.change_privacy(id, user, req.private)).await?;
    Ok(Json(group))
}

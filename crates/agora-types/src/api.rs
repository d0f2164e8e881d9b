use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{Id, UserId};
use crate::models::VoteType;

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePrivacyRequest {
    pub private: bool,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub added: bool,
}

// -- Points --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitializePointsRequest {
    pub balance: Option<i64>,
    pub streak: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferPointsRequest {
    pub amount: i64,
}

// -- Moderation --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WordRequest {
    pub word: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub label: String,
    #[serde(default)]
    pub items: Vec<Id>,
}

// -- Votes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateVoteRequest {
    pub scope: Id,
    pub title: String,
    #[serde(default)]
    pub reason: String,
    pub electorate: Vec<UserId>,
    pub vote_type: VoteType,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VoteQuery {
    pub scope: Id,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

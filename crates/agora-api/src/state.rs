use std::sync::Arc;

use agora_concepts::{
    CategoryConcept, CensoredWordListConcept, FriendConcept, GroupConcept, PointsConcept,
    VoteConcept,
};
use agora_db::Database;
use tracing::error;

use crate::error::AppError;

pub type AppState = Arc<AppStateInner>;

/// Every concept, built once at startup over the same database.
pub struct AppStateInner {
    pub friends: FriendConcept,
    pub groups: GroupConcept,
    pub points: PointsConcept,
    pub votes: VoteConcept,
    pub categories: CategoryConcept,
    pub word_lists: CensoredWordListConcept,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            friends: FriendConcept::new(db.clone()),
            groups: GroupConcept::new(db.clone()),
            points: PointsConcept::new(db.clone()),
            votes: VoteConcept::new(db.clone()),
            categories: CategoryConcept::new(db.clone()),
            word_lists: CensoredWordListConcept::new(db),
        }
    }
}

/// Run blocking concept work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&AppStateInner) -> agora_types::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::Internal
        })?
        .map_err(AppError::from)
}

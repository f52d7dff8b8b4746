//! Poll repository.

use std::sync::Arc;

use crate::entities::{Poll, poll};
use ballotbox_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Poll repository for database operations.
#[derive(Clone)]
pub struct PollRepository {
    db: Arc<DatabaseConnection>,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll::Model>> {
        Poll::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a poll by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PollNotFound(id.to_string()))
    }

    /// Create a new poll.
    pub async fn create(&self, model: poll::ActiveModel) -> AppResult<poll::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List polls that have not been soft-deleted, oldest first.
    ///
    /// Expiration is not considered here; callers classify rows against
    /// their own query time.
    pub async fn find_not_deleted(&self) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::IsDeleted.eq(false))
            .order_by_asc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List polls created by a user, newest first. Soft-deleted polls are
    /// excluded.
    pub async fn find_by_creator(&self, user_id: &str) -> AppResult<Vec<poll::Model>> {
        Poll::find()
            .filter(poll::Column::UserId.eq(user_id))
            .filter(poll::Column::IsDeleted.eq(false))
            .order_by_desc(poll::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a poll as soft-deleted.
    ///
    /// Only this poll's flag is touched; its options and votes keep their
    /// own rows and flags.
    pub async fn soft_delete(&self, id: &str) -> AppResult<poll::Model> {
        let poll = self.get_by_id(id).await?;

        let mut active: poll::ActiveModel = poll.into();
        active.is_deleted = Set(true);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

//! Poll option repository.

use std::sync::Arc;

use crate::entities::{PollOption, poll_option};
use ballotbox_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Poll option repository for database operations.
#[derive(Clone)]
pub struct PollOptionRepository {
    db: Arc<DatabaseConnection>,
}

impl PollOptionRepository {
    /// Create a new poll option repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an option by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<poll_option::Model>> {
        PollOption::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an option by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<poll_option::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Poll option not found: {id}")))
    }

    /// Create a new option.
    pub async fn create(&self, model: poll_option::ActiveModel) -> AppResult<poll_option::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a poll's options that have not been soft-deleted.
    pub async fn find_by_poll(&self, poll_id: &str) -> AppResult<Vec<poll_option::Model>> {
        PollOption::find()
            .filter(poll_option::Column::PollId.eq(poll_id))
            .filter(poll_option::Column::IsDeleted.eq(false))
            .order_by_asc(poll_option::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark an option as soft-deleted. Votes referencing it are untouched.
    pub async fn soft_delete(&self, id: &str) -> AppResult<poll_option::Model> {
        let option = self.get_by_id(id).await?;

        let mut active: poll_option::ActiveModel = option.into();
        active.is_deleted = Set(true);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_option(id: &str, poll_id: &str, text: &str) -> poll_option::Model {
        poll_option::Model {
            id: id.to_string(),
            poll_id: poll_id.to_string(),
            text: text.to_string(),
            is_deleted: false,
        }
    }

    #[tokio::test]
    async fn test_find_by_poll() {
        let o1 = create_test_option("o1", "p1", "Ramen");
        let o2 = create_test_option("o2", "p1", "Tacos");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[o1, o2]])
                .into_connection(),
        );

        let repo = PollOptionRepository::new(db);
        let result = repo.find_by_poll("p1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].text, "Tacos");
    }
}

//! Vote service.
//!
//! Casting a vote is where the invariants live that the schema cannot
//! express declaratively: option/poll consistency, expiration, and
//! per-poll vote uniqueness.

use ballotbox_common::{AppError, AppResult, IdGenerator};
use ballotbox_db::{
    entities::vote,
    repositories::{PollOptionRepository, PollRepository, UserRepository, VoteRepository},
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::Deserialize;

/// Input for casting a vote.
#[derive(Debug, Deserialize)]
pub struct CastVoteInput {
    pub user_id: String,
    pub poll_id: String,
    pub option_id: String,

    #[serde(default)]
    pub is_anonymous: bool,
}

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    vote_repo: VoteRepository,
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        vote_repo: VoteRepository,
        poll_repo: PollRepository,
        option_repo: PollOptionRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            vote_repo,
            poll_repo,
            option_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a vote.
    ///
    /// Checks, in order: the user exists; the poll exists and is not
    /// soft-deleted; the poll has not expired at `now`; the option exists,
    /// is not soft-deleted, and belongs to the referenced poll; and the
    /// user has not already voted (per poll on single-select, per option
    /// on multi-select).
    pub async fn cast(&self, input: CastVoteInput, now: DateTime<Utc>) -> AppResult<vote::Model> {
        let user = self.user_repo.get_by_id(&input.user_id).await?;

        let poll = self.poll_repo.get_by_id(&input.poll_id).await?;
        if poll.is_deleted {
            return Err(AppError::PollNotFound(poll.id));
        }

        if poll.expires_at <= now {
            tracing::warn!(poll_id = %poll.id, user_id = %user.id, "Rejected vote on expired poll");
            return Err(AppError::BadRequest("Poll has expired".to_string()));
        }

        let option = self.option_repo.get_by_id(&input.option_id).await?;
        if option.is_deleted {
            return Err(AppError::NotFound(format!(
                "Poll option not found: {}",
                option.id
            )));
        }
        if option.poll_id != poll.id {
            return Err(AppError::Validation(
                "Option does not belong to the referenced poll".to_string(),
            ));
        }

        if poll.allow_multiple {
            // Multi-select: one vote per option
            if self
                .vote_repo
                .has_voted_option(&user.id, &poll.id, &option.id)
                .await?
            {
                return Err(AppError::Conflict(
                    "You have already voted for this option".to_string(),
                ));
            }
        } else {
            // Single-select: one vote per poll
            if self.vote_repo.has_voted(&user.id, &poll.id).await? {
                return Err(AppError::Conflict(
                    "You have already voted on this poll".to_string(),
                ));
            }
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            poll_id: Set(poll.id.clone()),
            option_id: Set(option.id),
            is_anonymous: Set(input.is_anonymous),
            created_at: Set(now.into()),
        };

        let vote = self.vote_repo.create(model).await?;
        tracing::debug!(vote_id = %vote.id, poll_id = %poll.id, "Recorded vote");
        Ok(vote)
    }

    /// All votes a user has cast on a poll.
    pub async fn votes_for(&self, user_id: &str, poll_id: &str) -> AppResult<Vec<vote::Model>> {
        self.vote_repo.find_by_user_and_poll(user_id, poll_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ballotbox_db::entities::{poll, poll_option, user};
    use chrono::Duration;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn test_user() -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn test_poll(expires_at: DateTime<Utc>, allow_multiple: bool) -> poll::Model {
        poll::Model {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            title: "Lunch spot".to_string(),
            description: None,
            expires_at: expires_at.into(),
            allow_multiple,
            is_deleted: false,
            created_at: Utc::now().into(),
        }
    }

    fn test_option(id: &str, poll_id: &str) -> poll_option::Model {
        poll_option::Model {
            id: id.to_string(),
            poll_id: poll_id.to_string(),
            text: "Ramen".to_string(),
            is_deleted: false,
        }
    }

    fn service_with(db: Arc<sea_orm::DatabaseConnection>) -> VoteService {
        VoteService::new(
            VoteRepository::new(db.clone()),
            PollRepository::new(db.clone()),
            PollOptionRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    fn input() -> CastVoteInput {
        CastVoteInput {
            user_id: "u1".to_string(),
            poll_id: "p1".to_string(),
            option_id: "o1".to_string(),
            is_anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_cast_rejects_expired_poll() {
        let now = Utc::now();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user()]])
                .append_query_results([[test_poll(now - Duration::hours(1), false)]])
                .into_connection(),
        );

        let result = service_with(db).cast(input(), now).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_cast_rejects_option_from_other_poll() {
        let now = Utc::now();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user()]])
                .append_query_results([[test_poll(now + Duration::hours(1), false)]])
                .append_query_results([[test_option("o1", "p2")]])
                .into_connection(),
        );

        let result = service_with(db).cast(input(), now).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cast_rejects_second_vote_on_single_select() {
        let now = Utc::now();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user()]])
                .append_query_results([[test_poll(now + Duration::hours(1), false)]])
                .append_query_results([[test_option("o1", "p1")]])
                .append_query_results([vec![btreemap! {
                    "num_items" => Value::from(1i64),
                }]])
                .into_connection(),
        );

        let result = service_with(db).cast(input(), now).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}

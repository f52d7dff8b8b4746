//! Vote repository.
//!
//! Besides the plain CRUD surface this module owns the analytics queries:
//! per-poll and per-option tallies, participation, most-active users, and
//! the trending ranking. Every time-dependent query takes the query time as
//! an explicit parameter.

use std::sync::Arc;

use crate::entities::{Poll, PollOption, Vote, poll, poll_option, user, vote};
use ballotbox_common::{AppError, AppResult};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;

/// Vote tally for a single poll.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct PollVoteCount {
    pub poll_id: String,
    pub title: String,
    pub vote_count: i64,
}

/// Vote tally for a single option.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct OptionVoteCount {
    pub option_id: String,
    pub text: String,
    pub vote_count: i64,
}

/// A user's total vote count.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserVoteCount {
    pub user_id: String,
    pub username: String,
    pub vote_count: i64,
}

/// A poll ranked by votes cast inside the trending window.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct TrendingPoll {
    pub poll_id: String,
    pub title: String,
    pub recent_votes: i64,
}

/// Length of the trailing window used by [`VoteRepository::trending`].
const TRENDING_WINDOW_HOURS: i64 = 24;

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new vote.
    pub async fn create(&self, model: vote::ActiveModel) -> AppResult<vote::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all votes a user has cast on a poll.
    pub async fn find_by_user_and_poll(
        &self,
        user_id: &str,
        poll_id: &str,
    ) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::PollId.eq(poll_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has voted on a poll at all.
    pub async fn has_voted(&self, user_id: &str, poll_id: &str) -> AppResult<bool> {
        let count = Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::PollId.eq(poll_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Check if a user has voted for a specific option of a poll.
    pub async fn has_voted_option(
        &self,
        user_id: &str,
        poll_id: &str,
        option_id: &str,
    ) -> AppResult<bool> {
        let count = Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::PollId.eq(poll_id))
            .filter(vote::Column::OptionId.eq(option_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Tally votes for every poll that is not soft-deleted.
    ///
    /// Zero-vote polls are included with a count of 0 (LEFT JOIN). The
    /// poll's own soft-delete flag is the only exclusion criterion.
    pub async fn count_per_poll(&self) -> AppResult<Vec<PollVoteCount>> {
        Poll::find()
            .filter(poll::Column::IsDeleted.eq(false))
            .join(JoinType::LeftJoin, poll::Relation::Votes.def())
            .select_only()
            .column_as(poll::Column::Id, "poll_id")
            .column_as(poll::Column::Title, "title")
            .column_as(vote::Column::Id.count(), "vote_count")
            .group_by(poll::Column::Id)
            .group_by(poll::Column::Title)
            .order_by_asc(poll::Column::Id)
            .into_model::<PollVoteCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tally votes for every option that is not soft-deleted, optionally
    /// restricted to one poll.
    ///
    /// Zero-vote options are included with a count of 0. Filtering is on the
    /// option's own flag, never the parent poll's, so tallies for options of
    /// a soft-deleted poll remain queryable.
    pub async fn count_per_option(
        &self,
        poll_id: Option<&str>,
    ) -> AppResult<Vec<OptionVoteCount>> {
        let mut query = PollOption::find().filter(poll_option::Column::IsDeleted.eq(false));

        if let Some(pid) = poll_id {
            query = query.filter(poll_option::Column::PollId.eq(pid));
        }

        query
            .join(JoinType::LeftJoin, poll_option::Relation::Votes.def())
            .select_only()
            .column_as(poll_option::Column::Id, "option_id")
            .column_as(poll_option::Column::Text, "text")
            .column_as(vote::Column::Id.count(), "vote_count")
            .group_by(poll_option::Column::Id)
            .group_by(poll_option::Column::Text)
            .order_by_asc(poll_option::Column::Id)
            .into_model::<OptionVoteCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Titles of the polls a user has voted in at least once.
    ///
    /// Set semantics: a poll appears once no matter how many votes the user
    /// cast in it. Soft-deleted polls are excluded.
    pub async fn polls_voted_by(&self, user_id: &str) -> AppResult<Vec<String>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .join(JoinType::InnerJoin, vote::Relation::Poll.def())
            .filter(poll::Column::IsDeleted.eq(false))
            .select_only()
            .column(poll::Column::Title)
            .distinct()
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users ranked by total vote count, descending.
    ///
    /// Inner join semantics: users with zero votes never appear.
    pub async fn most_active_users(&self, limit: u64) -> AppResult<Vec<UserVoteCount>> {
        Vote::find()
            .join(JoinType::InnerJoin, vote::Relation::User.def())
            .select_only()
            .column_as(user::Column::Id, "user_id")
            .column_as(user::Column::Username, "username")
            .column_as(vote::Column::Id.count(), "vote_count")
            .group_by(user::Column::Id)
            .group_by(user::Column::Username)
            .order_by_desc(vote::Column::Id.count())
            .limit(limit)
            .into_model::<UserVoteCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Polls ranked by votes cast in the trailing 24-hour window ending at
    /// `now`, descending.
    ///
    /// Polls with no vote inside the window are excluded, as are
    /// soft-deleted polls.
    pub async fn trending(&self, now: DateTime<Utc>, limit: u64) -> AppResult<Vec<TrendingPoll>> {
        let window_start = now - Duration::hours(TRENDING_WINDOW_HOURS);

        Vote::find()
            .filter(vote::Column::CreatedAt.gt(window_start))
            .filter(vote::Column::CreatedAt.lte(now))
            .join(JoinType::InnerJoin, vote::Relation::Poll.def())
            .filter(poll::Column::IsDeleted.eq(false))
            .select_only()
            .column_as(poll::Column::Id, "poll_id")
            .column_as(poll::Column::Title, "title")
            .column_as(vote::Column::Id.count(), "recent_votes")
            .group_by(poll::Column::Id)
            .group_by(poll::Column::Title)
            .order_by_desc(vote::Column::Id.count())
            .limit(limit)
            .into_model::<TrendingPoll>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

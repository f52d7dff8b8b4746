//! Analytics service.
//!
//! Stateless read operations computing derived views over the current
//! table contents. Every query is independently evaluable against a
//! snapshot; the query time is always an explicit parameter, never an
//! ambient clock.

use ballotbox_common::AppResult;
use ballotbox_db::repositories::{
    OptionVoteCount, PollRepository, PollVoteCount, TrendingPoll, UserVoteCount, VoteRepository,
};
use chrono::{DateTime, Utc};

use super::poll::{PollStatus, PollWithStatus};

/// Analytics service over the poll store.
#[derive(Clone)]
pub struct AnalyticsService {
    poll_repo: PollRepository,
    vote_repo: VoteRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository, vote_repo: VoteRepository) -> Self {
        Self {
            poll_repo,
            vote_repo,
        }
    }

    /// Every non-soft-deleted poll classified as active or expired at `now`.
    pub async fn poll_statuses(&self, now: DateTime<Utc>) -> AppResult<Vec<PollWithStatus>> {
        let polls = self.poll_repo.find_not_deleted().await?;

        Ok(polls
            .into_iter()
            .map(|poll| {
                let status = PollStatus::classify(&poll, now);
                PollWithStatus { poll, status }
            })
            .collect())
    }

    /// Vote tallies per poll, including zero-vote polls.
    pub async fn votes_per_poll(&self) -> AppResult<Vec<PollVoteCount>> {
        self.vote_repo.count_per_poll().await
    }

    /// Vote tallies per option, optionally restricted to one poll.
    pub async fn votes_per_option(
        &self,
        poll_id: Option<&str>,
    ) -> AppResult<Vec<OptionVoteCount>> {
        self.vote_repo.count_per_option(poll_id).await
    }

    /// Titles of the polls a user has participated in (set semantics).
    pub async fn participation(&self, user_id: &str) -> AppResult<Vec<String>> {
        self.vote_repo.polls_voted_by(user_id).await
    }

    /// Users ranked by total vote count, descending. Zero-vote users are
    /// excluded.
    pub async fn most_active_users(&self, limit: u64) -> AppResult<Vec<UserVoteCount>> {
        self.vote_repo.most_active_users(limit).await
    }

    /// Polls ranked by votes cast in the trailing 24-hour window ending at
    /// `now`, descending. Polls without recent votes are excluded.
    pub async fn trending_polls(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<TrendingPoll>> {
        self.vote_repo.trending(now, limit).await
    }
}

//! Poll service.

use ballotbox_common::{AppError, AppResult, IdGenerator};
use ballotbox_db::{
    entities::{poll, poll_option},
    repositories::{PollOptionRepository, PollRepository, UserRepository},
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Poll lifecycle status, derived at query time.
///
/// Expiration is an attribute of the poll, not a stored state transition:
/// the same poll can be `Active` for one query time and `Expired` for a
/// later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollStatus {
    Active,
    Expired,
}

impl PollStatus {
    /// Classify a poll against a query time.
    ///
    /// `Active` iff the expiration is strictly after `now`.
    #[must_use]
    pub fn classify(poll: &poll::Model, now: DateTime<Utc>) -> Self {
        if poll.expires_at > now {
            Self::Active
        } else {
            Self::Expired
        }
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

/// A poll together with its derived status.
#[derive(Debug, Clone)]
pub struct PollWithStatus {
    pub poll: poll::Model,
    pub status: PollStatus,
}

/// Input for creating a poll.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePollInput {
    pub user_id: String,

    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[validate(length(max = 2048))]
    pub description: Option<String>,

    pub expires_at: DateTime<Utc>,

    #[serde(default)]
    pub allow_multiple: bool,

    pub options: Vec<String>,
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
    option_repo: PollOptionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(
        poll_repo: PollRepository,
        option_repo: PollOptionRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            poll_repo,
            option_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a poll with its options.
    ///
    /// The poll and its options are inserted as separate statements with no
    /// wrapping transaction; each insert is atomic on its own.
    pub async fn create(
        &self,
        input: CreatePollInput,
        now: DateTime<Utc>,
    ) -> AppResult<(poll::Model, Vec<poll_option::Model>)> {
        input.validate()?;

        if input.options.len() < 2 {
            return Err(AppError::BadRequest(
                "Poll must have at least 2 options".to_string(),
            ));
        }
        if input.options.len() > 10 {
            return Err(AppError::BadRequest(
                "Poll cannot have more than 10 options".to_string(),
            ));
        }
        for text in &input.options {
            if text.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Poll options cannot be empty".to_string(),
                ));
            }
            if text.len() > 256 {
                return Err(AppError::BadRequest(
                    "Poll option is too long (max 256 chars)".to_string(),
                ));
            }
        }

        if input.expires_at <= now {
            return Err(AppError::BadRequest(
                "Poll expiration must be in the future".to_string(),
            ));
        }

        let creator = self.user_repo.get_by_id(&input.user_id).await?;

        let poll_model = poll::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(creator.id),
            title: Set(input.title),
            description: Set(input.description),
            expires_at: Set(input.expires_at.into()),
            allow_multiple: Set(input.allow_multiple),
            is_deleted: Set(false),
            created_at: Set(now.into()),
        };
        let poll = self.poll_repo.create(poll_model).await?;

        let mut options = Vec::with_capacity(input.options.len());
        for text in input.options {
            let option_model = poll_option::ActiveModel {
                id: Set(self.id_gen.generate()),
                poll_id: Set(poll.id.clone()),
                text: Set(text),
                is_deleted: Set(false),
            };
            options.push(self.option_repo.create(option_model).await?);
        }

        tracing::info!(poll_id = %poll.id, options = options.len(), "Created poll");
        Ok((poll, options))
    }

    /// Get a poll by ID.
    pub async fn get(&self, id: &str) -> AppResult<poll::Model> {
        self.poll_repo.get_by_id(id).await
    }

    /// Get a poll together with its live options.
    pub async fn get_with_options(
        &self,
        id: &str,
    ) -> AppResult<(poll::Model, Vec<poll_option::Model>)> {
        let poll = self.poll_repo.get_by_id(id).await?;
        let options = self.option_repo.find_by_poll(&poll.id).await?;
        Ok((poll, options))
    }

    /// List every poll that is not soft-deleted, classified against `now`.
    pub async fn list_with_status(&self, now: DateTime<Utc>) -> AppResult<Vec<PollWithStatus>> {
        let polls = self.poll_repo.find_not_deleted().await?;

        Ok(polls
            .into_iter()
            .map(|poll| {
                let status = PollStatus::classify(&poll, now);
                PollWithStatus { poll, status }
            })
            .collect())
    }

    /// Soft-delete a poll.
    ///
    /// Flips only this poll's flag; options and votes are untouched.
    pub async fn soft_delete(&self, id: &str) -> AppResult<poll::Model> {
        let poll = self.poll_repo.soft_delete(id).await?;
        tracing::info!(poll_id = %poll.id, "Soft-deleted poll");
        Ok(poll)
    }

    /// Soft-delete a single option.
    pub async fn soft_delete_option(&self, id: &str) -> AppResult<poll_option::Model> {
        let option = self.option_repo.soft_delete(id).await?;
        tracing::info!(option_id = %option.id, "Soft-deleted poll option");
        Ok(option)
    }
}

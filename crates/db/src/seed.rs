//! Deterministic seed data for manual verification and integration tests.
//!
//! Inserts the fixed dataset the analytics queries are documented against:
//! 10 users, 3 polls, 11 options, 11 votes. All timestamps are anchored to a
//! caller-supplied time so tests control the clock.
//!
//! Shape of the dataset:
//! - poll 1: single-select, open, 4 options, 5 votes all inside the trailing
//!   24-hour window;
//! - poll 2: multi-select, open, 4 options, 4 votes (one voter picked two
//!   distinct options, one vote is older than the window);
//! - poll 3: already expired, 3 options, 2 votes cast days ago;
//! - two users have 2 votes each, one user has none, two votes are anonymous.

use crate::entities::{poll, poll_option, user, vote};
use ballotbox_common::{AppError, AppResult, IdGenerator};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Models inserted by [`seed`], in insertion order.
pub struct SeedData {
    pub users: Vec<user::Model>,
    pub polls: Vec<poll::Model>,
    pub options: Vec<poll_option::Model>,
    pub votes: Vec<vote::Model>,
}

const USERNAMES: [&str; 10] = [
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
];

/// (poll index, option text)
const OPTIONS: [(usize, &str); 11] = [
    (0, "Ramen"),
    (0, "Tacos"),
    (0, "Sushi"),
    (0, "Pizza"),
    (1, "Async Rust in practice"),
    (1, "Profiling walkthrough"),
    (1, "Error handling patterns"),
    (1, "Live API design review"),
    (2, "Mountains"),
    (2, "Seaside"),
    (2, "City center"),
];

/// (user index, option index, vote age in minutes, anonymous)
const VOTES: [(usize, usize, i64, bool); 11] = [
    // poll 1: five voters, all within the last 24 hours
    (1, 0, 60, false),
    (2, 1, 120, false),
    (4, 0, 180, false),
    (5, 2, 240, false),
    (6, 0, 300, true),
    // poll 2: dave votes twice (multi-select), heidi's vote predates the window
    (3, 4, 120, false),
    (3, 6, 90, false),
    (0, 5, 180, false),
    (7, 4, 30 * 60, false),
    // poll 3: votes cast before the poll expired
    (4, 8, 3 * 24 * 60, false),
    (8, 9, 3 * 24 * 60, true),
];

/// Insert the verification dataset and return the created models.
pub async fn seed(db: &DatabaseConnection, now: DateTime<Utc>) -> AppResult<SeedData> {
    let id_gen = IdGenerator::new();

    let mut users = Vec::with_capacity(USERNAMES.len());
    for (i, username) in USERNAMES.iter().enumerate() {
        let model = user::ActiveModel {
            id: Set(id_gen.generate()),
            username: Set((*username).to_string()),
            email: Set(format!("{username}@example.com")),
            created_at: Set((now - Duration::days(40 - i as i64)).into()),
        };
        users.push(
            model
                .insert(db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        );
    }

    let poll_specs = [
        // (creator, title, description, expires offset, multi, created offset)
        (
            0,
            "Where should we get lunch on Friday?",
            None,
            Duration::days(7),
            false,
            Duration::days(-2),
        ),
        (
            1,
            "Which conference talks should we schedule?",
            Some("Pick as many as you would attend."),
            Duration::days(3),
            true,
            Duration::days(-1),
        ),
        (
            2,
            "Where should the spring offsite be?",
            None,
            Duration::days(-2),
            false,
            Duration::days(-10),
        ),
    ];

    let mut polls = Vec::with_capacity(poll_specs.len());
    for (creator, title, description, expires_in, multi, created) in poll_specs {
        let model = poll::ActiveModel {
            id: Set(id_gen.generate()),
            user_id: Set(users[creator].id.clone()),
            title: Set(title.to_string()),
            description: Set(description.map(ToString::to_string)),
            expires_at: Set((now + expires_in).into()),
            allow_multiple: Set(multi),
            is_deleted: Set(false),
            created_at: Set((now + created).into()),
        };
        polls.push(
            model
                .insert(db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        );
    }

    let mut options = Vec::with_capacity(OPTIONS.len());
    for (poll_idx, text) in OPTIONS {
        let model = poll_option::ActiveModel {
            id: Set(id_gen.generate()),
            poll_id: Set(polls[poll_idx].id.clone()),
            text: Set(text.to_string()),
            is_deleted: Set(false),
        };
        options.push(
            model
                .insert(db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        );
    }

    let mut votes = Vec::with_capacity(VOTES.len());
    for (user_idx, option_idx, age_minutes, anonymous) in VOTES {
        let option = &options[option_idx];
        let model = vote::ActiveModel {
            id: Set(id_gen.generate()),
            user_id: Set(users[user_idx].id.clone()),
            poll_id: Set(option.poll_id.clone()),
            option_id: Set(option.id.clone()),
            is_anonymous: Set(anonymous),
            created_at: Set((now - Duration::minutes(age_minutes)).into()),
        };
        votes.push(
            model
                .insert(db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?,
        );
    }

    Ok(SeedData {
        users,
        polls,
        options,
        votes,
    })
}

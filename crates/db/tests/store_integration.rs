//! Poll store integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test store_integration -- --ignored`
//!
//! Setup test database:
//!   docker-compose -f docker-compose.test.yml up -d test-db
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `ballotbox_test`)
//!   `TEST_DB_PASSWORD` (default: `ballotbox_test`)
//!   `TEST_DB_NAME` (default: `ballotbox_test`)

#![allow(clippy::unwrap_used)]

use ballotbox_db::entities::{poll, vote};
use ballotbox_db::repositories::{PollRepository, UserRepository, VoteRepository};
use ballotbox_db::seed::seed;
use ballotbox_db::test_utils::{TestDatabase, TestDbConfig};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};

/// Install a subscriber so repository logging shows with `--nocapture`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    init_tracing();
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_votes_per_poll_includes_zero_vote_polls() {
    init_tracing();
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    // A fresh poll nobody has voted on yet
    let empty_poll = poll::ActiveModel {
        id: Set("zzz_no_votes".to_string()),
        user_id: Set(data.users[0].id.clone()),
        title: Set("Unloved poll".to_string()),
        description: Set(None),
        expires_at: Set((now + Duration::days(1)).into()),
        allow_multiple: Set(false),
        is_deleted: Set(false),
        created_at: Set(now.into()),
    }
    .insert(db.connection())
    .await
    .unwrap();

    let counts = VoteRepository::new(conn).count_per_poll().await.unwrap();

    assert_eq!(counts.len(), 4);
    let by_id = |id: &str| counts.iter().find(|c| c.poll_id == id).unwrap();
    assert_eq!(by_id(&data.polls[0].id).vote_count, 5);
    assert_eq!(by_id(&data.polls[1].id).vote_count, 4);
    assert_eq!(by_id(&data.polls[2].id).vote_count, 2);
    assert_eq!(by_id(&empty_poll.id).vote_count, 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_votes_per_option_counts() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let counts = VoteRepository::new(conn)
        .count_per_option(Some(&data.polls[0].id))
        .await
        .unwrap();

    assert_eq!(counts.len(), 4);
    let by_text = |text: &str| counts.iter().find(|c| c.text == text).unwrap();
    assert_eq!(by_text("Ramen").vote_count, 3);
    assert_eq!(by_text("Tacos").vote_count, 1);
    assert_eq!(by_text("Sushi").vote_count, 1);
    // Zero-vote options stay in the result
    assert_eq!(by_text("Pizza").vote_count, 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_participation_has_set_semantics() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();
    let repo = VoteRepository::new(conn);

    // dave voted twice in poll 2; its title must appear exactly once
    let dave = &data.users[3];
    let titles = repo.polls_voted_by(&dave.id).await.unwrap();
    assert_eq!(titles, vec![data.polls[1].title.clone()]);

    // erin voted in polls 1 and 3
    let erin = &data.users[4];
    let mut titles = repo.polls_voted_by(&erin.id).await.unwrap();
    titles.sort();
    let mut expected = vec![data.polls[0].title.clone(), data.polls[2].title.clone()];
    expected.sort();
    assert_eq!(titles, expected);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_most_active_users_ranking() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let ranking = VoteRepository::new(conn).most_active_users(20).await.unwrap();

    // Nine of the ten seeded users voted; judy never did
    assert_eq!(ranking.len(), 9);
    assert!(ranking.iter().all(|r| r.vote_count > 0));
    assert!(!ranking.iter().any(|r| r.username == "judy"));

    // Two users are tied at the top with 2 votes each
    assert_eq!(ranking[0].vote_count, 2);
    assert_eq!(ranking[1].vote_count, 2);
    let leaders: Vec<&str> = ranking[..2].iter().map(|r| r.username.as_str()).collect();
    assert!(leaders.contains(&"dave"));
    assert!(leaders.contains(&"erin"));

    // Non-increasing order
    assert!(ranking.windows(2).all(|w| w[0].vote_count >= w[1].vote_count));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_trending_restricted_to_window() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let trending = VoteRepository::new(conn).trending(now, 10).await.unwrap();

    // Poll 3's votes are days old; poll 2 has one vote outside the window
    assert_eq!(trending.len(), 2);
    assert_eq!(trending[0].poll_id, data.polls[0].id);
    assert_eq!(trending[0].recent_votes, 5);
    assert_eq!(trending[1].poll_id, data.polls[1].id);
    assert_eq!(trending[1].recent_votes, 3);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_soft_delete_leaves_options_and_votes_queryable() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let poll_repo = PollRepository::new(conn.clone());
    let vote_repo = VoteRepository::new(conn);

    let deleted = poll_repo.soft_delete(&data.polls[0].id).await.unwrap();
    assert!(deleted.is_deleted);

    // The poll disappears from per-poll tallies...
    let counts = vote_repo.count_per_poll().await.unwrap();
    assert!(!counts.iter().any(|c| c.poll_id == data.polls[0].id));

    // ...but its options still tally by their own flags
    let option_counts = vote_repo
        .count_per_option(Some(&data.polls[0].id))
        .await
        .unwrap();
    assert_eq!(option_counts.len(), 4);
    assert_eq!(
        option_counts.iter().map(|c| c.vote_count).sum::<i64>(),
        5
    );

    // ...and the vote rows themselves are untouched
    let bob_votes = vote_repo
        .find_by_user_and_poll(&data.users[1].id, &data.polls[0].id)
        .await
        .unwrap();
    assert_eq!(bob_votes.len(), 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_foreign_keys_reject_dangling_votes() {
    let db = TestDatabase::create_unique().await.unwrap();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let dangling = vote::ActiveModel {
        id: Set("v_dangling".to_string()),
        user_id: Set("no_such_user".to_string()),
        poll_id: Set(data.polls[0].id.clone()),
        option_id: Set(data.options[0].id.clone()),
        is_anonymous: Set(false),
        created_at: Set(now.into()),
    }
    .insert(db.connection())
    .await;

    assert!(dangling.is_err());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unique_username_and_email() {
    let db = TestDatabase::create_unique().await.unwrap();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let duplicate = ballotbox_db::entities::user::ActiveModel {
        id: Set("u_duplicate".to_string()),
        username: Set(data.users[0].username.clone()),
        email: Set("fresh@example.com".to_string()),
        created_at: Set(now.into()),
    }
    .insert(db.connection())
    .await;

    assert!(duplicate.is_err());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_seeded_listings() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.connection_arc();
    let now = Utc::now();
    let data = seed(db.connection(), now).await.unwrap();

    let users = UserRepository::new(conn.clone()).find_all().await.unwrap();
    assert_eq!(users.len(), 10);
    // Oldest account first
    assert_eq!(users[0].username, "alice");

    let alices_polls = PollRepository::new(conn)
        .find_by_creator(&data.users[0].id)
        .await
        .unwrap();
    assert_eq!(alices_polls.len(), 1);
    assert_eq!(alices_polls[0].id, data.polls[0].id);

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}

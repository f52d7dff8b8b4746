//! Business logic services.

pub mod analytics;
pub mod poll;
pub mod user;
pub mod vote;

pub use analytics::AnalyticsService;
pub use poll::{CreatePollInput, PollService, PollStatus, PollWithStatus};
pub use user::{CreateUserInput, UserService};
pub use vote::{CastVoteInput, VoteService};

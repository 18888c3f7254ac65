//! # Habitgrid Core Library
//!
//! Core logic for Habitgrid, a daily habit tracker organised into dated
//! challenges. Every operation is available through the `habitgrid` CLI,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Challenge model**: challenges, habits and the sparse per-day grid of
//!   [`CellState`]s
//! - **Stats**: completion percentage, mandatory-habit streaks and the
//!   top-habit ranking, recomputed from the grid on demand
//! - **Session**: loading, migrating and normalising a collection, plus
//!   mutations that return deferred [`PersistTask`]s
//! - **Storage**: SQLite-backed local store, HTTP remote store and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`Session`]: the signed-in user's working collection
//! - [`ChallengeStore`]: list/save/delete contract for backends
//! - [`compute_stats`]: dashboard aggregation
//! - [`Config`]: application configuration management

pub mod challenge;
pub mod error;
pub mod identity;
pub mod session;
pub mod stats;
pub mod storage;

pub use challenge::{
    default_challenge, CellState, Challenge, ChallengeDraft, Habit, HabitType, TrackerState,
};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use identity::{Identity, IdentityProvider, LocalIdentity};
pub use session::{LoadSource, PersistTask, RetryPolicy, SaveIndicator, Session};
pub use stats::{compute_stats, ChallengeStats, HabitScore};
pub use storage::{
    ChallengeStore, Config, LocalStore, MemoryProfile, MemoryStore, ProfileState, RemoteStore,
};

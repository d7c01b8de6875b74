//! # cubetime-types
//!
//! Data model and wire format types for the cubetime speed-solving timer.
//!
//! This crate provides the foundational types used across all cubetime crates:
//! - [`Solve`], [`SolveId`], [`Penalty`], [`PuzzleType`] - Solve records
//! - [`Settings`] - User preferences, replaced as a whole value
//! - [`SyncStatus`] - The status triplet shown to presentation layers
//! - [`PullResponse`], [`PushRequest`], [`PushResponse`] - Remote sync payloads
//! - [`TypesError`], [`ValidationError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod puzzle;
mod settings;
mod solve;
mod status;
pub mod validate;

pub use error::{TypesError, ValidationError};
pub use ids::SolveId;
pub use messages::{errors, PullResponse, PushRequest, PushResponse};
pub use puzzle::PuzzleType;
pub use settings::{Settings, Theme, VisibleStats, DEFAULT_INSPECTION_SECS};
pub use solve::{Penalty, Solve, SolveDate, PLUS_TWO_MS};
pub use status::SyncStatus;

//! # cubetime-server
//!
//! Reference sync endpoint for the cubetime speed-solving timer.
//!
//! This crate implements a small HTTP service that:
//! - Authenticates callers by bearer token
//! - Stores each user's solves and settings in a string KV store
//! - Stamps every write with a `lastSync` timestamp
//! - Rejects malformed payloads whole, never partially applying them
//!
//! ## Architecture
//!
//! ```text
//! Device A ──┐                    ┌── Device B
//!            │   GET/POST         │
//!            │   /api/sync        │
//!        ┌───┴────────────────────┴───┐
//!        │      cubetime-server       │
//!        │  ┌─────────────────────┐   │
//!        │  │  KV (SQLite/memory) │   │
//!        │  └─────────────────────┘   │
//!        └────────────────────────────┘
//! ```
//!
//! ## Endpoint
//!
//! - `GET /api/sync` → `{ success, solves, settings, lastSync }`
//! - `POST /api/sync` with `{ solves?, settings? }` → `{ success, lastSync }`
//! - `GET /health` → status, version, uptime

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod storage;

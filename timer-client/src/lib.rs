//! # cubetime-client
//!
//! Runtime side of the cubetime speed-solving timer.
//!
//! This is the library that hosts (the CLI, a GUI shell) use to time
//! solves and keep them synced.
//!
//! ## Features
//!
//! - **Offline-first**: every mutation is written locally before any network call
//! - **Remote Abstraction**: Pluggable remote store (HTTP, mock)
//! - **Debounced Sync**: Bursts of edits collapse into one push; failures back off
//! - **Pure State Machines**: Uses cubetime-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use cubetime_client::{EngineConfig, FileStorage, HttpRemote, SyncEngine, TimerSession};
//! use cubetime_core::MonotonicClock;
//!
//! let storage = Arc::new(FileStorage::open(data_dir)?);
//! let solves = SyncEngine::open(storage.clone(), EngineConfig::default());
//! let settings = SyncEngine::open(storage, EngineConfig::default());
//! let mut session = TimerSession::new(MonotonicClock::new(), solves, settings);
//!
//! session.authenticate(Arc::new(HttpRemote::new(endpoint, token)?)).await;
//! session.hold_begin();
//! // ... 300 ms later
//! session.hold_end();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod deferred;
pub mod driver;
pub mod engine;
pub mod remote;
pub mod session;
pub mod storage;

pub use deferred::{DeferredTask, RepeatingTask};
pub use driver::TimerDriver;
pub use engine::{EngineConfig, EngineError, SyncEngine, Synced, SETTINGS_KEY, SOLVES_KEY};
pub use remote::{HttpRemote, MockRemote, RemoteError, RemoteStore};
pub use session::TimerSession;
pub use storage::{load_or_default, FileStorage, LocalStorage, MemoryStorage, StorageError};

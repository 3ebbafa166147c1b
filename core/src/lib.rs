/// Deskline - conversation synchronization core
///
/// Keeps an in-memory conversation directory and message cache consistent
/// with a stream of push events, periodic full-snapshot refreshes, and
/// optimistic operator sends, while the active conversation changes
/// underneath the asynchronous handlers.

pub mod backend;
pub mod cache;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod events;
pub mod gateway;
pub mod identity;
pub mod reconciler;
pub mod rest;
pub mod selection;
pub mod sender;
pub mod store;
pub mod types;

pub use config::Config;
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use gateway::Gateway;

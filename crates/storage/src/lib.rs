//! SQLite-backed settings storage for Convoy.
//!
//! This crate owns the agent definitions and the model-server URL. The
//! orchestration runtime only ever reads agents; every write goes through
//! [`SettingsStore`].
//!
//! # Core Concepts
//!
//! ## Agent
//!
//! An [`Agent`] is a named persona: a system prompt, a model name, the set of
//! tools it may invoke and an optional vault path allowlist. Its [`AgentId`]
//! is assigned once at creation and never changes.
//!
//! ## SettingsStore
//!
//! The [`SettingsStore`] wraps a SQLite database. A fresh database is seeded
//! with a single general-purpose agent and the default server URL.
//!
//! # Example
//!
//! ```no_run
//! use storage::SettingsStore;
//!
//! let store = SettingsStore::open("settings.db")?;
//! let agent = store.create_agent("Researcher", "You dig up facts.", "llama3.2")?;
//!
//! for agent in store.agents()? {
//!     println!("{} ({})", agent.name, agent.id);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod agent;
mod error;
mod settings;
mod store;

pub use agent::{Agent, AgentId, DEFAULT_MODEL, DEFAULT_TOOLS};
pub use error::{Error, Result};
pub use settings::{DEFAULT_SERVER_URL, Settings};
pub use store::SettingsStore;

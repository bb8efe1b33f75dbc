//! SQLite settings store implementation.

use crate::{Agent, AgentId, DEFAULT_SERVER_URL, Error, Result, Settings};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

const KEY_SERVER_URL: &str = "server_url";
const KEY_SEEDED: &str = "seeded";

/// SQLite-backed store for agent definitions and the model-server URL.
pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    /// Open or create a settings store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory settings store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        // Defaults are written once. A user who later deletes every agent
        // keeps an empty list.
        if self.setting(KEY_SEEDED)?.is_none() {
            debug!("seeding default settings");
            self.insert_agent(&Agent::default_assistant())?;
            self.put_setting(KEY_SEEDED, "1")?;
        }
        Ok(())
    }

    /// Load agents and server URL in one snapshot.
    pub fn load(&self) -> Result<Settings> {
        Ok(Settings {
            agents: self.agents()?,
            server_url: self.server_url()?,
        })
    }

    /// All agents, in creation order.
    pub fn agents(&self) -> Result<Vec<Agent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM agents ORDER BY rowid")?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(Error::from))
            .collect()
    }

    /// Look up an agent by id.
    pub fn agent(&self, id: &AgentId) -> Result<Option<Agent>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM agents WHERE id = ?1",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|d| serde_json::from_str(&d).map_err(Error::from))
            .transpose()
    }

    /// Create and persist a new agent with a fresh id and no tools.
    pub fn create_agent(
        &self,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Agent> {
        let agent = Agent::new(name, system_prompt, model);
        self.insert_agent(&agent)?;
        Ok(agent)
    }

    /// Persist a fully-formed agent. Fails if the id is taken.
    pub fn insert_agent(&self, agent: &Agent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO agents (id, data) VALUES (?1, ?2)",
            params![agent.id.as_str(), serde_json::to_string(agent)?],
        )?;
        debug!(agent = %agent.id, "agent inserted");
        Ok(())
    }

    /// Overwrite an existing agent. Unknown ids are ignored.
    ///
    /// Returns whether a row was updated.
    pub fn update_agent(&self, agent: &Agent) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE agents SET data = ?2 WHERE id = ?1",
            params![agent.id.as_str(), serde_json::to_string(agent)?],
        )?;
        Ok(changed > 0)
    }

    /// Delete an agent.
    pub fn delete_agent(&self, id: &AgentId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1", [id.as_str()])?;
        if changed == 0 {
            return Err(Error::NotFound(format!("agent {id}")));
        }
        Ok(())
    }

    /// The model-server base URL.
    pub fn server_url(&self) -> Result<String> {
        Ok(self
            .setting(KEY_SERVER_URL)?
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()))
    }

    pub fn set_server_url(&self, url: &str) -> Result<()> {
        self.put_setting(KEY_SERVER_URL, url)
    }

    fn setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

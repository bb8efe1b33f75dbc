/// A capability an agent asks to exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityRequest {
    /// Invoke the named tool.
    Tool { name: String },
    /// Read a file from the vault.
    VaultRead { path: String },
}

impl CapabilityRequest {
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }

    pub fn vault_read(path: impl Into<String>) -> Self {
        Self::VaultRead { path: path.into() }
    }
}

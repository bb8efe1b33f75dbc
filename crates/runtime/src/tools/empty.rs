//! No-op host collaborators.

use super::{Delivery, Notifier, NotifyError, VaultError, VaultReader};
use async_trait::async_trait;

/// A vault with no files.
///
/// Useful for testing or when no vault is configured.
#[derive(Debug, Default)]
pub struct EmptyVault;

#[async_trait]
impl VaultReader for EmptyVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        Err(VaultError::NotFound(path.to_string()))
    }
}

/// A host without a notification surface.
#[derive(Debug, Default)]
pub struct NoNotifier;

#[async_trait]
impl Notifier for NoNotifier {
    async fn notify(&self, _title: &str, _body: &str) -> Result<Delivery, NotifyError> {
        Err(NotifyError::Unsupported)
    }
}

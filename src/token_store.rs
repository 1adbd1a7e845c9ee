// pending confirmations used to live in a process-global map; handlers now
// only see this trait, so a persistent backend can be dropped in via
// `Application::build_with_store`

mod memory;

use async_trait::async_trait;
pub use memory::InMemoryTokenStore;

use crate::domain::ConfirmationToken;
use crate::domain::PendingConfirmation;

/// Storage for pending confirmations, keyed by token.
///
/// Entries are created on subscribe and removed on confirm; they are never
/// updated in place. Expiry is the caller's concern (checked lazily on
/// confirm), stores are not expected to sweep.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(
        &self,
        token: &str,
    ) -> Result<Option<PendingConfirmation>, anyhow::Error>;

    async fn put(
        &self,
        token: &ConfirmationToken,
        pending: PendingConfirmation,
    ) -> Result<(), anyhow::Error>;

    /// Deleting a missing token is not an error.
    async fn delete(
        &self,
        token: &str,
    ) -> Result<(), anyhow::Error>;
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::TokenStore;
use crate::domain::ConfirmationToken;
use crate::domain::PendingConfirmation;

/// Process-local store; everything is lost on restart.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTokenStore(Arc<RwLock<HashMap<String, PendingConfirmation>>>);

impl InMemoryTokenStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.0.read().len() }

    pub fn is_empty(&self) -> bool { self.0.read().is_empty() }

    pub fn contains(
        &self,
        token: &str,
    ) -> bool {
        self.0.read().contains_key(token)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(
        &self,
        token: &str,
    ) -> Result<Option<PendingConfirmation>, anyhow::Error> {
        Ok(self.0.read().get(token).cloned())
    }

    async fn put(
        &self,
        token: &ConfirmationToken,
        pending: PendingConfirmation,
    ) -> Result<(), anyhow::Error> {
        self.0.write().insert(token.as_ref().to_string(), pending);
        Ok(())
    }

    async fn delete(
        &self,
        token: &str,
    ) -> Result<(), anyhow::Error> {
        self.0.write().remove(token);
        Ok(())
    }
}

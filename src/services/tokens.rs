use async_trait::async_trait;
use std::time::Duration;

use crate::core::SessionContext;

pub const TOKEN_KEY: &str = "token";
pub const EMAIL_KEY: &str = "email";

/// Opaque key-value store holding the device's credentials
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String);
    async fn remove(&self, key: &str);
}

/// In-process token store; entries expire after the configured TTL
#[derive(Clone)]
pub struct MemoryTokenStore {
    entries: moka::future::Cache<String, String>,
}

impl MemoryTokenStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        let mut builder = moka::future::CacheBuilder::new(64);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            entries: builder.build(),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value).await;
    }

    async fn remove(&self, key: &str) {
        self.entries.invalidate(key).await;
    }
}

/// Snapshot the stored credentials into an explicit context
pub async fn load_context(store: &dyn TokenStore) -> SessionContext {
    let ctx = SessionContext::new(store.get(TOKEN_KEY).await, store.get(EMAIL_KEY).await);
    if !ctx.is_authenticated() {
        tracing::debug!("No stored token, continuing unauthenticated");
    }
    ctx
}

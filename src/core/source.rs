use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Category, Identified};

/// Errors reported by listing collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("unauthorized: backend rejected the credential")]
    Unauthorized,

    #[error("channel closed: {0}")]
    Channel(String),

    #[error("category {0} is not served by this source")]
    UnsupportedCategory(Category),
}

/// Credentials threaded explicitly through every collaborator call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub token: Option<String>,
    pub email: Option<String>,
}

impl SessionContext {
    pub fn new(token: Option<String>, email: Option<String>) -> Self {
        Self { token, email }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// `Authorization` header value, if a token is present
    pub fn bearer(&self) -> Option<String> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("Bearer {}", t))
    }
}

/// Paged listing collaborator
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Identified + Send;

    async fn fetch_page(
        &self,
        ctx: &SessionContext,
        category: Category,
        page: u32,
    ) -> Result<Vec<Self::Item>, SourceError>;
}

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::{PageSource, SessionContext, SourceError};
use crate::models::{Category, ChatEntry};
use crate::services::backend::BackendClient;

type Reply = Result<Vec<ChatEntry>, SourceError>;

/// One page request travelling to the inbox transport
#[derive(Debug)]
pub struct InboxRequest {
    pub ctx: SessionContext,
    pub category: Category,
    pub page: u32,
    reply: oneshot::Sender<Reply>,
}

impl InboxRequest {
    /// Deliver the single response; returns false if the requester went away
    pub fn respond(self, result: Reply) -> bool {
        self.reply.send(result).is_ok()
    }
}

/// Client end of the real-time inbox channel
///
/// Each request gets exactly one paginated response through its reply
/// callback. No ordering is assumed across reconnects.
#[derive(Debug, Clone)]
pub struct InboxChannel {
    tx: mpsc::Sender<InboxRequest>,
    timeout: Duration,
}

impl InboxChannel {
    pub fn new(buffer: usize, timeout: Duration) -> (Self, mpsc::Receiver<InboxRequest>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx, timeout }, rx)
    }

    pub async fn request(
        &self,
        ctx: &SessionContext,
        category: Category,
        page: u32,
    ) -> Result<Vec<ChatEntry>, SourceError> {
        if category.is_trip() {
            return Err(SourceError::UnsupportedCategory(category));
        }

        let (reply, response) = oneshot::channel();
        let request = InboxRequest {
            ctx: ctx.clone(),
            category,
            page,
            reply,
        };

        self.tx
            .send(request)
            .await
            .map_err(|_| SourceError::Channel("inbox transport stopped".to_string()))?;

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SourceError::Channel("inbox request dropped".to_string())),
            Err(_) => {
                tracing::warn!("Inbox {} page {} timed out after {:?}", category, page, self.timeout);
                Err(SourceError::Network("inbox response timed out".to_string()))
            }
        }
    }
}

#[async_trait]
impl PageSource for InboxChannel {
    type Item = ChatEntry;

    async fn fetch_page(
        &self,
        ctx: &SessionContext,
        category: Category,
        page: u32,
    ) -> Result<Vec<ChatEntry>, SourceError> {
        self.request(ctx, category, page).await
    }
}

/// Serve inbox requests by polling the backend's chat list endpoint
pub fn spawn_http_transport(
    mut requests: mpsc::Receiver<InboxRequest>,
    backend: Arc<BackendClient>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let backend = backend.clone();
            tokio::spawn(async move {
                let result = backend
                    .fetch_chats(&request.ctx, request.category, request.page)
                    .await;
                if !request.respond(result) {
                    tracing::debug!("Inbox requester went away before the response arrived");
                }
            });
        }
        tracing::info!("Inbox transport stopped");
    })
}

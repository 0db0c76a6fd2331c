use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::{FeedMachine, Paginator, SessionContext, TransitionTicket};
use crate::models::{Category, ChatEntry, FilterCriteria, TripListing};

/// State owned by one mounted client session
#[derive(Debug)]
pub struct Session {
    pub ctx: SessionContext,
    pub feed: FeedMachine,
    pub trips: Paginator<TripListing>,
    pub chats: Paginator<ChatEntry>,
    pub filter: FilterCriteria,
}

impl Session {
    pub fn new(ctx: SessionContext, feed: FeedMachine, merge_categories: &[Category]) -> Self {
        Self {
            ctx,
            feed,
            trips: Paginator::new().with_merge_categories(merge_categories.iter().copied()),
            chats: Paginator::new().with_merge_categories(merge_categories.iter().copied()),
            filter: FilterCriteria::default(),
        }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session limit of {0} reached")]
    Full(u64),
}

/// Open sessions keyed by id; idle sessions are evicted
///
/// The cache itself is unbounded. The session limit is enforced when a
/// session is opened, so an accepted session is never evicted for space.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: moka::future::Cache<Uuid, SessionHandle>,
    max_sessions: u64,
    admission: Arc<Mutex<()>>,
}

impl SessionRegistry {
    pub fn new(max_sessions: u64, idle_timeout: Duration) -> Self {
        let sessions = moka::future::Cache::builder()
            .time_to_idle(idle_timeout)
            .build();
        Self {
            sessions,
            max_sessions,
            admission: Arc::new(Mutex::new(())),
        }
    }

    pub async fn open(&self, session: Session) -> Result<Uuid, SessionError> {
        let _admission = self.admission.lock().await;

        // settle expirations and removals so the count is exact
        self.sessions.run_pending_tasks().await;
        if self.sessions.entry_count() >= self.max_sessions {
            tracing::warn!("Refusing session: {} of {} open", self.sessions.entry_count(), self.max_sessions);
            return Err(SessionError::Full(self.max_sessions));
        }

        let id = Uuid::new_v4();
        self.sessions.insert(id, Arc::new(Mutex::new(session))).await;
        tracing::info!("Opened session {}", id);
        Ok(id)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id).await
    }

    /// Unmount a session; pending presentation timers become no-ops
    pub async fn close(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).await.is_some();
        if removed {
            tracing::info!("Closed session {}", id);
        }
        removed
    }

    pub fn count(&self) -> u64 {
        self.sessions.entry_count()
    }

    /// Complete a transient feed state now, or after its presentation interval
    pub fn finish_transient(
        &self,
        id: Uuid,
        session: &mut Session,
        ticket: TransitionTicket,
        presentation: Duration,
    ) {
        if presentation.is_zero() {
            session.feed.complete(ticket);
        } else {
            self.settle_after(id, ticket, presentation);
        }
    }

    pub fn settle_after(&self, id: Uuid, ticket: TransitionTicket, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match registry.get(&id).await {
                Some(handle) => {
                    let mut session = handle.lock().await;
                    if !session.feed.complete(ticket) {
                        tracing::debug!("Session {} ignored stale ticket {:?}", id, ticket);
                    }
                }
                None => tracing::debug!("Session {} closed before its transition settled", id),
            }
        })
    }
}

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::source::{PageSource, SessionContext, SourceError};
use crate::models::{Category, Identified};

/// Errors raised by the pagination cursor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("no more pages for {0}")]
    Exhausted(Category),

    #[error("a fetch for {0} is already in flight")]
    InFlight(Category),

    #[error("fetch ticket for {0} is not current")]
    StaleTicket(Category),

    #[error("fetching {category} page {page} failed: {source}")]
    Source {
        category: Category,
        page: u32,
        #[source]
        source: SourceError,
    },
}

/// How an incoming item whose id is already accumulated is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// Keep the stored item, discard the incoming one
    #[default]
    Drop,
    /// Replace the stored item in place
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Re-request the current page
    Next,
    /// Request the page after the current one
    More,
    /// Request page 1 and replace everything
    Refresh,
}

/// Handed out by [`Paginator::begin`], settled by [`Paginator::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub category: Category,
    pub page: u32,
    pub kind: FetchKind,
    seq: u64,
}

/// Cursor and accumulated items for one category
#[derive(Debug, Clone)]
pub struct PaginationState<T> {
    page: u32,
    has_more: bool,
    /// Sequence number of the fetch currently in flight
    pending: Option<u64>,
    next_seq: u64,
    policy: DedupPolicy,
    accumulated: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T: Identified> PaginationState<T> {
    fn new(policy: DedupPolicy) -> Self {
        Self {
            page: 1,
            has_more: true,
            pending: None,
            next_seq: 0,
            policy,
            accumulated: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    pub fn items(&self) -> &[T] {
        &self.accumulated
    }

    /// Append items in arrival order; returns how many ids were new
    fn merge(&mut self, items: Vec<T>) -> usize {
        let mut added = 0;
        for item in items {
            match self.positions.get(item.id()) {
                Some(&pos) => {
                    if self.policy == DedupPolicy::Merge {
                        self.accumulated[pos] = item;
                    }
                }
                None => {
                    self.positions
                        .insert(item.id().to_string(), self.accumulated.len());
                    self.accumulated.push(item);
                    added += 1;
                }
            }
        }
        added
    }

    fn reset(&mut self) {
        self.accumulated.clear();
        self.positions.clear();
    }
}

/// Per-category pagination with dedup by identifier
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    states: HashMap<Category, PaginationState<T>>,
    merge_categories: HashSet<Category>,
}

impl<T: Identified> Default for Paginator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> Paginator<T> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            merge_categories: HashSet::new(),
        }
    }

    /// Categories whose duplicates replace the stored item instead of being dropped
    pub fn with_merge_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.merge_categories.extend(categories);
        self
    }

    pub fn policy_for(&self, category: Category) -> DedupPolicy {
        if self.merge_categories.contains(&category) {
            DedupPolicy::Merge
        } else {
            DedupPolicy::Drop
        }
    }

    pub fn state(&self, category: Category) -> Option<&PaginationState<T>> {
        self.states.get(&category)
    }

    pub fn items(&self, category: Category) -> &[T] {
        self.states
            .get(&category)
            .map(|s| s.items())
            .unwrap_or(&[])
    }

    pub fn page(&self, category: Category) -> u32 {
        self.states.get(&category).map_or(1, |s| s.page)
    }

    pub fn has_more(&self, category: Category) -> bool {
        self.states.get(&category).map_or(true, |s| s.has_more)
    }

    /// Mark a fetch in flight and pick the page to request
    pub fn begin(&mut self, category: Category, kind: FetchKind) -> Result<FetchTicket, PaginationError> {
        let policy = self.policy_for(category);
        let state = self
            .states
            .entry(category)
            .or_insert_with(|| PaginationState::new(policy));

        if state.pending.is_some() {
            return Err(PaginationError::InFlight(category));
        }

        let page = match kind {
            FetchKind::Next if !state.has_more => return Err(PaginationError::Exhausted(category)),
            FetchKind::More if !state.has_more => return Err(PaginationError::Exhausted(category)),
            FetchKind::Next => state.page,
            FetchKind::More => state.page + 1,
            FetchKind::Refresh => 1,
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending = Some(seq);
        tracing::debug!("Fetching {} page {} ({:?})", category, page, kind);

        Ok(FetchTicket { category, page, kind, seq })
    }

    /// Settle a fetch started with [`begin`](Self::begin)
    ///
    /// On failure nothing but the in-flight flag changes. On success returns
    /// the number of items whose id was not accumulated before.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<T>, SourceError>,
    ) -> Result<usize, PaginationError> {
        let state = match self.states.get_mut(&ticket.category) {
            Some(state) if state.pending == Some(ticket.seq) => state,
            _ => return Err(PaginationError::StaleTicket(ticket.category)),
        };
        state.pending = None;

        let items = result.map_err(|source| PaginationError::Source {
            category: ticket.category,
            page: ticket.page,
            source,
        })?;

        let added = match ticket.kind {
            FetchKind::Refresh => {
                let received = !items.is_empty();
                state.reset();
                let added = state.merge(items);
                state.page = 1;
                state.has_more = received;
                added
            }
            FetchKind::Next | FetchKind::More => {
                let added = state.merge(items);
                state.page = ticket.page;
                state.has_more = added > 0;
                added
            }
        };

        tracing::debug!(
            "{} page {}: {} new, {} total, has_more={}",
            ticket.category,
            ticket.page,
            added,
            state.accumulated.len(),
            state.has_more
        );

        Ok(added)
    }

    /// Abandon a fetch that will never be applied
    ///
    /// Only the ticket's own fetch is released; a later fetch for the same
    /// category stays in flight.
    pub fn cancel(&mut self, ticket: FetchTicket) -> bool {
        match self.states.get_mut(&ticket.category) {
            Some(state) if state.pending == Some(ticket.seq) => {
                state.pending = None;
                true
            }
            _ => false,
        }
    }

    pub async fn fetch_next_page<S>(
        &mut self,
        source: &S,
        ctx: &SessionContext,
        category: Category,
    ) -> Result<usize, PaginationError>
    where
        S: PageSource<Item = T> + ?Sized,
    {
        self.run(source, ctx, category, FetchKind::Next).await
    }

    pub async fn load_more<S>(
        &mut self,
        source: &S,
        ctx: &SessionContext,
        category: Category,
    ) -> Result<usize, PaginationError>
    where
        S: PageSource<Item = T> + ?Sized,
    {
        self.run(source, ctx, category, FetchKind::More).await
    }

    pub async fn refresh<S>(
        &mut self,
        source: &S,
        ctx: &SessionContext,
        category: Category,
    ) -> Result<usize, PaginationError>
    where
        S: PageSource<Item = T> + ?Sized,
    {
        self.run(source, ctx, category, FetchKind::Refresh).await
    }

    async fn run<S>(
        &mut self,
        source: &S,
        ctx: &SessionContext,
        category: Category,
        kind: FetchKind,
    ) -> Result<usize, PaginationError>
    where
        S: PageSource<Item = T> + ?Sized,
    {
        let ticket = self.begin(category, kind)?;
        let result = source.fetch_page(ctx, category, ticket.page).await;
        self.apply(ticket, result)
    }
}

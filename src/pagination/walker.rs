//! Collection walker
//!
//! Drives the fetcher across a cursor-linked collection, one page at a time,
//! resolving every page's entry URLs concurrently before following `next`.

use super::types::{Page, WalkConfig, WalkOutcome, WalkState, WalkStatus};
use crate::error::Result;
use crate::http::{ConcurrencyLimiter, Fetcher, RetryBudget};
use crate::query::append_query_param;
use crate::types::{JsonValue, ResourceType};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Walks a paginated collection to exhaustion or to its ceiling
pub struct PaginationWalker {
    fetcher: Arc<dyn Fetcher>,
    limiter: ConcurrencyLimiter,
    config: WalkConfig,
}

impl PaginationWalker {
    /// Create a walker over `fetcher`
    pub fn new(fetcher: Arc<dyn Fetcher>, config: WalkConfig) -> Self {
        Self {
            fetcher,
            limiter: ConcurrencyLimiter::new(config.concurrency),
            config,
        }
    }

    /// Get the walk configuration
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// URL of the first page of `resource` starting at `offset`
    pub fn first_page_url(&self, resource: &ResourceType, offset: u64) -> String {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            resource.as_str()
        );
        let url = append_query_param(&url, "limit", self.config.limit);
        append_query_param(&url, "offset", offset)
    }

    /// Collect every item of `resource` from `offset` onwards.
    ///
    /// Never fails: a page or item failure ends the walk as
    /// [`WalkStatus::Aborted`] with the items of all earlier pages. So does a
    /// `next` link pointing at a page this walk already fetched.
    pub async fn walk_all(&self, resource: &ResourceType, offset: u64) -> WalkOutcome {
        let budget = RetryBudget::new(self.config.max_retries);
        let mut outcome = WalkOutcome::default();
        let mut state = WalkState::Start;
        let mut visited = HashSet::new();

        loop {
            state = match state {
                WalkState::Start => WalkState::FetchingPage(self.first_page_url(resource, offset)),
                WalkState::FetchingPage(url) if !visited.insert(url.clone()) => {
                    WalkState::Aborted(format!("Page {url} was already fetched"))
                }
                WalkState::FetchingPage(url) => match self.fetch_page(&url, &budget).await {
                    Ok(page) => {
                        outcome.pages += 1;
                        outcome.total_count = Some(page.count);
                        WalkState::ResolvingItems(page)
                    }
                    Err(e) => WalkState::Aborted(e.to_string()),
                },
                WalkState::ResolvingItems(page) => {
                    let take = self.config.remaining(outcome.items.len());
                    match self.resolve_items(&page, take, &budget).await {
                        Ok(items) => {
                            debug!(
                                "Resolved {} {} items on page {}",
                                items.len(),
                                resource,
                                outcome.pages
                            );
                            outcome.items.extend(items);
                            match page.next_url() {
                                Some(next) if self.config.remaining(outcome.items.len()) > 0 => {
                                    WalkState::FetchingPage(next.to_string())
                                }
                                _ => WalkState::Done,
                            }
                        }
                        Err(e) => WalkState::Aborted(e.to_string()),
                    }
                }
                WalkState::Done => {
                    info!(
                        "Collected {} {} items in {} pages",
                        outcome.items.len(),
                        resource,
                        outcome.pages
                    );
                    outcome.status = WalkStatus::Done;
                    break;
                }
                WalkState::Aborted(reason) => {
                    warn!(
                        "Walk of {} aborted after {} items: {}",
                        resource,
                        outcome.items.len(),
                        reason
                    );
                    outcome.status = WalkStatus::Aborted { reason };
                    break;
                }
            };
        }

        outcome
    }

    async fn fetch_page(&self, url: &str, budget: &RetryBudget) -> Result<Page> {
        let budget = budget.for_request(self.config.retry_scope);
        let body = self.fetcher.fetch(url, &budget).await?;
        Page::from_value(url, body)
    }

    /// Fetch up to `take` entries of `page` in result order
    async fn resolve_items(
        &self,
        page: &Page,
        take: usize,
        budget: &RetryBudget,
    ) -> Result<Vec<JsonValue>> {
        let fetches = page.item_urls().take(take).map(|url| {
            let budget = budget.for_request(self.config.retry_scope);
            self.limiter
                .run(async move { self.fetcher.fetch(url, &budget).await })
        });

        try_join_all(fetches).await
    }
}

impl std::fmt::Debug for PaginationWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationWalker")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

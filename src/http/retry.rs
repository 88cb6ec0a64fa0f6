//! Rate-limit retry budget
//!
//! A budget is passed explicitly into every fetch. Clones share the same
//! counter, so one budget can span a whole walk while concurrent item
//! fetches draw from it.

use crate::types::RetryScope;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Counter of rate-limit retries still available
#[derive(Debug, Clone)]
pub struct RetryBudget {
    max_retries: u32,
    used: Arc<AtomicU32>,
}

impl RetryBudget {
    /// Create a budget allowing `max_retries` retries
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            used: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Budget for the next request under `scope`.
    ///
    /// `PerWalk` shares this budget's counter, `PerRequest` starts from zero.
    pub fn for_request(&self, scope: RetryScope) -> Self {
        match scope {
            RetryScope::PerWalk => self.clone(),
            RetryScope::PerRequest => Self::new(self.max_retries),
        }
    }

    /// Take one retry from the budget. Returns false once it is exhausted.
    pub fn try_consume(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.max_retries).then_some(used + 1)
            })
            .is_ok()
    }

    /// Retries consumed so far
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    /// Retries still available
    pub fn remaining(&self) -> u32 {
        self.max_retries.saturating_sub(self.used())
    }

    /// Configured maximum
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

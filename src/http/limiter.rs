//! Bounded concurrency for outbound requests
//!
//! Upstream fair-use limits care about how many requests are in flight at
//! once, which a token bucket alone does not bound. The limiter hands out at
//! most `max_concurrent` permits; excess callers queue on the semaphore in
//! arrival order and are admitted as permits free up.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Caps the number of simultaneously running futures
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting `max_concurrent` futures (at least one)
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// A limiter that fully serializes its callers
    pub fn serial() -> Self {
        Self::new(1)
    }

    /// Run `future` once a slot is free. The slot is released when the future
    /// completes, whatever its output.
    pub async fn run<F: Future>(&self, future: F) -> F::Output {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("limiter semaphore is never closed");
        future.await
    }

    /// Maximum number of concurrent runs
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// An async operation whose invocations share one [`ConcurrencyLimiter`]
#[derive(Debug, Clone)]
pub struct Limited<Op> {
    op: Op,
    limiter: ConcurrencyLimiter,
}

impl<Op> Limited<Op> {
    /// Invoke the wrapped operation under the limiter.
    ///
    /// `op` itself is only called once a slot is held, so work it starts
    /// eagerly is bounded too.
    pub async fn call<A, Fut>(&self, arg: A) -> Fut::Output
    where
        Op: Fn(A) -> Fut,
        Fut: Future,
    {
        self.limiter.run(async move { (self.op)(arg).await }).await
    }

    /// The limiter guarding this operation
    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }
}

/// Wrap `op` so that at most `max_concurrent` invocations run at once
pub fn limit<Op>(op: Op, max_concurrent: usize) -> Limited<Op> {
    Limited {
        op,
        limiter: ConcurrencyLimiter::new(max_concurrent),
    }
}

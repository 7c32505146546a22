//! Reuse pool for dispatch contexts.
//!
//! Each in-flight request checks out its own [`DispatchContext`]. The pool is
//! a mutex-guarded free list; the lock is held only to push or pop.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::DispatchContext;

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Contexts allocated up front.
    pub prewarm: usize,
    /// Idle contexts kept; extra contexts are dropped on release.
    pub max_idle: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            prewarm: 0,
            max_idle: 1024,
        }
    }
}

struct Inner {
    free: Mutex<Vec<DispatchContext>>,
    param_capacity: usize,
    max_idle: usize,
    created: AtomicU64,
}

/// A shared free list of [`DispatchContext`]s.
///
/// Cloning the pool is cheap and every clone shares the same free list.
///
/// # Example
///
/// ```rust
/// use galley_core::{ContextPool, PoolSettings};
///
/// let pool = ContextPool::new(2, PoolSettings::default());
/// {
///     let ctx = pool.acquire();
///     assert!(ctx.params().next().is_none());
/// } // returned to the pool here
/// assert_eq!(pool.idle(), 1);
/// assert_eq!(pool.created(), 1);
/// ```
#[derive(Clone)]
pub struct ContextPool {
    inner: Arc<Inner>,
}

impl fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("idle", &self.idle())
            .field("created", &self.created())
            .field("param_capacity", &self.inner.param_capacity)
            .field("max_idle", &self.inner.max_idle)
            .finish()
    }
}

impl ContextPool {
    /// Creates a pool whose contexts hold `param_capacity` parameters.
    ///
    /// `settings.prewarm` contexts are allocated immediately, capped at
    /// `settings.max_idle`.
    #[must_use]
    pub fn new(param_capacity: usize, settings: PoolSettings) -> Self {
        let prewarm = settings.prewarm.min(settings.max_idle);
        let free = (0..prewarm)
            .map(|_| DispatchContext::new(param_capacity))
            .collect();

        Self {
            inner: Arc::new(Inner {
                free: Mutex::new(free),
                param_capacity,
                max_idle: settings.max_idle,
                created: AtomicU64::new(prewarm as u64),
            }),
        }
    }

    /// Checks out a context, allocating one only if the pool is empty.
    ///
    /// The context returns to the pool when the guard is dropped.
    #[must_use]
    pub fn acquire(&self) -> PooledContext {
        let recycled = self.inner.free.lock().pop();
        let ctx = recycled.unwrap_or_else(|| {
            self.inner.created.fetch_add(1, Ordering::Relaxed);
            galley_telemetry::record_context_created();
            DispatchContext::new(self.inner.param_capacity)
        });

        PooledContext {
            ctx: Some(ctx),
            pool: self.clone(),
        }
    }

    fn put_back(&self, mut ctx: DispatchContext) {
        ctx.recycle();
        let mut free = self.inner.free.lock();
        if free.len() < self.inner.max_idle {
            free.push(ctx);
        }
    }

    /// Returns the number of idle contexts.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.inner.free.lock().len()
    }

    /// Returns the number of contexts ever allocated, including prewarmed ones.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.inner.created.load(Ordering::Relaxed)
    }

    /// Returns the parameter capacity of pooled contexts.
    #[must_use]
    pub fn param_capacity(&self) -> usize {
        self.inner.param_capacity
    }
}

/// A checked-out context.
///
/// Dereferences to [`DispatchContext`]. Dropping the guard returns the
/// context to its pool on every exit path, including unwinding and
/// cancelled futures.
pub struct PooledContext {
    ctx: Option<DispatchContext>,
    pool: ContextPool,
}

impl PooledContext {
    /// Returns the context to the pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl fmt::Debug for PooledContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledContext").field(&self.ctx).finish()
    }
}

impl Deref for PooledContext {
    type Target = DispatchContext;

    fn deref(&self) -> &DispatchContext {
        // Only `Drop` takes the context out.
        self.ctx.as_ref().unwrap_or_else(|| unreachable!("context taken before drop"))
    }
}

impl DerefMut for PooledContext {
    fn deref_mut(&mut self) -> &mut DispatchContext {
        self.ctx.as_mut().unwrap_or_else(|| unreachable!("context taken before drop"))
    }
}

impl Drop for PooledContext {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.pool.put_back(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::not_found_chain;
    use crate::request_id::RequestId;
    use galley_router::Span;
    use http::Method;

    #[test]
    fn test_acquire_allocates_when_empty() {
        let pool = ContextPool::new(1, PoolSettings::default());
        assert_eq!(pool.idle(), 0);

        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.created(), 2);

        drop(a);
        b.release();
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_acquire_reuses_released_context() {
        let pool = ContextPool::new(1, PoolSettings::default());
        pool.acquire().release();
        let _ctx = pool.acquire();
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_prewarm() {
        let pool = ContextPool::new(
            0,
            PoolSettings {
                prewarm: 4,
                max_idle: 8,
            },
        );
        assert_eq!(pool.idle(), 4);
        assert_eq!(pool.created(), 4);

        let _ctx = pool.acquire();
        assert_eq!(pool.created(), 4);
        assert_eq!(pool.idle(), 3);
    }

    #[test]
    fn test_max_idle_drops_extra_contexts() {
        let pool = ContextPool::new(
            0,
            PoolSettings {
                prewarm: 0,
                max_idle: 1,
            },
        );
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_released_context_drops_request_state() {
        let pool = ContextPool::new(1, PoolSettings::default());
        {
            let mut ctx = pool.acquire();
            ctx.reset(RequestId::new(), Method::GET, "/users/9", not_found_chain());
            ctx.params_mut().push(Span::new(7, 8));
            ctx.set("secret", String::from("token"));
        }

        let ctx = pool.acquire();
        assert!(!ctx.contains("secret"));
        assert_eq!(ctx.params().count(), 0);
    }

    #[test]
    fn test_context_returns_after_panic() {
        let pool = ContextPool::new(0, PoolSettings::default());
        let cloned = pool.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ctx = cloned.acquire();
            panic!("handler blew up");
        }));

        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_acquire_release() {
        let pool = ContextPool::new(0, PoolSettings::default());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    for _ in 0..50 {
                        let mut ctx = pool.acquire();
                        ctx.set("n", 1_u8);
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert!(pool.created() <= 16);
        assert_eq!(pool.idle() as u64, pool.created());
    }
}

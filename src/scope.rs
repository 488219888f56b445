use std::ops::{Deref, DerefMut};

use crate::pool::Pool;

/// RAII session around a [`Pool`]: dropping the guard stops every worker
/// and joins it, whether the scope exits normally or by unwinding.
///
/// The guard derefs to the pool, so the whole pool surface is available
/// on it directly.
pub struct ScopedPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pool: Pool<I, O>,
}

impl<I, O> ScopedPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn new() -> Self {
        Self { pool: Pool::new() }
    }
}

impl<I, O> Default for ScopedPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> Deref for ScopedPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    type Target = Pool<I, O>;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl<I, O> DerefMut for ScopedPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool
    }
}

impl<I, O> Drop for ScopedPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn drop(&mut self) {
        self.pool.cleanup_all(true);
    }
}

/// Runs `f` against a fresh pool and guarantees a full stop-and-join of
/// every worker before returning, even if `f` panics.
pub fn scope<I, O, T, F>(f: F) -> T
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnOnce(&mut Pool<I, O>) -> T,
{
    let mut scoped = ScopedPool::new();
    f(&mut scoped.pool)
}

//! Recycled per-request scratch buffers.
//!
//! A buffer is taken from the pool when a dispatch starts and handed back by the guard's `Drop`,
//! so it returns on every exit path: normal completion, a filter that short-circuits, an error or
//! a panic unwinding through the handler.

use crossbeam::queue::ArrayQueue;
use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

pub(crate) const DEFAULT_POOL_SIZE: usize = 1024;

/// Resets a value before it goes back into the pool.
pub(crate) trait Recycle {
    fn recycle(&mut self);
}

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) {
        self.clear();
    }
}

pub(crate) struct Pool<T> {
    queue: ArrayQueue<T>,
}

impl<T: Default + Recycle> Pool<T> {
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Pool {
            queue: ArrayQueue::new(capacity.max(1)),
        })
    }

    pub(crate) fn acquire(self: &Arc<Self>) -> Pooled<T> {
        Pooled {
            value: self.queue.pop().unwrap_or_default(),
            pool: Arc::clone(self),
        }
    }

    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.queue.len()
    }
}

/// A pooled value. It is cleared and returned to its pool when dropped; if the pool is full it is
/// simply freed.
pub(crate) struct Pooled<T: Default + Recycle> {
    value: T,
    pool: Arc<Pool<T>>,
}

impl<T: Default + Recycle> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Default + Recycle> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Default + Recycle> Drop for Pooled<T> {
    fn drop(&mut self) {
        let mut value = mem::take(&mut self.value);
        value.recycle();
        let _ = self.pool.queue.push(value);
    }
}

impl<T: Default + Recycle + Debug> Debug for Pooled<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn should_reuse_cleared_buffer() {
        let pool: Arc<Pool<Vec<u32>>> = Pool::new(4);
        {
            let mut buf = pool.acquire();
            buf.extend([1, 2, 3]);
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 3);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn should_return_buffer_on_panic() {
        let pool: Arc<Pool<Vec<u32>>> = Pool::new(4);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut buf = pool.acquire();
            buf.push(1);
            panic!("handler failed");
        }));

        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
        assert!(pool.acquire().is_empty());
    }

    #[test]
    fn should_drop_buffers_beyond_capacity() {
        let pool: Arc<Pool<Vec<u32>>> = Pool::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }
}

//! Error types returned by queue construction and by enqueue/dequeue.

use thiserror::Error;

/// Construction failed; the queue was never created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    /// Capacity is below 2, not a power of two, or its slot array would not
    /// fit in the address space.
    #[error("invalid capacity {0}: must be a power of two >= 2 that fits in the address space")]
    InvalidCapacity(usize),

    /// The allocator could not provide the slot array.
    #[error("failed to allocate slot array for capacity {0}")]
    AllocationFailure(usize),
}

/// Every slot is occupied. Carries back the value that was not enqueued.
#[derive(Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    /// Recover the rejected value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl so `QueueFull<T>` is `Debug` (and thus an `Error`) for any `T`.
impl<T> std::fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

/// No published element is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is empty")]
pub struct QueueEmpty;

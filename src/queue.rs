//! Typed front end over [`RawQueue`].

use core::fmt;
use core::marker::PhantomData;

use crate::error::{InitError, QueueEmpty, QueueFull};
use crate::raw::RawQueue;
use crate::trace::{debug, trace};
use crate::word::Word;

/// Bounded lock-free MPMC queue of `T`.
///
/// Values that fit in a machine word (integers, pointers, `Box`es, small
/// `Copy` structs) are stored directly in the slot. Larger values are moved
/// into a `Box` on enqueue and moved back out on dequeue, so ownership
/// travels through the queue without cloning. See [`Queue::STORES_INLINE`].
///
/// Dropping the queue drops every element still inside it.
///
/// # Example
///
/// ```
/// use bounded_mpmc::{Queue, QueueFull};
///
/// let q = Queue::<String>::new(2)?;
/// q.enqueue("a".to_string()).unwrap();
/// q.enqueue("b".to_string()).unwrap();
/// let QueueFull(rejected) = q.enqueue("c".to_string()).unwrap_err();
/// assert_eq!(rejected, "c");
/// assert_eq!(q.dequeue().unwrap(), "a");
/// # Ok::<(), bounded_mpmc::InitError>(())
/// ```
pub struct Queue<T> {
    raw: RawQueue,
    _marker: PhantomData<T>,
}

// SAFETY: each element is moved in by one thread and out by exactly one
// other; `RawQueue` orders the hand-off. Sharing the queue never exposes `&T`.
unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Send> Sync for Queue<T> {}

impl<T> Queue<T> {
    /// Whether elements live directly in the slot (`true`) or in a `Box`
    /// owned by the slot (`false`).
    pub const STORES_INLINE: bool = Word::fits::<T>();

    /// Create a queue with room for `capacity` elements. `capacity` must be a
    /// power of two, at least 2.
    pub fn new(capacity: usize) -> Result<Self, InitError> {
        let raw = RawQueue::new(capacity)?;
        debug!(
            element = core::any::type_name::<T>(),
            inline = Self::STORES_INLINE,
            "typed queue ready"
        );
        Ok(Queue {
            raw,
            _marker: PhantomData,
        })
    }

    /// Append `value`. If the queue is full the value comes back inside
    /// [`QueueFull`].
    pub fn enqueue(&self, value: T) -> Result<(), QueueFull<T>> {
        let word = Self::into_word(value);
        self.raw.enqueue(word).map_err(|QueueFull(word)| {
            // SAFETY: `word` was packed just above and never reached a slot.
            QueueFull(unsafe { Self::from_word(word) })
        })
    }

    /// Remove the oldest element, or report [`QueueEmpty`].
    pub fn dequeue(&self) -> Result<T, QueueEmpty> {
        let word = self.raw.dequeue()?;
        // SAFETY: every word in `raw` was packed by `enqueue` for this `T`,
        // and winning the dequeue makes this the only unpack of it.
        Ok(unsafe { Self::from_word(word) })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Snapshot of the number of queued elements; may be stale under
    /// concurrency.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Snapshot check for emptiness.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Snapshot check for fullness.
    pub fn is_full(&self) -> bool {
        self.raw.is_full()
    }

    fn into_word(value: T) -> Word {
        // SAFETY: `T` (or `Box<T>`, which is one pointer) fits in a word, and
        // the resulting word is the sole owner of the value.
        unsafe {
            if Self::STORES_INLINE {
                Word::pack(value)
            } else {
                Word::pack(Box::new(value))
            }
        }
    }

    /// # Safety
    ///
    /// `word` must come from `into_word` for this `T` and be unpacked once.
    unsafe fn from_word(word: Word) -> T {
        if Self::STORES_INLINE {
            word.unpack::<T>()
        } else {
            *word.unpack::<Box<T>>()
        }
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        // `&mut self` means no enqueue/dequeue can be in flight.
        let mut drained = 0usize;
        while let Ok(value) = self.dequeue() {
            drop(value);
            drained += 1;
        }
        if drained > 0 {
            trace!(drained, "dropped elements left in queue");
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("inline", &Self::STORES_INLINE)
            .finish()
    }
}

//! The lock-free engine: generation-tagged slots and two position counters.
//!
//! # Algorithm
//!
//! This is Dmitry Vyukov's bounded MPMC queue over opaque [`Word`] payloads:
//!
//! - Slot `i` starts with `seq = i`, meaning "empty, waiting for the
//!   producer at position `i`".
//! - A producer at position `pos` may take the slot when `seq == pos`. It
//!   claims `pos` by CAS on `enqueue_pos`, writes the payload, then publishes
//!   with a release store of `seq = pos + 1`.
//! - A consumer at position `pos` may take the slot when `seq == pos + 1`. It
//!   claims `pos` by CAS on `dequeue_pos`, reads the payload, then hands the
//!   slot to the next generation with a release store of `seq = pos + capacity`.
//! - A sequence behind the expected value means full (producer) or empty
//!   (consumer). A sequence ahead of it means the position snapshot is
//!   stale, so the thread reloads and retries.
//!
//! Positions wrap around `usize`. All comparisons use the signed wrapping
//! difference, which makes wrapped counters behave like unbounded ones.
//!
//! # Memory ordering
//!
//! Position counters are only loaded and CASed with `Relaxed`. The acquire
//! load / release store pair on each slot's `seq` is the only thing that
//! orders payload accesses between threads. Under `--cfg loom` the payload
//! cell is loom's, so the model checker flags any access that this pair
//! fails to order.

use core::fmt;
use core::mem::size_of;

use crossbeam_utils::{Backoff, CachePadded};

use crate::error::{InitError, QueueEmpty, QueueFull};
use crate::sync::{AtomicUsize, Ordering, UnsafeCell};
use crate::trace::{debug, warn};
use crate::word::Word;

/// One cell of the ring.
struct Slot {
    /// `pos` when empty for the producer at `pos`, `pos + 1` when holding
    /// that producer's payload.
    sequence: AtomicUsize,
    payload: UnsafeCell<Word>,
}

impl Slot {
    fn new(sequence: usize) -> Self {
        Slot {
            sequence: AtomicUsize::new(sequence),
            payload: UnsafeCell::new(Word::uninit()),
        }
    }
}

/// Slot array and index mask. Read-only after construction, so it shares a
/// cache line with nothing that is written.
struct Ring {
    slots: Box<[Slot]>,
    mask: usize,
}

/// Bounded lock-free MPMC queue of [`Word`] payloads.
///
/// Any number of threads may call [`enqueue`](Self::enqueue) and
/// [`dequeue`](Self::dequeue) concurrently. Neither call blocks: a full or
/// empty queue is reported immediately.
///
/// The engine never interprets payloads. Dropping a `RawQueue` frees the slot
/// array only; anything a queued word points to is the caller's to release.
/// Use [`Queue`](crate::Queue) for owned, typed elements.
pub struct RawQueue {
    ring: CachePadded<Ring>,
    enqueue_pos: CachePadded<AtomicUsize>,
    dequeue_pos: CachePadded<AtomicUsize>,
}

// SAFETY: slot payloads are only touched by the thread that won the position
// CAS for that slot's current generation, and the hand-off between threads is
// ordered by the release/acquire pair on `sequence`.
unsafe impl Send for RawQueue {}
unsafe impl Sync for RawQueue {}

impl RawQueue {
    /// Allocate a queue with room for `capacity` payloads.
    ///
    /// `capacity` must be a power of two, at least 2. Fails with
    /// [`InitError::InvalidCapacity`] otherwise, or when the slot array would
    /// not fit in the address space, and with [`InitError::AllocationFailure`]
    /// when the allocator refuses.
    pub fn new(capacity: usize) -> Result<Self, InitError> {
        Self::with_origin(capacity, 0)
    }

    /// Build a queue whose positions start at `origin` instead of zero.
    /// Lets tests drive the counters across the `usize` wrap.
    pub(crate) fn with_origin(capacity: usize, origin: usize) -> Result<Self, InitError> {
        if capacity < 2 || !capacity.is_power_of_two() {
            warn!(capacity, "rejected capacity");
            return Err(InitError::InvalidCapacity(capacity));
        }
        match capacity.checked_mul(size_of::<Slot>()) {
            Some(bytes) if bytes <= isize::MAX as usize => {}
            _ => {
                warn!(capacity, "slot array exceeds address space");
                return Err(InitError::InvalidCapacity(capacity));
            }
        }

        let mut slots: Vec<Slot> = Vec::new();
        if slots.try_reserve_exact(capacity).is_err() {
            warn!(capacity, "slot array allocation failed");
            return Err(InitError::AllocationFailure(capacity));
        }
        let mask = capacity - 1;
        // The slot at index `i` waits for the first position in
        // `origin..origin + capacity` that maps to `i`.
        slots.extend((0..capacity).map(|index| {
            Slot::new(origin.wrapping_add(index.wrapping_sub(origin) & mask))
        }));

        debug!(capacity, slot_bytes = size_of::<Slot>(), "allocated queue");

        Ok(RawQueue {
            ring: CachePadded::new(Ring {
                slots: slots.into_boxed_slice(),
                mask,
            }),
            enqueue_pos: CachePadded::new(AtomicUsize::new(origin)),
            dequeue_pos: CachePadded::new(AtomicUsize::new(origin)),
        })
    }

    /// Append `payload`, or hand it back inside [`QueueFull`] if every slot
    /// is occupied.
    pub fn enqueue(&self, payload: Word) -> Result<(), QueueFull<Word>> {
        let backoff = Backoff::new();
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);

        let slot = loop {
            let slot = &self.ring.slots[pos & self.ring.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos) as isize;

            if diff == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break slot,
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                // Last generation's element at this index is still unread.
                return Err(QueueFull(payload));
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        };

        // SAFETY: winning the CAS for `pos` while `seq == pos` gives this
        // thread exclusive access to the slot until the store below.
        slot.payload.with_mut(|cell| unsafe { *cell = payload });
        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Take the oldest published payload, or [`QueueEmpty`] if there is none.
    pub fn dequeue(&self) -> Result<Word, QueueEmpty> {
        let backoff = Backoff::new();
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);

        let slot = loop {
            let slot = &self.ring.slots[pos & self.ring.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break slot,
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                return Err(QueueEmpty);
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        };

        // SAFETY: `seq == pos + 1` was observed with acquire, so the
        // producer's write is visible, and the CAS makes this thread the only
        // reader of this generation.
        let payload = slot.payload.with(|cell| unsafe { *cell });
        slot.sequence
            .store(pos.wrapping_add(self.ring.mask).wrapping_add(1), Ordering::Release);
        Ok(payload)
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.ring.mask + 1
    }

    /// Approximate number of claimed positions not yet dequeued.
    ///
    /// A snapshot only: under concurrency it may be stale by the time it
    /// returns. Always within `0..=capacity`.
    pub fn len(&self) -> usize {
        let head = self.dequeue_pos.load(Ordering::Relaxed);
        let tail = self.enqueue_pos.load(Ordering::Relaxed);
        let diff = tail.wrapping_sub(head) as isize;
        diff.clamp(0, self.capacity() as isize) as usize
    }

    /// Snapshot check for emptiness. See [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot check for fullness. See [`len`](Self::len).
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }
}

impl fmt::Debug for RawQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

//! bounded_mpmc - fixed-capacity lock-free MPMC queue (Vyukov-style, CAS-claimed slots)
//!
//! Two layers:
//!
//! - [`RawQueue`]: the engine. A power-of-two ring of generation-tagged slots,
//!   each carrying one opaque [`Word`], plus cache-padded enqueue and dequeue
//!   positions. No locks, no blocking: full and empty are reported at once.
//! - [`Queue<T>`]: the typed adapter. Moves owned `T` values through the
//!   engine, inline when they fit in a word and boxed otherwise.
//!
//! ```
//! use bounded_mpmc::Queue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let q = Arc::new(Queue::<u64>::new(16)?);
//! let producer = {
//!     let q = q.clone();
//!     thread::spawn(move || {
//!         for i in 0..100 {
//!             let mut item = i;
//!             while let Err(full) = q.enqueue(item) {
//!                 item = full.into_inner();
//!                 std::hint::spin_loop();
//!             }
//!         }
//!     })
//! };
//!
//! let mut sum = 0;
//! let mut received = 0;
//! while received < 100 {
//!     if let Ok(v) = q.dequeue() {
//!         sum += v;
//!         received += 1;
//!     }
//! }
//! producer.join().unwrap();
//! assert_eq!(sum, 4950);
//! # Ok::<(), bounded_mpmc::InitError>(())
//! ```
#![warn(missing_docs)]

mod error;
mod queue;
mod raw;
mod sync;
mod trace;
mod word;

pub use error::{InitError, QueueEmpty, QueueFull};
pub use queue::Queue;
pub use raw::RawQueue;
pub use trace::init_tracing;
pub use word::Word;

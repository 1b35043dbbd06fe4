//! Bounded Lock-Free Queues Between Manager Tasks
#![allow(unsafe_code)] // Required for the lock-free ring buffer
//!
//! ## Overview
//!
//! Every channel between managers is one of these: a fixed-capacity ring
//! with atomic head/tail indices, carrying a `Copy` message type. Control
//! commands, telemetry events, parameter requests, config updates and log
//! lines all ride the same structure at different depths.
//!
//! ```text
//! Producer tick                     Consumer tick
//!      ↓                                 ↓
//!   push (never blocks) ─► ring ─► pop (never blocks)
//! ```
//!
//! A full queue drops the new message and counts the drop; a manager tick
//! must never stall because its peer is behind. The failsafe logic depends
//! on this: an empty command queue is an observation, not an error.
//!
//! ## Algorithm
//!
//! Ring buffer with one permanently empty slot, so `N` slots hold at most
//! `N - 1` messages:
//!
//! ```text
//! ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//! │  0  │  1  │  2  │  3  │  4  │  5  │  6  │  7  │
//! └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!          ↑                       ↑
//!        tail                    head
//!        (next read)          (next write)
//! ```
//!
//! `N` must be a power of two so index wrap is a mask, not a division.
//!
//! ## Memory Ordering
//!
//! - **Acquire** on index loads: see the slot write that preceded the
//!   matching release
//! - **Release** on index stores: publish the slot write before moving
//!   the index
//! - **Relaxed** for statistics counters, which observers only sample
//!
//! Each queue has one producer. Pop claims the tail slot with a CAS so a
//! diagnostic reader on another core cannot race the owning consumer.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ptr;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Queue health counters
///
/// Sampled for diagnostics; never part of control flow.
pub struct QueueStats {
    /// Total messages accepted
    pub pushed: AtomicU32,
    /// Total messages handed to a consumer
    pub popped: AtomicU32,
    /// Messages rejected because the ring was full
    pub dropped: AtomicU32,
    /// Deepest occupancy observed
    pub max_depth: AtomicU32,
}

impl QueueStats {
    const fn new() -> Self {
        Self {
            pushed: AtomicU32::new(0),
            popped: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            max_depth: AtomicU32::new(0),
        }
    }

    fn update_max_depth(&self, current: u32) {
        let mut max = self.max_depth.load(Ordering::Relaxed);
        while current > max {
            match self.max_depth.compare_exchange_weak(
                max,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => max = actual,
            }
        }
    }
}

/// Bounded lock-free message ring
///
/// `N` slots hold `N - 1` messages. Declare one per channel and hand
/// shared references to the producing and consuming managers:
///
/// ```rust
/// use skyhelm_core::queue::MessageQueue;
/// use skyhelm_core::command::ControlCommand;
///
/// static COMMANDS: MessageQueue<ControlCommand, 8> = MessageQueue::new();
///
/// // System manager tick
/// COMMANDS.push(ControlCommand::neutral());
///
/// // Attitude manager tick
/// while let Some(cmd) = COMMANDS.pop() {
///     let _ = cmd;
/// }
/// ```
pub struct MessageQueue<T: Copy, const N: usize> {
    /// Ring storage; slots outside [tail, head) are uninitialized
    buffer: UnsafeCell<[MaybeUninit<T>; N]>,

    /// Next write position (producer owned)
    head: AtomicUsize,

    /// Next read position (consumer owned, CAS claimed)
    tail: AtomicUsize,

    /// Health counters
    stats: QueueStats,
}

impl<T: Copy, const N: usize> MessageQueue<T, N> {
    /// Index wrap requires a power-of-two slot count
    const CAPACITY_OK: () = assert!(N.is_power_of_two() && N >= 2);

    /// Create an empty queue; usable in static context
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::CAPACITY_OK;
        Self {
            buffer: UnsafeCell::new([MaybeUninit::uninit(); N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            stats: QueueStats::new(),
        }
    }

    /// Messages the ring can hold at once
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Push a message; `false` means the ring was full and the message
    /// was dropped
    ///
    /// Must only be called from the single producing task.
    pub fn push(&self, message: T) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let next_head = (head + 1) & (N - 1);

        if next_head == self.tail.load(Ordering::Acquire) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // Sole producer; the slot at head is not visible to consumers yet
        unsafe {
            let buffer = &mut *self.buffer.get();
            buffer[head].write(message);
        }

        self.head.store(next_head, Ordering::Release);

        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.stats.update_max_depth(self.len() as u32);

        true
    }

    /// Pop the oldest message, or `None` when empty
    pub fn pop(&self) -> Option<T> {
        loop {
            let tail = self.tail.load(Ordering::Acquire);
            let head = self.head.load(Ordering::Acquire);

            if tail == head {
                return None;
            }

            let next_tail = (tail + 1) & (N - 1);
            match self.tail.compare_exchange_weak(
                tail,
                next_tail,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // Slot claimed; nobody else will read it
                    let message = unsafe {
                        let buffer = &*self.buffer.get();
                        ptr::read(&buffer[tail]).assume_init()
                    };

                    self.stats.popped.fetch_add(1, Ordering::Relaxed);
                    return Some(message);
                }
                Err(_) => {
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Copy of the oldest message without removing it
    pub fn peek(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        unsafe {
            let buffer = &*self.buffer.get();
            Some(ptr::read(&buffer[tail]).assume_init())
        }
    }

    /// Current occupancy
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);

        if head >= tail {
            head - tail
        } else {
            N - tail + head
        }
    }

    /// Slots still free before pushes start dropping
    pub fn remaining_capacity(&self) -> usize {
        self.capacity() - self.len()
    }

    /// `true` when no message is waiting
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// `true` when the next push would drop
    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        ((head + 1) & (N - 1)) == tail
    }

    /// Health counters
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Drain all pending messages through an iterator
    pub fn drain(&self) -> QueueDrain<'_, T, N> {
        QueueDrain { queue: self }
    }
}

impl<T: Copy, const N: usize> Default for MessageQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// The ring synchronizes access itself; messages are plain Copy data
unsafe impl<T: Copy + Send, const N: usize> Send for MessageQueue<T, N> {}
unsafe impl<T: Copy + Send, const N: usize> Sync for MessageQueue<T, N> {}

/// Iterator that pops until the queue is empty
pub struct QueueDrain<'a, T: Copy, const N: usize> {
    queue: &'a MessageQueue<T, N>,
}

impl<'a, T: Copy, const N: usize> Iterator for QueueDrain<'a, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ControlCommand;

    #[test]
    fn queue_basic() {
        let queue = MessageQueue::<u32, 16>::new();

        assert!(queue.push(7));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek(), Some(7));

        assert_eq!(queue.pop(), Some(7));
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn queue_full_drops() {
        let queue = MessageQueue::<u32, 4>::new();
        assert_eq!(queue.capacity(), 3);

        // One slot stays empty to distinguish full from empty
        for i in 0..3 {
            assert!(queue.push(i));
        }
        assert!(queue.is_full());

        assert!(!queue.push(99));
        assert_eq!(queue.stats().dropped.load(Ordering::Relaxed), 1);

        // The rejected message never appears
        let drained: heapless::Vec<u32, 4> = queue.drain().collect();
        assert_eq!(drained.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn queue_wraps_around() {
        let queue = MessageQueue::<u32, 4>::new();

        for round in 0..10u32 {
            assert!(queue.push(round));
            assert!(queue.push(round + 100));
            assert_eq!(queue.pop(), Some(round));
            assert_eq!(queue.pop(), Some(round + 100));
        }
        assert!(queue.is_empty());
        assert_eq!(queue.stats().pushed.load(Ordering::Relaxed), 20);
        assert_eq!(queue.stats().popped.load(Ordering::Relaxed), 20);
    }

    #[test]
    fn queue_carries_commands() {
        let queue = MessageQueue::<ControlCommand, 8>::new();

        let mut cmd = ControlCommand::neutral();
        cmd.throttle = 30.0;
        assert!(queue.push(cmd));

        let popped = queue.pop().unwrap();
        assert_eq!(popped.throttle, 30.0);
        assert_eq!(popped.roll, 50.0);
    }

    #[test]
    fn queue_tracks_max_depth() {
        let queue = MessageQueue::<u8, 8>::new();

        for i in 0..5 {
            queue.push(i);
        }
        while queue.pop().is_some() {}

        assert_eq!(queue.stats().max_depth.load(Ordering::Relaxed), 5);
    }
}

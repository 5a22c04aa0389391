//! Reader/writer gate
//!
//! Lets any number of readers in at once, or exactly one writer.
//!
//! ## Protocol
//! - `begin_read` waits only while a writer is active
//! - `end_read` wakes a waiting writer when the last reader leaves
//! - `begin_write` waits until no writer is active and no reader is active
//! - `end_write` wakes every waiting reader and writer
//!
//! Readers arriving while a writer waits are admitted as long as no writer
//! is active, so a writer can wait indefinitely under a sustained stream of
//! overlapping reads. Among writers there is no queueing order: whichever
//! waiter reacquires the lock first proceeds.

use parking_lot::{Condvar, Mutex};

/// Snapshot of the gate's shared state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateState {
    /// Readers currently inside the gate
    pub active_readers: usize,

    /// Whether a writer is inside the gate
    pub writer_active: bool,
}

/// Many-readers XOR one-writer gate
///
/// ## Invariant
/// `writer_active` implies `active_readers == 0`, and `active_readers > 0`
/// implies `!writer_active`.
pub struct RwGate {
    state: Mutex<GateState>,
    /// Waited on by `begin_read` while a writer is active
    readers_cv: Condvar,
    /// Waited on by `begin_write` while readers or a writer are active
    writers_cv: Condvar,
}

impl RwGate {
    /// Create an open gate
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
        }
    }

    /// Register a reader, blocking while a writer is active
    pub fn begin_read(&self) {
        let mut state = self.state.lock();

        while state.writer_active {
            self.readers_cv.wait(&mut state);
        }

        state.active_readers += 1;
        tracing::trace!(readers = state.active_readers, "reader entered gate");
    }

    /// Deregister a reader; the last one out wakes a waiting writer
    pub fn end_read(&self) {
        let mut state = self.state.lock();

        debug_assert!(state.active_readers > 0, "end_read without begin_read");
        state.active_readers = state.active_readers.saturating_sub(1);

        if state.active_readers == 0 {
            drop(state);
            self.writers_cv.notify_one();
        }
    }

    /// Register the writer
    ///
    /// Blocks until no other writer is active, then until every active reader
    /// has left.
    pub fn begin_write(&self) {
        let mut state = self.state.lock();

        while state.writer_active {
            self.writers_cv.wait(&mut state);
        }

        // A reader may slip in while this thread waits here, and another writer
        // may win the race once the readers drain, so both are re-checked.
        while state.active_readers > 0 || state.writer_active {
            self.writers_cv.wait(&mut state);
        }

        state.writer_active = true;
        tracing::trace!("writer entered gate");
    }

    /// Deregister the writer and wake everyone waiting to enter
    pub fn end_write(&self) {
        {
            let mut state = self.state.lock();
            debug_assert!(state.writer_active, "end_write without begin_write");
            state.writer_active = false;
        }

        self.readers_cv.notify_all();
        self.writers_cv.notify_all();
    }

    /// Enter as a reader until the guard is dropped
    pub fn read(&self) -> ReadGuard<'_> {
        self.begin_read();
        ReadGuard { gate: self }
    }

    /// Enter as the writer until the guard is dropped
    pub fn write(&self) -> WriteGuard<'_> {
        self.begin_write();
        WriteGuard { gate: self }
    }

    /// Current state of the gate
    pub fn state(&self) -> GateState {
        *self.state.lock()
    }
}

impl Default for RwGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader registration released on drop
#[must_use = "the reader leaves the gate as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    gate: &'a RwGate,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.gate.end_read();
    }
}

/// Writer registration released on drop
#[must_use = "the writer leaves the gate as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    gate: &'a RwGate,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.gate.end_write();
    }
}

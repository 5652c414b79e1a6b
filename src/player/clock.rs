#![doc = r#"
Time sources for the playback thread.

The thread reads a position in seconds from its clock once per tick and
hands it to [`Scheduler::advance_to`](crate::Scheduler::advance_to), which
only looks at how far it moved.
"#]

use std::{
    sync::{Arc, atomic::Ordering},
    time::Instant,
};

use atomic_float::AtomicF64;

/// A monotonic position in seconds
pub trait ClockSource: Send + 'static {
    /// Seconds since some fixed point. May stall, should not go backwards.
    fn position(&self) -> f64;
}

/// Wall time from [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// A clock starting at zero now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn position(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[doc = r#"
A position pushed from elsewhere, usually an audio callback reporting
how much it has played.

# Example
```rust
# use smfplay::prelude::*;
let clock = ExternalClock::new();
let handle = clock.handle();

handle.set(1.5);
assert_eq!(clock.position(), 1.5);
```
"#]
#[derive(Debug, Clone, Default)]
pub struct ExternalClock {
    position: Arc<AtomicF64>,
}

impl ExternalClock {
    /// A clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that moves this clock
    pub fn handle(&self) -> ExternalClockHandle {
        ExternalClockHandle {
            position: Arc::clone(&self.position),
        }
    }
}

impl ClockSource for ExternalClock {
    fn position(&self) -> f64 {
        self.position.load(Ordering::Acquire)
    }
}

/// Writes the position of an [`ExternalClock`]
#[derive(Debug, Clone)]
pub struct ExternalClockHandle {
    position: Arc<AtomicF64>,
}

impl ExternalClockHandle {
    /// Move the clock to `seconds`
    pub fn set(&self, seconds: f64) {
        self.position.store(seconds, Ordering::Release);
    }

    /// Move the clock forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.position.fetch_add(seconds, Ordering::AcqRel);
    }

    /// The current position
    pub fn get(&self) -> f64 {
        self.position.load(Ordering::Acquire)
    }
}

#[test]
fn external_clock_follows_its_handle() {
    let clock = ExternalClock::new();
    let handle = clock.handle();
    handle.advance(0.25);
    handle.advance(0.25);
    assert_eq!(clock.position(), 0.5);
    assert_eq!(handle.get(), 0.5);
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock::new();
    let first = clock.position();
    std::thread::sleep(std::time::Duration::from_millis(2));
    assert!(clock.position() > first);
}

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag shared between a scan and its issuer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A selection scan waiting out its quiescence window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScan {
    pub path: PathBuf,
    pub line: u32,
    pub generation: u64,
    due: Instant,
}

/// Last-write-wins debouncer for selection-triggered scans.
///
/// Every submission replaces the pending scan and bumps the generation; a
/// scan's result may be published only while its generation is still the
/// latest, so a cursor move during a slow scan discards that scan's output.
#[derive(Debug)]
pub struct SelectionDebouncer {
    window: Duration,
    generation: u64,
    pending: Option<PendingScan>,
}

impl SelectionDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            pending: None,
        }
    }

    /// Record a selection change, superseding any pending scan.
    pub fn submit(&mut self, path: PathBuf, line: u32, now: Instant) -> u64 {
        self.generation += 1;
        self.pending = Some(PendingScan {
            path,
            line,
            generation: self.generation,
            due: now + self.window,
        });
        self.generation
    }

    /// Take the pending scan once its window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingScan> {
        if self.pending.as_ref().is_some_and(|scan| scan.due <= now) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Whether `generation` is still the most recent submission.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Deadline of the pending scan, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|scan| scan.due)
    }
}

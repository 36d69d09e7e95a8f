//! Ctrl-C handling outside of child processes
//!
//! Listening for Ctrl-C replaces the default "terminate" action for the rest
//! of the process. While a child runs, the invoker owns the interrupt. At any
//! other time (archiving, uploading) the process exits as it would by default.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

/// Exit status of a process terminated by SIGINT
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static CHILDREN: ChildTracker = ChildTracker::new();

/// What to do with an interrupt that reaches the process-wide listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// A child is running and handles it
    Forward,
    /// Nothing is waiting on a child: stop now
    Exit,
}

/// Counts the children currently being waited on
#[derive(Debug, Default)]
pub struct ChildTracker {
    waiting: AtomicUsize,
}

impl ChildTracker {
    pub const fn new() -> Self {
        Self {
            waiting: AtomicUsize::new(0),
        }
    }

    /// Mark a child as running until the guard is dropped
    pub fn enter(&self) -> ChildGuard<'_> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        ChildGuard { tracker: self }
    }

    pub fn action(&self) -> InterruptAction {
        if self.waiting.load(Ordering::SeqCst) > 0 {
            InterruptAction::Forward
        } else {
            InterruptAction::Exit
        }
    }
}

pub struct ChildGuard<'a> {
    tracker: &'a ChildTracker,
}

impl Drop for ChildGuard<'_> {
    fn drop(&mut self) {
        self.tracker.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Tracker shared by every invoker in this process
pub fn children() -> &'static ChildTracker {
    &CHILDREN
}

/// Exit with [`INTERRUPTED_EXIT_CODE`] on Ctrl-C unless a child is running.
///
/// Must be called from within a tokio runtime.
pub fn install() {
    tokio::spawn(async {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if children().action() == InterruptAction::Exit {
                warn!("Interrupted");
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        }
    });
}

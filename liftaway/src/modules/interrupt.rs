/// ----- INTERRUPT MODULE -----
/// This module owns the cancel signal. Any producer may raise it; the
/// scheduler observes it between actions and clears it once the queue has
/// been drained. Blocking waits inside actions poll it so that a cancel is
/// noticed within one poll interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use parking_lot::Mutex;

use crate::modules::action::Action;
use crate::modules::stage::Stage;

/// Process-wide "paused" flag.
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal {
    paused: Arc<AtomicBool>,
}

impl InterruptSignal {
    pub fn new() -> Self {
        InterruptSignal::default()
    }

    /// Returns true if the signal was not already raised.
    pub fn raise(&self) -> bool {
        !self.paused.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Sleeps for `duration` in steps of at most `quantum`. Returns false if
    /// the wait was cut short by the signal.
    pub fn wait(&self, duration: Duration, quantum: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_raised() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(quantum.min(deadline - now));
        }
    }

    /// Sleeps in steps of `quantum` for as long as `busy` holds. Returns false
    /// if the wait was cut short by the signal.
    pub fn wait_while(&self, mut busy: impl FnMut() -> bool, quantum: Duration) -> bool {
        loop {
            if self.is_raised() {
                return false;
            }
            if !busy() {
                return true;
            }
            thread::sleep(quantum);
        }
    }
}

/// Raises cancels and delivers `interrupt()` to whatever is in flight.
#[derive(Clone)]
pub struct InterruptController {
    stage: Stage,
    in_flight: Arc<Mutex<Option<Arc<Action>>>>,
}

impl InterruptController {
    pub fn new(stage: Stage) -> Self {
        InterruptController {
            stage: stage,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn signal(&self) -> &InterruptSignal {
        self.stage.signal()
    }

    pub fn is_pending(&self) -> bool {
        self.signal().is_raised()
    }

    /// Callable from any thread. Returns false if a cancel was already
    /// pending, in which case nothing else happens.
    pub fn request_cancel(&self) -> bool {
        if !self.signal().raise() {
            debug!("Cancel already pending");
            return false;
        }
        info!("Cancel requested");
        self.stage.cancel_indicator(true);
        if let Some(action) = self.in_flight.lock().as_ref() {
            info!("Interrupting {}", action);
            action.interrupt();
        }
        true
    }

    /// Marks `action` as in flight. Returns false and leaves nothing in
    /// flight when a cancel is already pending.
    pub fn begin(&self, action: &Arc<Action>) -> bool {
        let mut in_flight = self.in_flight.lock();
        if self.signal().is_raised() {
            return false;
        }
        *in_flight = Some(action.clone());
        true
    }

    pub fn finish(&self) {
        self.in_flight.lock().take();
    }

    pub fn in_flight(&self) -> Option<Arc<Action>> {
        self.in_flight.lock().clone()
    }

    /// Ends a cancel once the queue has been drained.
    pub fn clear(&self) {
        self.signal().clear();
        self.stage.cancel_indicator(false);
    }
}

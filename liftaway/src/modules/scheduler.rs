/// ----- SCHEDULER MODULE -----
/// The one consumer of the action queue. Pops and runs actions in order,
/// keeps the ambient track going in between, and drains the queue in
/// interrupted mode after a cancel.

use std::sync::Arc;

use crossbeam_channel::{select, unbounded, Receiver, Sender, TryRecvError};
use log::{info, warn};
use parking_lot::Mutex;
use shared_resources::control::FlavourKind;

use crate::modules::action::Action;
use crate::modules::ambient::AmbientTrack;
use crate::modules::interrupt::InterruptController;
use crate::modules::queue::ActionQueue;
use crate::modules::stage::Stage;
use crate::utilities::status::{SchedulerState, SchedulerStatus};

/// Outcome of one scheduler iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Ran(String),
    Drained(usize),
}

pub struct Scheduler {
    stage: Stage,
    queue: Arc<ActionQueue>,
    ambient: Arc<AmbientTrack>,
    interrupts: InterruptController,
    state: Arc<Mutex<SchedulerState>>,
    board: StatusBoard,
    shutdown_rx: Receiver<()>,
}

/// What producers hold. Cheap to clone, safe to use from any thread.
#[derive(Clone)]
pub struct SchedulerHandle {
    queue: Arc<ActionQueue>,
    interrupts: InterruptController,
    state: Arc<Mutex<SchedulerState>>,
    board: StatusBoard,
    shutdown_tx: Sender<()>,
}

/// Builds status snapshots and sends the ones that differ from the last.
/// Shared by the scheduler and every handle, but only the scheduler closes
/// it, so the receiver sees a disconnect once the scheduler is gone.
#[derive(Clone)]
struct StatusBoard {
    status_tx: Arc<Mutex<Option<Sender<SchedulerStatus>>>>,
    last: Arc<Mutex<Option<SchedulerStatus>>>,
    queue: Arc<ActionQueue>,
    ambient: Arc<AmbientTrack>,
    interrupts: InterruptController,
    state: Arc<Mutex<SchedulerState>>,
}

impl StatusBoard {
    /// Scheduler side: waits for the queue lock.
    fn publish(&self) {
        if self.is_open() {
            self.send(self.queue.snapshot());
        }
    }

    /// Producer side: skipped when the queue is busy, the next change
    /// publishes anyway.
    fn try_publish(&self) {
        if !self.is_open() {
            return;
        }
        if let Some(queued) = self.queue.try_snapshot() {
            self.send(queued);
        }
    }

    fn is_open(&self) -> bool {
        self.status_tx.lock().is_some()
    }

    fn send(&self, queued: Vec<String>) {
        let status_tx = self.status_tx.lock();
        let status_tx = match status_tx.as_ref() {
            Some(status_tx) => status_tx,
            None => return,
        };
        let status = SchedulerStatus {
            state: *self.state.lock(),
            in_flight: self.interrupts.in_flight().map(|action| action.to_string()),
            queued: queued,
            lit_floors: self.queue.lit_floors(),
            ambient: self.ambient.state(),
            cancel_pending: self.interrupts.is_pending(),
        };

        let mut last = self.last.lock();
        if last.as_ref() == Some(&status) {
            return;
        }
        if status_tx.send(status.clone()).is_err() {
            warn!("Status receiver is gone");
        }
        *last = Some(status);
    }

    fn close(&self) {
        self.status_tx.lock().take();
    }
}

impl Scheduler {
    pub fn new(
        stage: Stage,
        queue: Arc<ActionQueue>,
        ambient: Arc<AmbientTrack>,
        status_tx: Option<Sender<SchedulerStatus>>,
    ) -> (Scheduler, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = unbounded();
        let interrupts = InterruptController::new(stage.clone());
        let state = Arc::new(Mutex::new(SchedulerState::Idle));
        let board = StatusBoard {
            status_tx: Arc::new(Mutex::new(status_tx)),
            last: Arc::new(Mutex::new(None)),
            queue: queue.clone(),
            ambient: ambient.clone(),
            interrupts: interrupts.clone(),
            state: state.clone(),
        };
        let handle = SchedulerHandle {
            queue: queue.clone(),
            interrupts: interrupts.clone(),
            state: state.clone(),
            board: board.clone(),
            shutdown_tx: shutdown_tx,
        };
        let scheduler = Scheduler {
            stage: stage,
            queue: queue,
            ambient: ambient,
            interrupts: interrupts,
            state: state,
            board: board,
            shutdown_rx: shutdown_rx,
        };
        (scheduler, handle)
    }

    /// Runs until a shutdown is requested or every handle is dropped.
    pub fn main(self) {
        info!("Scheduler: Started");
        self.stage.all_indicators_off();
        self.ambient.play();
        self.board.publish();

        loop {
            match self.run_once() {
                Tick::Idle => {
                    select! {
                        recv(self.shutdown_rx) -> _ => break,
                        default(self.stage.timing().idle_poll()) => {},
                    }
                }
                Tick::Ran(_) | Tick::Drained(_) => match self.shutdown_rx.try_recv() {
                    Err(TryRecvError::Empty) => {}
                    _ => break,
                },
            }
        }

        info!("Scheduler: Shutting down");
        self.ambient.stop();
        self.stage.all_indicators_off();
        self.set_state(SchedulerState::Idle);
    }

    /// One iteration: drain if a cancel is pending, otherwise nudge the
    /// ambient track and run the next action, if any.
    pub fn run_once(&self) -> Tick {
        if self.interrupts.is_pending() {
            return Tick::Drained(self.drain(None));
        }

        self.ambient.play_or_fadein();
        let action = match self.queue.pop_next() {
            Some(action) => action,
            None => {
                self.set_state(SchedulerState::Idle);
                return Tick::Idle;
            }
        };
        if !self.interrupts.begin(&action) {
            return Tick::Drained(self.drain(Some(action)));
        }

        self.set_state(SchedulerState::Running);
        action.run(false);
        self.interrupts.finish();

        if self.interrupts.is_pending() {
            return Tick::Drained(self.drain(None));
        }
        Tick::Ran(action.to_string())
    }

    /// Runs every queued action in interrupted mode, then ends the cancel.
    /// `popped` is an action already taken off the queue that must not run
    /// normally.
    fn drain(&self, popped: Option<Arc<Action>>) -> usize {
        self.set_state(SchedulerState::Paused);
        info!("Scheduler: Cancel observed, draining {} queued", self.queue.len() + popped.iter().count());
        self.set_state(SchedulerState::Draining);

        let mut drained = 0;
        let mut next = popped.or_else(|| self.queue.pop_next());
        while let Some(action) = next {
            action.run(true);
            drained += 1;
            next = self.queue.pop_next();
        }

        self.interrupts.clear();
        info!("Scheduler: Drained {} actions", drained);
        self.set_state(SchedulerState::Idle);
        drained
    }

    /// Publishes if anything in the status changed, not only the state.
    fn set_state(&self, state: SchedulerState) {
        *self.state.lock() = state;
        self.board.publish();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.board.close();
    }
}

impl SchedulerHandle {
    pub fn push_floor_request(&self, floor: u8) -> bool {
        let queued = self.queue.push_floor_request(floor);
        if queued {
            self.board.try_publish();
        }
        queued
    }

    pub fn push_flavour_request(&self, kind: FlavourKind) -> bool {
        let queued = self.queue.push_flavour_request(kind);
        if queued {
            self.board.try_publish();
        }
        queued
    }

    pub fn request_cancel(&self) -> bool {
        let raised = self.interrupts.request_cancel();
        if raised {
            self.board.try_publish();
        }
        raised
    }

    pub fn shutdown(&self) {
        info!("Shutdown requested");
        let _ = self.shutdown_tx.send(());
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    pub fn in_flight(&self) -> Option<String> {
        self.interrupts.in_flight().map(|action| action.to_string())
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::testing::{Call, Recorder};
    use crossbeam_channel::RecvTimeoutError;
    use shared_resources::config::TimingConfig;
    use std::thread;
    use std::time::{Duration, Instant};

    fn scheduler_with(
        recorder: &Recorder,
        timing: TimingConfig,
        status_tx: Option<Sender<SchedulerStatus>>,
    ) -> (Scheduler, SchedulerHandle) {
        let stage = recorder.stage_with(timing, 12);
        let ambient = recorder.ambient(&stage);
        let actions = crate::modules::action::ActionSet::new(&stage, &ambient, &recorder.audio_config(12));
        let queue = Arc::new(ActionQueue::new(actions));
        Scheduler::new(stage, queue, ambient, status_tx)
    }

    fn scheduler(recorder: &Recorder) -> (Scheduler, SchedulerHandle) {
        scheduler_with(recorder, recorder.timing(), None)
    }

    fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn runs_movement_then_floor_then_idles() {
        let recorder = Recorder::new();
        let (scheduler, handle) = scheduler(&recorder);
        assert!(handle.push_floor_request(2));

        assert_eq!(scheduler.run_once(), Tick::Ran("Movement".to_string()));
        assert_eq!(scheduler.run_once(), Tick::Ran("Floor(2)".to_string()));
        assert_eq!(scheduler.run_once(), Tick::Idle);
        assert!(recorder.played("lift_ding.wav"));
        assert!(recorder.played("floor2_a.wav"));
        assert_eq!(handle.state(), SchedulerState::Idle);
    }

    #[test]
    fn ambient_plays_between_actions() {
        let recorder = Recorder::new();
        let (scheduler, _handle) = scheduler(&recorder);
        assert_eq!(scheduler.run_once(), Tick::Idle);
        assert!(recorder.played("muzak.wav"));
    }

    #[test]
    fn cancel_before_start_drains_without_side_effects() {
        let recorder = Recorder::new();
        let (scheduler, handle) = scheduler(&recorder);
        assert!(handle.push_floor_request(5));
        assert!(handle.push_floor_request(7));
        assert!(handle.request_cancel());

        assert_eq!(scheduler.run_once(), Tick::Drained(4));
        assert!(handle.queue().is_empty());
        assert!(!scheduler.interrupts.is_pending());
        assert!(!recorder.played("muzak.wav"));
        assert!(!recorder.played("lift_ding.wav"));
        assert!(!recorder.played("elevator_travel.wav"));
        assert_eq!(
            recorder.calls(),
            vec![
                Call::FloorIndicator(5, true),
                Call::FloorIndicator(7, true),
                Call::CancelIndicator(true),
                Call::FloorIndicator(5, false),
                Call::FloorIndicator(7, false),
                Call::CancelIndicator(false),
            ]
        );
        assert_eq!(handle.queue().lit_floors(), vec![false; 12]);
    }

    #[test]
    fn requests_after_a_drain_run_normally() {
        let recorder = Recorder::new();
        let (scheduler, handle) = scheduler(&recorder);
        handle.push_floor_request(1);
        handle.request_cancel();
        scheduler.run_once();

        assert!(handle.push_floor_request(1));
        assert_eq!(scheduler.run_once(), Tick::Ran("Movement".to_string()));
        assert_eq!(scheduler.run_once(), Tick::Ran("Floor(1)".to_string()));
        assert!(recorder.played("lift_ding.wav"));
    }

    #[test]
    fn cancel_during_travel_stops_and_drains_the_floor() {
        let recorder = Recorder::new();
        let mut timing = recorder.timing();
        timing.travel_min_ms = 10_000;
        timing.travel_max_ms = 10_000;
        let (scheduler, handle) = scheduler_with(&recorder, timing, None);
        assert!(handle.push_floor_request(3));

        let canceller = handle.clone();
        let cancel = thread::spawn(move || {
            assert!(wait_until(Duration::from_secs(5), || canceller.in_flight().is_some()));
            canceller.request_cancel();
        });

        let start = Instant::now();
        assert_eq!(scheduler.run_once(), Tick::Drained(1));
        assert!(start.elapsed() < Duration::from_secs(2));
        cancel.join().unwrap();

        assert!(recorder.played("elevator_stop.wav"));
        assert!(recorder.calls().contains(&Call::Stop("elevator_travel.wav".to_string())));
        assert!(!recorder.played("lift_ding.wav"));
        assert!(handle.queue().is_empty());
        assert_eq!(recorder.calls().last(), Some(&Call::CancelIndicator(false)));
    }

    #[test]
    fn cancel_reaches_a_running_scheduler_within_a_poll_interval() {
        let recorder = Recorder::new();
        let mut timing = recorder.timing();
        timing.floor_hold_ms = 10_000;
        timing.cancel_poll_ms = 5;
        let (scheduler, handle) = scheduler_with(&recorder, timing, None);
        let runner = thread::spawn(move || scheduler.main());

        assert!(handle.push_floor_request(6));
        assert!(handle.push_floor_request(8));
        assert!(wait_until(Duration::from_secs(5), || {
            handle.in_flight().as_deref() == Some("Floor(6)")
        }));

        let start = Instant::now();
        assert!(handle.request_cancel());
        assert!(wait_until(Duration::from_secs(5), || {
            handle.queue().is_empty() && handle.state() == SchedulerState::Idle && handle.in_flight().is_none()
        }));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!recorder.played("floor8_a.wav"));

        handle.shutdown();
        runner.join().unwrap();
    }

    #[test]
    fn collaborator_faults_do_not_stall_the_scheduler() {
        let recorder = Recorder::new();
        recorder.fail_all(true);
        let (scheduler, handle) = scheduler(&recorder);
        assert!(handle.push_floor_request(0));
        assert!(handle.push_flavour_request(FlavourKind::Emergency));

        assert_eq!(scheduler.run_once(), Tick::Ran("Movement".to_string()));
        assert_eq!(scheduler.run_once(), Tick::Ran("Floor(0)".to_string()));
        assert_eq!(scheduler.run_once(), Tick::Ran("Flavour(emergency)".to_string()));
        assert_eq!(scheduler.run_once(), Tick::Idle);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn shutdown_silences_and_darkens_the_prop() {
        let recorder = Recorder::new();
        let (scheduler, handle) = scheduler(&recorder);
        let runner = thread::spawn(move || scheduler.main());
        assert!(wait_until(Duration::from_secs(5), || recorder.played("muzak.wav")));

        handle.shutdown();
        runner.join().unwrap();
        let calls = recorder.calls();
        let tail: Vec<Call> = calls[calls.len() - 15..].to_vec();
        assert_eq!(tail[0], Call::Stop("muzak.wav".to_string()));
        assert_eq!(tail[14], Call::CancelIndicator(false));
        assert_eq!(tail[13], Call::DirectionIndicator(false));
    }

    #[test]
    fn dropping_every_handle_stops_the_scheduler() {
        let recorder = Recorder::new();
        let (scheduler, handle) = scheduler(&recorder);
        drop(handle);
        scheduler.main();
    }

    #[test]
    fn status_follows_state_changes() {
        let recorder = Recorder::new();
        let (status_tx, status_rx) = unbounded();
        let (scheduler, handle) = scheduler_with(&recorder, recorder.timing(), Some(status_tx));
        handle.push_floor_request(4);
        scheduler.run_once();

        let statuses: Vec<SchedulerStatus> = status_rx.try_iter().collect();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].state, SchedulerState::Idle);
        assert_eq!(statuses[0].queued, vec!["Movement", "Floor(4)"]);
        let status = &statuses[1];
        assert_eq!(status.state, SchedulerState::Running);
        assert_eq!(status.in_flight.as_deref(), Some("Movement"));
        assert_eq!(status.queued, vec!["Floor(4)"]);
        assert!(status.lit_floors[4]);

        handle.request_cancel();
        assert!(status_rx.try_recv().unwrap().cancel_pending);
        scheduler.run_once();
        let states: Vec<SchedulerState> = status_rx.try_iter().map(|status| status.state).collect();
        assert_eq!(
            states,
            vec![SchedulerState::Paused, SchedulerState::Draining, SchedulerState::Idle]
        );
    }

    #[test]
    fn idle_ticks_publish_only_what_changed() {
        let recorder = Recorder::new();
        let (status_tx, status_rx) = unbounded();
        let (scheduler, handle) = scheduler_with(&recorder, recorder.timing(), Some(status_tx));
        assert_eq!(scheduler.run_once(), Tick::Idle);
        assert_eq!(scheduler.run_once(), Tick::Idle);
        assert_eq!(status_rx.try_iter().count(), 1);

        assert!(handle.push_flavour_request(FlavourKind::Squeaker));
        let status = status_rx.try_recv().unwrap();
        assert_eq!(status.state, SchedulerState::Idle);
        assert_eq!(status.queued, vec!["Flavour(squeaker)"]);

        assert!(!handle.push_floor_request(12));
        assert!(status_rx.try_recv().is_err());
    }

    #[test]
    fn requests_during_a_long_action_are_published() {
        let recorder = Recorder::new();
        let mut timing = recorder.timing();
        timing.floor_hold_ms = 10_000;
        let (status_tx, status_rx) = unbounded();
        let (scheduler, handle) = scheduler_with(&recorder, timing, Some(status_tx));
        let runner = thread::spawn(move || scheduler.main());

        assert!(handle.push_floor_request(6));
        assert!(wait_until(Duration::from_secs(5), || {
            handle.in_flight().as_deref() == Some("Floor(6)")
        }));
        assert!(handle.push_floor_request(8));
        let published = status_rx.try_iter().any(|status| {
            status.in_flight.as_deref() == Some("Floor(6)")
                && status.queued == vec!["Movement", "Floor(8)"]
                && status.lit_floors[8]
        });
        assert!(published);

        handle.request_cancel();
        handle.shutdown();
        runner.join().unwrap();
    }

    #[test]
    fn status_channel_closes_when_the_scheduler_stops() {
        let recorder = Recorder::new();
        let (status_tx, status_rx) = unbounded();
        let (scheduler, handle) = scheduler_with(&recorder, recorder.timing(), Some(status_tx));
        let runner = thread::spawn(move || scheduler.main());
        handle.push_flavour_request(FlavourKind::Squeaker);

        handle.shutdown();
        runner.join().unwrap();
        // The handle outlives the scheduler, as the panel threads do.
        assert!(handle.push_flavour_request(FlavourKind::Squeaker));
        assert!(status_rx.try_iter().count() >= 1);
        assert_eq!(
            status_rx.recv_timeout(Duration::from_secs(1)),
            Err(RecvTimeoutError::Disconnected)
        );
    }
}

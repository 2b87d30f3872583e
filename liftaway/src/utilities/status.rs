use std::fmt;

use crate::modules::ambient::AmbientState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Paused,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchedulerState::Idle => "Idle",
            SchedulerState::Running => "Running",
            SchedulerState::Draining => "Draining",
            SchedulerState::Paused => "Paused",
        })
    }
}

/// Published whenever the state, the queue or the lamps change.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub in_flight: Option<String>,
    pub queued: Vec<String>,
    pub lit_floors: Vec<bool>,
    pub ambient: AmbientState,
    pub cancel_pending: bool,
}

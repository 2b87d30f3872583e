/// ----- QUEUE MODULE -----
/// The FIFO between the producers (panel threads) and the one scheduler
/// thread. Producers only ever try the lock: a press that finds the queue busy
/// is dropped and the visitor presses again. The scheduler takes the lock.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use shared_resources::control::FlavourKind;

use crate::modules::action::{Action, ActionSet};

pub struct ActionQueue {
    actions: ActionSet,
    entries: Mutex<VecDeque<Arc<Action>>>,
}

impl ActionQueue {
    pub fn new(actions: ActionSet) -> Self {
        ActionQueue {
            actions: actions,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Queues a trip to `floor`: a Movement followed by the Floor. Returns
    /// false if the floor is unknown, the queue is busy, or the floor is
    /// already waiting in the queue.
    pub fn push_floor_request(&self, floor: u8) -> bool {
        let action = match self.actions.floor(floor) {
            Some(action) => action,
            None => {
                info!("Floor({}): No such floor", floor);
                return false;
            }
        };
        let mut entries = match self.entries.try_lock() {
            Some(entries) => entries,
            None => {
                debug!("Floor({}): Queue busy, request dropped", floor);
                return false;
            }
        };
        if entries.iter().any(|queued| Arc::ptr_eq(queued, action)) {
            info!("Floor({}): Already queued", floor);
            return false;
        }

        entries.push_back(self.actions.movement.clone());
        entries.push_back(action.clone());
        action.activate();
        info!("Floor({}): Queued", floor);
        true
    }

    /// Queues a flavour. Flavours are not deduplicated.
    pub fn push_flavour_request(&self, kind: FlavourKind) -> bool {
        let action = match self.actions.flavour(kind) {
            Some(action) => action,
            None => {
                info!("Flavour({}): Not configured", kind);
                return false;
            }
        };
        let mut entries = match self.entries.try_lock() {
            Some(entries) => entries,
            None => {
                debug!("Flavour({}): Queue busy, request dropped", kind);
                return false;
            }
        };
        entries.push_back(action.clone());
        action.activate();
        info!("Flavour({}): Queued", kind);
        true
    }

    pub fn pop_next(&self) -> Option<Arc<Action>> {
        self.entries.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries.lock().iter().map(|action| action.to_string()).collect()
    }

    /// Like `snapshot`, but gives up instead of waiting for the lock.
    pub fn try_snapshot(&self) -> Option<Vec<String>> {
        let entries = self.entries.try_lock()?;
        Some(entries.iter().map(|action| action.to_string()).collect())
    }

    /// Which floor indicators should currently be lit.
    pub fn lit_floors(&self) -> Vec<bool> {
        self.actions
            .floors
            .iter()
            .map(|action| action.as_floor().map_or(false, |floor| floor.is_queued()))
            .collect()
    }
}

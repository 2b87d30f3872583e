/// ----- CONTROLS MODULE -----
/// Turns presses on input channels into scheduler requests, using the
/// channel bindings from the configuration file.

use std::collections::HashMap;

use crossbeam_channel::Receiver;
use log::{debug, info};
use shared_resources::control::Control;

use crate::modules::scheduler::SchedulerHandle;

#[derive(Clone)]
pub struct Controls {
    bindings: HashMap<u8, Control>,
    handle: SchedulerHandle,
}

impl Controls {
    pub fn new(bindings: HashMap<u8, Control>, handle: SchedulerHandle) -> Self {
        Controls {
            bindings: bindings,
            handle: handle,
        }
    }

    /// Returns whether the press was acted on. A dropped press (busy queue,
    /// floor already queued, cancel already pending) returns false.
    pub fn on_press(&self, channel: u8) -> bool {
        let control = match self.bindings.get(&channel) {
            Some(control) => *control,
            None => {
                debug!("Channel {}: not bound", channel);
                return false;
            }
        };
        debug!("Channel {}: {:?}", channel, control);
        match control {
            Control::Floor(floor) => self.handle.push_floor_request(floor),
            Control::Flavour(kind) => self.handle.push_flavour_request(kind),
            Control::Cancel => self.handle.request_cancel(),
            Control::Shutdown => {
                self.handle.shutdown();
                true
            }
        }
    }

    /// Dispatches presses until the input side hangs up.
    pub fn listen(&self, presses: Receiver<u8>) {
        for channel in presses.iter() {
            self.on_press(channel);
        }
        info!("Input closed");
    }
}

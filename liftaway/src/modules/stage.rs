/// ----- STAGE MODULE -----
/// Every lamp and sound the actions touch goes through the stage. Calls are
/// best effort: a failing collaborator is logged here and never reaches the
/// scheduler, so the prop keeps running when a lamp or a sound is broken.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::warn;
use shared_resources::audio::{AudioChannel, Clip};
use shared_resources::config::TimingConfig;

use crate::modules::audio::{Audio, PlayOptions};
use crate::modules::interrupt::InterruptSignal;
use crate::modules::io::Indicators;
use crate::utilities::error::AudioError;

#[derive(Clone)]
pub struct Stage {
    indicators: Arc<dyn Indicators>,
    audio: Arc<dyn Audio>,
    signal: InterruptSignal,
    timing: TimingConfig,
    num_floors: u8,
}

impl Stage {
    pub fn new(
        indicators: Arc<dyn Indicators>,
        audio: Arc<dyn Audio>,
        timing: TimingConfig,
        num_floors: u8,
    ) -> Self {
        Stage {
            indicators: indicators,
            audio: audio,
            signal: InterruptSignal::new(),
            timing: timing,
            num_floors: num_floors,
        }
    }

    pub fn signal(&self) -> &InterruptSignal {
        &self.signal
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn num_floors(&self) -> u8 {
        self.num_floors
    }

    pub fn floor_indicator(&self, floor: u8, on: bool) {
        if let Err(e) = self.indicators.set_floor_indicator(floor, on) {
            warn!("Floor({}) indicator: {}", floor, e);
        }
    }

    pub fn direction_indicator(&self, on: bool) {
        if let Err(e) = self.indicators.set_direction_indicator(on) {
            warn!("Direction indicator: {}", e);
        }
    }

    pub fn cancel_indicator(&self, on: bool) {
        if let Err(e) = self.indicators.set_cancel_indicator(on) {
            warn!("Cancel indicator: {}", e);
        }
    }

    pub fn all_indicators_off(&self) {
        for floor in 0..self.num_floors {
            self.floor_indicator(floor, false);
        }
        self.direction_indicator(false);
        self.cancel_indicator(false);
    }

    /// Returns whether the clip started. A blocking play returns once the
    /// clip's channel is idle or a cancel is raised.
    pub fn play(&self, clip: &Clip, options: PlayOptions) -> bool {
        match self.audio.play(clip, &options) {
            Ok(()) => {
                if options.blocking {
                    self.wait_for(clip.channel);
                }
                true
            }
            Err(AudioError::Busy(channel)) => {
                warn!("Channel {} busy; couldn't play {}", channel, clip.file);
                false
            }
            Err(e) => {
                warn!("Couldn't play {}: {}", clip, e);
                false
            }
        }
    }

    pub fn fadeout(&self, clip: &Clip, fade: Duration) {
        if let Err(e) = self.audio.fadeout(clip, fade) {
            warn!("Couldn't fade out {}: {}", clip, e);
        }
    }

    pub fn stop(&self, clip: &Clip) {
        if let Err(e) = self.audio.stop(clip) {
            warn!("Couldn't stop {}: {}", clip, e);
        }
    }

    pub fn is_busy(&self, channel: AudioChannel) -> bool {
        self.audio.is_busy(channel)
    }

    /// Blocks while `channel` is busy. Returns false if cut short by a cancel.
    pub fn wait_for(&self, channel: AudioChannel) -> bool {
        self.signal
            .wait_while(|| self.audio.is_busy(channel), self.timing.cancel_poll())
    }

    /// Interruptible sleep. Returns false if cut short by a cancel.
    pub fn hold(&self, duration: Duration) -> bool {
        self.signal.wait(duration, self.timing.cancel_poll())
    }

    /// Plain sleep, used while draining when the signal is known to be raised.
    pub fn settle(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

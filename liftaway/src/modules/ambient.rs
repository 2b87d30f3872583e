/// ----- AMBIENT MODULE -----
/// The looping background track. Floors duck it while their doors are open
/// and the scheduler nudges it back on between actions.

use std::fmt;

use log::info;
use parking_lot::Mutex;
use shared_resources::audio::Clip;

use crate::modules::audio::PlayOptions;
use crate::modules::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientState {
    Stopped,
    Playing,
    Fading,
}

impl fmt::Display for AmbientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AmbientState::Stopped => "stopped",
            AmbientState::Playing => "playing",
            AmbientState::Fading => "fading",
        })
    }
}

pub struct AmbientTrack {
    stage: Stage,
    clip: Clip,
    state: Mutex<AmbientState>,
}

impl AmbientTrack {
    pub fn new(stage: Stage, clip: Clip) -> Self {
        AmbientTrack {
            stage: stage,
            clip: clip,
            state: Mutex::new(AmbientState::Stopped),
        }
    }

    pub fn state(&self) -> AmbientState {
        *self.state.lock()
    }

    /// Starts the loop unless it is already playing. Returns whether it
    /// started.
    pub fn play(&self) -> bool {
        let mut state = self.state.lock();
        if *state == AmbientState::Playing && self.stage.is_busy(self.clip.channel) {
            return false;
        }
        self.start(&mut state, PlayOptions::new().looped())
    }

    /// Brings a ducked track back with a gradual ramp. Returns whether it
    /// started.
    pub fn fadein(&self) -> bool {
        let mut state = self.state.lock();
        if *state != AmbientState::Fading {
            return false;
        }
        let fade = self.stage.timing().ambient_fade();
        self.start(&mut state, PlayOptions::new().looped().fade_in(fade))
    }

    pub fn fadeout(&self) {
        let mut state = self.state.lock();
        if *state == AmbientState::Playing {
            info!("Ambient: Fading out");
            self.stage.fadeout(&self.clip, self.stage.timing().ambient_fade());
            *state = AmbientState::Fading;
        }
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state != AmbientState::Stopped {
            info!("Ambient: Stopped");
            self.stage.stop(&self.clip);
            *state = AmbientState::Stopped;
        }
    }

    /// Called once per scheduler iteration: fades a ducked track back in and
    /// restarts one that went quiet without being asked to.
    pub fn play_or_fadein(&self) -> bool {
        match self.state() {
            AmbientState::Fading => self.fadein(),
            AmbientState::Stopped | AmbientState::Playing => self.play(),
        }
    }

    fn start(&self, state: &mut AmbientState, options: PlayOptions) -> bool {
        if self.stage.play(&self.clip, options) {
            info!("Ambient: Playing {}", self.clip.file);
            *state = AmbientState::Playing;
            true
        } else {
            false
        }
    }
}

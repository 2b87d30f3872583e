/// ----- FLAVOUR MODULE -----
/// The side buttons: voicemail, emergency, squeaker and the nag for pressing
/// nothing. Each press plays the next clip of a cyclic list on the flavour's
/// own channel. A sequenced flavour plays its whole list instead, and a
/// ducking flavour holds the ambient track down until its clip ends.

use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use shared_resources::audio::Clip;
use shared_resources::config::FlavourConfig;
use shared_resources::control::FlavourKind;

use crate::modules::ambient::AmbientTrack;
use crate::modules::audio::PlayOptions;
use crate::modules::stage::Stage;

pub struct Flavour {
    kind: FlavourKind,
    stage: Stage,
    ambient: Arc<AmbientTrack>,
    clips: Vec<Clip>,
    index: Mutex<usize>,
    self_interruptible: bool,
    sequence: bool,
    duck_ambient: bool,
}

impl Flavour {
    pub fn new(
        kind: FlavourKind,
        stage: Stage,
        ambient: Arc<AmbientTrack>,
        config: &FlavourConfig,
    ) -> Self {
        let clips: Vec<Clip> = config
            .clips
            .iter()
            .map(|clip| clip.clone().on_channel(kind.channel()))
            .collect();
        let last = clips.len().saturating_sub(1);
        Flavour {
            kind: kind,
            stage: stage,
            ambient: ambient,
            clips: clips,
            index: Mutex::new(last),
            self_interruptible: config.self_interruptible,
            sequence: config.sequence,
            duck_ambient: config.duck_ambient,
        }
    }

    pub fn kind(&self) -> FlavourKind {
        self.kind
    }

    /// Index of the clip played last.
    pub fn index(&self) -> usize {
        *self.index.lock()
    }

    pub fn run(&self, interrupted: bool) {
        if interrupted {
            info!("Flavour({}): Popped off queue; Interrupted({})", self.kind, interrupted);
            return;
        }
        if self.clips.is_empty() {
            return;
        }
        if !self.self_interruptible && self.stage.is_busy(self.kind.channel()) {
            info!("Flavour({}): Still playing, ignored", self.kind);
            return;
        }

        if self.duck_ambient {
            self.ambient.fadeout();
        }
        let completed = if self.sequence {
            self.play_sequence()
        } else {
            self.play_next()
        };
        // A cancelled clip leaves the track ducked for the drain.
        if self.duck_ambient && completed {
            self.ambient.play_or_fadein();
        } else if !completed {
            info!("Flavour({}): Cut short", self.kind);
        }
    }

    pub fn interrupt(&self) {
        if let Some(clip) = self.clips.get(self.index()) {
            self.stage.stop(clip);
        }
    }

    fn options(&self) -> PlayOptions {
        PlayOptions::new().interrupt_existing(self.self_interruptible)
    }

    /// Returns false if the clip was cut short. Only a ducking flavour waits
    /// for its clip.
    fn play_next(&self) -> bool {
        let clip = {
            let mut index = self.index.lock();
            *index = (*index + 1) % self.clips.len();
            &self.clips[*index]
        };
        info!("Flavour({}): Playing {}", self.kind, clip.file);
        if !self.stage.play(clip, self.options()) {
            return false;
        }
        !self.duck_ambient || self.stage.wait_for(self.kind.channel())
    }

    /// Plays every clip back to back. Stops at the first one that is cut
    /// short or fails to start.
    fn play_sequence(&self) -> bool {
        let last = self.clips.len() - 1;
        for (i, clip) in self.clips.iter().enumerate() {
            *self.index.lock() = i;
            info!("Flavour({}): Playing {} ({}/{})", self.kind, clip.file, i + 1, self.clips.len());
            if !self.stage.play(clip, self.options()) {
                return false;
            }
            if (i < last || self.duck_ambient) && !self.stage.wait_for(self.kind.channel()) {
                return false;
            }
        }
        true
    }
}

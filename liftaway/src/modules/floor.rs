/// ----- FLOOR MODULE -----
/// Arrival at a floor: ding, doors, the floor's own sound, doors again.
/// There is exactly one Floor per floor index; the queue refuses to hold it
/// twice.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::info;
use parking_lot::Mutex;
use shared_resources::audio::{AudioChannel, Clip};
use shared_resources::config::CueConfig;

use crate::modules::ambient::AmbientTrack;
use crate::modules::audio::PlayOptions;
use crate::modules::stage::Stage;

pub struct Floor {
    number: u8,
    stage: Stage,
    ambient: Arc<AmbientTrack>,
    cues: CueConfig,
    clips: Vec<Clip>,
    clip_index: Mutex<usize>,
    // Enqueued or running. A count rather than a flag so that a floor
    // re-requested while it runs stays marked until the second run ends.
    queued: AtomicUsize,
}

impl Floor {
    pub fn new(
        number: u8,
        stage: Stage,
        ambient: Arc<AmbientTrack>,
        cues: CueConfig,
        clips: Vec<Clip>,
    ) -> Self {
        let clips: Vec<Clip> = clips
            .into_iter()
            .map(|clip| clip.on_channel(AudioChannel::Floor))
            .collect();
        let last = clips.len().saturating_sub(1);
        Floor {
            number: number,
            stage: stage,
            ambient: ambient,
            cues: cues,
            clips: clips,
            clip_index: Mutex::new(last),
            queued: AtomicUsize::new(0),
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn is_queued(&self) -> bool {
        self.queued.load(Ordering::SeqCst) > 0
    }

    pub fn activate(&self) {
        info!("Floor({}): Activated", self.number);
        self.queued.fetch_add(1, Ordering::SeqCst);
        self.stage.floor_indicator(self.number, true);
    }

    pub fn run(&self, interrupted: bool) {
        info!("Floor({}): Popped off queue; Interrupted({})", self.number, interrupted);
        self.stage.floor_indicator(self.number, false);
        if interrupted {
            self.stage.settle(self.stage.timing().interrupted_floor());
        } else {
            self.arrive();
        }
        // Saturating: never wraps if run without a matching activate.
        let remaining = self
            .queued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_or(0, |n| n - 1);
        if remaining > 0 {
            // Requested again while running: the next visit is still queued.
            self.stage.floor_indicator(self.number, true);
        }
    }

    pub fn interrupt(&self) {}

    fn next_clip(&self) -> Option<&Clip> {
        if self.clips.is_empty() {
            return None;
        }
        let mut index = self.clip_index.lock();
        *index = (*index + 1) % self.clips.len();
        self.clips.get(*index)
    }

    fn arrive(&self) {
        let timing = *self.stage.timing();
        self.stage.direction_indicator(false);
        self.stage.play(&self.cues.ding, PlayOptions::new().blocking());

        self.stage.play(&self.cues.door_open, PlayOptions::new());
        self.ambient.fadeout();
        let mut completed = self.stage.hold(timing.door_open());

        let clip = self.next_clip();
        if let Some(clip) = clip {
            info!("Floor({}): Playing {}", self.number, clip.file);
            self.stage.play(clip, PlayOptions::new());
        }
        if completed {
            completed = self.stage.hold(timing.floor_hold());
        }

        self.stage.play(&self.cues.door_close, PlayOptions::new());
        if let Some(clip) = clip {
            self.stage.fadeout(clip, timing.floor_fadeout());
        }
        if completed && self.stage.hold(timing.door_close()) {
            self.ambient.play_or_fadein();
        } else {
            info!("Floor({}): Cut short", self.number);
        }
    }
}

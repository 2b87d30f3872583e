/// ----- MOVEMENT MODULE -----
/// Travel between two floors. Queued ahead of every Floor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::info;
use rand::Rng;
use shared_resources::audio::Clip;

use crate::modules::audio::PlayOptions;
use crate::modules::stage::Stage;

pub struct Movement {
    stage: Stage,
    travel: Clip,
    halt: Clip,
    // Whoever clears this first (the arrival or the interrupt) owns the
    // travel clip.
    travelling: AtomicBool,
}

impl Movement {
    pub fn new(stage: Stage, travel: Clip, halt: Clip) -> Self {
        Movement {
            stage: stage,
            travel: travel,
            halt: halt,
            travelling: AtomicBool::new(false),
        }
    }

    pub fn travel_time(&self) -> Duration {
        let timing = self.stage.timing();
        let ms = if timing.travel_min_ms >= timing.travel_max_ms {
            timing.travel_min_ms
        } else {
            rand::thread_rng().gen_range(timing.travel_min_ms..=timing.travel_max_ms)
        };
        Duration::from_millis(ms)
    }

    pub fn run(&self, interrupted: bool) {
        if interrupted {
            info!("Movement: Popped off queue; Interrupted({})", interrupted);
            self.stage.settle(self.stage.timing().interrupted_movement());
            return;
        }

        let travel_time = self.travel_time();
        info!("Movement: Popped off queue; travelling for {} ms", travel_time.as_millis());
        self.travelling.store(true, Ordering::SeqCst);
        self.stage.direction_indicator(true);
        self.stage.play(&self.travel, PlayOptions::new());
        let arrived = self.stage.hold(travel_time);
        if !self.travelling.swap(false, Ordering::SeqCst) {
            return;
        }
        if arrived {
            self.stage.fadeout(&self.travel, self.stage.timing().halt_fadeout());
        } else {
            info!("Movement: Cut short");
            self.halt();
        }
    }

    pub fn is_travelling(&self) -> bool {
        self.travelling.load(Ordering::SeqCst)
    }

    /// Emergency stop. Does nothing once the car has arrived.
    pub fn interrupt(&self) {
        if self.travelling.swap(false, Ordering::SeqCst) {
            info!("Movement: Interrupted");
            self.halt();
        }
    }

    /// The halt cue over silenced travel audio.
    fn halt(&self) {
        self.stage.play(&self.halt, PlayOptions::new());
        self.stage.stop(&self.travel);
        self.stage.direction_indicator(false);
    }
}

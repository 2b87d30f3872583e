/// ----- ACTION MODULE -----
/// Everything the scheduler can run is an `Action`. The set is closed, so
/// dispatch is a plain match. Actions are built once at start-up and shared
/// as `Arc<Action>` between the queue, the scheduler and the interrupt
/// controller.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use shared_resources::config::AudioConfig;
use shared_resources::control::FlavourKind;

use crate::modules::ambient::AmbientTrack;
use crate::modules::flavour::Flavour;
use crate::modules::floor::Floor;
use crate::modules::movement::Movement;
use crate::modules::stage::Stage;

pub enum Action {
    Movement(Movement),
    Floor(Floor),
    Flavour(Flavour),
}

impl Action {
    /// Side effect of being enqueued. Called with the queue lock held.
    pub fn activate(&self) {
        match self {
            Action::Movement(_) => {}
            Action::Floor(floor) => floor.activate(),
            Action::Flavour(_) => {}
        }
    }

    /// Runs the full behaviour, or only the timing of it while draining.
    pub fn run(&self, interrupted: bool) {
        match self {
            Action::Movement(movement) => movement.run(interrupted),
            Action::Floor(floor) => floor.run(interrupted),
            Action::Flavour(flavour) => flavour.run(interrupted),
        }
    }

    /// Delivered once to the action in flight when a cancel is raised. May be
    /// called from a producer thread while `run` is executing.
    pub fn interrupt(&self) {
        match self {
            Action::Movement(movement) => movement.interrupt(),
            Action::Floor(floor) => floor.interrupt(),
            Action::Flavour(flavour) => flavour.interrupt(),
        }
    }

    pub fn as_floor(&self) -> Option<&Floor> {
        match self {
            Action::Floor(floor) => Some(floor),
            _ => None,
        }
    }

    pub fn is_movement(&self) -> bool {
        matches!(self, Action::Movement(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Movement(_) => write!(f, "Movement"),
            Action::Floor(floor) => write!(f, "Floor({})", floor.number()),
            Action::Flavour(flavour) => write!(f, "Flavour({})", flavour.kind()),
        }
    }
}

/// The fixed population of actions: one Movement shared by every trip, one
/// Floor per floor index and one Flavour per configured kind.
pub struct ActionSet {
    pub movement: Arc<Action>,
    pub floors: Vec<Arc<Action>>,
    pub flavours: HashMap<FlavourKind, Arc<Action>>,
}

impl ActionSet {
    pub fn new(stage: &Stage, ambient: &Arc<AmbientTrack>, audio: &AudioConfig) -> Self {
        let movement = Arc::new(Action::Movement(Movement::new(
            stage.clone(),
            audio.cues.travel.clone(),
            audio.cues.halt.clone(),
        )));

        let floors = audio
            .floors
            .iter()
            .take(stage.num_floors() as usize)
            .enumerate()
            .map(|(number, clips)| {
                Arc::new(Action::Floor(Floor::new(
                    number as u8,
                    stage.clone(),
                    ambient.clone(),
                    audio.cues.clone(),
                    clips.clone(),
                )))
            })
            .collect();

        let flavours = audio
            .flavours
            .iter()
            .map(|(kind, flavour)| {
                (
                    *kind,
                    Arc::new(Action::Flavour(Flavour::new(
                        *kind,
                        stage.clone(),
                        ambient.clone(),
                        flavour,
                    ))),
                )
            })
            .collect();

        ActionSet {
            movement: movement,
            floors: floors,
            flavours: flavours,
        }
    }

    pub fn floor(&self, number: u8) -> Option<&Arc<Action>> {
        self.floors.get(number as usize)
    }

    pub fn flavour(&self, kind: FlavourKind) -> Option<&Arc<Action>> {
        self.flavours.get(&kind)
    }
}

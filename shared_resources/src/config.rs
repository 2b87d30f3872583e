use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use thiserror::Error;

use crate::audio::Clip;
use crate::control::{Control, FlavourKind};

const CONFIG_FILE: &str = "config.json";
const FALLBACK_CONFIG_FILE: &str = "_config.json";

/// How often the run loop looks at an empty queue.
pub const IDLE_POLL_INTERVAL_MS: u64 = 100;
/// Longest stretch an interruptible wait sleeps before checking for a cancel.
/// This bounds cancellation latency.
pub const CANCEL_POLL_INTERVAL_MS: u64 = 500;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct ElevatorConfig {
    pub num_floors: u8,
}

/// Every duration the prop waits for, in milliseconds.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub idle_poll_ms: u64,
    pub cancel_poll_ms: u64,
    /// Travel time is drawn from `travel_min_ms..=travel_max_ms`; equal
    /// bounds give a fixed travel time.
    pub travel_min_ms: u64,
    pub travel_max_ms: u64,
    pub door_open_ms: u64,
    pub floor_hold_ms: u64,
    pub door_close_ms: u64,
    pub floor_fadeout_ms: u64,
    pub ambient_fade_ms: u64,
    pub halt_fadeout_ms: u64,
    pub interrupted_movement_ms: u64,
    pub interrupted_floor_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            idle_poll_ms: IDLE_POLL_INTERVAL_MS,
            cancel_poll_ms: CANCEL_POLL_INTERVAL_MS,
            travel_min_ms: 1500,
            travel_max_ms: 1500,
            door_open_ms: 1500,
            floor_hold_ms: 15000,
            door_close_ms: 2500,
            floor_fadeout_ms: 1700,
            ambient_fade_ms: 1000,
            halt_fadeout_ms: 500,
            interrupted_movement_ms: 500,
            interrupted_floor_ms: 200,
        }
    }
}

impl TimingConfig {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn cancel_poll(&self) -> Duration {
        Duration::from_millis(self.cancel_poll_ms)
    }

    pub fn door_open(&self) -> Duration {
        Duration::from_millis(self.door_open_ms)
    }

    pub fn floor_hold(&self) -> Duration {
        Duration::from_millis(self.floor_hold_ms)
    }

    pub fn door_close(&self) -> Duration {
        Duration::from_millis(self.door_close_ms)
    }

    pub fn floor_fadeout(&self) -> Duration {
        Duration::from_millis(self.floor_fadeout_ms)
    }

    pub fn ambient_fade(&self) -> Duration {
        Duration::from_millis(self.ambient_fade_ms)
    }

    pub fn halt_fadeout(&self) -> Duration {
        Duration::from_millis(self.halt_fadeout_ms)
    }

    pub fn interrupted_movement(&self) -> Duration {
        Duration::from_millis(self.interrupted_movement_ms)
    }

    pub fn interrupted_floor(&self) -> Duration {
        Duration::from_millis(self.interrupted_floor_ms)
    }
}

/// The fixed cues shared by every floor and every trip.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct CueConfig {
    pub travel: Clip,
    pub halt: Clip,
    pub ding: Clip,
    pub door_open: Clip,
    pub door_close: Clip,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct FlavourConfig {
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub self_interruptible: bool,
    /// Play every clip in order on each press instead of the next one.
    #[serde(default)]
    pub sequence: bool,
    /// Fade the ambient track out for the clip and back in afterwards.
    #[serde(default)]
    pub duck_ambient: bool,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct AudioConfig {
    pub data_dir: PathBuf,
    pub ambient: Clip,
    pub cues: CueConfig,
    /// One list of clips per floor, cycled through on each arrival.
    pub floors: Vec<Vec<Clip>>,
    #[serde(default)]
    pub flavours: HashMap<FlavourKind, FlavourConfig>,
}

/// How the simulator panel's buttons map onto input channels.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct PanelConfig {
    /// Channel for the cab button of each floor, indexed by floor.
    pub cab: Vec<u8>,
    /// Floor -> channel for the hall up buttons.
    pub hall_up: HashMap<u8, u8>,
    /// Floor -> channel for the hall down buttons.
    pub hall_down: HashMap<u8, u8>,
    pub stop: Option<u8>,
    pub obstruction: Option<u8>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct LiftConfig {
    pub elevator: ElevatorConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub audio: AudioConfig,
    /// Input channel -> control.
    pub controls: HashMap<u8, Control>,
    #[serde(default)]
    pub panel: PanelConfig,
}

fn read_config_file(path: Option<&Path>) -> Result<String, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(CONFIG_FILE).exists() => PathBuf::from(CONFIG_FILE),
        None => {
            info!("No configuration file provided, using default settings...");
            PathBuf::from(FALLBACK_CONFIG_FILE)
        }
    };
    fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })
}

impl LiftConfig {
    /// Reads `path`, or `config.json` falling back to `_config.json`.
    pub fn get(path: Option<&Path>) -> Result<Self, ConfigError> {
        let contents = read_config_file(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: LiftConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let num_floors = self.elevator.num_floors;
        if num_floors == 0 {
            return Err(ConfigError::Invalid("num_floors must be at least 1".to_string()));
        }
        if self.audio.floors.len() < num_floors as usize {
            return Err(ConfigError::Invalid(format!(
                "{} floors configured but only {} floor clip lists",
                num_floors,
                self.audio.floors.len()
            )));
        }
        for (floor, clips) in self.audio.floors.iter().enumerate().take(num_floors as usize) {
            if clips.is_empty() {
                return Err(ConfigError::Invalid(format!("floor {} has no clips", floor)));
            }
        }
        for (kind, flavour) in &self.audio.flavours {
            if flavour.clips.is_empty() {
                return Err(ConfigError::Invalid(format!("flavour {} has no clips", kind)));
            }
        }

        let timing = &self.timing;
        if timing.travel_min_ms > timing.travel_max_ms {
            return Err(ConfigError::Invalid(format!(
                "travel_min_ms ({}) is larger than travel_max_ms ({})",
                timing.travel_min_ms, timing.travel_max_ms
            )));
        }
        if timing.idle_poll_ms == 0 || timing.cancel_poll_ms == 0 {
            return Err(ConfigError::Invalid("poll intervals must be non-zero".to_string()));
        }

        for (channel, control) in &self.controls {
            match control {
                Control::Floor(floor) if *floor >= num_floors => {
                    return Err(ConfigError::Invalid(format!(
                        "channel {} requests floor {} but there are {} floors",
                        channel, floor, num_floors
                    )));
                }
                Control::Flavour(kind) if !self.audio.flavours.contains_key(kind) => {
                    return Err(ConfigError::Invalid(format!(
                        "channel {} requests flavour {} which has no clips",
                        channel, kind
                    )));
                }
                _ => {}
            }
        }
        if self.panel.cab.len() > num_floors as usize {
            return Err(ConfigError::Invalid(format!(
                "panel has {} cab buttons but there are {} floors",
                self.panel.cab.len(),
                num_floors
            )));
        }
        Ok(())
    }
}

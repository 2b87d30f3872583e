use shared_resources::audio::AudioChannel;
use thiserror::Error;

/// Faults on the panel side: lamps and buttons.
#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("{0} output is disconnected")]
    Disconnected(&'static str),
    #[error("floor {floor} has no indicator, the panel has {num_floors} floors")]
    NoSuchFloor { floor: u8, num_floors: u8 },
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("could not open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("no audio output: {0}")]
    NoDevice(String),
    #[error("channel {0} is busy")]
    Busy(AudioChannel),
    #[error("could not start fade: {0}")]
    Fade(#[source] std::io::Error),
}

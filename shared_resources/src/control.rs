use std::fmt;

use crate::audio::AudioChannel;

/// The non-floor buttons on the panel. Each one plays a cyclic set of clips.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FlavourKind {
    Voicemail,
    Emergency,
    Squeaker,
    NoPress,
}

impl FlavourKind {
    pub fn iter() -> impl Iterator<Item = FlavourKind> {
        [
            FlavourKind::Voicemail,
            FlavourKind::Emergency,
            FlavourKind::Squeaker,
            FlavourKind::NoPress,
        ]
        .iter()
        .copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlavourKind::Voicemail => "voicemail",
            FlavourKind::Emergency => "emergency",
            FlavourKind::Squeaker => "squeaker",
            FlavourKind::NoPress => "no_press",
        }
    }

    pub fn channel(self) -> AudioChannel {
        match self {
            FlavourKind::Voicemail => AudioChannel::Voicemail,
            FlavourKind::Emergency => AudioChannel::Emergency,
            FlavourKind::Squeaker => AudioChannel::Squeaker,
            FlavourKind::NoPress => AudioChannel::NoPress,
        }
    }
}

impl fmt::Display for FlavourKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What pressing a bound input channel means.
///
/// In the configuration file a control is written as `{"floor": 3}`,
/// `{"flavour": "voicemail"}`, `"cancel"` or `"shutdown"`.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Floor(u8),
    Flavour(FlavourKind),
    Cancel,
    Shutdown,
}

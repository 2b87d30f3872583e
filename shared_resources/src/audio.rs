use std::fmt;
use std::time::Duration;

/// Mixer channels. A channel plays one clip at a time; busy checks and
/// interruption happen per channel.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannel {
    #[default]
    Default,
    Movement,
    NoPress,
    Voicemail,
    Emergency,
    Squeaker,
    Floor,
    Ambient,
}

impl AudioChannel {
    pub fn iter() -> impl Iterator<Item = AudioChannel> {
        [
            AudioChannel::Default,
            AudioChannel::Movement,
            AudioChannel::NoPress,
            AudioChannel::Voicemail,
            AudioChannel::Emergency,
            AudioChannel::Squeaker,
            AudioChannel::Floor,
            AudioChannel::Ambient,
        ]
        .iter()
        .copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioChannel::Default => "default",
            AudioChannel::Movement => "movement",
            AudioChannel::NoPress => "no_press",
            AudioChannel::Voicemail => "voicemail",
            AudioChannel::Emergency => "emergency",
            AudioChannel::Squeaker => "squeaker",
            AudioChannel::Floor => "floor",
            AudioChannel::Ambient => "ambient",
        }
    }
}

impl fmt::Display for AudioChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn full_volume() -> f32 {
    1.0
}

/// A sound file and how to play it. The file name doubles as the clip id.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct Clip {
    pub file: String,
    #[serde(default = "full_volume")]
    pub volume: f32,
    #[serde(default)]
    pub channel: AudioChannel,
    /// Nominal length, only used when no audio device is available.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Clip {
    pub fn new(file: &str, channel: AudioChannel) -> Self {
        Clip {
            file: file.to_string(),
            volume: full_volume(),
            channel: channel,
            duration_ms: None,
        }
    }

    pub fn on_channel(mut self, channel: AudioChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms.unwrap_or(0))
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on channel:{}", self.file, self.channel)
    }
}

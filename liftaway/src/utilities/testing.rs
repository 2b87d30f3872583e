//! Recording fakes for the lamp and audio capabilities, plus fixtures built
//! on them. Only compiled for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_resources::audio::{AudioChannel, Clip};
use shared_resources::config::{AudioConfig, CueConfig, FlavourConfig, TimingConfig};
use shared_resources::control::FlavourKind;

use crate::modules::action::ActionSet;
use crate::modules::ambient::AmbientTrack;
use crate::modules::audio::{Audio, PlayOptions};
use crate::modules::io::Indicators;
use crate::modules::stage::Stage;
use crate::utilities::error::{AudioError, HardwareError};

fn flavour(files: &[&str], self_interruptible: bool) -> FlavourConfig {
    FlavourConfig {
        clips: files
            .iter()
            .map(|file| Clip::new(file, AudioChannel::Default))
            .collect(),
        self_interruptible: self_interruptible,
        sequence: false,
        duck_ambient: false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FloorIndicator(u8, bool),
    DirectionIndicator(bool),
    CancelIndicator(bool),
    Play(String),
    Fadeout(String),
    Stop(String),
}

#[derive(Default)]
struct Log {
    calls: Mutex<Vec<Call>>,
    options: Mutex<Vec<(String, PlayOptions)>>,
    busy: Mutex<HashMap<AudioChannel, bool>>,
    failing: AtomicBool,
}

/// Records every collaborator call in order. A channel is busy while a
/// looped clip plays on it or after `set_busy(channel, true)`.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Log>,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.log.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn played(&self, file: &str) -> bool {
        self.log
            .calls
            .lock()
            .iter()
            .any(|call| matches!(call, Call::Play(played) if played == file))
    }

    pub fn play_options(&self, file: &str) -> Vec<PlayOptions> {
        self.log
            .options
            .lock()
            .iter()
            .filter(|(played, _)| played == file)
            .map(|(_, options)| *options)
            .collect()
    }

    pub fn set_busy(&self, channel: AudioChannel, busy: bool) {
        self.log.busy.lock().insert(channel, busy);
    }

    /// Makes every call fail without being recorded.
    pub fn fail_all(&self, failing: bool) {
        self.log.failing.store(failing, Ordering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.log.failing.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.log.calls.lock().push(call);
    }

    fn indicator(&self, call: Call) -> Result<(), HardwareError> {
        if self.failing() {
            return Err(HardwareError::Disconnected("recorder"));
        }
        self.record(call);
        Ok(())
    }

    pub fn timing(&self) -> TimingConfig {
        TimingConfig {
            idle_poll_ms: 1,
            cancel_poll_ms: 1,
            travel_min_ms: 1,
            travel_max_ms: 1,
            door_open_ms: 1,
            floor_hold_ms: 2,
            door_close_ms: 1,
            floor_fadeout_ms: 1,
            ambient_fade_ms: 5,
            halt_fadeout_ms: 1,
            interrupted_movement_ms: 1,
            interrupted_floor_ms: 1,
        }
    }

    pub fn stage(&self, num_floors: u8) -> Stage {
        self.stage_with(self.timing(), num_floors)
    }

    pub fn stage_with(&self, timing: TimingConfig, num_floors: u8) -> Stage {
        Stage::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            timing,
            num_floors,
        )
    }

    pub fn audio_config(&self, num_floors: u8) -> AudioConfig {
        let floors = (0..num_floors)
            .map(|floor| {
                vec![
                    Clip::new(&format!("floor{}_a.wav", floor), AudioChannel::Default),
                    Clip::new(&format!("floor{}_b.wav", floor), AudioChannel::Default),
                ]
            })
            .collect();

        let mut flavours = HashMap::new();
        let mut voicemail = flavour(&["voice_vm_ringing.wav", "voice_vm_dutch.wav"], false);
        voicemail.sequence = true;
        flavours.insert(FlavourKind::Voicemail, voicemail);
        let mut emergency = flavour(&["emergency.wav"], false);
        emergency.duck_ambient = true;
        flavours.insert(FlavourKind::Emergency, emergency);
        flavours.insert(
            FlavourKind::Squeaker,
            flavour(&["squeak1.wav", "squeak2.wav"], true),
        );
        flavours.insert(
            FlavourKind::NoPress,
            flavour(&["voice_button_1.wav", "voice_button_2.wav"], false),
        );

        AudioConfig {
            data_dir: "data".into(),
            ambient: Clip::new("muzak.wav", AudioChannel::Ambient),
            cues: CueConfig {
                travel: Clip::new("elevator_travel.wav", AudioChannel::Movement),
                halt: Clip::new("elevator_stop.wav", AudioChannel::Default),
                ding: Clip::new("lift_ding.wav", AudioChannel::Default),
                door_open: Clip::new("elevator_open.wav", AudioChannel::Default),
                door_close: Clip::new("elevator_close2.wav", AudioChannel::Default),
            },
            floors: floors,
            flavours: flavours,
        }
    }

    pub fn ambient(&self, stage: &Stage) -> Arc<AmbientTrack> {
        Arc::new(AmbientTrack::new(
            stage.clone(),
            self.audio_config(stage.num_floors()).ambient,
        ))
    }

    pub fn action_set(&self, stage: &Stage) -> ActionSet {
        let ambient = self.ambient(stage);
        ActionSet::new(stage, &ambient, &self.audio_config(stage.num_floors()))
    }
}

impl Indicators for Recorder {
    fn set_floor_indicator(&self, floor: u8, on: bool) -> Result<(), HardwareError> {
        self.indicator(Call::FloorIndicator(floor, on))
    }

    fn set_direction_indicator(&self, on: bool) -> Result<(), HardwareError> {
        self.indicator(Call::DirectionIndicator(on))
    }

    fn set_cancel_indicator(&self, on: bool) -> Result<(), HardwareError> {
        self.indicator(Call::CancelIndicator(on))
    }
}

impl Audio for Recorder {
    fn play(&self, clip: &Clip, options: &PlayOptions) -> Result<(), AudioError> {
        if self.failing() {
            return Err(AudioError::NoDevice("recorder".to_string()));
        }
        if !options.interrupt_existing && self.is_busy(clip.channel) {
            return Err(AudioError::Busy(clip.channel));
        }
        self.record(Call::Play(clip.file.clone()));
        self.log.options.lock().push((clip.file.clone(), *options));
        if options.looped {
            self.set_busy(clip.channel, true);
        }
        Ok(())
    }

    fn fadeout(&self, clip: &Clip, _fade: Duration) -> Result<(), AudioError> {
        if self.failing() {
            return Err(AudioError::NoDevice("recorder".to_string()));
        }
        self.record(Call::Fadeout(clip.file.clone()));
        self.set_busy(clip.channel, false);
        Ok(())
    }

    fn stop(&self, clip: &Clip) -> Result<(), AudioError> {
        if self.failing() {
            return Err(AudioError::NoDevice("recorder".to_string()));
        }
        self.record(Call::Stop(clip.file.clone()));
        self.set_busy(clip.channel, false);
        Ok(())
    }

    fn is_busy(&self, channel: AudioChannel) -> bool {
        self.log.busy.lock().get(&channel).copied().unwrap_or(false)
    }
}

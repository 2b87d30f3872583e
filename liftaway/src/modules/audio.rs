/// ----- AUDIO MODULE -----
/// The audio capability and its two backends: rodio on a real output device,
/// and a silent stand-in that only logs and keeps channel timing.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use shared_resources::audio::{AudioChannel, Clip};

use crate::utilities::error::AudioError;

const FADE_STEPS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOptions {
    pub blocking: bool,
    pub interrupt_existing: bool,
    pub fade_in_ms: u64,
    pub looped: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        PlayOptions {
            blocking: false,
            interrupt_existing: true,
            fade_in_ms: 0,
            looped: false,
        }
    }
}

impl PlayOptions {
    pub fn new() -> Self {
        PlayOptions::default()
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    pub fn interrupt_existing(mut self, interrupt: bool) -> Self {
        self.interrupt_existing = interrupt;
        self
    }

    pub fn fade_in(mut self, fade: Duration) -> Self {
        self.fade_in_ms = fade.as_millis() as u64;
        self
    }

    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }
}

/// Plays clips on named channels. Implementations never block: blocking
/// plays are built on `is_busy` by the caller.
pub trait Audio: Send + Sync {
    /// Starts `clip` on its channel. Fails with `AudioError::Busy` when the
    /// channel is busy and `interrupt_existing` is false.
    fn play(&self, clip: &Clip, options: &PlayOptions) -> Result<(), AudioError>;
    /// Ramps `clip` down to silence if it is what its channel is playing.
    fn fadeout(&self, clip: &Clip, fade: Duration) -> Result<(), AudioError>;
    fn stop(&self, clip: &Clip) -> Result<(), AudioError>;
    fn is_busy(&self, channel: AudioChannel) -> bool;
}

struct Playback {
    sink: Arc<Sink>,
    file: String,
}

pub struct RodioAudio {
    handle: OutputStreamHandle,
    data_dir: PathBuf,
    channels: Mutex<HashMap<AudioChannel, Playback>>,
}

impl RodioAudio {
    /// Opens the default output device. The returned stream must be kept
    /// alive on the calling thread for as long as audio should play.
    pub fn open(data_dir: &Path) -> Result<(OutputStream, Self), AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::NoDevice(e.to_string()))?;
        info!("Audio output opened, data dir {}", data_dir.display());
        Ok((
            stream,
            RodioAudio {
                handle: handle,
                data_dir: data_dir.to_path_buf(),
                channels: Mutex::new(HashMap::new()),
            },
        ))
    }

    /// Decodes the clip into a paused sink. Touches the disk, so it runs
    /// before the channel table is locked.
    fn prepare(&self, clip: &Clip, options: &PlayOptions) -> Result<Sink, AudioError> {
        let source = decode(&self.data_dir, clip)?;
        let sink = Sink::try_new(&self.handle).map_err(|e| AudioError::NoDevice(e.to_string()))?;
        sink.pause();
        sink.set_volume(clip.volume);
        let fade = Duration::from_millis(options.fade_in_ms);
        match (options.looped, fade.is_zero()) {
            (true, true) => sink.append(source.repeat_infinite()),
            (true, false) => sink.append(source.repeat_infinite().fade_in(fade)),
            (false, true) => sink.append(source),
            (false, false) => sink.append(source.fade_in(fade)),
        }
        Ok(sink)
    }
}

fn decode(data_dir: &Path, clip: &Clip) -> Result<Decoder<BufReader<File>>, AudioError> {
    let path = data_dir.join(&clip.file);
    let file = File::open(&path).map_err(|source| AudioError::Open {
        path: path.display().to_string(),
        source: source,
    })?;
    Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl Audio for RodioAudio {
    fn play(&self, clip: &Clip, options: &PlayOptions) -> Result<(), AudioError> {
        let sink = self.prepare(clip, options)?;

        let mut channels = self.channels.lock();
        if let Some(current) = channels.get(&clip.channel) {
            if !current.sink.empty() {
                if !options.interrupt_existing {
                    return Err(AudioError::Busy(clip.channel));
                }
                current.sink.stop();
            }
        }
        sink.play();
        debug!("Play Sound {}, fadein:{}, loop:{}", clip, options.fade_in_ms, options.looped);

        channels.insert(
            clip.channel,
            Playback {
                sink: Arc::new(sink),
                file: clip.file.clone(),
            },
        );
        Ok(())
    }

    fn fadeout(&self, clip: &Clip, fade: Duration) -> Result<(), AudioError> {
        let sink = {
            let channels = self.channels.lock();
            match channels.get(&clip.channel) {
                Some(current) if current.file == clip.file && !current.sink.empty() => {
                    current.sink.clone()
                }
                _ => return Ok(()),
            }
        };
        debug!("Fadeout Sound {}, fadeout_ms:{}", clip, fade.as_millis());

        let step = fade / FADE_STEPS;
        thread::Builder::new()
            .name("fadeout".to_string())
            .spawn(move || {
                let start = sink.volume();
                for i in (0..FADE_STEPS).rev() {
                    sink.set_volume(start * i as f32 / FADE_STEPS as f32);
                    thread::sleep(step);
                }
                sink.stop();
            })
            .map_err(AudioError::Fade)?;
        Ok(())
    }

    fn stop(&self, clip: &Clip) -> Result<(), AudioError> {
        let channels = self.channels.lock();
        if let Some(current) = channels.get(&clip.channel) {
            if current.file == clip.file {
                current.sink.stop();
            }
        }
        Ok(())
    }

    fn is_busy(&self, channel: AudioChannel) -> bool {
        self.channels
            .lock()
            .get(&channel)
            .map(|current| !current.sink.empty())
            .unwrap_or(false)
    }
}

/// Stand-in used when there is no output device. A channel counts as busy
/// for the nominal duration of the clip it was last asked to play.
#[derive(Default)]
pub struct SilentAudio {
    channels: Mutex<HashMap<AudioChannel, (String, Option<Instant>)>>,
}

impl SilentAudio {
    pub fn new() -> Self {
        SilentAudio::default()
    }
}

impl Audio for SilentAudio {
    fn play(&self, clip: &Clip, options: &PlayOptions) -> Result<(), AudioError> {
        if !options.interrupt_existing && self.is_busy(clip.channel) {
            return Err(AudioError::Busy(clip.channel));
        }
        info!("Play Sound {} (silent)", clip);
        // A looped clip stays busy until it is stopped or faded out.
        let until = if options.looped {
            None
        } else {
            Some(Instant::now() + clip.duration())
        };
        self.channels
            .lock()
            .insert(clip.channel, (clip.file.clone(), until));
        Ok(())
    }

    fn fadeout(&self, clip: &Clip, fade: Duration) -> Result<(), AudioError> {
        let mut channels = self.channels.lock();
        if let Some((file, until)) = channels.get_mut(&clip.channel) {
            if *file == clip.file {
                debug!("Fadeout Sound {} (silent)", clip);
                let faded = Instant::now() + fade;
                *until = Some(until.map_or(faded, |end| end.min(faded)));
            }
        }
        Ok(())
    }

    fn stop(&self, clip: &Clip) -> Result<(), AudioError> {
        let mut channels = self.channels.lock();
        if channels
            .get(&clip.channel)
            .map_or(false, |(file, _)| *file == clip.file)
        {
            channels.remove(&clip.channel);
        }
        Ok(())
    }

    fn is_busy(&self, channel: AudioChannel) -> bool {
        match self.channels.lock().get(&channel) {
            Some((_, None)) => true,
            Some((_, Some(until))) => Instant::now() < *until,
            None => false,
        }
    }
}

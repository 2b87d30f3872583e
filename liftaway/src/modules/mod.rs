use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{info, warn};
use rodio::OutputStream;
use shared_resources::config::LiftConfig;

use crate::utilities::debug::Debug;
use crate::utilities::status::SchedulerStatus;
use crate::Args;

pub mod action;
pub mod ambient;
pub mod audio;
pub mod controls;
pub mod flavour;
pub mod floor;
pub mod interrupt;
pub mod io;
pub mod movement;
pub mod queue;
pub mod scheduler;
pub mod stage;

use self::action::ActionSet;
use self::ambient::AmbientTrack;
use self::audio::{Audio, RodioAudio, SilentAudio};
use self::controls::Controls;
use self::io::Indicators;
use self::queue::ActionQueue;
use self::scheduler::Scheduler;
use self::stage::Stage;

/// The stream has to outlive every sink and stays on the calling thread.
fn open_audio(data_dir: &Path, silent: bool) -> (Option<OutputStream>, Arc<dyn Audio>) {
    if silent {
        info!("Audio disabled, running silent");
        return (None, Arc::new(SilentAudio::new()));
    }
    match RodioAudio::open(data_dir) {
        Ok((stream, audio)) => (Some(stream), Arc::new(audio)),
        Err(e) => {
            warn!("{}; running silent", e);
            (None, Arc::new(SilentAudio::new()))
        }
    }
}

/// Status snapshots only flow under `--status`. Otherwise no sender exists
/// and the receiver reports a disconnect straight away.
fn status_channel(enabled: bool) -> (Option<Sender<SchedulerStatus>>, Receiver<SchedulerStatus>) {
    let (status_tx, status_rx) = unbounded();
    if enabled {
        (Some(status_tx), status_rx)
    } else {
        (None, status_rx)
    }
}

pub fn run(args: Args) -> Result<(), Box<dyn Error>> {
    // READ CONFIGURATION
    let mut config = LiftConfig::get(args.config.as_deref())?;
    if let Some(port) = args.serverport {
        config.server.port = port;
    }
    let num_floors = config.elevator.num_floors;
    info!("Starting with {} floors, simulator on port {}", num_floors, config.server.port);

    // INITIALIZE PANEL
    let (panel, button_press_rx, switch_press_rx) =
        io::init(config.server.port, &config.elevator, &config.panel)?;
    let indicators: Arc<dyn Indicators> = Arc::new(panel);

    // INITIALIZE AUDIO
    let (_stream, audio) = open_audio(&config.audio.data_dir, args.silent);

    // BUILD ACTIONS
    let stage = Stage::new(indicators, audio, config.timing, num_floors);
    let ambient = Arc::new(AmbientTrack::new(stage.clone(), config.audio.ambient.clone()));
    let actions = ActionSet::new(&stage, &ambient, &config.audio);
    let queue = Arc::new(ActionQueue::new(actions));

    // INITIALIZE THREAD FOR SCHEDULER
    let (status_tx, status_rx) = status_channel(args.status);
    let (scheduler, handle) = Scheduler::new(stage, queue, ambient, status_tx);
    let scheduler_thread = thread::Builder::new()
        .name("scheduler".to_string())
        .spawn(move || scheduler.main())?;

    // INITIALIZE THREADS FOR PANEL INPUT
    let controls = Controls::new(config.controls.clone(), handle);
    for (name, presses) in [("buttons", button_press_rx), ("switches", switch_press_rx)] {
        let controls = controls.clone();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || controls.listen(presses))?;
    }
    drop(controls);

    // Ends when the scheduler exits and closes the status channel.
    if args.status {
        let mut debug = Debug::new(num_floors);
        for status in status_rx.iter() {
            debug.printstatus(&status)?;
        }
    }

    if scheduler_thread.join().is_err() {
        return Err("scheduler thread panicked".into());
    }
    info!("STOPPING PROGRAM...");
    Ok(())
}

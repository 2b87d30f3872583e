/// ----- I/O MODULE -----
/// This module is responsible for the prop's panel, the elevator simulator
/// reached through the elevio driver. It polls the buttons and switches,
/// translating presses into input channels, and drives the lamps from
/// their own threads so a dead driver connection never blocks an action.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use driver_rust::elevio::{elev, poll};
use log::{debug, warn};
use shared_resources::config::{ElevatorConfig, PanelConfig};

use crate::utilities::error::HardwareError;

/// The lamps the core knows about. Fire-and-forget from the core's view:
/// errors are only ever logged.
pub trait Indicators: Send + Sync {
    fn set_floor_indicator(&self, floor: u8, on: bool) -> Result<(), HardwareError>;
    fn set_direction_indicator(&self, on: bool) -> Result<(), HardwareError>;
    fn set_cancel_indicator(&self, on: bool) -> Result<(), HardwareError>;
}

/// Lamps on the simulator panel: floor indicators are the cab button lamps,
/// the direction indicator is the door lamp and the cancel indicator is the
/// stop button lamp.
pub struct ElevioPanel {
    num_floors: u8,
    button_light_tx: Sender<(u8, u8, bool)>,
    door_light_tx: Sender<bool>,
    stop_button_light_tx: Sender<bool>,
}

impl Indicators for ElevioPanel {
    fn set_floor_indicator(&self, floor: u8, on: bool) -> Result<(), HardwareError> {
        if floor >= self.num_floors {
            return Err(HardwareError::NoSuchFloor {
                floor: floor,
                num_floors: self.num_floors,
            });
        }
        self.button_light_tx
            .send((floor, elev::CAB, on))
            .map_err(|_| HardwareError::Disconnected("button light"))
    }

    fn set_direction_indicator(&self, on: bool) -> Result<(), HardwareError> {
        self.door_light_tx
            .send(on)
            .map_err(|_| HardwareError::Disconnected("door light"))
    }

    fn set_cancel_indicator(&self, on: bool) -> Result<(), HardwareError> {
        self.stop_button_light_tx
            .send(on)
            .map_err(|_| HardwareError::Disconnected("stop button light"))
    }
}

/// Maps a simulator call button onto the input channel wired to it.
pub fn call_button_channel(panel: &PanelConfig, floor: u8, call: u8) -> Option<u8> {
    match call {
        elev::CAB => panel.cab.get(floor as usize).copied(),
        elev::HALL_UP => panel.hall_up.get(&floor).copied(),
        elev::HALL_DOWN => panel.hall_down.get(&floor).copied(),
        _ => None,
    }
}

/// Connects to the simulator. Returns the lamps, the channels pressed on the
/// call buttons, and the channels pressed on the stop/obstruction switches.
pub fn init(
    server_port: u16,
    elevator_settings: &ElevatorConfig,
    panel: &PanelConfig,
) -> std::io::Result<(ElevioPanel, Receiver<u8>, Receiver<u8>)> {
    let serveraddr = "localhost:".to_owned() + &server_port.to_string();
    let elevator = elev::Elevator::init(serveraddr.as_str(), elevator_settings.num_floors)?;

    let poll_period = Duration::from_millis(25);
    let (button_press_tx, button_press_rx) = unbounded();
    {
        let (call_button_tx, call_button_rx) = unbounded::<poll::CallButton>();
        let elevator = elevator.clone();
        thread::Builder::new().name("poll_call_buttons".to_string()).spawn(move || poll::call_buttons(elevator, call_button_tx, poll_period))?;
        let panel = panel.clone();
        thread::Builder::new().name("call_buttons".to_string()).spawn(move || {
            for button in call_button_rx.iter() {
                match call_button_channel(&panel, button.floor, button.call) {
                    Some(channel) => {
                        if button_press_tx.send(channel).is_err() {
                            break;
                        }
                    }
                    None => debug!("Unwired button: floor {} call {}", button.floor, button.call),
                }
            }
        })?;
    }

    let (switch_press_tx, switch_press_rx) = unbounded();
    if let Some(channel) = panel.stop {
        let (stop_button_tx, stop_button_rx) = unbounded::<bool>();
        let elevator = elevator.clone();
        thread::Builder::new().name("poll_stop_button".to_string()).spawn(move || poll::stop_button(elevator, stop_button_tx, poll_period))?;
        let switch_press_tx = switch_press_tx.clone();
        thread::Builder::new().name("stop_button".to_string()).spawn(move || {
            for pressed in stop_button_rx.iter() {
                if pressed && switch_press_tx.send(channel).is_err() {
                    break;
                }
            }
        })?;
    }
    if let Some(channel) = panel.obstruction {
        let (obstruction_tx, obstruction_rx) = unbounded::<bool>();
        let elevator = elevator.clone();
        thread::Builder::new().name("poll_obstruction".to_string()).spawn(move || poll::obstruction(elevator, obstruction_tx, poll_period))?;
        thread::Builder::new().name("obstruction".to_string()).spawn(move || {
            for active in obstruction_rx.iter() {
                if active && switch_press_tx.send(channel).is_err() {
                    break;
                }
            }
        })?;
    }

    let (button_light_tx, button_light_rx) = unbounded();
    {
        let elevator = elevator.clone();
        thread::Builder::new().name("button_light".to_string()).spawn(move || {
            for (floor, call, on) in button_light_rx.iter() {
                elevator.call_button_light(floor, call, on);
            }
        })?;
    }

    let (door_light_tx, door_light_rx) = unbounded();
    {
        let elevator = elevator.clone();
        thread::Builder::new().name("door_light".to_string()).spawn(move || {
            for on in door_light_rx.iter() {
                elevator.door_light(on);
            }
        })?;
    }

    let (stop_button_light_tx, stop_button_light_rx) = unbounded();
    {
        let elevator = elevator.clone();
        thread::Builder::new().name("stop_button_light".to_string()).spawn(move || {
            for on in stop_button_light_rx.iter() {
                elevator.stop_button_light(on);
            }
        })?;
    }

    // Hall lamps are not indicators; clear whatever a previous run left lit.
    for floor in 0..elevator_settings.num_floors {
        for call in [elev::HALL_UP, elev::HALL_DOWN] {
            if button_light_tx.send((floor, call, false)).is_err() {
                warn!("Button light thread exited during start-up");
            }
        }
    }

    Ok((
        ElevioPanel {
            num_floors: elevator_settings.num_floors,
            button_light_tx: button_light_tx,
            door_light_tx: door_light_tx,
            stop_button_light_tx: stop_button_light_tx,
        },
        button_press_rx,
        switch_press_rx,
    ))
}

use std::time::Duration;

use sdl2::controller::GameController;
use sdl2::event::{Event, EventSender};
use sdl2::joystick::Joystick;
use sdl2::{EventPump, GameControllerSubsystem, JoystickSubsystem};

use super::{Backend, BackendEvent, OpenedDevice, Waker};
use crate::error::{Error, OpenError, Result};
use crate::types::DeviceKind;

/// Custom SDL event used to wake the worker.
struct WakeUp;

/// Handles kept open for a device, depending on the API it was opened with.
pub enum SdlDevice {
    Joystick(Joystick),
    Controller {
        controller: GameController,
        // Keeps counts and the instance id reachable through the joystick API.
        joystick: Joystick,
    },
}

impl SdlDevice {
    pub fn joystick(&self) -> &Joystick {
        match self {
            SdlDevice::Joystick(joystick) => joystick,
            SdlDevice::Controller { joystick, .. } => joystick,
        }
    }

    pub fn controller_mut(&mut self) -> Option<&mut GameController> {
        match self {
            SdlDevice::Controller { controller, .. } => Some(controller),
            SdlDevice::Joystick(_) => None,
        }
    }
}

/// Pushes wake-up events into the SDL queue. SDL allows this from any thread.
pub struct SdlWaker(EventSender);

impl Waker for SdlWaker {
    fn wake(&self) -> Result<()> {
        self.0.push_custom_event(WakeUp).map_err(Error::Backend)
    }
}

/// SDL2-backed driver. Must be created on, and never leave, the worker thread.
pub struct SdlBackend {
    _sdl: sdl2::Sdl,
    joystick_subsystem: JoystickSubsystem,
    controller_subsystem: GameControllerSubsystem,
    event_subsystem: sdl2::EventSubsystem,
    event_pump: EventPump,
}

impl SdlBackend {
    pub fn new() -> Result<Self> {
        // Signals belong to the host process.
        sdl2::hint::set("SDL_NO_SIGNAL_HANDLERS", "1");

        let sdl = sdl2::init().map_err(Error::BackendInit)?;
        let joystick_subsystem = sdl.joystick().map_err(Error::BackendInit)?;
        let controller_subsystem = sdl.game_controller().map_err(Error::BackendInit)?;
        let event_subsystem = sdl.event().map_err(Error::BackendInit)?;
        event_subsystem
            .register_custom_event::<WakeUp>()
            .map_err(Error::BackendInit)?;
        let event_pump = sdl.event_pump().map_err(Error::BackendInit)?;

        Ok(Self {
            _sdl: sdl,
            joystick_subsystem,
            controller_subsystem,
            event_subsystem,
            event_pump,
        })
    }

    fn translate(event: Event) -> BackendEvent {
        match event {
            Event::JoyDeviceAdded { which, .. } => BackendEvent::DeviceAdded { index: which },
            Event::JoyDeviceRemoved { which, .. } => {
                BackendEvent::DeviceRemoved { instance_id: which }
            }
            Event::JoyAxisMotion {
                which,
                axis_idx,
                value,
                ..
            } => BackendEvent::AxisMotion {
                instance_id: which,
                axis: axis_idx,
                value,
            },
            Event::JoyHatMotion {
                which,
                hat_idx,
                state,
                ..
            } => BackendEvent::HatMotion {
                instance_id: which,
                hat: hat_idx,
                bits: state.to_raw(),
            },
            Event::JoyButtonDown {
                which, button_idx, ..
            } => BackendEvent::Button {
                instance_id: which,
                button: button_idx,
                pressed: true,
            },
            Event::JoyButtonUp {
                which, button_idx, ..
            } => BackendEvent::Button {
                instance_id: which,
                button: button_idx,
                pressed: false,
            },
            ev if ev.is_user_event() => match ev.as_user_event_type::<WakeUp>() {
                Some(WakeUp) => BackendEvent::Wake,
                None => BackendEvent::Other,
            },
            _ => BackendEvent::Other,
        }
    }
}

/// Samples every axis right after opening, while the device is at rest.
///
/// The safe binding has no initial-state query, so this is the first value
/// the driver reports. A stick already deflected at plug time becomes its
/// own center until the device is re-plugged.
fn rest_samples(joystick: &Joystick) -> Vec<i16> {
    (0..joystick.num_axes())
        .map(|axis| joystick.axis(axis).unwrap_or(0))
        .collect()
}

impl Backend for SdlBackend {
    type Device = SdlDevice;

    fn open(&mut self, index: u32) -> std::result::Result<OpenedDevice<SdlDevice>, OpenError> {
        let (kind, handle) = if self.controller_subsystem.is_game_controller(index) {
            let controller = self
                .controller_subsystem
                .open(index)
                .map_err(|e| OpenError::new(index, e.to_string()))?;
            let joystick = self
                .joystick_subsystem
                .open(index)
                .map_err(|e| OpenError::new(index, e.to_string()))?;
            (
                DeviceKind::Controller,
                SdlDevice::Controller {
                    controller,
                    joystick,
                },
            )
        } else {
            let joystick = self
                .joystick_subsystem
                .open(index)
                .map_err(|e| OpenError::new(index, e.to_string()))?;
            (DeviceKind::Joystick, SdlDevice::Joystick(joystick))
        };

        let name = match &handle {
            SdlDevice::Controller { controller, .. } => controller.name(),
            SdlDevice::Joystick(joystick) => joystick.name(),
        };
        let joystick = handle.joystick();
        let instance_id = joystick.instance_id();
        let axes = rest_samples(joystick);
        let hat_count = joystick.num_hats() as usize;
        let button_count = joystick.num_buttons() as usize;

        Ok(OpenedDevice {
            instance_id,
            name,
            kind,
            axes,
            hat_count,
            button_count,
            handle,
        })
    }

    fn close(&mut self, device: SdlDevice) {
        // SDL handles close on drop.
        drop(device);
    }

    fn wait_event(&mut self, timeout: Option<Duration>) -> Option<BackendEvent> {
        let event = match timeout {
            None => self.event_pump.wait_event(),
            Some(timeout) => {
                // Round up so the wait never ends before the deadline.
                let ms = timeout.as_micros().div_ceil(1000);
                self.event_pump
                    .wait_event_timeout(u32::try_from(ms).unwrap_or(u32::MAX))?
            }
        };
        Some(Self::translate(event))
    }

    fn start_rumble(
        &mut self,
        device: &mut SdlDevice,
        low: u16,
        high: u16,
        duration_ms: u32,
    ) -> Result<()> {
        match device.controller_mut() {
            Some(controller) => controller
                .set_rumble(low, high, duration_ms)
                .map_err(|e| Error::Backend(e.to_string())),
            None => Ok(()),
        }
    }

    fn stop_rumble(&mut self, device: &mut SdlDevice) -> Result<()> {
        self.start_rumble(device, 0, 0, 0)
    }

    fn waker(&self) -> Box<dyn Waker> {
        Box::new(SdlWaker(self.event_subsystem.event_sender()))
    }
}

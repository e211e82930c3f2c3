use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, warn};

use crate::backend::{Backend, BackendEvent};
use crate::command::Command;
use crate::discretize::{discretize_axis, discretize_hat};
use crate::events::{EventSink, InputEvent};
use crate::registry::Registry;
use crate::settings::Settings;
use crate::types::InstanceId;

/// Longest rumble the driver accepts, in milliseconds.
const MAX_RUMBLE: Duration = Duration::from_millis(u32::MAX as u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rumble {
    low: u16,
    high: u16,
    duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    AwaitingTimeout { deadline: Instant, rumble: Rumble },
}

/// Event loop owning the driver and the device registry.
///
/// The single blocking point is [`Backend::wait_event`]. Cross-thread
/// commands are queued on a channel and announced by a wake event, so they
/// interleave with hardware events in arrival order.
pub(crate) struct Worker<B: Backend, S> {
    backend: B,
    registry: Registry<B::Device>,
    commands: Receiver<Command<B::Device>>,
    sink: S,
    state: LoopState,
    divisor: i32,
}

impl<B: Backend, S: EventSink> Worker<B, S> {
    pub(crate) fn new(
        backend: B,
        commands: Receiver<Command<B::Device>>,
        sink: S,
        settings: &Settings,
    ) -> Self {
        Self {
            backend,
            registry: Registry::new(),
            commands,
            sink,
            state: LoopState::Idle,
            divisor: settings.divisor(),
        }
    }

    /// Runs until a shutdown command. Devices are closed when the worker
    /// is dropped, which also covers unwinding out of a submitted closure.
    pub(crate) fn run(mut self) {
        while self.step().is_continue() {}
        debug!("input worker stopped");
    }

    /// Waits for one input and handles it.
    fn step(&mut self) -> ControlFlow<()> {
        let timeout = match self.state {
            LoopState::Idle => None,
            LoopState::AwaitingTimeout { deadline, .. } => {
                Some(deadline.saturating_duration_since(Instant::now()))
            }
        };
        match self.backend.wait_event(timeout) {
            Some(event) => self.handle(event),
            None => {
                if let LoopState::AwaitingTimeout { rumble, .. } = self.state {
                    debug!("rumble of {:?} elapsed", rumble.duration);
                    self.stop_rumble();
                }
                ControlFlow::Continue(())
            }
        }
    }

    fn handle(&mut self, event: BackendEvent) -> ControlFlow<()> {
        match event {
            BackendEvent::DeviceAdded { index } => {
                let slot = match self.registry.register(&mut self.backend, index) {
                    Ok(id) => self.registry.slot_of(id),
                    Err(e) => {
                        warn!("{e}");
                        None
                    }
                };
                self.sink.emit(InputEvent::Attached { index, slot });
            }
            BackendEvent::DeviceRemoved { instance_id } => {
                let slot = self.registry.unregister(&mut self.backend, instance_id);
                self.sink.emit(InputEvent::Detached { instance_id, slot });
            }
            BackendEvent::AxisMotion {
                instance_id,
                axis,
                value,
            } => self.on_axis(instance_id, axis, value),
            BackendEvent::HatMotion {
                instance_id,
                hat,
                bits,
            } => self.on_hat(instance_id, hat, bits),
            BackendEvent::Button {
                instance_id,
                button,
                pressed,
            } => match self.registry.slot_of(instance_id) {
                Some(slot) => self.sink.emit(InputEvent::RawButton {
                    slot,
                    button,
                    pressed,
                }),
                None => debug!("button {button} of unknown instance {instance_id}"),
            },
            BackendEvent::Wake => return self.drain_commands(),
            BackendEvent::Other => {}
        }
        ControlFlow::Continue(())
    }

    fn on_axis(&mut self, instance_id: InstanceId, axis: u8, sample: i16) {
        let Some(device) = self.registry.get_mut(instance_id) else {
            debug!("axis {axis} of unknown instance {instance_id}");
            return;
        };
        let slot = device.slot();
        let Some(state) = device.axes.get_mut(usize::from(axis)) else {
            debug!("slot {slot}: axis {axis} out of range");
            return;
        };
        let transition = discretize_axis(state, sample, self.divisor);

        self.sink.emit(InputEvent::RawAxis { slot, axis, sample });
        if let Some(t) = transition {
            self.sink.emit(InputEvent::DiscreteAxis {
                slot,
                axis,
                direction: t.direction,
                pressed: t.pressed,
            });
        }
    }

    fn on_hat(&mut self, instance_id: InstanceId, hat: u8, bits: u8) {
        let Some(device) = self.registry.get_mut(instance_id) else {
            debug!("hat {hat} of unknown instance {instance_id}");
            return;
        };
        let slot = device.slot();
        let Some(state) = device.hats.get_mut(usize::from(hat)) else {
            debug!("slot {slot}: hat {hat} out of range");
            return;
        };
        let transition = discretize_hat(state, bits);

        self.sink.emit(InputEvent::RawHat { slot, hat, bits });
        if let Some(t) = transition {
            self.sink.emit(InputEvent::DiscreteHat {
                slot,
                hat,
                direction: t.direction,
                pressed: t.pressed,
            });
        }
    }

    fn drain_commands(&mut self) -> ControlFlow<()> {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Work(work)) => work(&mut self.registry),
                Ok(Command::Rumble {
                    low,
                    high,
                    duration,
                }) => self.start_rumble(Rumble {
                    low,
                    high,
                    duration,
                }),
                Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => {
                    return ControlFlow::Break(())
                }
                Err(TryRecvError::Empty) => return ControlFlow::Continue(()),
            }
        }
    }

    fn start_rumble(&mut self, mut rumble: Rumble) {
        rumble.duration = rumble.duration.min(MAX_RUMBLE);
        let duration_ms = u32::try_from(rumble.duration.as_millis()).unwrap_or(u32::MAX);
        for device in self.registry.controllers_mut() {
            if let Err(e) =
                self.backend
                    .start_rumble(device.handle_mut(), rumble.low, rumble.high, duration_ms)
            {
                warn!("slot {}: failed to set rumble: {e}", device.slot());
            }
        }
        self.state = match Instant::now().checked_add(rumble.duration) {
            Some(deadline) => LoopState::AwaitingTimeout { deadline, rumble },
            None => {
                warn!("rumble of {:?} has no representable deadline", rumble.duration);
                LoopState::Idle
            }
        };
    }

    fn stop_rumble(&mut self) {
        for device in self.registry.controllers_mut() {
            if let Err(e) = self.backend.stop_rumble(device.handle_mut()) {
                warn!("slot {}: failed to stop rumble: {e}", device.slot());
            }
        }
        self.state = LoopState::Idle;
    }
}

impl<B: Backend, S> Drop for Worker<B, S> {
    fn drop(&mut self) {
        self.registry.close_all(&mut self.backend);
    }
}

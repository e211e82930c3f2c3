//! Hot-pluggable joystick and game controller input.
//!
//! A single worker thread owns the device driver and every open device. It
//! turns noisy axis samples and hat masks into debounced press/release
//! events, while other threads reach the device registry only through
//! [`InputManager::submit`].

mod backend;
mod command;
mod device;
mod discretize;
mod error;
mod events;
mod manager;
mod registry;
mod runtime;
mod settings;
mod types;

pub use crate::backend::{Backend, BackendEvent, OpenedDevice, Waker};
#[cfg(feature = "sdl2-backend")]
pub use crate::backend::{SdlBackend, SdlDevice, SdlWaker};
pub use crate::device::{AxisState, Device, HatState};
pub use crate::discretize::{
    axis_zone, discretize_axis, discretize_hat, AxisTransition, HatTransition,
};
pub use crate::error::{Error, OpenError, Result};
pub use crate::events::{Broadcaster, EventReceiver, EventSink, InputEvent};
pub use crate::manager::InputManager;
pub use crate::registry::Registry;
pub use crate::settings::{Settings, DEFAULT_AXIS_THRESHOLD_DIVISOR, DEFAULT_THREAD_NAME};
pub use crate::types::{AxisDirection, DeviceInfo, DeviceKind, HatDirection, InstanceId, Slot};

//! Seam between the worker and the device driver library.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "sdl2-backend")]
mod sdl;

use std::time::Duration;

#[cfg(feature = "sdl2-backend")]
pub use sdl::{SdlBackend, SdlDevice, SdlWaker};

use crate::error::{OpenError, Result};
use crate::types::{DeviceKind, InstanceId};

/// Everything the driver reports about a device when it is opened.
pub struct OpenedDevice<D> {
    pub instance_id: InstanceId,
    pub name: String,
    pub kind: DeviceKind,
    /// Rest sample of each axis at open time.
    pub axes: Vec<i16>,
    pub hat_count: usize,
    pub button_count: usize,
    pub handle: D,
}

/// Raw event delivered by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    /// A device appeared at the given enumeration index.
    DeviceAdded { index: u32 },
    /// A device was unplugged.
    DeviceRemoved { instance_id: InstanceId },
    AxisMotion { instance_id: InstanceId, axis: u8, value: i16 },
    HatMotion { instance_id: InstanceId, hat: u8, bits: u8 },
    Button { instance_id: InstanceId, button: u8, pressed: bool },
    /// Token pushed by a [`Waker`]: cross-thread requests are pending.
    Wake,
    /// Any other driver event. Still counts as activity for the rumble deadline.
    Other,
}

/// Wakes the worker's blocking wait from any thread.
pub trait Waker: Send + Sync + 'static {
    fn wake(&self) -> Result<()>;
}

/// Device driver used by the worker thread.
///
/// Implementations live entirely on the worker thread and need not be `Send`.
pub trait Backend {
    /// Handle(s) kept open for a registered device.
    type Device: 'static;

    /// Opens the device at an enumeration index.
    fn open(&mut self, index: u32) -> std::result::Result<OpenedDevice<Self::Device>, OpenError>;

    /// Releases a device handle.
    fn close(&mut self, device: Self::Device);

    /// Blocks until the next event. `None` means `timeout` elapsed first.
    fn wait_event(&mut self, timeout: Option<Duration>) -> Option<BackendEvent>;

    fn start_rumble(
        &mut self,
        device: &mut Self::Device,
        low: u16,
        high: u16,
        duration_ms: u32,
    ) -> Result<()>;

    fn stop_rumble(&mut self, device: &mut Self::Device) -> Result<()>;

    /// Returns a waker pushing [`BackendEvent::Wake`] into this backend's queue.
    fn waker(&self) -> Box<dyn Waker>;
}

use smallvec::SmallVec;

use crate::backend::OpenedDevice;
use crate::types::{DeviceInfo, DeviceKind, InstanceId, Slot};

/// Debounce state of one analog axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisState {
    /// Rest sample captured when the device was opened.
    pub initial: i16,
    /// Last raw sample observed.
    pub last: i16,
}

impl AxisState {
    pub fn new(initial: i16) -> Self {
        Self {
            initial,
            last: initial,
        }
    }
}

/// Debounce state of one hat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HatState {
    pub bits: u8,
}

/// An open device together with its per-axis and per-hat debounce state.
pub struct Device<D> {
    instance_id: InstanceId,
    slot: Slot,
    name: String,
    kind: DeviceKind,
    pub(crate) axes: SmallVec<[AxisState; 8]>,
    pub(crate) hats: SmallVec<[HatState; 4]>,
    button_count: usize,
    handle: D,
}

impl<D> Device<D> {
    pub(crate) fn from_opened(opened: OpenedDevice<D>, slot: Slot) -> Self {
        Self {
            instance_id: opened.instance_id,
            slot,
            name: opened.name,
            kind: opened.kind,
            axes: opened.axes.into_iter().map(AxisState::new).collect(),
            hats: std::iter::repeat(HatState::default())
                .take(opened.hat_count)
                .collect(),
            button_count: opened.button_count,
            handle: opened.handle,
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn axes(&self) -> &[AxisState] {
        &self.axes
    }

    pub fn hats(&self) -> &[HatState] {
        &self.hats
    }

    pub fn button_count(&self) -> usize {
        self.button_count
    }

    pub fn handle(&self) -> &D {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut D {
        &mut self.handle
    }

    pub(crate) fn into_handle(self) -> D {
        self.handle
    }

    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            instance_id: self.instance_id,
            slot: self.slot,
            name: self.name.clone(),
            kind: self.kind,
            axes: self.axes.len(),
            hats: self.hats.len(),
            buttons: self.button_count,
        }
    }
}

impl<D> std::fmt::Debug for Device<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("instance_id", &self.instance_id)
            .field("slot", &self.slot)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("axes", &self.axes)
            .field("hats", &self.hats)
            .field("button_count", &self.button_count)
            .finish_non_exhaustive()
    }
}

use ahash::AHashMap;
use log::info;

use crate::backend::Backend;
use crate::device::Device;
use crate::error::OpenError;
use crate::types::{DeviceInfo, InstanceId, Slot};

/// Open devices keyed by driver instance id.
///
/// Owned by the worker thread. Other threads reach it only through
/// [`InputManager::submit`](crate::InputManager::submit).
pub struct Registry<D> {
    devices: AHashMap<InstanceId, Device<D>>,
}

impl<D> Default for Registry<D> {
    fn default() -> Self {
        Self {
            devices: AHashMap::new(),
        }
    }
}

impl<D: 'static> Registry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the device at `index` and assigns it the first free slot.
    ///
    /// Nothing is inserted if the driver fails to open the device. If the
    /// instance is already registered the fresh handle is closed and the
    /// existing entry kept.
    pub fn register<B>(&mut self, backend: &mut B, index: u32) -> Result<InstanceId, OpenError>
    where
        B: Backend<Device = D>,
    {
        let opened = backend.open(index)?;
        let instance_id = opened.instance_id;
        if self.devices.contains_key(&instance_id) {
            backend.close(opened.handle);
            return Ok(instance_id);
        }

        let device = Device::from_opened(opened, self.first_free_slot());
        info!(
            "Slot {}: {}: {} axes, {} buttons, {} hats, {} API",
            device.slot(),
            device.name(),
            device.axes().len(),
            device.button_count(),
            device.hats().len(),
            device.kind().api_name()
        );
        self.devices.insert(instance_id, device);
        Ok(instance_id)
    }

    /// Closes and removes a device, returning the slot it occupied.
    /// Unknown ids are ignored.
    pub fn unregister<B>(&mut self, backend: &mut B, instance_id: InstanceId) -> Option<Slot>
    where
        B: Backend<Device = D>,
    {
        let device = self.devices.remove(&instance_id)?;
        let slot = device.slot();
        backend.close(device.into_handle());
        Some(slot)
    }

    /// Closes every device.
    pub fn close_all<B>(&mut self, backend: &mut B)
    where
        B: Backend<Device = D>,
    {
        for (_, device) in self.devices.drain() {
            backend.close(device.into_handle());
        }
    }

    pub fn slot_of(&self, instance_id: InstanceId) -> Option<Slot> {
        self.devices.get(&instance_id).map(Device::slot)
    }

    /// Smallest slot not claimed by an open device.
    pub fn first_free_slot(&self) -> Slot {
        (0..)
            .find(|slot| self.devices.values().all(|d| d.slot() != *slot))
            .unwrap_or(self.devices.len())
    }

    pub fn get(&self, instance_id: InstanceId) -> Option<&Device<D>> {
        self.devices.get(&instance_id)
    }

    pub fn get_mut(&mut self, instance_id: InstanceId) -> Option<&mut Device<D>> {
        self.devices.get_mut(&instance_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device<D>> {
        self.devices.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device<D>> {
        self.devices.values_mut()
    }

    /// Controller-kind devices, the only ones that can rumble.
    pub fn controllers_mut(&mut self) -> impl Iterator<Item = &mut Device<D>> {
        self.devices.values_mut().filter(|d| d.kind().is_controller())
    }

    /// Snapshot of every device, ordered by slot.
    pub fn infos(&self) -> Vec<DeviceInfo> {
        let mut infos: Vec<DeviceInfo> = self.devices.values().map(Device::info).collect();
        infos.sort_by_key(|info| info.slot);
        infos
    }
}

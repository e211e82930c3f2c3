use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ahash::AHashMap;
use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{Backend, BackendEvent, OpenedDevice, Waker};
use crate::error::{Error, OpenError, Result};
use crate::types::{DeviceKind, InstanceId};

/// Description of a fake device plugged at some enumeration index.
#[derive(Debug, Clone)]
pub(crate) struct MockSpec {
    pub instance_id: InstanceId,
    pub kind: DeviceKind,
    pub axes: Vec<i16>,
    pub hats: usize,
    pub buttons: usize,
    pub fail_open: bool,
}

impl MockSpec {
    pub fn controller(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            kind: DeviceKind::Controller,
            axes: vec![0; 4],
            hats: 1,
            buttons: 2,
            fail_open: false,
        }
    }

    pub fn joystick(instance_id: InstanceId) -> Self {
        Self {
            kind: DeviceKind::Joystick,
            ..Self::controller(instance_id)
        }
    }
}

/// Driver calls recorded by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Open(u32),
    Close(InstanceId),
    StartRumble {
        instance_id: InstanceId,
        low: u16,
        high: u16,
        duration_ms: u32,
    },
    StopRumble(InstanceId),
}

#[derive(Debug)]
pub(crate) struct MockHandle {
    pub instance_id: InstanceId,
}

/// Test-side remote of a [`MockBackend`].
#[derive(Clone)]
pub(crate) struct MockControl {
    tx: Sender<BackendEvent>,
    catalog: Arc<Mutex<AHashMap<u32, MockSpec>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    wake_fails: Arc<AtomicBool>,
}

impl MockControl {
    /// Makes a device available at `index` and reports its attachment.
    pub fn plug(&self, index: u32, spec: MockSpec) {
        self.catalog.lock().unwrap().insert(index, spec);
        self.send(BackendEvent::DeviceAdded { index });
    }

    pub fn unplug(&self, instance_id: InstanceId) {
        self.send(BackendEvent::DeviceRemoved { instance_id });
    }

    pub fn send(&self, event: BackendEvent) {
        self.tx.send(event).unwrap();
    }

    /// Makes every waker of the backend report an error without waking.
    pub fn fail_wakes(&self, fail: bool) {
        self.wake_fails.store(fail, Ordering::Release);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(*c)).count()
    }
}

/// In-memory driver: events come from a channel, calls are recorded.
pub(crate) struct MockBackend {
    tx: Sender<BackendEvent>,
    rx: Receiver<BackendEvent>,
    catalog: Arc<Mutex<AHashMap<u32, MockSpec>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    wake_fails: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn new() -> (Self, MockControl) {
        let (tx, rx) = unbounded();
        let catalog = Arc::new(Mutex::new(AHashMap::new()));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let wake_fails = Arc::new(AtomicBool::new(false));
        let control = MockControl {
            tx: tx.clone(),
            catalog: catalog.clone(),
            calls: calls.clone(),
            wake_fails: wake_fails.clone(),
        };
        (
            Self {
                tx,
                rx,
                catalog,
                calls,
                wake_fails,
            },
            control,
        )
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

struct MockWaker {
    tx: Sender<BackendEvent>,
    fails: Arc<AtomicBool>,
}

impl Waker for MockWaker {
    fn wake(&self) -> Result<()> {
        if self.fails.load(Ordering::Acquire) {
            return Err(Error::Backend("event queue full".into()));
        }
        self.tx
            .send(BackendEvent::Wake)
            .map_err(|e| Error::Backend(e.to_string()))
    }
}

impl Backend for MockBackend {
    type Device = MockHandle;

    fn open(&mut self, index: u32) -> std::result::Result<OpenedDevice<MockHandle>, OpenError> {
        self.record(Call::Open(index));
        let spec = self
            .catalog
            .lock()
            .unwrap()
            .get(&index)
            .cloned()
            .ok_or_else(|| OpenError::new(index, "no such device"))?;
        if spec.fail_open {
            return Err(OpenError::new(index, "device busy"));
        }
        Ok(OpenedDevice {
            instance_id: spec.instance_id,
            name: format!("mock {}", spec.instance_id),
            kind: spec.kind,
            axes: spec.axes,
            hat_count: spec.hats,
            button_count: spec.buttons,
            handle: MockHandle {
                instance_id: spec.instance_id,
            },
        })
    }

    fn close(&mut self, device: MockHandle) {
        self.record(Call::Close(device.instance_id));
    }

    fn wait_event(&mut self, timeout: Option<Duration>) -> Option<BackendEvent> {
        match timeout {
            None => self.rx.recv().ok(),
            Some(timeout) => self.rx.recv_timeout(timeout).ok(),
        }
    }

    fn start_rumble(
        &mut self,
        device: &mut MockHandle,
        low: u16,
        high: u16,
        duration_ms: u32,
    ) -> Result<()> {
        self.record(Call::StartRumble {
            instance_id: device.instance_id,
            low,
            high,
            duration_ms,
        });
        Ok(())
    }

    fn stop_rumble(&mut self, device: &mut MockHandle) -> Result<()> {
        self.record(Call::StopRumble(device.instance_id));
        Ok(())
    }

    fn waker(&self) -> Box<dyn Waker> {
        Box::new(MockWaker {
            tx: self.tx.clone(),
            fails: self.wake_fails.clone(),
        })
    }
}

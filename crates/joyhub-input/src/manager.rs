use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Sender};
use log::{error, warn};

use crate::backend::{Backend, Waker};
#[cfg(feature = "sdl2-backend")]
use crate::backend::{SdlBackend, SdlDevice};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::events::{Broadcaster, EventReceiver};
use crate::registry::Registry;
use crate::runtime::Worker;
use crate::settings::Settings;
use crate::types::{DeviceInfo, InstanceId, Slot};

/// Handle to the input worker thread.
///
/// The worker owns the driver and every open device. This handle only queues
/// commands for it, so it can be shared between threads.
pub struct InputManager<D: 'static> {
    commands: Sender<Command<D>>,
    waker: Box<dyn Waker>,
    broadcaster: Broadcaster,
    shutting_down: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

#[cfg(feature = "sdl2-backend")]
impl InputManager<SdlDevice> {
    /// Starts the SDL2-backed worker with default settings.
    pub fn new() -> Result<Self> {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Result<Self> {
        Self::start(settings, SdlBackend::new)
    }

    /// Like [`with_settings`](Self::with_settings), publishing events through
    /// a broadcaster the caller may have subscribed to already. Devices that
    /// are plugged in at startup are reported right away, so subscribing
    /// first is the only way to see their attach events.
    pub fn with_broadcaster(settings: Settings, broadcaster: Broadcaster) -> Result<Self> {
        Self::start_with(settings, broadcaster, SdlBackend::new)
    }
}

impl<D: 'static> InputManager<D> {
    /// Spawns the worker thread and waits until its backend is initialized.
    ///
    /// `factory` runs on the worker thread, so the backend itself need not be `Send`.
    pub fn start<B, F>(settings: Settings, factory: F) -> Result<Self>
    where
        B: Backend<Device = D>,
        F: FnOnce() -> Result<B> + Send + 'static,
    {
        Self::start_with(settings, Broadcaster::new(), factory)
    }

    /// Same as [`start`](Self::start) with a caller-provided broadcaster.
    pub fn start_with<B, F>(settings: Settings, broadcaster: Broadcaster, factory: F) -> Result<Self>
    where
        B: Backend<Device = D>,
        F: FnOnce() -> Result<B> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = unbounded::<Command<D>>();
        let sink = broadcaster.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<Box<dyn Waker>>>();

        let handle = thread::Builder::new()
            .name(settings.thread_name.clone())
            .spawn(move || {
                // The backend must live entirely within this thread
                let backend = match factory() {
                    Ok(backend) => backend,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(backend.waker())).is_err() {
                    return;
                }
                Worker::new(backend, cmd_rx, sink, &settings).run();
            })
            .map_err(|e| Error::BackendInit(e.to_string()))?;

        let waker = match ready_rx.recv() {
            Ok(Ok(waker)) => waker,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(Error::BackendInit("input worker exited during init".into()));
            }
        };

        Ok(Self {
            commands: cmd_tx,
            waker,
            broadcaster,
            shutting_down: AtomicBool::new(false),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Subscribes to input events. Dropped subscribers are cleaned automatically.
    pub fn subscribe(&self) -> EventReceiver {
        self.broadcaster.subscribe()
    }

    /// Runs `work` on the worker thread with exclusive access to the registry
    /// and blocks until it returns.
    pub fn submit<R, F>(&self, work: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut Registry<D>) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(Command::Work(Box::new(move |registry: &mut Registry<D>| {
            let _ = reply_tx.send(work(registry));
        })))?;
        // The closure is dropped unrun if the worker stops first.
        reply_rx.recv().map_err(|_| Error::ShutdownInProgress)
    }

    /// Rumbles every open controller. The worker stops it once `duration`
    /// passes without any other input arriving in between.
    pub fn rumble(&self, low: u16, high: u16, duration: Duration) -> Result<()> {
        self.send(Command::Rumble {
            low,
            high,
            duration,
        })
    }

    /// Snapshot of every open device, ordered by slot.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        self.submit(|registry| registry.infos())
    }

    /// Snapshot of open devices using the game controller API.
    pub fn controllers(&self) -> Result<Vec<DeviceInfo>> {
        self.submit(|registry| {
            registry
                .infos()
                .into_iter()
                .filter(|info| info.kind.is_controller())
                .collect()
        })
    }

    /// Current slot of a device.
    pub fn slot_of(&self, instance_id: InstanceId) -> Result<Slot> {
        self.submit(move |registry| registry.slot_of(instance_id))?
            .ok_or(Error::UnknownInstance(instance_id))
    }

    /// False once shutdown has begun or the worker thread has exited.
    pub fn is_running(&self) -> bool {
        if self.shutting_down.load(Ordering::Acquire) {
            return false;
        }
        self.worker
            .lock()
            .is_ok_and(|worker| worker.as_ref().is_some_and(|h| !h.is_finished()))
    }

    /// Stops the worker and blocks until every device is closed.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        let first = !self.shutting_down.swap(true, Ordering::AcqRel);
        if first && self.commands.send(Command::Shutdown).is_ok() {
            if let Err(e) = self.waker.wake() {
                warn!("failed to wake input worker: {e}");
            }
        }

        let Ok(mut worker) = self.worker.lock() else {
            return;
        };
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                error!("input worker panicked");
            }
        }
    }

    /// Queues `command` and wakes the worker.
    ///
    /// A failed wake-up leaves the command queued: it runs with the next
    /// command or shutdown that does get through.
    fn send(&self, command: Command<D>) -> Result<()> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(Error::ShutdownInProgress);
        }
        self.commands
            .send(command)
            .map_err(|_| Error::ShutdownInProgress)?;
        self.waker.wake()
    }
}

impl<D: 'static> Drop for InputManager<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::backend::mock::{Call, MockBackend, MockControl, MockHandle, MockSpec};
    use crate::backend::BackendEvent;
    use crate::events::InputEvent;
    use crate::types::AxisDirection;

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn start() -> (InputManager<MockHandle>, MockControl) {
        let (backend, control) = MockBackend::new();
        let manager = InputManager::start(Settings::default(), move || Ok(backend)).unwrap();
        (manager, control)
    }

    fn wait_for(control: &MockControl, pred: impl Fn(&Call) -> bool) -> Instant {
        let deadline = Instant::now() + TIMEOUT;
        while control.count(&pred) == 0 {
            assert!(Instant::now() < deadline, "timed out waiting for driver call");
            thread::sleep(Duration::from_millis(2));
        }
        Instant::now()
    }

    #[test]
    fn backend_init_failure_is_reported() {
        let result = InputManager::<MockHandle>::start(Settings::default(), || {
            Err::<MockBackend, _>(Error::BackendInit("no joystick subsystem".into()))
        });
        assert!(matches!(result, Err(Error::BackendInit(_))));
    }

    #[test]
    fn hot_plug_scenario_assigns_lowest_free_slot() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1)); // A
        control.plug(1, MockSpec::controller(2)); // B
        let slots = manager
            .submit(|r| (r.slot_of(1), r.slot_of(2)))
            .unwrap();
        assert_eq!(slots, (Some(0), Some(1)));

        control.unplug(1);
        assert_eq!(manager.submit(|r| (r.slot_of(2), r.first_free_slot())).unwrap(), (Some(1), 0));

        control.plug(0, MockSpec::controller(3)); // C
        assert_eq!(manager.slot_of(3).unwrap(), 0);
        assert!(matches!(manager.slot_of(1), Err(Error::UnknownInstance(1))));

        let infos = manager.devices().unwrap();
        let slots: Vec<_> = infos.iter().map(|i| (i.slot, i.instance_id)).collect();
        assert_eq!(slots, vec![(0, 3), (1, 2)]);
        assert_eq!(infos[0].axes, 4);
        assert_eq!(infos[0].hats, 1);
        assert_eq!(infos[0].buttons, 2);
    }

    #[test]
    fn subscribers_receive_discrete_events() {
        let (manager, control) = start();
        let events = manager.subscribe();
        control.plug(0, MockSpec::joystick(5));
        control.send(BackendEvent::AxisMotion {
            instance_id: 5,
            axis: 0,
            value: -30000,
        });

        let received: Vec<_> = (0..3)
            .map(|_| events.recv_timeout(TIMEOUT).unwrap())
            .collect();
        assert_eq!(
            received,
            vec![
                InputEvent::Attached { index: 0, slot: Some(0) },
                InputEvent::RawAxis { slot: 0, axis: 0, sample: -30000 },
                InputEvent::DiscreteAxis {
                    slot: 0,
                    axis: 0,
                    direction: AxisDirection::Negative,
                    pressed: true,
                },
            ]
        );
    }

    #[test]
    fn early_subscribers_see_startup_devices() {
        let (backend, control) = MockBackend::new();
        // already plugged when the worker starts
        control.plug(0, MockSpec::controller(1));

        let broadcaster = Broadcaster::new();
        let events = broadcaster.subscribe();
        let manager =
            InputManager::start_with(Settings::default(), broadcaster, move || Ok(backend)).unwrap();
        assert_eq!(
            events.recv_timeout(TIMEOUT).unwrap(),
            InputEvent::Attached { index: 0, slot: Some(0) }
        );
        assert_eq!(manager.controllers().unwrap()[0].name, "mock 1");
    }

    #[test]
    fn unopenable_device_is_invisible() {
        let (manager, control) = start();
        let events = manager.subscribe();
        control.plug(
            0,
            MockSpec {
                fail_open: true,
                ..MockSpec::controller(1)
            },
        );
        assert_eq!(
            events.recv_timeout(TIMEOUT).unwrap(),
            InputEvent::Attached { index: 0, slot: None }
        );
        assert!(manager.devices().unwrap().is_empty());
    }

    #[test]
    fn rumble_stops_all_controllers_exactly_once() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1));
        control.plug(1, MockSpec::controller(2));
        control.plug(2, MockSpec::joystick(3));
        assert_eq!(manager.controllers().unwrap().len(), 2);

        let requested = Instant::now();
        manager.rumble(0x4000, 0xffff, Duration::from_millis(50)).unwrap();
        let stopped = wait_for(&control, |c| matches!(c, Call::StopRumble(_)));
        assert!(stopped - requested >= Duration::from_millis(50));

        thread::sleep(Duration::from_millis(100));
        assert_eq!(control.count(|c| matches!(c, Call::StartRumble { .. })), 2);
        assert_eq!(control.count(|c| *c == Call::StopRumble(1)), 1);
        assert_eq!(control.count(|c| *c == Call::StopRumble(2)), 1);
        assert_eq!(control.count(|c| *c == Call::StopRumble(3)), 0);
    }

    #[test]
    fn concurrent_work_sees_whole_devices() {
        let (manager, control) = start();
        let manager = Arc::new(manager);

        let plugger = {
            let control = control.clone();
            thread::spawn(move || control.plug(0, MockSpec::controller(1)))
        };
        let observed = manager
            .submit(|r| {
                let axes = r.get(1).map(|d| d.axes().len());
                (r.len(), axes)
            })
            .unwrap();
        plugger.join().unwrap();

        assert!(
            observed == (0, None) || observed == (1, Some(4)),
            "observed {observed:?}"
        );
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 1);
    }

    #[test]
    fn work_from_many_threads_runs_in_worker() {
        let (manager, _control) = start();
        let manager = Arc::new(manager);
        let worker_name = manager
            .submit(|_| thread::current().name().map(str::to_string))
            .unwrap();
        assert_eq!(worker_name.as_deref(), Some("joyhub-input"));

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let manager = manager.clone();
                thread::spawn(move || manager.submit(move |r| r.len() + n).unwrap())
            })
            .collect();
        let mut results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        results.sort_unstable();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[test]
    fn shutdown_is_idempotent_and_releases_devices() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1));
        control.plug(1, MockSpec::joystick(2));
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 2);

        manager.shutdown();
        assert!(!manager.is_running());
        assert_eq!(control.count(|c| matches!(c, Call::Close(_))), 2);

        manager.shutdown();
        assert_eq!(control.count(|c| matches!(c, Call::Close(_))), 2);

        assert!(matches!(manager.submit(|r| r.len()), Err(Error::ShutdownInProgress)));
        assert!(matches!(
            manager.rumble(1, 1, Duration::from_millis(10)),
            Err(Error::ShutdownInProgress)
        ));
    }

    #[test]
    fn unbounded_rumble_keeps_worker_alive() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1));
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 1);

        manager.rumble(1, 1, Duration::MAX).unwrap();
        wait_for(&control, |c| matches!(c, Call::StartRumble { .. }));
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 1);
        assert!(manager.is_running());

        manager.shutdown();
        assert_eq!(control.count(|c| *c == Call::Close(1)), 1);
    }

    #[test]
    fn panicking_work_releases_devices() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1));
        control.plug(1, MockSpec::joystick(2));
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 2);

        let result = manager.submit(|_| -> usize { panic!("work failed") });
        assert!(matches!(result, Err(Error::ShutdownInProgress)));

        let deadline = Instant::now() + TIMEOUT;
        while manager.is_running() {
            assert!(Instant::now() < deadline, "worker still reported as running");
            thread::sleep(Duration::from_millis(2));
        }
        manager.shutdown();
        assert_eq!(control.count(|c| *c == Call::Close(1)), 1);
        assert_eq!(control.count(|c| *c == Call::Close(2)), 1);
        assert!(matches!(manager.submit(|r| r.len()), Err(Error::ShutdownInProgress)));
    }

    #[test]
    fn command_behind_failed_wake_runs_on_next_wake() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1));
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 1);

        control.fail_wakes(true);
        assert!(matches!(
            manager.rumble(7, 8, Duration::from_millis(10)),
            Err(Error::Backend(_))
        ));
        assert_eq!(control.count(|c| matches!(c, Call::StartRumble { .. })), 0);

        control.fail_wakes(false);
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 1);
        assert_eq!(
            control.count(|c| matches!(c, Call::StartRumble { instance_id: 1, low: 7, high: 8, .. })),
            1
        );
    }

    #[test]
    fn drop_shuts_worker_down() {
        let (manager, control) = start();
        control.plug(0, MockSpec::controller(1));
        assert_eq!(manager.submit(|r| r.len()).unwrap(), 1);
        drop(manager);
        assert_eq!(control.count(|c| *c == Call::Close(1)), 1);
    }
}

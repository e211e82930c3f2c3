use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};

use crate::types::{AxisDirection, HatDirection, InstanceId, Slot};

/// Events produced by the input worker, tagged with the device slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Raw axis sample, forwarded for every motion.
    RawAxis { slot: Slot, axis: u8, sample: i16 },
    /// Raw hat mask, forwarded for every motion.
    RawHat { slot: Slot, hat: u8, bits: u8 },
    /// Raw button transition. Buttons are not debounced.
    RawButton { slot: Slot, button: u8, pressed: bool },
    /// An axis entered (`pressed`) or left one of its extreme zones.
    DiscreteAxis {
        slot: Slot,
        axis: u8,
        direction: AxisDirection,
        pressed: bool,
    },
    /// A hat direction was pressed or released.
    DiscreteHat {
        slot: Slot,
        hat: u8,
        direction: HatDirection,
        pressed: bool,
    },
    /// The driver reported a device at `index`; `slot` is `None` if it failed to open.
    Attached { index: u32, slot: Option<Slot> },
    /// The driver reported a device gone; `slot` is `None` if it was never registered.
    Detached {
        instance_id: InstanceId,
        slot: Option<Slot>,
    },
}

impl InputEvent {
    /// Whether the event carries a raw driver sample rather than a derived one.
    pub fn is_raw(&self) -> bool {
        matches!(
            self,
            InputEvent::RawAxis { .. } | InputEvent::RawHat { .. } | InputEvent::RawButton { .. }
        )
    }
}

/// Receiving end for input event subscription.
pub type EventReceiver = Receiver<InputEvent>;

/// Consumer of events produced by the worker thread.
pub trait EventSink: Send + 'static {
    fn emit(&mut self, event: InputEvent);
}

impl<F> EventSink for F
where
    F: FnMut(InputEvent) + Send + 'static,
{
    fn emit(&mut self, event: InputEvent) {
        self(event);
    }
}

/// Fans events out to every live subscriber.
#[derive(Clone, Default)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<Vec<Sender<InputEvent>>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to events. Dropped subscribers are cleaned automatically.
    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = crossbeam_channel::unbounded();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl EventSink for Broadcaster {
    fn emit(&mut self, event: InputEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event).is_ok());
        }
    }
}

use std::time::Duration;

use crate::registry::Registry;

/// Closure run on the worker thread with exclusive registry access.
pub(crate) type Work<D> = Box<dyn FnOnce(&mut Registry<D>) + Send>;

/// Internal commands sent to the runtime thread.
pub(crate) enum Command<D> {
    Work(Work<D>),
    Rumble { low: u16, high: u16, duration: Duration },
    Shutdown,
}

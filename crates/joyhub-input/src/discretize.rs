//! Turns continuous axis samples and hat masks into edge-triggered
//! press/release transitions.
//!
//! Both state machines read and update the stored state of a single axis or
//! hat. They run only on the worker thread, so the state needs no locking.

use crate::device::{AxisState, HatState};
use crate::types::{AxisDirection, HatDirection};

/// A discrete transition produced by an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTransition {
    pub direction: AxisDirection,
    pub pressed: bool,
}

/// A discrete transition produced by a hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatTransition {
    pub direction: HatDirection,
    pub pressed: bool,
}

/// Ternary zone of `value` relative to an axis resting at `center`.
#[inline]
pub fn axis_zone(center: i16, value: i16, divisor: i32) -> Option<AxisDirection> {
    let center = i32::from(center);
    let value = i32::from(value);
    // Both distances are non-negative, so the division truncates toward the center.
    if value > center + (i32::from(i16::MAX) - center) / divisor {
        return Some(AxisDirection::Positive);
    }
    if value < center - (center - i32::from(i16::MIN)) / divisor {
        return Some(AxisDirection::Negative);
    }
    None
}

/// Feeds a raw sample into an axis.
///
/// Emits once when the sample crosses into an extreme zone and once when it
/// leaves it. A move straight from one extreme to the other reports only the
/// extreme being entered. `last` is updated in every case.
pub fn discretize_axis(
    state: &mut AxisState,
    now: i16,
    divisor: i32,
) -> Option<AxisTransition> {
    let was = axis_zone(state.initial, state.last, divisor);
    let is = axis_zone(state.initial, now, divisor);
    state.last = now;

    if was == is {
        return None;
    }
    match (is, was) {
        (Some(direction), _) => Some(AxisTransition {
            direction,
            pressed: true,
        }),
        (None, Some(direction)) => Some(AxisTransition {
            direction,
            pressed: false,
        }),
        (None, None) => None,
    }
}

/// Feeds a raw hat mask into a hat.
///
/// Only the first direction in [`HatDirection::SCAN_ORDER`] whose bit changed
/// is reported, even if several changed at once. The stored mask is replaced
/// only when an event is produced.
pub fn discretize_hat(state: &mut HatState, bits: u8) -> Option<HatTransition> {
    if state.bits == bits {
        return None;
    }
    let changed = state.bits ^ bits;
    let direction = HatDirection::SCAN_ORDER
        .into_iter()
        .find(|d| changed & d.bit() != 0)?;
    state.bits = bits;
    Some(HatTransition {
        direction,
        pressed: bits & direction.bit() != 0,
    })
}

/// Stable identifier the driver assigns to a device when it is opened.
pub type InstanceId = u32;

/// Display slot of an open device. Always the smallest free index at attach time.
pub type Slot = usize;

/// How the driver opened a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Plain joystick API: raw axes, hats and buttons only.
    Joystick,
    /// Game controller API: same raw inputs plus rumble actuation.
    Controller,
}

impl DeviceKind {
    pub fn is_controller(self) -> bool {
        matches!(self, DeviceKind::Controller)
    }

    pub fn api_name(self) -> &'static str {
        match self {
            DeviceKind::Joystick => "Joystick",
            DeviceKind::Controller => "Controller",
        }
    }
}

/// Hat directions, valued by the driver's hat bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatDirection {
    Up = 0x01,
    Right = 0x02,
    Down = 0x04,
    Left = 0x08,
}

impl HatDirection {
    /// Order in which a changed hat mask is scanned.
    pub const SCAN_ORDER: [HatDirection; 4] = [
        HatDirection::Up,
        HatDirection::Down,
        HatDirection::Left,
        HatDirection::Right,
    ];

    #[inline]
    pub fn bit(self) -> u8 {
        self as u8
    }
}

/// Which extreme of an axis a discrete event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    Negative,
    Positive,
}

impl AxisDirection {
    /// Signed form, `-1` or `+1`.
    #[inline]
    pub fn signum(self) -> i8 {
        match self {
            AxisDirection::Negative => -1,
            AxisDirection::Positive => 1,
        }
    }
}

/// Snapshot of an open device, safe to hand to other threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub instance_id: InstanceId,
    pub slot: Slot,
    pub name: String,
    pub kind: DeviceKind,
    pub axes: usize,
    pub hats: usize,
    pub buttons: usize,
}

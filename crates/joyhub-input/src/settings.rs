/// Divisor of the axis dead zone formula unless configured otherwise.
pub const DEFAULT_AXIS_THRESHOLD_DIVISOR: u16 = 3;

/// Name given to the worker thread unless configured otherwise.
pub const DEFAULT_THREAD_NAME: &str = "joyhub-input";

/// Runtime settings of the input worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// An axis counts as pressed once it travels past `1 / divisor` of the
    /// distance between its rest sample and the end of its range.
    pub axis_threshold_divisor: u16,
    pub thread_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            axis_threshold_divisor: DEFAULT_AXIS_THRESHOLD_DIVISOR,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl Settings {
    pub fn with_axis_threshold_divisor(mut self, divisor: u16) -> Self {
        self.axis_threshold_divisor = divisor.max(1);
        self
    }

    /// Divisor clamped to a usable value.
    #[inline]
    pub(crate) fn divisor(&self) -> i32 {
        i32::from(self.axis_threshold_divisor.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_divisor_is_three() {
        assert_eq!(Settings::default().divisor(), 3);
    }

    #[test]
    fn zero_divisor_is_clamped() {
        let settings = Settings::default().with_axis_threshold_divisor(0);
        assert_eq!(settings.axis_threshold_divisor, 1);

        let raw = Settings {
            axis_threshold_divisor: 0,
            ..Settings::default()
        };
        assert_eq!(raw.divisor(), 1);
    }
}

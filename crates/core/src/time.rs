//! Time units and clock sources used by the frame transmitter.

use core::{fmt, str::FromStr, time::Duration};
use std::time::Instant;

/// Frequency in hertz.
#[derive(PartialEq, PartialOrd, Clone, Copy, Eq, Debug, Ord, Default)]
pub struct Hertz(pub u32);

impl fmt::Display for Hertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Hertz {
    type Err = core::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

macro_rules! impl_time_unit {
    ($name:ident, $hz_factor:expr) => {
        #[derive(PartialEq, PartialOrd, Clone, Copy, Eq, Debug, Ord, Default, Hash)]
        pub struct $name(pub u64);

        impl $name {
            pub const SECS_FACTOR: u64 = $hz_factor;
        }

        impl From<u64> for $name {
            fn from(inner: u64) -> Self {
                Self(inner)
            }
        }

        impl From<Hertz> for $name {
            /// Returns a period of the given frequency, zero hertz gives a zero period.
            fn from(hz: Hertz) -> Self {
                Self(Self::SECS_FACTOR.checked_div(hz.0.into()).unwrap_or_default())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

impl_time_unit!(Microseconds, 1_000_000);
impl_time_unit!(Milliseconds, 1_000);

impl From<Milliseconds> for Microseconds {
    fn from(ms: Milliseconds) -> Self {
        Self(ms.0.saturating_mul(1_000))
    }
}

impl From<Microseconds> for Duration {
    fn from(us: Microseconds) -> Self {
        Duration::from_micros(us.0)
    }
}

impl From<Milliseconds> for Duration {
    fn from(ms: Milliseconds) -> Self {
        Duration::from_millis(ms.0)
    }
}

impl Microseconds {
    /// Adds two time points without overflowing.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// A monotonic time source with the microseconds resolution.
///
/// Implementations must never go backwards, wall clock adjustments must not affect them.
pub trait Clock {
    /// Returns the time elapsed since some fixed point in the past.
    fn now(&self) -> Microseconds;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Microseconds {
        T::now(self)
    }
}

/// The system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock that counts from the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Microseconds {
        let elapsed = self.origin.elapsed().as_micros();
        Microseconds(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

/// Returns `true` if the strip has been silent for at least the reset window since the
/// last successful write.
///
/// A strip that has never been written to is always ready.
#[must_use]
pub fn reset_window_elapsed(
    last_write: Option<Microseconds>,
    now: Microseconds,
    reset_window: Microseconds,
) -> bool {
    match last_write {
        Some(last_write) => now >= last_write.saturating_add(reset_window),
        None => true,
    }
}

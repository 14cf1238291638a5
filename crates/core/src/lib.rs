//! WS2801 LED strip driver
//!
//! This crate drives a WS2801 strip wired to a write-only bus, such as the Linux `spidev`
//! character device. The strip has no addressing protocol: it latches a frame once the
//! clock line has been silent for a while, so the driver drops frames written too close
//! to each other.
//!
//! ```no_run
//! use ws2801_core::{CharDevice, StripDriver, RGB8};
//!
//! let mut strip = StripDriver::new(CharDevice);
//! strip.connect(32, "/dev/spidev0.0", None)?;
//! strip.fill(RGB8::new(255, 255, 0));
//! strip.set_color_hex(0, "#f00");
//! let status = strip.update()?;
//! println!("First frame: {status:?}");
//! strip.disconnect()?;
//! # Ok::<(), ws2801_core::Error>(())
//! ```

// Linter configuration
#![warn(unsafe_code, clippy::pedantic, clippy::use_self)]
// Too many false positives.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

pub use smart_leds::{SmartLedsWrite, RGB8};

pub use crate::{
    bus::{Bus, BusConnection, CharDevice, DEFAULT_DEVICE},
    color::{ChannelOrder, BYTES_PER_PIXEL},
    driver::{FrameStatus, StripDriver, DEFAULT_RESET_WINDOW},
    errors::{Error, Result},
    gamma::{GammaTable, DEFAULT_GAMMA},
    time::{Clock, Hertz, Microseconds, Milliseconds, MonotonicClock},
};

pub mod bus;
pub mod color;
pub mod errors;
pub mod gamma;
pub mod test_utils;
pub mod time;

mod driver;

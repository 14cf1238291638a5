use core::fmt::Display;

use displaydoc::Display;

/// A specialized result type for the strip driver.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when driving a LED strip.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Debug)]
pub enum Error {
    /// The number of LEDs in the strip must be greater than zero.
    InvalidLedCount,
    /// The gamma correction exponent must be a positive finite number.
    InvalidGamma,
    /// The channel order must be a permutation of the indices 0, 1 and 2.
    InvalidChannelOrder,
    /// Unable to open or close the bus device.
    Connection,
    /// The driver is not connected to the bus device.
    NotConnected,
    /// The length of the frame buffer does not match with the strip channels count.
    BufferLengthMismatch,
    /// Unable to write a frame to the bus device.
    Transmission,
}

impl Error {
    /// Creates a new bus connection error.
    pub fn connection<E>(err: E) -> Self
    where
        E: Display,
    {
        log::warn!("Bus connection failed: {err}");
        Self::Connection
    }

    /// Creates a new frame transmission error.
    pub fn transmission<E>(err: E) -> Self
    where
        E: Display,
    {
        log::warn!("Bus write failed: {err}");
        Self::Transmission
    }
}

impl std::error::Error for Error {}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::InvalidLedCount
            | Error::InvalidGamma
            | Error::InvalidChannelOrder
            | Error::BufferLengthMismatch => std::io::ErrorKind::InvalidInput,
            Error::NotConnected => std::io::ErrorKind::NotConnected,
            Error::Connection | Error::Transmission => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

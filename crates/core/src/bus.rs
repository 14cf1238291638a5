//! Write-only byte sink the strip is wired to.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
};

/// Default SPI character device on a Raspberry Pi.
pub const DEFAULT_DEVICE: &str = "/dev/spidev0.0";

/// The trait allows to open a connection to the bus device with the given identifier.
pub trait Bus {
    /// Type holding an open bus resource.
    type Connection: BusConnection;
    /// Opens the bus device for writing.
    fn open(&mut self, device: &str) -> io::Result<Self::Connection>;
}

/// An open write-only bus resource.
pub trait BusConnection {
    /// Writes the whole byte sequence in a single blocking call.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Releases the bus resource.
    fn close(self) -> io::Result<()>;
}

/// Character device bus, such as the Linux `spidev` interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharDevice;

impl Bus for CharDevice {
    type Connection = CharDeviceConnection;

    fn open(&mut self, device: &str) -> io::Result<Self::Connection> {
        let file = OpenOptions::new().write(true).open(device)?;
        Ok(CharDeviceConnection(file))
    }
}

/// An open character device.
#[derive(Debug)]
pub struct CharDeviceConnection(File);

impl BusConnection for CharDeviceConnection {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.write_all(bytes)?;
        self.0.flush()
    }

    fn close(self) -> io::Result<()> {
        drop(self.0);
        Ok(())
    }
}

//! Test helpers

use std::{
    cell::{Cell, RefCell},
    io,
    rc::Rc,
};

use crate::{
    bus::{Bus, BusConnection},
    time::{Clock, Microseconds},
};

#[derive(Debug, Default)]
struct MemoryBusState {
    frames: RefCell<Vec<Vec<u8>>>,
    opened: RefCell<Vec<String>>,
    open_connections: Cell<usize>,
    fail_open: Cell<bool>,
    fail_write: Cell<bool>,
    fail_close: Cell<bool>,
}

/// In-memory bus which records every written frame.
///
/// Clones share the same state, so a test can keep a handle to inspect the frames after
/// the bus has been moved into a driver.
#[derive(Debug, Default, Clone)]
pub struct MemoryBus(Rc<MemoryBusState>);

impl MemoryBus {
    /// Returns all frames written so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.frames.borrow().clone()
    }

    /// Returns the number of written frames.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.0.frames.borrow().len()
    }

    /// Returns the identifiers of the devices that were successfully opened.
    #[must_use]
    pub fn opened_devices(&self) -> Vec<String> {
        self.0.opened.borrow().clone()
    }

    /// Returns the number of connections that have not been closed yet.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.0.open_connections.get()
    }

    /// Makes subsequent `open` calls fail.
    pub fn fail_open(&self, fail: bool) {
        self.0.fail_open.set(fail);
    }

    /// Makes subsequent writes fail.
    pub fn fail_write(&self, fail: bool) {
        self.0.fail_write.set(fail);
    }

    /// Makes subsequent `close` calls fail.
    pub fn fail_close(&self, fail: bool) {
        self.0.fail_close.set(fail);
    }
}

impl Bus for MemoryBus {
    type Connection = MemoryConnection;

    fn open(&mut self, device: &str) -> io::Result<Self::Connection> {
        if self.0.fail_open.get() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }

        self.0.opened.borrow_mut().push(device.to_owned());
        self.0.open_connections.set(self.0.open_connections.get() + 1);
        Ok(MemoryConnection(self.0.clone()))
    }
}

/// Connection to the [`MemoryBus`].
#[derive(Debug)]
pub struct MemoryConnection(Rc<MemoryBusState>);

impl BusConnection for MemoryConnection {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.0.fail_write.get() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "bus is broken"));
        }

        self.0.frames.borrow_mut().push(bytes.to_vec());
        Ok(())
    }

    fn close(self) -> io::Result<()> {
        self.0.open_connections.set(self.0.open_connections.get() - 1);
        if self.0.fail_close.get() {
            return Err(io::Error::new(io::ErrorKind::Other, "unable to close"));
        }
        Ok(())
    }
}

/// Manually driven clock.
///
/// Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    /// Creates a clock which starts at the given time.
    #[must_use]
    pub fn starting_at(micros: u64) -> Self {
        Self(Rc::new(Cell::new(micros)))
    }

    /// Moves the clock forward.
    pub fn advance(&self, micros: u64) {
        self.0.set(self.0.get() + micros);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Microseconds {
        Microseconds(self.0.get())
    }
}

#[test]
fn test_memory_bus_records_frames() {
    let bus = MemoryBus::default();

    let mut connection = bus.clone().open("/dev/null").unwrap();
    connection.write(&[1, 2, 3]).unwrap();
    bus.fail_write(true);
    assert!(connection.write(&[4, 5, 6]).is_err());
    assert_eq!(bus.open_connections(), 1);
    connection.close().unwrap();

    assert_eq!(bus.frames(), vec![vec![1, 2, 3]]);
    assert_eq!(bus.opened_devices(), ["/dev/null"]);
    assert_eq!(bus.open_connections(), 0);
}

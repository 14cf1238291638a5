//! WS2801 strip driver.

use smart_leds::{SmartLedsWrite, RGB8};

use crate::{
    bus::{Bus, BusConnection, CharDevice, DEFAULT_DEVICE},
    color::{self, ChannelOrder, BYTES_PER_PIXEL},
    gamma::{GammaTable, DEFAULT_GAMMA},
    time::{reset_window_elapsed, Clock, Microseconds, MonotonicClock},
    Error, Result,
};

/// Minimum bus silence between two frames.
///
/// The WS2801 datasheet states 500µs, but the strip needs at least 1000µs to reliably
/// latch a frame.
pub const DEFAULT_RESET_WINDOW: Microseconds = Microseconds(1_000);

/// Outcome of a frame transmission.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame has been written to the bus.
    Sent,
    /// The reset window since the previous frame has not elapsed yet, the frame was dropped.
    Dropped,
    /// The driver is not connected, nothing happened.
    Skipped,
}

impl FrameStatus {
    /// Returns `true` if the frame has been written to the bus.
    #[must_use]
    pub fn is_sent(self) -> bool {
        self == Self::Sent
    }
}

/// Driver of a WS2801 LED strip connected to a write-only bus.
///
/// The driver owns the pixel buffer in the physical channel layout. Callers mutate it
/// through the setters and then send it to the strip with [`StripDriver::update`].
pub struct StripDriver<B: Bus, C = MonotonicClock> {
    bus: B,
    clock: C,
    device: String,
    connection: Option<B::Connection>,

    led_count: usize,
    gamma: f64,
    gamma_table: GammaTable,
    pixels: Vec<u8>,

    channel_order: ChannelOrder,
    inverted: bool,
    reversed: bool,

    reset_window: Microseconds,
    last_write: Option<Microseconds>,
}

impl Default for StripDriver<CharDevice> {
    fn default() -> Self {
        Self::new(CharDevice)
    }
}

impl<B: Bus> StripDriver<B> {
    /// Creates a new disconnected driver on top of the given bus and the system clock.
    pub fn new(bus: B) -> Self {
        Self::with_clock(bus, MonotonicClock::new())
    }
}

impl<B, C> StripDriver<B, C>
where
    B: Bus,
    C: Clock,
{
    /// Creates a new disconnected driver with a custom time source.
    pub fn with_clock(bus: B, clock: C) -> Self {
        Self {
            bus,
            clock,
            device: DEFAULT_DEVICE.to_owned(),
            connection: None,
            led_count: 0,
            gamma: DEFAULT_GAMMA,
            gamma_table: GammaTable::default(),
            pixels: Vec::new(),
            channel_order: ChannelOrder::default(),
            inverted: false,
            reversed: false,
            reset_window: DEFAULT_RESET_WINDOW,
            last_write: None,
        }
    }

    /// Overrides the minimum bus silence between two frames.
    #[must_use]
    pub fn with_reset_window(mut self, reset_window: Microseconds) -> Self {
        self.reset_window = reset_window;
        self
    }

    /// Opens the bus device and prepares a zeroed pixel buffer for `led_count` LEDs.
    ///
    /// The device defaults to the last successfully opened one (initially
    /// [`DEFAULT_DEVICE`]), the gamma exponent defaults to [`DEFAULT_GAMMA`]. An already
    /// open connection is closed first.
    pub fn connect<'a, D, G>(&mut self, led_count: usize, device: D, gamma: G) -> Result<()>
    where
        D: Into<Option<&'a str>>,
        G: Into<Option<f64>>,
    {
        let channel_count = led_count
            .checked_mul(BYTES_PER_PIXEL)
            .filter(|&count| count > 0)
            .ok_or(Error::InvalidLedCount)?;
        let gamma = gamma.into().unwrap_or(DEFAULT_GAMMA);
        let gamma_table = GammaTable::new(gamma)?;
        let device = device.into().map_or_else(|| self.device.clone(), str::to_owned);

        if self.connection.is_some() {
            log::info!("Reconnecting to {device}");
            if let Err(err) = self.disconnect() {
                log::warn!("Unable to close the previous connection: {err}");
            }
        }

        let connection = self.bus.open(&device).map_err(Error::connection)?;
        log::info!("Connected to {device}, {led_count} LEDs, gamma {gamma}");

        self.connection = Some(connection);
        self.device = device;
        self.led_count = led_count;
        self.gamma = gamma;
        self.gamma_table = gamma_table;
        self.pixels = vec![0; channel_count];
        Ok(())
    }

    /// Closes the bus connection, does nothing if the driver is already disconnected.
    ///
    /// The pixel buffer is preserved.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        log::info!("Disconnecting from {}", self.device);
        connection.close().map_err(Error::connection)
    }

    /// Returns `true` if the bus connection is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Fills the strip with black and sends it.
    pub fn clear(&mut self) -> Result<FrameStatus> {
        self.fill(RGB8::default());
        self.update()
    }

    /// Sets every LED of the pixel buffer to the given color.
    pub fn fill(&mut self, color: RGB8) {
        if !self.is_connected() {
            return;
        }

        let raw = self.apply_color_mapping(color);
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&raw);
        }
    }

    /// Sets the color of the LED with the given index.
    pub fn set_color(&mut self, led_index: usize, color: RGB8) {
        if !self.is_connected() || led_index >= self.led_count {
            return;
        }

        // `led_count * BYTES_PER_PIXEL` has been checked by `connect`.
        let base = led_index * BYTES_PER_PIXEL;
        let raw = self.apply_color_mapping(color);
        for (offset, value) in raw.into_iter().enumerate() {
            self.set_channel_power(base + offset, f64::from(value) / 255.0);
        }
    }

    /// Sets the color of the LED with the given index from a `#rgb` or `#rrggbb` string.
    ///
    /// A malformed string sets the LED to black.
    pub fn set_color_hex(&mut self, led_index: usize, hex: &str) {
        let color = color::parse_hex_color(hex).unwrap_or_else(|| {
            log::debug!("Malformed color {hex:?}, using black");
            RGB8::default()
        });
        self.set_color(led_index, color);
    }

    /// Sets the raw buffer slot to the given power in the `0..=1` range.
    ///
    /// The power is clamped, an out of range channel index is ignored.
    pub fn set_channel_power(&mut self, channel_index: usize, power: f64) {
        let Some(slot) = self.connected_pixels_mut().and_then(|p| p.get_mut(channel_index))
        else {
            return;
        };

        let power = if power.is_nan() {
            0.0
        } else {
            power.clamp(0.0, 1.0)
        };
        *slot = (255.0 * power).floor() as u8;
    }

    fn connected_pixels_mut(&mut self) -> Option<&mut [u8]> {
        self.connection.as_ref()?;
        Some(self.pixels.as_mut_slice())
    }

    /// Converts a logical color into the raw bytes of a single LED.
    ///
    /// The components are arranged in the physical channel order, then inverted if the
    /// strip is inverted.
    #[must_use]
    pub fn apply_color_mapping(&self, color: RGB8) -> [u8; BYTES_PER_PIXEL] {
        let raw = self.channel_order.arrange(color);
        if self.inverted {
            raw.map(|value| u8::MAX - value)
        } else {
            raw
        }
    }

    /// Returns the raw bytes of a rainbow color at the given angle.
    #[must_use]
    pub fn rainbow(&self, angle: f64) -> [u8; BYTES_PER_PIXEL] {
        self.apply_color_mapping(color::rainbow(angle))
    }

    /// Changes the physical positions of the red, green and blue channels.
    ///
    /// Only affects the subsequent color assignments, the pixel buffer is left intact.
    pub fn set_color_index_order(&mut self, red: usize, green: usize, blue: usize) -> Result<()> {
        let order = ChannelOrder::new(red, green, blue).ok_or(Error::InvalidChannelOrder)?;
        self.set_channel_order(order);
        Ok(())
    }

    /// Changes the channel order.
    pub fn set_channel_order(&mut self, order: ChannelOrder) {
        self.channel_order = order;
    }

    /// Toggles the color inversion.
    pub fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    /// Toggles the order in which LEDs are sent to the strip.
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Sends the pixel buffer to the strip.
    ///
    /// Returns [`FrameStatus::Skipped`] if the driver is not connected.
    pub fn update(&mut self) -> Result<FrameStatus> {
        if !self.is_connected() {
            return Ok(FrameStatus::Skipped);
        }

        let pixels = core::mem::take(&mut self.pixels);
        let status = self.transmit(&pixels);
        self.pixels = pixels;
        status
    }

    /// Sends the given raw buffer to the strip, bypassing the pixel buffer.
    ///
    /// The buffer must have exactly [`StripDriver::channel_count`] bytes in the physical
    /// channel layout. If the reset window since the last successful write has not
    /// elapsed yet, the frame is dropped and [`FrameStatus::Dropped`] is returned. On a
    /// write failure the timing state is left intact.
    pub fn transmit(&mut self, buffer: &[u8]) -> Result<FrameStatus> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        if buffer.len() != self.channel_count() {
            return Err(Error::BufferLengthMismatch);
        }

        let now = self.clock.now();
        if !reset_window_elapsed(self.last_write, now, self.reset_window) {
            log::debug!("Writing too fast, frame dropped");
            return Ok(FrameStatus::Dropped);
        }

        let frame = self.render_frame(buffer);
        let connection = self.connection.as_mut().ok_or(Error::NotConnected)?;
        connection.write(&frame).map_err(Error::transmission)?;

        self.last_write = Some(now);
        log::trace!("Sent {} bytes frame", frame.len());
        Ok(FrameStatus::Sent)
    }

    fn render_frame(&self, buffer: &[u8]) -> Vec<u8> {
        let mut frame: Vec<u8> = buffer
            .iter()
            .map(|&value| self.gamma_table.correct(value))
            .collect();
        if self.reversed {
            reverse_pixels(&mut frame);
        }
        frame
    }

    /// Returns the number of raw buffer slots.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        // Never overflows, `connect` rejects such LED counts.
        self.led_count * BYTES_PER_PIXEL
    }

    /// Returns the number of LEDs in the strip.
    #[must_use]
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// Returns the pixel buffer in the physical channel layout.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[must_use]
    pub fn gamma_table(&self) -> &GammaTable {
        &self.gamma_table
    }

    #[must_use]
    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Returns the identifier of the bus device.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub fn reset_window(&self) -> Microseconds {
        self.reset_window
    }

    /// Returns the time of the last successful write, if any.
    #[must_use]
    pub fn last_write(&self) -> Option<Microseconds> {
        self.last_write
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Reverses the order of LEDs while keeping the channel order within every LED.
fn reverse_pixels(frame: &mut [u8]) {
    frame.reverse();
    for pixel in frame.chunks_exact_mut(BYTES_PER_PIXEL) {
        pixel.reverse();
    }
}

impl<B, C> SmartLedsWrite for StripDriver<B, C>
where
    B: Bus,
    C: Clock,
{
    type Error = Error;
    type Color = RGB8;

    /// Sets the LEDs from the beginning of the strip and sends the pixel buffer.
    ///
    /// Extra colors are ignored, a dropped frame is not an error.
    fn write<T, I>(&mut self, iterator: T) -> Result<()>
    where
        T: Iterator<Item = I>,
        I: Into<Self::Color>,
    {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        for (index, color) in iterator.take(self.led_count).enumerate() {
            self.set_color(index, color.into());
        }
        self.update().map(drop)
    }
}

impl<B: Bus, C> Drop for StripDriver<B, C> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            if let Err(err) = connection.close() {
                log::warn!("Unable to close {}: {err}", self.device);
            }
        }
    }
}

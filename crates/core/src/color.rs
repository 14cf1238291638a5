//! Color space helpers: channel ordering, hex parsing and oscillators.

use core::f64::consts::{FRAC_PI_2, PI};

use smart_leds::RGB8;

/// Bytes count per single pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// Mapping from the logical red, green and blue channels to the physical byte position
/// expected by the wired strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelOrder {
    red: usize,
    green: usize,
    blue: usize,
}

impl ChannelOrder {
    pub const RGB: Self = Self::new_unchecked(0, 1, 2);
    pub const RBG: Self = Self::new_unchecked(0, 2, 1);
    pub const GRB: Self = Self::new_unchecked(1, 0, 2);
    pub const GBR: Self = Self::new_unchecked(2, 0, 1);
    pub const BRG: Self = Self::new_unchecked(1, 2, 0);
    pub const BGR: Self = Self::new_unchecked(2, 1, 0);

    const fn new_unchecked(red: usize, green: usize, blue: usize) -> Self {
        Self { red, green, blue }
    }

    /// Creates a new channel order from the physical positions of the red, green and blue
    /// channels.
    ///
    /// Returns `None` unless the positions are a permutation of `0`, `1` and `2`.
    #[must_use]
    pub fn new(red: usize, green: usize, blue: usize) -> Option<Self> {
        let mut seen = [false; BYTES_PER_PIXEL];
        for index in [red, green, blue] {
            let slot = seen.get_mut(index)?;
            if *slot {
                return None;
            }
            *slot = true;
        }
        Some(Self::new_unchecked(red, green, blue))
    }

    /// Physical position of the red channel.
    #[must_use]
    pub fn red(self) -> usize {
        self.red
    }

    /// Physical position of the green channel.
    #[must_use]
    pub fn green(self) -> usize {
        self.green
    }

    /// Physical position of the blue channel.
    #[must_use]
    pub fn blue(self) -> usize {
        self.blue
    }

    /// Places the color components into their physical positions.
    #[must_use]
    pub fn arrange(self, color: RGB8) -> [u8; BYTES_PER_PIXEL] {
        let mut raw = [0_u8; BYTES_PER_PIXEL];
        raw[self.red] = color.r;
        raw[self.green] = color.g;
        raw[self.blue] = color.b;
        raw
    }
}

impl Default for ChannelOrder {
    fn default() -> Self {
        Self::RGB
    }
}

/// Returns the raw buffer slot of the first byte of the given LED.
#[must_use]
pub const fn red_channel_index(led_index: usize) -> usize {
    led_index * BYTES_PER_PIXEL
}

/// Returns the raw buffer slot of the second byte of the given LED.
#[must_use]
pub const fn green_channel_index(led_index: usize) -> usize {
    led_index * BYTES_PER_PIXEL + 1
}

/// Returns the raw buffer slot of the third byte of the given LED.
#[must_use]
pub const fn blue_channel_index(led_index: usize) -> usize {
    led_index * BYTES_PER_PIXEL + 2
}

/// Parses a `#rgb` or `#rrggbb` hex color string.
///
/// In the short form every digit is duplicated, so `#f80` is the same as `#ff8800`.
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<RGB8> {
    let digits = hex.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let component = |from: usize, len: usize| {
        let part = &digits[from..from + len];
        let value = u8::from_str_radix(part, 16).ok()?;
        Some(if len == 1 { value * 0x11 } else { value })
    };

    match digits.len() {
        3 => Some(RGB8::new(component(0, 1)?, component(1, 1)?, component(2, 1)?)),
        6 => Some(RGB8::new(component(0, 2)?, component(2, 2)?, component(4, 2)?)),
        _ => None,
    }
}

/// Converts the channel values into the `0..=1` power range.
#[must_use]
pub fn normalize(color: RGB8) -> [f64; BYTES_PER_PIXEL] {
    [color.r, color.g, color.b].map(|value| f64::from(value) / 255.0)
}

/// Parses a hex color string into the normalized channel powers.
///
/// Malformed strings are treated as black.
#[must_use]
pub fn hex_to_power(hex: &str) -> [f64; BYTES_PER_PIXEL] {
    normalize(parse_hex_color(hex).unwrap_or_default())
}

/// Oscillates between `min` and `max` following the sine of the given angle.
#[must_use]
pub fn sine_wave(angle: f64, min: f64, max: f64) -> f64 {
    min + (max - min) / 2.0 * (angle.sin() + 1.0)
}

/// Returns a fully saturated color on the rainbow wheel at the given angle in radians.
#[must_use]
pub fn rainbow(angle: f64) -> RGB8 {
    let channel = |phase: f64| sine_wave(angle + phase, 0.0, 255.0) as u8;
    RGB8::new(channel(0.0), channel(FRAC_PI_2), channel(PI))
}

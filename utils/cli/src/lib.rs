//! Animation sources for the WS2801 command line utility.

use std::f64::consts::TAU;

use ws2801_core::{
    color::{rainbow, sine_wave},
    Bus, Clock, StripDriver, RGB8,
};

/// Angle increment per frame of the sine waves animation.
pub const ANIMATION_TICK: f64 = 0.005;
/// Phase shift between two neighbour LEDs.
pub const LED_DISTANCE: f64 = 0.3;

/// Endless animation of three sine waves running along the strip at different speeds.
#[derive(Debug, Clone, Copy)]
pub struct SineWaves {
    angle: f64,
    tick: f64,
    led_distance: f64,
}

impl Default for SineWaves {
    fn default() -> Self {
        Self::new(ANIMATION_TICK, LED_DISTANCE)
    }
}

impl SineWaves {
    #[must_use]
    pub fn new(tick: f64, led_distance: f64) -> Self {
        Self {
            angle: 0.0,
            tick,
            led_distance,
        }
    }

    /// Returns the color of the LED at the given position for the current angle.
    #[must_use]
    pub fn pixel(&self, position: usize) -> RGB8 {
        let shift = position as f64 * self.led_distance;
        let channel = |speed: f64| sine_wave(self.angle * speed + shift, 0.0, 255.0) as u8;
        RGB8::new(channel(1.0), channel(-5.0), channel(7.0))
    }

    /// Returns the colors of the current frame and moves the animation forward.
    pub fn next_frame(&mut self, led_count: usize) -> Vec<RGB8> {
        let frame = (0..led_count).map(|position| self.pixel(position)).collect();
        self.angle = (self.angle + self.tick) % TAU;
        frame
    }
}

/// Returns a rainbow spread evenly along the strip and rotated by the given angle.
#[must_use]
pub fn rainbow_frame(angle: f64, led_count: usize) -> Vec<RGB8> {
    let step = TAU / led_count.max(1) as f64;
    (0..led_count)
        .map(|position| rainbow(angle + position as f64 * step))
        .collect()
}

/// Puts logical colors into the pixel buffer starting from the first LED.
///
/// Extra colors are ignored.
pub fn set_frame<B, C>(driver: &mut StripDriver<B, C>, colors: &[RGB8])
where
    B: Bus,
    C: Clock,
{
    for (index, &color) in colors.iter().enumerate() {
        driver.set_color(index, color);
    }
}

/// Converts logical colors into the raw buffer of the given strip.
pub fn to_raw_frame<B, C>(driver: &StripDriver<B, C>, colors: &[RGB8]) -> Vec<u8>
where
    B: Bus,
    C: Clock,
{
    colors
        .iter()
        .flat_map(|&color| driver.apply_color_mapping(color))
        .collect()
}

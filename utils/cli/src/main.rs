use std::{
    thread,
    time::{Duration, Instant},
};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use ws2801_cli::{rainbow_frame, set_frame, to_raw_frame, SineWaves};
use ws2801_core::{
    color::parse_hex_color, CharDevice, ChannelOrder, FrameStatus, Hertz, Microseconds,
    StripDriver, DEFAULT_DEVICE, RGB8,
};

/// WS2801 LED strip utility
///
/// A command line application for driving a WS2801 LED strip connected to the SPI bus.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = false)]
struct Cli {
    /// Bus device path
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: String,
    /// Number of LEDs in the strip
    #[arg(short = 'n', long, default_value = "32")]
    leds: usize,
    /// Gamma correction exponent
    #[arg(short, long, default_value = "2.5")]
    gamma: f64,
    /// Physical order of the color channels
    #[arg(short, long, value_enum, default_value = "rgb")]
    order: Order,
    /// Invert all colors
    #[arg(long)]
    invert: bool,
    /// Send LEDs in the reverse order
    #[arg(long)]
    reverse: bool,
    /// Actual command
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
#[value(rename_all = "lower")]
enum Order {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl From<Order> for ChannelOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Rgb => Self::RGB,
            Order::Rbg => Self::RBG,
            Order::Grb => Self::GRB,
            Order::Gbr => Self::GBR,
            Order::Brg => Self::BRG,
            Order::Bgr => Self::BGR,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill the whole strip with a single color
    Fill {
        /// Color in the `#rgb` or `#rrggbb` form
        #[arg(value_parser = parse_color)]
        color: RGB8,
    },
    /// Set colors of the consecutive LEDs, malformed colors are shown as black
    Set {
        /// Index of the first LED
        index: usize,
        /// Colors in the `#rgb` or `#rrggbb` form
        #[arg(required = true)]
        colors: Vec<String>,
    },
    /// Turn all LEDs off
    Clear,
    /// Run the demonstration: a yellow strip, a few primary colors and sine waves
    Demo {
        /// Animation frame rate
        #[arg(short, long, default_value = "200", value_name = "Hz")]
        rate: Hertz,
        /// Animation duration in seconds
        #[arg(short = 't', long, default_value = "10", value_name = "SECS")]
        duration: u64,
    },
    /// Show a rotating rainbow
    Rainbow {
        /// Animation frame rate
        #[arg(short, long, default_value = "60", value_name = "Hz")]
        rate: Hertz,
        /// Animation duration in seconds
        #[arg(short = 't', long, default_value = "10", value_name = "SECS")]
        duration: u64,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate the completions for
        #[arg(value_enum)]
        shell: clap_complete_command::Shell,
    },
}

fn parse_color(s: &str) -> Result<RGB8, String> {
    parse_hex_color(s).ok_or_else(|| format!("`{s}` is not a `#rgb` or `#rrggbb` color"))
}

type Driver = StripDriver<CharDevice>;

fn open_strip(cli: &Cli) -> anyhow::Result<Driver> {
    let mut driver = StripDriver::new(CharDevice);
    driver.set_channel_order(cli.order.into());
    if cli.invert {
        driver.invert();
    }
    if cli.reverse {
        driver.reverse();
    }

    driver.connect(cli.leds, cli.device.as_str(), cli.gamma)?;
    Ok(driver)
}

/// Sends the pixel buffer, waiting for the reset window if the frame was dropped.
fn show(driver: &mut Driver) -> anyhow::Result<()> {
    if driver.update()? == FrameStatus::Dropped {
        thread::sleep(driver.reset_window().into());
        if driver.update()? == FrameStatus::Dropped {
            log::warn!("Frame dropped twice in a row");
        }
    }
    Ok(())
}

fn clear(driver: &mut Driver) -> anyhow::Result<()> {
    driver.fill(RGB8::default());
    show(driver)
}

/// Calls `next_frame` at the given rate until the duration expires.
fn animate<F>(
    driver: &mut Driver,
    rate: Hertz,
    duration: u64,
    mut next_frame: F,
) -> anyhow::Result<()>
where
    F: FnMut(&mut Driver) -> anyhow::Result<FrameStatus>,
{
    let period: Duration = Microseconds::from(rate).into();
    let deadline = Instant::now() + Duration::from_secs(duration);

    log::info!("Animating at {rate}Hz for {duration}s");
    let (mut sent, mut dropped) = (0_u64, 0_u64);
    while Instant::now() < deadline {
        match next_frame(driver)? {
            FrameStatus::Sent => sent += 1,
            FrameStatus::Dropped => dropped += 1,
            FrameStatus::Skipped => {}
        }
        thread::sleep(period);
    }
    log::info!("Animation finished, {sent} frames sent, {dropped} dropped");
    Ok(())
}

fn demo(driver: &mut Driver, rate: Hertz, duration: u64) -> anyhow::Result<()> {
    log::info!("Fill all yellow");
    driver.fill(RGB8::new(0xFF, 0xFF, 0x00));
    show(driver)?;
    thread::sleep(Duration::from_secs(2));

    log::info!("Red, green, blue, red, green, blue");
    driver.set_color_hex(0, "#FF0000");
    driver.set_color_hex(1, "#00FF00");
    driver.set_color_hex(2, "#0000FF");
    driver.set_color(3, RGB8::new(255, 0, 0));
    driver.set_color(4, RGB8::new(0, 255, 0));
    driver.set_color(5, RGB8::new(0, 0, 255));
    show(driver)?;
    thread::sleep(Duration::from_secs(2));

    log::info!("Sine waves animation");
    let mut waves = SineWaves::default();
    let led_count = driver.led_count();
    animate(driver, rate, duration, |driver| {
        let raw = to_raw_frame(driver, &waves.next_frame(led_count));
        Ok(driver.transmit(&raw)?)
    })
}

fn rainbow(driver: &mut Driver, rate: Hertz, duration: u64) -> anyhow::Result<()> {
    let led_count = driver.led_count();
    let mut angle = 0.0_f64;
    animate(driver, rate, duration, |driver| {
        set_frame(driver, &rainbow_frame(angle, led_count));
        angle = (angle + 0.05) % std::f64::consts::TAU;
        Ok(driver.update()?)
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Fill { color } => {
            let mut driver = open_strip(&cli)?;
            log::info!("Filling {} LEDs with {color:?}", driver.led_count());
            driver.fill(*color);
            show(&mut driver)?;
            driver.disconnect()?;
        }
        Command::Set { index, colors } => {
            let mut driver = open_strip(&cli)?;
            for (offset, color) in colors.iter().enumerate() {
                log::debug!("Setting LED {} to {color}", index + offset);
                driver.set_color_hex(index + offset, color);
            }
            show(&mut driver)?;
            driver.disconnect()?;
        }
        Command::Clear => {
            let mut driver = open_strip(&cli)?;
            log::info!("Clearing {} LEDs", driver.led_count());
            clear(&mut driver)?;
            driver.disconnect()?;
        }
        Command::Demo { rate, duration } => {
            let mut driver = open_strip(&cli)?;
            demo(&mut driver, *rate, *duration)?;
            clear(&mut driver)?;
            driver.disconnect()?;
        }
        Command::Rainbow { rate, duration } => {
            let mut driver = open_strip(&cli)?;
            rainbow(&mut driver, *rate, *duration)?;
            clear(&mut driver)?;
            driver.disconnect()?;
        }

        Command::Completions { shell } => {
            shell.clone().generate(&mut Cli::command(), &mut std::io::stdout());
        }
    }

    Ok(())
}

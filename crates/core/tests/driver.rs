use ws2801_core::{
    test_utils::{ManualClock, MemoryBus},
    ChannelOrder, Error, FrameStatus, GammaTable, Microseconds, SmartLedsWrite, StripDriver,
    DEFAULT_DEVICE, DEFAULT_RESET_WINDOW, RGB8,
};

type TestDriver = StripDriver<MemoryBus, ManualClock>;

fn init_driver() -> (TestDriver, MemoryBus, ManualClock) {
    let _ = env_logger::try_init();

    let bus = MemoryBus::default();
    let clock = ManualClock::starting_at(1_000_000);
    let driver = StripDriver::with_clock(bus.clone(), clock.clone());
    (driver, bus, clock)
}

fn connected_driver(led_count: usize) -> (TestDriver, MemoryBus, ManualClock) {
    let (mut driver, bus, clock) = init_driver();
    driver.connect(led_count, None, None).unwrap();
    (driver, bus, clock)
}

fn led(driver: &TestDriver, index: usize) -> &[u8] {
    &driver.pixels()[index * 3..index * 3 + 3]
}

#[test]
fn test_connect_allocates_zeroed_buffer() {
    for led_count in [1, 3, 32, 160] {
        let (driver, bus, _) = connected_driver(led_count);

        assert!(driver.is_connected());
        assert_eq!(driver.led_count(), led_count);
        assert_eq!(driver.channel_count(), led_count * 3);
        assert_eq!(driver.pixels().len(), led_count * 3);
        assert!(driver.pixels().iter().all(|&value| value == 0));
        assert_eq!(bus.opened_devices(), [DEFAULT_DEVICE]);
    }
}

#[test]
fn test_connect_rejects_zero_leds() {
    let (mut driver, bus, _) = init_driver();

    assert_eq!(driver.connect(0, None, None), Err(Error::InvalidLedCount));
    assert!(!driver.is_connected());
    assert!(bus.opened_devices().is_empty());
}

#[test]
fn test_connect_rejects_invalid_gamma() {
    let (mut driver, bus, _) = init_driver();

    assert_eq!(driver.connect(4, None, -1.0), Err(Error::InvalidGamma));
    assert_eq!(driver.connect(4, None, 0.0), Err(Error::InvalidGamma));
    assert!(!driver.is_connected());
    assert!(bus.opened_devices().is_empty());
}

#[test]
fn test_connect_custom_device_and_gamma() {
    let (mut driver, bus, _) = init_driver();

    driver.connect(2, "/dev/spidev1.0", 2.2).unwrap();
    assert_eq!(driver.device(), "/dev/spidev1.0");
    assert_eq!(driver.gamma(), 2.2);
    assert_eq!(driver.gamma_table(), &GammaTable::new(2.2).unwrap());

    // Reconnecting without a device reuses the previous one and resets the gamma.
    driver.connect(3, None, None).unwrap();
    assert_eq!(driver.device(), "/dev/spidev1.0");
    assert_eq!(driver.gamma(), 2.5);
    assert_eq!(driver.channel_count(), 9);
    assert_eq!(bus.opened_devices(), ["/dev/spidev1.0", "/dev/spidev1.0"]);
    assert_eq!(bus.open_connections(), 1);
}

#[test]
fn test_connect_failure_is_retryable() {
    let (mut driver, bus, _) = init_driver();

    bus.fail_open(true);
    assert_eq!(driver.connect(3, None, None), Err(Error::Connection));
    assert!(!driver.is_connected());
    assert_eq!(driver.channel_count(), 0);

    bus.fail_open(false);
    driver.connect(3, None, None).unwrap();
    assert!(driver.is_connected());
    assert_eq!(driver.channel_count(), 9);
}

#[test]
fn test_reconnect_reallocates_buffer() {
    let (mut driver, _, _) = connected_driver(2);
    driver.fill(RGB8::new(1, 2, 3));

    driver.connect(4, None, None).unwrap();
    assert_eq!(driver.pixels(), [0; 12]);
}

#[test]
fn test_disconnect() {
    let (mut driver, bus, _) = connected_driver(2);
    driver.fill(RGB8::new(9, 8, 7));

    driver.disconnect().unwrap();
    assert!(!driver.is_connected());
    assert_eq!(bus.open_connections(), 0);
    // The buffer survives.
    assert_eq!(driver.pixels(), [9, 8, 7, 9, 8, 7]);
    // Second call is a no-op.
    driver.disconnect().unwrap();
}

#[test]
fn test_disconnect_failure_still_disconnects() {
    let (mut driver, bus, _) = connected_driver(2);

    bus.fail_close(true);
    assert_eq!(driver.disconnect(), Err(Error::Connection));
    assert!(!driver.is_connected());
}

#[test]
fn test_mutations_are_noops_when_disconnected() {
    let (mut driver, bus, _) = init_driver();

    driver.fill(RGB8::new(255, 255, 255));
    driver.set_color(0, RGB8::new(255, 0, 0));
    driver.set_color_hex(0, "#00ff00");
    driver.set_channel_power(0, 1.0);
    assert!(driver.pixels().is_empty());

    assert_eq!(driver.update(), Ok(FrameStatus::Skipped));
    assert_eq!(driver.clear(), Ok(FrameStatus::Skipped));
    assert_eq!(driver.transmit(&[]), Err(Error::NotConnected));
    assert_eq!(bus.writes(), 0);

    // After a disconnect the buffer is frozen as well.
    let (mut driver, _, _) = connected_driver(1);
    driver.disconnect().unwrap();
    driver.fill(RGB8::new(255, 255, 255));
    assert_eq!(driver.pixels(), [0, 0, 0]);
}

#[test]
fn test_fill_applies_mapping_to_every_led() {
    let (mut driver, bus, _) = connected_driver(4);

    driver.fill(RGB8::new(10, 20, 30));
    for index in 0..4 {
        assert_eq!(led(&driver, index), [10, 20, 30]);
    }

    driver.set_color_index_order(2, 0, 1).unwrap();
    driver.invert();
    driver.fill(RGB8::new(10, 20, 30));
    for index in 0..4 {
        assert_eq!(led(&driver, index), [235, 225, 245]);
    }
    // Fill does not transmit.
    assert_eq!(bus.writes(), 0);
}

#[test]
fn test_set_channel_power_clamps() {
    let (mut driver, _, _) = connected_driver(2);

    driver.set_channel_power(0, -0.5);
    driver.set_channel_power(1, 1.5);
    driver.set_channel_power(2, 0.5);
    driver.set_channel_power(3, 1.0);
    assert_eq!(driver.pixels(), [0, 255, 127, 255, 0, 0]);

    // Out of range index.
    driver.set_channel_power(6, 1.0);
    assert_eq!(driver.pixels(), [0, 255, 127, 255, 0, 0]);
}

#[test]
fn test_set_color() {
    let (mut driver, _, _) = connected_driver(3);

    driver.set_color(1, RGB8::new(255, 128, 7));
    assert_eq!(led(&driver, 0), [0, 0, 0]);
    assert_eq!(led(&driver, 1), [255, 128, 7]);
    assert_eq!(led(&driver, 2), [0, 0, 0]);

    driver.set_channel_order(ChannelOrder::GRB);
    driver.set_color(2, RGB8::new(255, 128, 7));
    assert_eq!(led(&driver, 2), [128, 255, 7]);

    // Out of range LED.
    driver.set_color(3, RGB8::new(1, 1, 1));
    assert_eq!(driver.pixels().len(), 9);
}

#[test]
fn test_set_color_hex() {
    let (mut driver, _, _) = connected_driver(4);

    driver.set_color_hex(0, "#FF0000");
    driver.set_color_hex(1, "#0f0");
    driver.set_color_hex(2, "#123456");
    assert_eq!(led(&driver, 0), [255, 0, 0]);
    assert_eq!(led(&driver, 1), [0, 255, 0]);
    assert_eq!(led(&driver, 2), [0x12, 0x34, 0x56]);

    // Malformed colors fall back to black.
    driver.set_color_hex(0, "#ZZZZZZ");
    driver.set_color_hex(1, "#0f00");
    assert_eq!(led(&driver, 0), [0, 0, 0]);
    assert_eq!(led(&driver, 1), [0, 0, 0]);
}

#[test]
fn test_hex_fallback_black_is_inverted() {
    let (mut driver, _, _) = connected_driver(1);

    driver.invert();
    driver.set_color_hex(0, "not a color");
    assert_eq!(led(&driver, 0), [255, 255, 255]);
}

#[test]
fn test_channel_order_is_not_retroactive() {
    let (mut driver, _, _) = connected_driver(2);

    driver.set_color(0, RGB8::new(1, 2, 3));
    driver.set_color_index_order(2, 1, 0).unwrap();
    driver.set_color(1, RGB8::new(1, 2, 3));

    assert_eq!(driver.pixels(), [1, 2, 3, 3, 2, 1]);
    assert_eq!(driver.channel_order(), ChannelOrder::BGR);
}

#[test]
fn test_invalid_channel_order_is_rejected() {
    let (mut driver, _, _) = connected_driver(1);

    driver.set_channel_order(ChannelOrder::GRB);
    assert_eq!(
        driver.set_color_index_order(0, 0, 1),
        Err(Error::InvalidChannelOrder)
    );
    assert_eq!(
        driver.set_color_index_order(0, 1, 5),
        Err(Error::InvalidChannelOrder)
    );
    assert_eq!(driver.channel_order(), ChannelOrder::GRB);
}

#[test]
fn test_invert_and_reverse_toggle() {
    let (mut driver, _, _) = connected_driver(1);

    assert!(!driver.is_inverted());
    assert!(!driver.is_reversed());
    driver.invert();
    driver.reverse();
    assert!(driver.is_inverted());
    assert!(driver.is_reversed());
    driver.invert();
    driver.reverse();
    assert!(!driver.is_inverted());
    assert!(!driver.is_reversed());
}

#[test]
fn test_update_sends_gamma_corrected_frame() {
    let (mut driver, bus, _) = connected_driver(3);
    let gamma = GammaTable::default();

    driver.fill(RGB8::new(255, 0, 0));
    assert_eq!(driver.update(), Ok(FrameStatus::Sent));

    let expected = [gamma.correct(255), gamma.correct(0), gamma.correct(0)].repeat(3);
    assert_eq!(bus.frames(), vec![expected]);
    // The stored buffer is not modified by the correction.
    assert_eq!(driver.pixels(), [255, 0, 0, 255, 0, 0, 255, 0, 0]);
}

#[test]
fn test_frames_inside_reset_window_are_dropped() {
    let (mut driver, bus, clock) = connected_driver(2);

    assert_eq!(driver.update(), Ok(FrameStatus::Sent));
    let last_write = driver.last_write();

    clock.advance(DEFAULT_RESET_WINDOW.0 - 1);
    driver.fill(RGB8::new(255, 255, 255));
    assert_eq!(driver.update(), Ok(FrameStatus::Dropped));
    assert_eq!(bus.writes(), 1);
    assert_eq!(driver.last_write(), last_write);
    // The buffer is left unchanged.
    assert_eq!(driver.pixels(), [255; 6]);
}

#[test]
fn test_frames_after_reset_window_are_sent() {
    let (mut driver, bus, clock) = connected_driver(2);
    let gamma = GammaTable::default();

    driver.fill(RGB8::new(128, 128, 128));
    assert_eq!(driver.update(), Ok(FrameStatus::Sent));

    clock.advance(DEFAULT_RESET_WINDOW.0);
    driver.fill(RGB8::new(64, 0, 255));
    assert_eq!(driver.update(), Ok(FrameStatus::Sent));

    let frames = bus.frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], [gamma.correct(128); 6]);
    assert_eq!(
        frames[1],
        [gamma.correct(64), 0, 255, gamma.correct(64), 0, 255]
    );
}

#[test]
fn test_first_frame_is_never_dropped() {
    let bus = MemoryBus::default();
    let mut driver = StripDriver::with_clock(bus.clone(), ManualClock::starting_at(0));
    driver.connect(1, None, None).unwrap();

    assert_eq!(driver.update(), Ok(FrameStatus::Sent));
    assert_eq!(driver.last_write(), Some(Microseconds(0)));
}

#[test]
fn test_custom_reset_window() {
    let (driver, bus, clock) = init_driver();
    let mut driver = driver.with_reset_window(Microseconds(20_000));
    driver.connect(1, None, None).unwrap();

    assert_eq!(driver.update(), Ok(FrameStatus::Sent));
    clock.advance(DEFAULT_RESET_WINDOW.0);
    assert_eq!(driver.update(), Ok(FrameStatus::Dropped));
    clock.advance(19_000);
    assert_eq!(driver.update(), Ok(FrameStatus::Sent));
    assert_eq!(bus.writes(), 2);
}

#[test]
fn test_reverse_keeps_pixel_grouping() {
    let (mut driver, bus, _) = connected_driver(3);
    // Linear correction keeps the bytes intact.
    driver.connect(3, None, 1.0).unwrap();

    driver.reverse();
    let buffer = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    assert_eq!(driver.transmit(&buffer), Ok(FrameStatus::Sent));
    assert_eq!(bus.frames(), vec![vec![7, 8, 9, 4, 5, 6, 1, 2, 3]]);
}

#[test]
fn test_transmit_custom_buffer() {
    let (mut driver, bus, clock) = connected_driver(2);
    let gamma = GammaTable::default();

    let buffer = [0, 50, 100, 150, 200, 250];
    assert_eq!(driver.transmit(&buffer), Ok(FrameStatus::Sent));
    assert_eq!(bus.frames()[0], buffer.map(|value| gamma.correct(value)));
    // The stored buffer is bypassed.
    assert_eq!(driver.pixels(), [0; 6]);

    clock.advance(DEFAULT_RESET_WINDOW.0);
    assert_eq!(
        driver.transmit(&[1, 2, 3]),
        Err(Error::BufferLengthMismatch)
    );
    assert_eq!(bus.writes(), 1);
}

#[test]
fn test_transmission_failure_keeps_timing_state() {
    let (mut driver, bus, clock) = connected_driver(1);

    assert_eq!(driver.update(), Ok(FrameStatus::Sent));
    let last_write = driver.last_write();

    clock.advance(DEFAULT_RESET_WINDOW.0);
    bus.fail_write(true);
    assert_eq!(driver.update(), Err(Error::Transmission));
    assert_eq!(driver.last_write(), last_write);

    // The retry is still measured against the last successful write.
    bus.fail_write(false);
    assert_eq!(driver.update(), Ok(FrameStatus::Sent));
    assert_eq!(bus.writes(), 2);
}

#[test]
fn test_clear_blanks_and_sends() {
    let (mut driver, bus, _) = connected_driver(2);

    driver.fill(RGB8::new(255, 255, 255));
    assert_eq!(driver.clear(), Ok(FrameStatus::Sent));
    assert_eq!(driver.pixels(), [0; 6]);
    assert_eq!(bus.frames(), vec![vec![0; 6]]);
}

#[test]
fn test_rainbow_is_mapped() {
    let (mut driver, _, _) = connected_driver(1);

    let plain = driver.rainbow(1.0);
    driver.set_channel_order(ChannelOrder::BGR);
    let mapped = driver.rainbow(1.0);
    assert_eq!(mapped, [plain[2], plain[1], plain[0]]);
}

#[test]
fn test_smart_leds_write() {
    let (mut driver, bus, _) = connected_driver(2);
    driver.connect(2, None, 1.0).unwrap();

    let colors = [
        RGB8::new(1, 2, 3),
        RGB8::new(4, 5, 6),
        RGB8::new(7, 8, 9),
    ];
    driver.write(colors.into_iter()).unwrap();

    assert_eq!(driver.pixels(), [1, 2, 3, 4, 5, 6]);
    assert_eq!(bus.frames(), vec![vec![1, 2, 3, 4, 5, 6]]);

    driver.disconnect().unwrap();
    assert_eq!(
        driver.write(colors.into_iter()),
        Err(Error::NotConnected)
    );
}

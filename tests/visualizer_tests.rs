//! Integration tests for Visualizer

mod common;
use common::*;

use protowave::{
    AnimationSettings, ConfigEdit, Direction, I2cConfig, Indicator, Phase, ProtocolConfig,
    SpiConfig, SpiMode, UartConfig, Visualizer, VisualizerAction, VisualizerError,
    VisualizerState,
};

type TestVisualizer<'t> = Visualizer<'t, TestInstant, MockView, MockTimeSource>;

fn visualizer(timer: &MockTimeSource) -> TestVisualizer<'_> {
    Visualizer::<TestInstant, MockView, MockTimeSource>::new(MockView::new(), timer)
}

fn spi_mode0() -> ProtocolConfig {
    ProtocolConfig::Spi(SpiConfig::new(SpiMode::Mode0, 0xA5))
}

#[test]
fn play_requires_configuration() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);

    assert_eq!(visualizer.state(), VisualizerState::Idle);
    assert_eq!(visualizer.play(), Err(VisualizerError::NotConfigured));
    assert_eq!(visualizer.reset(), Err(VisualizerError::NotConfigured));
}

#[test]
fn pause_requires_playing_state() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());

    let result = visualizer.pause();
    assert!(matches!(
        result,
        Err(VisualizerError::InvalidState {
            actual: VisualizerState::Stopped,
            ..
        })
    ));
}

#[test]
fn play_twice_is_rejected() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());

    visualizer.play().unwrap();
    assert!(matches!(
        visualizer.play(),
        Err(VisualizerError::InvalidState { .. })
    ));
}

#[test]
fn configure_draws_once_per_change() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);

    visualizer.configure(spi_mode0());
    assert_eq!(visualizer.state(), VisualizerState::Stopped);
    assert_eq!(visualizer.view().draw_count(), 1);

    let (config, waveform, layout) = visualizer.view().last_drawn().unwrap();
    assert_eq!(*config, spi_mode0());
    assert_eq!(waveform.total_time, 20.0);
    assert_eq!(layout.height, 320.0);

    visualizer.configure(ProtocolConfig::Uart(UartConfig::default()));
    assert_eq!(visualizer.view().draw_count(), 2);
    assert_eq!(visualizer.waveform().unwrap().total_time, 12.0);
}

#[test]
fn ticks_map_wall_time_onto_abstract_time() {
    let timer = MockTimeSource::new();
    timer.set_time(TestInstant(50_000));
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();

    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.t, 0.0);
    assert_eq!(frame.x, 0.0);
    assert_eq!(frame.descriptor.label.as_str(), "IDLE");

    // 8000 ms per SPI loop: 4000 ms is the middle of the 20-unit window.
    timer.advance(TestDuration(4000));
    let frame = visualizer.tick(&handle).unwrap();
    assert!(times_equal(frame.t, 10.0));
    assert!(!frame.wrapped);

    assert_eq!(visualizer.view().frames().len(), 2);
}

#[test]
fn loop_wraps_to_zero_after_duration() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();

    // Exactly at the end the scanline is still on the last pixel.
    timer.advance(TestDuration(8000));
    let frame = visualizer.tick(&handle).unwrap();
    assert!(times_equal(frame.t, 20.0));
    assert!(!frame.wrapped);

    timer.advance(TestDuration(1));
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.t, 0.0);
    assert!(frame.wrapped);
    assert_eq!(frame.highlight.active, None);
    assert_eq!(frame.highlight.latched, 0);

    // The new loop starts at the wrap instant.
    timer.advance(TestDuration(400));
    let frame = visualizer.tick(&handle).unwrap();
    assert!(times_equal(frame.t, 1.0));
}

#[test]
fn pause_cancels_outstanding_handles() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();

    visualizer.pause().unwrap();
    assert_eq!(visualizer.state(), VisualizerState::Stopped);
    let frames_before = visualizer.view().frames().len();

    assert_eq!(visualizer.tick(&handle), Err(VisualizerError::Cancelled));
    assert_eq!(visualizer.view().frames().len(), frames_before);

    // A handle from an earlier play stays dead after playing again.
    let fresh = visualizer.play().unwrap();
    assert_eq!(visualizer.tick(&handle), Err(VisualizerError::Cancelled));
    assert!(visualizer.tick(&fresh).is_ok());
}

#[test]
fn resume_restarts_from_zero() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();
    timer.advance(TestDuration(3000));
    let frame = visualizer.tick(&handle).unwrap();
    assert!(frame.t > 0.0);

    visualizer.pause().unwrap();
    timer.advance(TestDuration(10_000));
    let handle = visualizer.play().unwrap();
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.t, 0.0);
}

#[test]
fn reset_rewinds_without_stopping() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();
    timer.advance(TestDuration(800));
    let frame = visualizer.tick(&handle).unwrap();
    assert!(frame.highlight.active.is_some());

    visualizer.reset().unwrap();
    assert!(visualizer.is_playing());
    assert_eq!(visualizer.highlight().active, None);
    let pushed = visualizer.view().last_frame().unwrap();
    assert_eq!(pushed.t, 0.0);

    timer.advance(TestDuration(500));
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.t, 0.0);
}

#[test]
fn highlight_is_replaced_every_frame() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();

    // 800 ms = t 2.0, the first capture edge in mode 0.
    timer.advance(TestDuration(800));
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.highlight.active, Some(Indicator::ShiftCell(0)));
    assert!(frame.descriptor.sampling);

    // 1000 ms = t 2.5, between capture edges.
    timer.advance(TestDuration(200));
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.highlight.active, None);
    assert_eq!(frame.highlight.latched, 1);

    // 1600 ms = t 4.0, the second capture edge.
    timer.advance(TestDuration(600));
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.highlight.active, Some(Indicator::ShiftCell(1)));
    assert!(!frame.highlight.is_active(Indicator::ShiftCell(0)));
}

#[test]
fn i2c_highlight_follows_phases() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer).with_settings(AnimationSettings {
        duration_ms: 22_000,
    });
    visualizer.configure(ProtocolConfig::I2c(I2cConfig::default()));
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();

    let expected = [
        (1_200, Phase::Start, Some(Indicator::StartCondition)),
        (2_000, Phase::Address(0), Some(Indicator::AddressBit(0))),
        (9_000, Phase::ReadWrite, Some(Indicator::ReadWrite)),
        (10_000, Phase::Ack(0), Some(Indicator::Ack(0))),
        (12_000, Phase::Data(1), Some(Indicator::DataBit(1))),
        (19_000, Phase::Ack(1), Some(Indicator::Ack(1))),
        (21_000, Phase::Stop, Some(Indicator::StopCondition)),
    ];
    for (at, phase, indicator) in expected {
        timer.set_time(TestInstant(at));
        let frame = visualizer.tick(&handle).unwrap();
        assert_eq!(frame.descriptor.phase, phase, "at {} ms", at);
        assert_eq!(frame.highlight.active, indicator, "at {} ms", at);
    }
}

#[test]
fn invalid_edit_keeps_previous_configuration() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());

    assert_eq!(visualizer.edit(&ConfigEdit::SpiData("zz")), Ok(false));
    assert_eq!(visualizer.edit(&ConfigEdit::SpiData("1FF")), Ok(false));
    assert_eq!(visualizer.edit(&ConfigEdit::I2cData("00")), Ok(false));
    assert_eq!(visualizer.config(), Some(&spi_mode0()));
    assert_eq!(visualizer.view().draw_count(), 1);

    assert_eq!(visualizer.edit(&ConfigEdit::SpiData("3c")), Ok(true));
    assert_eq!(
        visualizer.config(),
        Some(&ProtocolConfig::Spi(SpiConfig::new(SpiMode::Mode0, 0x3C)))
    );
    assert_eq!(visualizer.view().draw_count(), 2);
}

#[test]
fn edit_without_configuration_fails() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    assert_eq!(
        visualizer.edit(&ConfigEdit::ToggleDirection),
        Err(VisualizerError::NotConfigured)
    );
}

#[test]
fn reconfigure_while_playing_keeps_playing_from_zero() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(ProtocolConfig::I2c(I2cConfig::default()));
    let handle = visualizer.play().unwrap();
    visualizer.tick(&handle).unwrap();
    timer.advance(TestDuration(5000));
    visualizer.tick(&handle).unwrap();

    visualizer.edit(&ConfigEdit::ToggleDirection).unwrap();
    assert!(visualizer.is_playing());
    match visualizer.config() {
        Some(ProtocolConfig::I2c(c)) => assert_eq!(c.direction, Direction::Read),
        other => panic!("unexpected config {:?}", other),
    }

    timer.advance(TestDuration(100));
    let frame = visualizer.tick(&handle).unwrap();
    assert_eq!(frame.t, 0.0);
}

#[test]
fn clear_returns_to_idle_and_cancels() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());
    let handle = visualizer.play().unwrap();
    assert_eq!(visualizer.view().clear_count(), 0);

    visualizer.clear();
    assert_eq!(visualizer.view().clear_count(), 1);
    assert_eq!(visualizer.state(), VisualizerState::Idle);
    assert!(visualizer.config().is_none());
    assert_eq!(visualizer.tick(&handle), Err(VisualizerError::Cancelled));
}

#[test]
fn handle_action_dispatches() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);

    let result = visualizer.handle_action(VisualizerAction::from(spi_mode0()));
    assert_eq!(result, Ok(None));

    let handle = visualizer
        .handle_action(VisualizerAction::Play)
        .unwrap()
        .expect("play returns a handle");
    assert!(visualizer.tick(&handle).is_ok());

    let edit = VisualizerAction::from(ConfigEdit::SpiMode(SpiMode::Mode3));
    assert_eq!(visualizer.handle_action(edit), Ok(None));
    assert_eq!(
        visualizer.config(),
        Some(&ProtocolConfig::Spi(SpiConfig::new(SpiMode::Mode3, 0xA5)))
    );

    assert_eq!(visualizer.handle_action(VisualizerAction::Reset), Ok(None));
    assert_eq!(visualizer.handle_action(VisualizerAction::Pause), Ok(None));
    assert!(!visualizer.is_playing());
    assert!(matches!(
        visualizer.handle_action(VisualizerAction::Pause),
        Err(VisualizerError::InvalidState { .. })
    ));

    assert_eq!(visualizer.handle_action(VisualizerAction::Clear), Ok(None));
    assert_eq!(visualizer.state(), VisualizerState::Idle);
}

#[test]
fn toggle_alternates_play_and_pause() {
    let timer = MockTimeSource::new();
    let mut visualizer = visualizer(&timer);
    visualizer.configure(spi_mode0());

    let handle = visualizer.toggle().unwrap();
    assert!(handle.is_some());
    assert!(visualizer.is_playing());

    assert_eq!(visualizer.toggle(), Ok(None));
    assert!(!visualizer.is_playing());
}

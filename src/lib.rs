#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`ProtocolConfig`**: What to draw (SPI mode + byte, I2C address/data/direction, UART byte)
//! - **`Waveform`**: One `Timeline` of `TransitionPoint`s per signal line, plus annotations
//! - **`PhaseMap`**: Contiguous half-open intervals covering one transaction
//! - **`PhaseDescriptor`**: Label, color and highlighted indicator for a point in time
//! - **`AnimationClock`**: Looping elapsed-time clock driven by a `TimeSource`
//! - **`Visualizer`**: Drives a `WaveformView` frame by frame
//! - **`SvgRenderer`**: Writes waveforms and the scanline overlay as SVG
//!
//! Timelines live in abstract time units (`0..TOTAL_TIME` per protocol). The
//! visualizer maps wall-clock milliseconds onto that window and loops.

pub mod clock;
pub mod colors;
pub mod command;
pub mod config;
pub mod input;
pub mod phase;
pub mod protocol;
pub mod render;
pub mod time;
pub mod types;
pub mod visualizer;

pub use clock::AnimationClock;
pub use command::VisualizerAction;
pub use config::{
    AnimationSettings, Direction, I2cConfig, Layout, ProtocolConfig, ProtocolKind, SpiConfig,
    SpiMode, UartConfig,
};
pub use input::{ConfigEdit, InputError};
pub use phase::{
    Indicator, IndicatorCell, Phase, PhaseDescriptor, PhaseInterval, PhaseMap, classify,
};
pub use render::{Scale, SvgRenderer};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use types::{
    Annotation, AnnotationKind, Level, SignalLine, Timeline, TimelineError, TransitionPoint,
    Waveform,
};
pub use visualizer::{
    FrameHandle, FrameUpdate, HighlightState, Visualizer, VisualizerError, VisualizerState,
    WaveformView,
};

#[cfg(feature = "std")]
pub use render::SvgView;
#[cfg(feature = "std")]
pub use time::{StdClock, StdDuration, StdInstant};

pub use palette::Srgb;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_each_protocol() {
        let configs = [
            ProtocolConfig::Spi(SpiConfig::default()),
            ProtocolConfig::I2c(I2cConfig::default()),
            ProtocolConfig::Uart(UartConfig::default()),
        ];
        let totals = configs.map(|c| c.total_time());
        assert_eq!(totals, [20.0, 22.0, 12.0]);
        for config in configs {
            assert_eq!(config.waveform().total_time, config.total_time());
            assert_eq!(config.phase_map().total_time(), config.total_time());
        }
    }
}

//! UART: one 8N1 frame on TX, LSB first, no clock line.

use crate::colors;
use crate::config::UartConfig;
use crate::phase::{Indicator, Phase, PhaseDescriptor, PhaseMap, label};
use crate::protocol::bits_lsb_first;
use crate::types::{AnnotationKind, Level, LineWriter, Waveform};

/// Start (1) + data (8) + stop (1) with one unit of idle on each side.
pub const TOTAL_TIME: f32 = 12.0;
pub const BIT_TIME: f32 = 1.0;
pub const START_BIT: f32 = 1.0;
pub const FIRST_DATA_BIT: f32 = START_BIT + BIT_TIME;
pub const DATA_BITS: u8 = 8;
pub const STOP_BIT: f32 = FIRST_DATA_BIT + BIT_TIME * DATA_BITS as f32;
pub const FRAME_END: f32 = STOP_BIT + BIT_TIME;

pub const LINE_TX: &str = "TX";

pub fn waveform(config: &UartConfig) -> Waveform {
    let bits = bits_lsb_first(config.data);

    let mut tx = LineWriter::new(Level::High);
    tx.set(START_BIT, Level::Low);
    for (i, &bit) in bits.iter().enumerate() {
        tx.set(FIRST_DATA_BIT + BIT_TIME * i as f32, Level::from_bit(bit));
    }
    tx.set(STOP_BIT, Level::High);

    let mut waveform = Waveform::new(TOTAL_TIME);
    waveform.add_line(LINE_TX, colors::BLUE, tx.finish(TOTAL_TIME));

    let mut boundary = START_BIT;
    while boundary <= FRAME_END {
        waveform.annotate(boundary, 0, AnnotationKind::Divider);
        boundary += BIT_TIME;
    }
    let half = BIT_TIME / 2.0;
    waveform.annotate(START_BIT + half, 0, AnnotationKind::StartBit);
    for (i, &bit) in bits.iter().enumerate() {
        let centre = FIRST_DATA_BIT + BIT_TIME * i as f32 + half;
        waveform.annotate(
            centre,
            0,
            AnnotationKind::BitValue {
                index: i as u8,
                value: bit,
            },
        );
    }
    waveform.annotate(STOP_BIT + half, 0, AnnotationKind::StopBit);

    waveform
}

pub fn phase_map() -> PhaseMap {
    PhaseMap::builder(TOTAL_TIME)
        .then(Phase::Idle, START_BIT)
        .then(Phase::StartBit, FIRST_DATA_BIT)
        .bits(Phase::DataBit(0), DATA_BITS, BIT_TIME)
        .then(Phase::StopBit, FRAME_END)
        .finish(Phase::Idle)
}

pub(crate) fn describe(config: &UartConfig, phase: Phase) -> PhaseDescriptor {
    match phase {
        Phase::StartBit => {
            PhaseDescriptor::new(phase, label(format_args!("START (0)")), colors::AMBER)
                .with_indicator(Indicator::UartStart)
        }
        Phase::DataBit(i) => {
            let bit = (config.data >> i) & 1;
            PhaseDescriptor::new(
                phase,
                label(format_args!("DATA[{}]={}", i, bit)),
                colors::BLUE,
            )
            .with_indicator(Indicator::UartData(i))
        }
        Phase::StopBit => {
            PhaseDescriptor::new(phase, label(format_args!("STOP (1)")), colors::SCAN_RED)
                .with_indicator(Indicator::UartStop)
        }
        _ => PhaseDescriptor::new(Phase::Idle, label(format_args!("IDLE")), colors::SLATE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_constants_line_up() {
        assert_eq!(FIRST_DATA_BIT, 2.0);
        assert_eq!(STOP_BIT, 10.0);
        assert_eq!(FRAME_END, 11.0);
    }

    #[test]
    fn dividers_mark_every_bit_boundary() {
        let waveform = waveform(&UartConfig::default());
        let dividers = waveform.annotations_of(AnnotationKind::Divider).count();
        assert_eq!(dividers, 11);
    }
}

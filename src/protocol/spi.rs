//! SPI: one byte on MOSI, framed by chip select, clocked per CPOL/CPHA.
//!
//! Time layout (units):
//!
//! ```text
//! 0    1    2    3    4  ...  16   17   18        20
//! CS ‾‾‾|_______________________________|‾‾‾‾‾‾‾‾‾
//! SCLK  idle |lead|trail|lead| ... |lead|trail| idle
//! ```
//!
//! Leading clock edges fall on even times 2..=16, trailing edges on odd
//! times 3..=17. With CPHA=0 each bit is presented one unit before its
//! leading edge and captured on it; with CPHA=1 it is presented on the
//! leading edge and captured on the trailing edge.

use crate::colors;
use crate::config::{SpiConfig, SpiMode};
use crate::phase::{Indicator, Phase, PhaseDescriptor, PhaseMap, label};
use crate::protocol::bits_msb_first;
use crate::types::{AnnotationKind, Level, LineWriter, Waveform};

pub const TOTAL_TIME: f32 = 20.0;
/// Two units per bit: one clock pulse plus its idle half.
pub const BIT_PERIOD: f32 = 2.0;
pub const BITS: u8 = 8;
pub const CS_ASSERT: f32 = 1.0;
pub const CS_RELEASE: f32 = 18.0;
/// First leading clock edge.
pub const CLOCK_START: f32 = 2.0;
/// How close the scanline must be to a capture edge to count as sampling.
pub const SAMPLE_WINDOW: f32 = 0.2;

pub const LINE_CS: &str = "CS";
pub const LINE_SCLK: &str = "SCLK";
pub const LINE_MOSI: &str = "MOSI";

/// Time at which bit 0 (the MSB) is presented on MOSI.
pub fn data_start(mode: SpiMode) -> f32 {
    if mode.cpha() { CLOCK_START } else { CS_ASSERT }
}

/// Capture edge for bit `k` in transfer order.
pub fn sample_time(mode: SpiMode, k: u8) -> f32 {
    let offset = if mode.cpha() { 1.0 } else { 0.0 };
    CLOCK_START + offset + BIT_PERIOD * k as f32
}

pub fn sample_times(mode: SpiMode) -> [f32; BITS as usize] {
    core::array::from_fn(|k| sample_time(mode, k as u8))
}

/// Number of capture edges strictly before `t`.
pub fn latched_before(mode: SpiMode, t: f32) -> u8 {
    sample_times(mode).iter().filter(|&&st| t > st).count() as u8
}

pub fn waveform(config: &SpiConfig) -> Waveform {
    let mode = config.mode;
    let idle = mode.cpol();
    let bits = bits_msb_first::<8>(config.data);

    let mut cs = LineWriter::new(Level::High);
    cs.set(CS_ASSERT, Level::Low).set(CS_RELEASE, Level::High);

    let mut sclk = LineWriter::new(idle);
    for k in 0..BITS {
        let lead = CLOCK_START + BIT_PERIOD * k as f32;
        sclk.set(lead, !idle).set(lead + 1.0, idle);
    }

    let start = data_start(mode);
    let mut mosi = LineWriter::new(Level::Low);
    for (i, &bit) in bits.iter().enumerate() {
        mosi.set(start + BIT_PERIOD * i as f32, Level::from_bit(bit));
    }
    mosi.set(start + BIT_PERIOD * BITS as f32, Level::Low);

    let mut waveform = Waveform::new(TOTAL_TIME);
    waveform.add_line(LINE_CS, colors::RED, cs.finish(TOTAL_TIME));
    waveform.add_line(LINE_SCLK, colors::BLUE, sclk.finish(TOTAL_TIME));
    waveform.add_line(LINE_MOSI, colors::EMERALD, mosi.finish(TOTAL_TIME));

    for k in 0..BITS {
        waveform.annotate(sample_time(mode, k), 1, AnnotationKind::SampleEdge(k));
    }
    for (i, &bit) in bits.iter().enumerate() {
        let centre = start + BIT_PERIOD * i as f32 + BIT_PERIOD / 2.0;
        let index = BITS - 1 - i as u8;
        waveform.annotate(centre, 2, AnnotationKind::BitValue { index, value: bit });
    }

    waveform
}

pub fn phase_map(config: &SpiConfig) -> PhaseMap {
    let start = data_start(config.mode);
    PhaseMap::builder(TOTAL_TIME)
        .then(Phase::Idle, CS_ASSERT)
        .then(Phase::Select, start)
        .bits(Phase::SpiBit(0), BITS, BIT_PERIOD)
        .then(Phase::Hold, CS_RELEASE)
        .finish(Phase::Deselect)
}

pub(crate) fn describe(config: &SpiConfig, phase: Phase, t: f32) -> PhaseDescriptor {
    let mode = config.mode;
    let latched = latched_before(mode, t);

    let mut descriptor = match phase {
        Phase::SpiBit(k) if libm::fabsf(t - sample_time(mode, k)) < SAMPLE_WINDOW => {
            let mut d = PhaseDescriptor::new(
                phase,
                label(format_args!("SAMPLE BIT {}", BITS - 1 - k)),
                colors::INK,
            )
            .with_indicator(Indicator::ShiftCell(k));
            d.sampling = true;
            d
        }
        Phase::SpiBit(k) => PhaseDescriptor::new(
            phase,
            label(format_args!("BIT {}", BITS - 1 - k)),
            colors::SCAN_RED,
        ),
        Phase::Select => {
            PhaseDescriptor::new(phase, label(format_args!("CS LOW")), colors::SCAN_RED)
        }
        Phase::Hold => PhaseDescriptor::new(phase, label(format_args!("HOLD")), colors::SCAN_RED),
        Phase::Deselect => {
            PhaseDescriptor::new(phase, label(format_args!("CS HIGH")), colors::SLATE)
        }
        _ => PhaseDescriptor::new(phase, label(format_args!("IDLE")), colors::SLATE),
    };
    descriptor.latched = latched;
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_edges_follow_cpha() {
        assert_eq!(sample_time(SpiMode::Mode0, 0), 2.0);
        assert_eq!(sample_time(SpiMode::Mode0, 7), 16.0);
        assert_eq!(sample_time(SpiMode::Mode1, 0), 3.0);
        assert_eq!(sample_time(SpiMode::Mode3, 7), 17.0);
    }

    #[test]
    fn cpha0_map_has_hold_but_no_select() {
        let map = phase_map(&SpiConfig::new(SpiMode::Mode0, 0));
        let phases: heapless::Vec<Phase, 8> = map.intervals().iter().map(|i| i.phase).collect();
        assert_eq!(
            phases.as_slice(),
            &[Phase::Idle, Phase::SpiBit(0), Phase::Hold, Phase::Deselect]
        );
    }

    #[test]
    fn cpha1_map_has_select_but_no_hold() {
        let map = phase_map(&SpiConfig::new(SpiMode::Mode1, 0));
        let phases: heapless::Vec<Phase, 8> = map.intervals().iter().map(|i| i.phase).collect();
        assert_eq!(
            phases.as_slice(),
            &[Phase::Idle, Phase::Select, Phase::SpiBit(0), Phase::Deselect]
        );
    }

    #[test]
    fn latched_counts_edges_strictly_before() {
        assert_eq!(latched_before(SpiMode::Mode0, 2.0), 0);
        assert_eq!(latched_before(SpiMode::Mode0, 2.01), 1);
        assert_eq!(latched_before(SpiMode::Mode0, 19.0), 8);
    }
}

//! I2C: START, 7-bit address, R/W, ACK, one data byte, ACK, STOP.
//!
//! After START, the transaction is 18 one-unit bit slots beginning at
//! [`FIRST_SLOT`]. In every slot SDA is set at the slot start (SCL low),
//! SCL rises a quarter in and falls three quarters in. START and STOP are
//! the only SDA edges while SCL is high.

use crate::colors;
use crate::config::{Direction, I2cConfig};
use crate::phase::{Indicator, Phase, PhaseDescriptor, PhaseMap, label};
use crate::protocol::bits_msb_first;
use crate::types::{AnnotationKind, Level, LineWriter, Waveform};

pub const TOTAL_TIME: f32 = 22.0;
/// SDA falls while SCL is high.
pub const START_TIME: f32 = 1.0;
/// SCL falls and the first address bit goes out.
pub const FIRST_SLOT: f32 = 1.5;
pub const SLOT: f32 = 1.0;
pub const SCL_RISE: f32 = 0.25;
pub const SCL_FALL: f32 = 0.75;

pub const ADDRESS_BITS: u8 = 7;
pub const DATA_BITS: u8 = 8;
pub const RW_SLOT: u8 = ADDRESS_BITS;
pub const ADDRESS_ACK_SLOT: u8 = RW_SLOT + 1;
pub const FIRST_DATA_SLOT: u8 = ADDRESS_ACK_SLOT + 1;
pub const DATA_ACK_SLOT: u8 = FIRST_DATA_SLOT + DATA_BITS;
pub const SLOTS: u8 = DATA_ACK_SLOT + 1;

/// Start of slot `n`.
pub const fn slot_start(n: u8) -> f32 {
    FIRST_SLOT + SLOT * n as f32
}

/// Start of the STOP phase, right after the last ACK slot.
pub const STOP_PHASE: f32 = slot_start(SLOTS);
/// SCL released high before STOP.
pub const STOP_SCL_RISE: f32 = STOP_PHASE + SCL_RISE;
/// SDA rises while SCL is high.
pub const STOP_TIME: f32 = STOP_PHASE + 0.5;

pub const LINE_SCL: &str = "SCL";
pub const LINE_SDA: &str = "SDA";

/// SDA value for every slot: address, R/W, ACK, data, ACK.
pub fn frame_bits(config: &I2cConfig) -> [u8; SLOTS as usize] {
    let address = bits_msb_first::<7>(config.address());
    let data = bits_msb_first::<8>(config.data);
    let mut frame = [0u8; SLOTS as usize];
    frame[..ADDRESS_BITS as usize].copy_from_slice(&address);
    frame[RW_SLOT as usize] = config.direction.bit();
    // Both ACK slots stay 0: the receiver pulls SDA low.
    let data_range = FIRST_DATA_SLOT as usize..DATA_ACK_SLOT as usize;
    frame[data_range].copy_from_slice(&data);
    frame
}

pub fn waveform(config: &I2cConfig) -> Waveform {
    let mut scl = LineWriter::new(Level::High);
    let mut sda = LineWriter::new(Level::High);

    sda.set(START_TIME, Level::Low);
    scl.set(FIRST_SLOT, Level::Low);

    for (n, &bit) in frame_bits(config).iter().enumerate() {
        let start = slot_start(n as u8);
        sda.set(start, Level::from_bit(bit));
        scl.set(start + SCL_RISE, Level::High)
            .set(start + SCL_FALL, Level::Low);
    }

    sda.set(STOP_PHASE, Level::Low);
    scl.set(STOP_SCL_RISE, Level::High);
    sda.set(STOP_TIME, Level::High);

    let mut waveform = Waveform::new(TOTAL_TIME);
    waveform.add_line(LINE_SCL, colors::BLUE, scl.finish(TOTAL_TIME));
    waveform.add_line(LINE_SDA, colors::EMERALD, sda.finish(TOTAL_TIME));

    waveform.annotate(START_TIME, 1, AnnotationKind::StartCondition);
    waveform.annotate(STOP_TIME, 1, AnnotationKind::StopCondition);
    for slot in [ADDRESS_ACK_SLOT, DATA_ACK_SLOT] {
        waveform.annotate(slot_start(slot) + SLOT / 2.0, 1, AnnotationKind::Ack);
    }

    waveform
}

pub fn phase_map() -> PhaseMap {
    PhaseMap::builder(TOTAL_TIME)
        .then(Phase::Idle, START_TIME)
        .then(Phase::Start, FIRST_SLOT)
        .bits(Phase::Address(0), ADDRESS_BITS, SLOT)
        .then(Phase::ReadWrite, slot_start(ADDRESS_ACK_SLOT))
        .then(Phase::Ack(0), slot_start(FIRST_DATA_SLOT))
        .bits(Phase::Data(0), DATA_BITS, SLOT)
        .then(Phase::Ack(1), STOP_PHASE)
        .finish(Phase::Stop)
}

pub(crate) fn describe(config: &I2cConfig, phase: Phase) -> PhaseDescriptor {
    match phase {
        Phase::Start => PhaseDescriptor::new(phase, label(format_args!("START")), colors::AMBER)
            .with_indicator(Indicator::StartCondition),
        Phase::Address(i) => PhaseDescriptor::new(
            phase,
            label(format_args!("ADDR [{}]", ADDRESS_BITS - 1 - i)),
            colors::BLUE,
        )
        .with_indicator(Indicator::AddressBit(i)),
        Phase::ReadWrite => {
            let text = match config.direction {
                Direction::Write => "WRITE",
                Direction::Read => "READ",
            };
            PhaseDescriptor::new(phase, label(format_args!("{}", text)), colors::VIOLET)
                .with_indicator(Indicator::ReadWrite)
        }
        Phase::Ack(n) => PhaseDescriptor::new(phase, label(format_args!("ACK")), colors::EMERALD)
            .with_indicator(Indicator::Ack(n)),
        Phase::Data(i) => PhaseDescriptor::new(
            phase,
            label(format_args!("DATA [{}]", DATA_BITS - 1 - i)),
            colors::EMERALD,
        )
        .with_indicator(Indicator::DataBit(i)),
        Phase::Stop => PhaseDescriptor::new(phase, label(format_args!("STOP")), colors::SCAN_RED)
            .with_indicator(Indicator::StopCondition),
        _ => PhaseDescriptor::new(Phase::Idle, label(format_args!("IDLE")), colors::SLATE),
    }
}

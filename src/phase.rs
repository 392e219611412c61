//! Phase classification: which part of a transaction a point in time falls in.
//!
//! Each protocol describes one transaction as a [`PhaseMap`], a list of
//! contiguous half-open intervals covering `[0, total_time)`. Runs of bits
//! are a single interval with a bit width; the bit index inside the run is
//! `floor((t - start) / width)`.

use core::fmt::Write;

use heapless::{String, Vec};
use palette::Srgb;

use crate::colors;
use crate::config::ProtocolConfig;
use crate::protocol::{i2c, spi, uart};

/// Maximum number of intervals in a phase map.
pub const MAX_INTERVALS: usize = 12;

/// Capacity of a scanline label.
pub const LABEL_CAPACITY: usize = 24;

/// Scanline label text.
pub type Label = String<LABEL_CAPACITY>;

/// A discrete protocol phase.
///
/// Bit indices count in transfer order: index 0 is the first bit on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Bus idle.
    Idle,
    /// SPI: chip select asserted, first bit not yet presented.
    Select,
    /// SPI: data bit in flight.
    SpiBit(u8),
    /// SPI: last clock edge done, chip select still asserted.
    Hold,
    /// SPI: chip select released.
    Deselect,
    /// I2C START condition.
    Start,
    /// I2C address bit.
    Address(u8),
    /// I2C R/W bit.
    ReadWrite,
    /// I2C acknowledge slot (0 after the address, 1 after the data).
    Ack(u8),
    /// I2C data bit.
    Data(u8),
    /// I2C STOP condition.
    Stop,
    /// UART start bit.
    StartBit,
    /// UART data bit.
    DataBit(u8),
    /// UART stop bit.
    StopBit,
}

impl Phase {
    /// Bit index for multi-bit phases.
    pub fn bit_index(&self) -> Option<u8> {
        match *self {
            Phase::SpiBit(i) | Phase::Address(i) | Phase::Data(i) | Phase::DataBit(i) => Some(i),
            _ => None,
        }
    }

    /// Same phase kind with a different bit index. Single phases are unchanged.
    pub fn with_index(self, index: u8) -> Self {
        match self {
            Phase::SpiBit(_) => Phase::SpiBit(index),
            Phase::Address(_) => Phase::Address(index),
            Phase::Data(_) => Phase::Data(index),
            Phase::DataBit(_) => Phase::DataBit(index),
            other => other,
        }
    }
}

/// A UI element that can be highlighted while the scanline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// SPI receive shift register cell, in transfer order.
    ShiftCell(u8),
    StartCondition,
    AddressBit(u8),
    ReadWrite,
    Ack(u8),
    DataBit(u8),
    StopCondition,
    UartStart,
    UartData(u8),
    UartStop,
}

impl Indicator {
    /// Stable element id, usable as an SVG/HTML id.
    pub fn dom_id(&self) -> String<16> {
        let mut id = String::new();
        // The longest id, "addr-bit-255", fits in 16 bytes.
        let _ = match *self {
            Indicator::ShiftCell(k) => write!(id, "bit-cell-{}", k),
            Indicator::StartCondition => write!(id, "start-cond"),
            Indicator::AddressBit(i) => write!(id, "addr-bit-{}", i),
            Indicator::ReadWrite => write!(id, "rw-bit"),
            Indicator::Ack(n) => write!(id, "ack-{}", u16::from(n) + 1),
            Indicator::DataBit(i) => write!(id, "data-bit-{}", i),
            Indicator::StopCondition => write!(id, "stop-cond"),
            Indicator::UartStart => write!(id, "bit-start"),
            Indicator::UartData(i) => write!(id, "bit-d{}", i),
            Indicator::UartStop => write!(id, "bit-stop"),
        };
        id
    }
}

/// Maximum number of indicator cells for one protocol (I2C has 20).
pub const MAX_CELLS: usize = 20;

/// One cell in the bit indicator strip shown next to the waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorCell {
    pub indicator: Indicator,
    /// Short caption, e.g. `S`, `A`, `D3`.
    pub caption: String<4>,
    /// Bit value shown in the cell, if the cell carries one.
    pub value: Option<u8>,
    /// Fill used while the cell is highlighted.
    pub color: Srgb<u8>,
}

impl IndicatorCell {
    fn new(
        indicator: Indicator,
        caption: core::fmt::Arguments<'_>,
        value: Option<u8>,
        color: Srgb<u8>,
    ) -> Self {
        let mut text = String::new();
        let _ = text.write_fmt(caption);
        Self {
            indicator,
            caption: text,
            value,
            color,
        }
    }
}

impl ProtocolConfig {
    /// Cells of the indicator strip, in wire order.
    pub fn indicator_cells(&self) -> Vec<IndicatorCell, MAX_CELLS> {
        let mut cells = Vec::new();
        let mut push = |cell: IndicatorCell| {
            // Every protocol stays within MAX_CELLS.
            let _ = cells.push(cell);
        };

        match self {
            ProtocolConfig::Spi(c) => {
                for (k, &bit) in crate::protocol::bits_msb_first::<8>(c.data).iter().enumerate() {
                    let color = if bit == 1 { colors::EMERALD } else { colors::BLUE };
                    let k = k as u8;
                    push(IndicatorCell::new(
                        Indicator::ShiftCell(k),
                        format_args!("{}", spi::BITS - 1 - k),
                        Some(bit),
                        color,
                    ));
                }
            }
            ProtocolConfig::I2c(c) => {
                let frame = i2c::frame_bits(c);
                push(IndicatorCell::new(
                    Indicator::StartCondition,
                    format_args!("S"),
                    None,
                    colors::AMBER,
                ));
                for i in 0..i2c::ADDRESS_BITS {
                    push(IndicatorCell::new(
                        Indicator::AddressBit(i),
                        format_args!("A{}", i2c::ADDRESS_BITS - 1 - i),
                        Some(frame[i as usize]),
                        colors::BLUE,
                    ));
                }
                push(IndicatorCell::new(
                    Indicator::ReadWrite,
                    format_args!("RW"),
                    Some(c.direction.bit()),
                    colors::VIOLET,
                ));
                push(IndicatorCell::new(
                    Indicator::Ack(0),
                    format_args!("A"),
                    None,
                    colors::EMERALD,
                ));
                for i in 0..i2c::DATA_BITS {
                    push(IndicatorCell::new(
                        Indicator::DataBit(i),
                        format_args!("D{}", i2c::DATA_BITS - 1 - i),
                        Some(frame[(i2c::FIRST_DATA_SLOT + i) as usize]),
                        colors::EMERALD,
                    ));
                }
                push(IndicatorCell::new(
                    Indicator::Ack(1),
                    format_args!("A"),
                    None,
                    colors::EMERALD,
                ));
                push(IndicatorCell::new(
                    Indicator::StopCondition,
                    format_args!("P"),
                    None,
                    colors::SCAN_RED,
                ));
            }
            ProtocolConfig::Uart(c) => {
                push(IndicatorCell::new(
                    Indicator::UartStart,
                    format_args!("ST"),
                    Some(0),
                    colors::AMBER,
                ));
                for i in 0..uart::DATA_BITS {
                    push(IndicatorCell::new(
                        Indicator::UartData(i),
                        format_args!("D{}", i),
                        Some((c.data >> i) & 1),
                        colors::BLUE,
                    ));
                }
                push(IndicatorCell::new(
                    Indicator::UartStop,
                    format_args!("SP"),
                    Some(1),
                    colors::SCAN_RED,
                ));
            }
        }
        cells
    }
}

/// One half-open interval `[start, end)` of a phase map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseInterval {
    pub start: f32,
    pub end: f32,
    /// The phase, with bit index 0 for bit runs.
    pub phase: Phase,
    /// Width of one bit for bit runs.
    pub bit_width: Option<f32>,
}

impl PhaseInterval {
    pub fn contains(&self, t: f32) -> bool {
        self.start <= t && t < self.end
    }

    /// Number of bits in a run, 1 for single phases.
    pub fn bit_count(&self) -> u8 {
        match self.bit_width {
            Some(w) => libm::roundf((self.end - self.start) / w) as u8,
            None => 1,
        }
    }

    /// Phase at `t`, which must lie inside the interval.
    pub fn phase_at(&self, t: f32) -> Phase {
        let Some(width) = self.bit_width else {
            return self.phase;
        };
        let index = libm::floorf((t - self.start) / width).max(0.0) as u8;
        self.phase.with_index(index.min(self.bit_count().saturating_sub(1)))
    }
}

/// Contiguous partition of one transaction window.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseMap {
    total_time: f32,
    intervals: Vec<PhaseInterval, MAX_INTERVALS>,
}

impl PhaseMap {
    /// Starts a map at time zero.
    pub fn builder(total_time: f32) -> PhaseMapBuilder {
        PhaseMapBuilder {
            cursor: 0.0,
            map: PhaseMap {
                total_time,
                intervals: Vec::new(),
            },
        }
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    pub fn intervals(&self) -> &[PhaseInterval] {
        &self.intervals
    }

    /// Wraps any time into `[0, total_time)`.
    pub fn wrap(&self, t: f32) -> f32 {
        wrap_time(t, self.total_time)
    }

    /// Interval containing `t` after wrapping.
    pub fn interval_at(&self, t: f32) -> Option<&PhaseInterval> {
        let t = self.wrap(t);
        self.intervals.iter().find(|i| i.contains(t))
    }

    /// Phase at `t` after wrapping.
    pub fn phase_at(&self, t: f32) -> Phase {
        let t = self.wrap(t);
        self.interval_at(t)
            .map(|i| i.phase_at(t))
            .unwrap_or(Phase::Idle)
    }

    /// Start time of the first interval holding `phase`, including bit runs.
    pub fn start_of(&self, phase: Phase) -> Option<f32> {
        self.intervals.iter().find_map(|i| match (i.bit_width, phase.bit_index()) {
            (Some(w), Some(index)) if i.phase == phase.with_index(0) => {
                (index < i.bit_count()).then_some(i.start + w * index as f32)
            }
            (None, _) if i.phase == phase => Some(i.start),
            _ => None,
        })
    }
}

/// Builds a [`PhaseMap`] interval by interval, so intervals can never gap or overlap.
#[derive(Debug)]
pub struct PhaseMapBuilder {
    cursor: f32,
    map: PhaseMap,
}

impl PhaseMapBuilder {
    /// Adds `phase` from the current cursor until `end`.
    ///
    /// Empty intervals (end at or before the cursor) are skipped.
    ///
    /// # Panics
    /// Panics if the map capacity is exceeded.
    pub fn then(self, phase: Phase, end: f32) -> Self {
        self.push(phase, end, None)
    }

    /// Adds a run of `count` bits of `width` each.
    pub fn bits(self, phase: Phase, count: u8, width: f32) -> Self {
        let end = self.cursor + width * count as f32;
        self.push(phase.with_index(0), end, Some(width))
    }

    /// Closes the map with `phase` until the end of the window.
    pub fn finish(self, phase: Phase) -> PhaseMap {
        let total = self.map.total_time;
        self.then(phase, total).map
    }

    fn push(mut self, phase: Phase, end: f32, bit_width: Option<f32>) -> Self {
        if end <= self.cursor {
            return self;
        }
        let interval = PhaseInterval {
            start: self.cursor,
            end,
            phase,
            bit_width,
        };
        if self.map.intervals.push(interval).is_err() {
            panic!("phase map capacity exceeded");
        }
        self.cursor = end;
        self
    }
}

/// Everything the scanline shows at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDescriptor {
    pub phase: Phase,
    pub label: Label,
    pub color: Srgb<u8>,
    /// Element to highlight, if any.
    pub indicator: Option<Indicator>,
    /// SPI: the scanline is on a capture edge.
    pub sampling: bool,
    /// SPI: bits already captured by the receiver's shift register.
    pub latched: u8,
}

impl PhaseDescriptor {
    pub fn new(phase: Phase, label: Label, color: Srgb<u8>) -> Self {
        Self {
            phase,
            label,
            color,
            indicator: None,
            sampling: false,
            latched: 0,
        }
    }

    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.indicator = Some(indicator);
        self
    }
}

/// Builds a label from format arguments, truncating silently if too long.
pub(crate) fn label(args: core::fmt::Arguments<'_>) -> Label {
    let mut s = Label::new();
    let _ = s.write_fmt(args);
    s
}

/// Wraps `t` into `[0, total)`.
pub fn wrap_time(t: f32, total: f32) -> f32 {
    if total <= 0.0 {
        return 0.0;
    }
    let wrapped = t - total * libm::floorf(t / total);
    if wrapped >= total || wrapped < 0.0 { 0.0 } else { wrapped }
}

impl ProtocolConfig {
    /// Phase partition of one transaction for this configuration.
    pub fn phase_map(&self) -> PhaseMap {
        match self {
            ProtocolConfig::Spi(c) => spi::phase_map(c),
            ProtocolConfig::I2c(_) => i2c::phase_map(),
            ProtocolConfig::Uart(_) => uart::phase_map(),
        }
    }
}

/// Classifies abstract time `t` for `config`.
///
/// `t` is wrapped into the protocol's window first. A boundary time belongs
/// to the phase that starts there.
pub fn classify(config: &ProtocolConfig, t: f32) -> PhaseDescriptor {
    let map = config.phase_map();
    let t = map.wrap(t);
    let phase = map.phase_at(t);
    match config {
        ProtocolConfig::Spi(c) => spi::describe(c, phase, t),
        ProtocolConfig::I2c(c) => i2c::describe(c, phase),
        ProtocolConfig::Uart(c) => uart::describe(c, phase),
    }
}

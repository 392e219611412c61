//! Per-protocol timeline builders and phase maps.
//!
//! Each submodule owns the timing constants of its transaction. Its
//! waveform builder and its phase map both read those constants, so the
//! drawn edges and the classified phases cannot drift apart.

pub mod i2c;
pub mod spi;
pub mod uart;

use crate::config::{ProtocolConfig, ProtocolKind};
use crate::types::Waveform;

impl ProtocolKind {
    /// Length of the abstract time window for one transaction.
    pub fn total_time(self) -> f32 {
        match self {
            ProtocolKind::Spi => spi::TOTAL_TIME,
            ProtocolKind::I2c => i2c::TOTAL_TIME,
            ProtocolKind::Uart => uart::TOTAL_TIME,
        }
    }
}

impl ProtocolConfig {
    /// Builds the waveform for one transaction.
    ///
    /// Pure and deterministic: equal configurations yield equal waveforms.
    pub fn waveform(&self) -> Waveform {
        match self {
            ProtocolConfig::Spi(c) => spi::waveform(c),
            ProtocolConfig::I2c(c) => i2c::waveform(c),
            ProtocolConfig::Uart(c) => uart::waveform(c),
        }
    }

    pub fn total_time(&self) -> f32 {
        self.kind().total_time()
    }
}

/// Bits of `value`, most significant of the low `width` bits first.
pub fn bits_msb_first<const W: usize>(value: u8) -> [u8; W] {
    core::array::from_fn(|i| (value >> (W - 1 - i)) & 1)
}

/// Bits of `value`, least significant first.
pub fn bits_lsb_first(value: u8) -> [u8; 8] {
    core::array::from_fn(|i| (value >> i) & 1)
}

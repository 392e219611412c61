//! Protocol configurations and presentation settings.

use crate::input::InputError;
use crate::types::Level;

/// Which bus a configuration describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolKind {
    Spi,
    I2c,
    Uart,
}

/// SPI clock mode: CPOL in bit 1, CPHA in bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    pub const ALL: [SpiMode; 4] = [SpiMode::Mode0, SpiMode::Mode1, SpiMode::Mode2, SpiMode::Mode3];

    /// Mode for a numeric index, `None` outside 0..=3.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }

    /// Clock polarity as the idle level of SCLK.
    pub fn cpol(self) -> Level {
        Level::from_bit(self.index() >> 1)
    }

    /// Clock phase: `false` samples on the leading edge, `true` on the trailing edge.
    pub fn cpha(self) -> bool {
        self.index() & 1 == 1
    }

    pub fn description(self) -> &'static str {
        match self {
            SpiMode::Mode0 => "clock idles low, data sampled on the rising (leading) edge",
            SpiMode::Mode1 => "clock idles low, data sampled on the falling (trailing) edge",
            SpiMode::Mode2 => "clock idles high, data sampled on the falling (leading) edge",
            SpiMode::Mode3 => "clock idles high, data sampled on the rising (trailing) edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpiConfig {
    pub mode: SpiMode,
    pub data: u8,
}

impl SpiConfig {
    pub fn new(mode: SpiMode, data: u8) -> Self {
        Self { mode, data }
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            mode: SpiMode::Mode0,
            data: 0xA5,
        }
    }
}

/// I2C transfer direction carried in the R/W bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Write,
    Read,
}

impl Direction {
    /// Value of the R/W bit (write is 0).
    pub fn bit(self) -> u8 {
        match self {
            Direction::Write => 0,
            Direction::Read => 1,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Direction::Write => Direction::Read,
            Direction::Read => Direction::Write,
        }
    }
}

/// Largest 7-bit I2C address.
pub const MAX_I2C_ADDRESS: u8 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawI2cConfig"))]
pub struct I2cConfig {
    address: u8,
    pub data: u8,
    pub direction: Direction,
}

/// Unchecked wire form of [`I2cConfig`], validated through [`I2cConfig::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawI2cConfig {
    address: u8,
    data: u8,
    direction: Direction,
}

#[cfg(feature = "serde")]
impl TryFrom<RawI2cConfig> for I2cConfig {
    type Error = InputError;

    fn try_from(raw: RawI2cConfig) -> Result<Self, Self::Error> {
        I2cConfig::new(raw.address, raw.data, raw.direction)
    }
}

impl I2cConfig {
    /// Creates a configuration, rejecting addresses wider than 7 bits.
    pub fn new(address: u8, data: u8, direction: Direction) -> Result<Self, InputError> {
        if address > MAX_I2C_ADDRESS {
            return Err(InputError::OutOfRange {
                value: address as u32,
                max: MAX_I2C_ADDRESS as u32,
            });
        }
        Ok(Self {
            address,
            data,
            direction,
        })
    }

    /// The 7-bit target address.
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn with_address(self, address: u8) -> Result<Self, InputError> {
        Self::new(address, self.data, self.direction)
    }
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            address: 0x50,
            data: 0xA5,
            direction: Direction::Write,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UartConfig {
    pub data: u8,
}

impl UartConfig {
    pub fn new(data: u8) -> Self {
        Self { data }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        // 'U': alternating 01010101
        Self { data: 0x55 }
    }
}

/// What a visualizer shows. Replaced wholesale on every edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolConfig {
    Spi(SpiConfig),
    I2c(I2cConfig),
    Uart(UartConfig),
}

impl ProtocolConfig {
    pub fn kind(&self) -> ProtocolKind {
        match self {
            ProtocolConfig::Spi(_) => ProtocolKind::Spi,
            ProtocolConfig::I2c(_) => ProtocolKind::I2c,
            ProtocolConfig::Uart(_) => ProtocolKind::Uart,
        }
    }
}

impl From<SpiConfig> for ProtocolConfig {
    fn from(config: SpiConfig) -> Self {
        ProtocolConfig::Spi(config)
    }
}

impl From<I2cConfig> for ProtocolConfig {
    fn from(config: I2cConfig) -> Self {
        ProtocolConfig::I2c(config)
    }
}

impl From<UartConfig> for ProtocolConfig {
    fn from(config: UartConfig) -> Self {
        ProtocolConfig::Uart(config)
    }
}

/// How long one pass of the scanline takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationSettings {
    pub duration_ms: u64,
}

impl AnimationSettings {
    pub fn for_protocol(kind: ProtocolKind) -> Self {
        let duration_ms = match kind {
            ProtocolKind::Spi | ProtocolKind::I2c => 8000,
            ProtocolKind::Uart => 6000,
        };
        Self { duration_ms }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self { duration_ms: 8000 }
    }
}

/// Pixel geometry of a rendered waveform.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    /// Height of one lane, low level at the bottom.
    pub lane_height: f32,
    /// Vertical space between lanes.
    pub lane_gap: f32,
    /// Distance between the high level and the top of the lane.
    pub level_padding: f32,
    /// Narrowest scanline label box.
    pub label_min_width: f32,
    /// Horizontal padding added to the label text width.
    pub label_padding: f32,
}

impl Layout {
    pub fn for_protocol(kind: ProtocolKind) -> Self {
        match kind {
            ProtocolKind::Spi => Self {
                height: 320.0,
                margin_top: 30.0,
                margin_left: 80.0,
                lane_gap: 30.0,
                level_padding: 10.0,
                ..Self::default()
            },
            ProtocolKind::I2c => Self {
                height: 280.0,
                margin_top: 40.0,
                lane_gap: 50.0,
                level_padding: 15.0,
                ..Self::default()
            },
            ProtocolKind::Uart => Self {
                height: 240.0,
                margin_top: 40.0,
                margin_bottom: 40.0,
                lane_height: 120.0,
                label_min_width: 80.0,
                label_padding: 10.0,
                ..Self::default()
            },
        }
    }

    /// Drawable width inside the horizontal margins.
    pub fn inner_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }

    pub fn with_width(self, width: f32) -> Self {
        Self { width, ..self }
    }

    /// Width of the scanline label box for `chars` characters of monospace text.
    pub fn label_width(&self, chars: usize) -> f32 {
        (chars as f32 * 8.0 + self.label_padding).max(self.label_min_width)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 280.0,
            margin_top: 30.0,
            margin_right: 30.0,
            margin_bottom: 20.0,
            margin_left: 60.0,
            lane_height: 60.0,
            lane_gap: 30.0,
            level_padding: 10.0,
            label_min_width: 60.0,
            label_padding: 20.0,
        }
    }
}

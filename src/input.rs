//! Validation of raw user input.
//!
//! Every field a learner can type into goes through here before it can
//! reach a protocol builder. Rejected input leaves the previous
//! configuration in place.

use crate::config::{I2cConfig, MAX_I2C_ADDRESS, ProtocolConfig, SpiMode};

/// Reasons a field edit was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// The field is empty.
    #[error("input is empty")]
    Empty,

    /// The field contains something other than hexadecimal digits.
    #[error("input is not a hexadecimal number")]
    NotHex,

    /// The parsed value does not fit the field.
    #[error("value {value:#x} exceeds maximum {max:#x}")]
    OutOfRange { value: u32, max: u32 },

    /// The edit targets a different protocol than the one configured.
    #[error("edit does not apply to the configured protocol")]
    WrongProtocol,
}

/// A single user edit, carrying the raw field text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEdit<'a> {
    /// Mode selector button.
    SpiMode(SpiMode),
    /// SPI data byte, hex.
    SpiData(&'a str),
    /// I2C 7-bit address, hex.
    I2cAddress(&'a str),
    /// I2C data byte, hex.
    I2cData(&'a str),
    /// I2C read/write toggle.
    ToggleDirection,
    /// UART character field; the first character's code is sent.
    UartChar(&'a str),
    /// UART data byte, hex.
    UartData(&'a str),
}

/// Parses a hex value of at most `max`. Accepts an optional `0x` prefix.
pub fn parse_hex(text: &str, max: u32) -> Result<u32, InputError> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    if digits.is_empty() {
        return Err(InputError::Empty);
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(InputError::NotHex);
    }

    let value = u32::from_str_radix(digits, 16).map_err(|_| InputError::OutOfRange {
        value: u32::MAX,
        max,
    })?;
    if value > max {
        return Err(InputError::OutOfRange { value, max });
    }
    Ok(value)
}

/// Parses a data byte field such as `A5`.
pub fn parse_hex_byte(text: &str) -> Result<u8, InputError> {
    parse_hex(text, u8::MAX as u32).map(|v| v as u8)
}

/// Parses a 7-bit I2C address field such as `50`.
pub fn parse_address(text: &str) -> Result<u8, InputError> {
    parse_hex(text, MAX_I2C_ADDRESS as u32).map(|v| v as u8)
}

/// Parses a decimal SPI mode (`0`..=`3`).
pub fn parse_spi_mode(text: &str) -> Result<SpiMode, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::Empty);
    }
    let index: u8 = text.parse().map_err(|_| InputError::NotHex)?;
    SpiMode::from_index(index).ok_or(InputError::OutOfRange {
        value: index as u32,
        max: 3,
    })
}

/// Code of the first character of a one-character field.
///
/// Characters beyond one byte cannot be sent as a single UART frame.
pub fn parse_char_byte(text: &str) -> Result<u8, InputError> {
    let c = text.chars().next().ok_or(InputError::Empty)?;
    let code = c as u32;
    if code > u8::MAX as u32 {
        return Err(InputError::OutOfRange {
            value: code,
            max: u8::MAX as u32,
        });
    }
    Ok(code as u8)
}

impl ProtocolConfig {
    /// Applies an edit, returning the new configuration.
    ///
    /// `self` is never modified; on error the caller keeps the old value.
    pub fn apply(&self, edit: &ConfigEdit<'_>) -> Result<ProtocolConfig, InputError> {
        let updated = match (*self, *edit) {
            (ProtocolConfig::Spi(mut spi), ConfigEdit::SpiMode(mode)) => {
                spi.mode = mode;
                ProtocolConfig::Spi(spi)
            }
            (ProtocolConfig::Spi(mut spi), ConfigEdit::SpiData(text)) => {
                spi.data = parse_hex_byte(text)?;
                ProtocolConfig::Spi(spi)
            }
            (ProtocolConfig::I2c(i2c), ConfigEdit::I2cAddress(text)) => {
                ProtocolConfig::I2c(i2c.with_address(parse_address(text)?)?)
            }
            (ProtocolConfig::I2c(mut i2c), ConfigEdit::I2cData(text)) => {
                i2c.data = parse_hex_byte(text)?;
                ProtocolConfig::I2c(i2c)
            }
            (ProtocolConfig::I2c(mut i2c), ConfigEdit::ToggleDirection) => {
                i2c.direction = i2c.direction.toggled();
                ProtocolConfig::I2c(i2c)
            }
            (ProtocolConfig::Uart(mut uart), ConfigEdit::UartChar(text)) => {
                uart.data = parse_char_byte(text)?;
                ProtocolConfig::Uart(uart)
            }
            (ProtocolConfig::Uart(mut uart), ConfigEdit::UartData(text)) => {
                uart.data = parse_hex_byte(text)?;
                ProtocolConfig::Uart(uart)
            }
            _ => return Err(InputError::WrongProtocol),
        };
        Ok(updated)
    }
}

impl I2cConfig {
    /// Parses address and data fields into a write or read configuration.
    pub fn parse(
        address: &str,
        data: &str,
        direction: crate::Direction,
    ) -> Result<Self, InputError> {
        I2cConfig::new(parse_address(address)?, parse_hex_byte(data)?, direction)
    }
}

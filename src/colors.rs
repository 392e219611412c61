//! Palette used by labels, lines and highlights.
//!
//! Values match the Tailwind shades the lessons are styled with.

use palette::Srgb;

/// Neutral label background while the bus is idle.
pub const SLATE: Srgb<u8> = Srgb::new(0x64, 0x74, 0x8b);
/// Dark label background, used while an SPI capture edge is under the scanline.
pub const INK: Srgb<u8> = Srgb::new(0x0f, 0x17, 0x2a);
/// Default SPI scanline color.
pub const SCAN_RED: Srgb<u8> = Srgb::new(0xdc, 0x26, 0x26);

pub const RED: Srgb<u8> = Srgb::new(0xef, 0x44, 0x44);
pub const BLUE: Srgb<u8> = Srgb::new(0x3b, 0x82, 0xf6);
pub const EMERALD: Srgb<u8> = Srgb::new(0x10, 0xb9, 0x81);
pub const AMBER: Srgb<u8> = Srgb::new(0xd9, 0x77, 0x06);
pub const VIOLET: Srgb<u8> = Srgb::new(0x8b, 0x5c, 0xf6);

/// Dashed guide lines.
pub const GRID: Srgb<u8> = Srgb::new(0xe2, 0xe8, 0xf0);
/// UART bit dividers.
pub const DIVIDER: Srgb<u8> = Srgb::new(0xcb, 0xd5, 0xe1);

/// Formats a color as a `#rrggbb` hex string into any writer.
pub fn write_hex<W: core::fmt::Write>(w: &mut W, color: Srgb<u8>) -> core::fmt::Result {
    write!(w, "#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Hex form of a color as a fixed-capacity string.
pub fn hex(color: Srgb<u8>) -> heapless::String<7> {
    let mut s = heapless::String::new();
    // Seven bytes always fit "#rrggbb".
    let _ = write_hex(&mut s, color);
    s
}

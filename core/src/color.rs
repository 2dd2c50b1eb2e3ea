use std::str::FromStr;

use bytemuck::{Pod, Zeroable};

use crate::display::DisplayBuffer;

pub const DEFAULT_BACKGROUND_COLOR: Chip8Color = Chip8Color::new(0, 0, 0);
pub const DEFAULT_FOREGROUND_COLOR: Chip8Color = Chip8Color::new(0xF0, 0xFF, 0x00);

/// One screen pixel, laid out to match an RGBX8888 texture word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C, packed)]
pub struct Chip8Color {
    padding: u8,
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Chip8Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Chip8Color {
        Chip8Color { r, g, b, padding: 0 }
    }
}

impl FromStr for Chip8Color {
    type Err = Chip8ColorParseError;

    fn from_str(s: &str) -> Result<Chip8Color, Chip8ColorParseError> {
        let err = || Chip8ColorParseError(s.to_string());
        let hex = s.strip_prefix("0x").unwrap_or(s);

        if hex.len() != 6 || hex.chars().any(|c| !c.is_ascii_hexdigit()) {
            return Err(err());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| err())
        };

        Ok(Chip8Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse hex color {0:?}, expected 0xRRGGBB")]
pub struct Chip8ColorParseError(String);

/// Map set cells to `fg` and unset cells to `bg`
pub fn render_pixels(
    display: &DisplayBuffer,
    fg: Chip8Color,
    bg: Chip8Color,
    pixels: &mut [Chip8Color],
) {
    for (pixel, cell) in pixels.iter_mut().zip(display.buffer()) {
        *pixel = if *cell != 0 { fg } else { bg };
    }
}

/// Raw bytes of a pixel slice, for texture upload
pub fn pixel_bytes(pixels: &[Chip8Color]) -> &[u8] {
    bytemuck::cast_slice(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH};

    #[test]
    fn test_parse_color() {
        assert_eq!("0xF0FF00".parse(), Ok(Chip8Color::new(0xF0, 0xFF, 0x00)));
        assert_eq!("102030".parse(), Ok(Chip8Color::new(0x10, 0x20, 0x30)));
        assert!("0xF0FF0".parse::<Chip8Color>().is_err());
        assert!("0xGGFF00".parse::<Chip8Color>().is_err());
    }

    #[test]
    fn test_render_pixels() {
        let mut display = DisplayBuffer::default();
        display.flip(1, 0);
        let mut pixels = vec![Chip8Color::default(); SCREEN_WIDTH * SCREEN_HEIGHT];

        render_pixels(&display, DEFAULT_FOREGROUND_COLOR, DEFAULT_BACKGROUND_COLOR, &mut pixels);

        assert_eq!(pixels[0], DEFAULT_BACKGROUND_COLOR);
        assert_eq!(pixels[1], DEFAULT_FOREGROUND_COLOR);
        assert_eq!(pixel_bytes(&pixels).len(), SCREEN_WIDTH * SCREEN_HEIGHT * 4);
        assert_eq!(&pixel_bytes(&pixels)[4..8], &[0x00, 0x00, 0xFF, 0xF0]);
    }
}

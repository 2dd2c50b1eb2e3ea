use crate::error::Chip8Error;

pub const MEMORY_SIZE: usize = 0x1000;
/// Address where programs are loaded and where execution starts
pub const PROGRAM_START: u16 = 0x200;
/// Largest ROM that fits between the program start and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Address mask: every instruction-level access is confined to 12 bits
pub const ADDRESS_MASK: u16 = 0x0FFF;

pub const FONT_START: u16 = 0x000;
pub const FONT_GLYPH_SIZE: u16 = 5;

pub static DEFAULT_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Flat 4 KiB memory image with the hex glyph set at the bottom.
///
/// Reads and writes take raw 16-bit addresses and mask them to 12 bits, so an
/// overflowing index register can never reach outside the image.
#[derive(Clone)]
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
    font: [u8; 80],
}

impl Memory {
    pub fn new(font: [u8; 80]) -> Memory {
        let mut memory = Memory {
            bytes: Box::new([0u8; MEMORY_SIZE]),
            font,
        };
        memory.reset();
        memory
    }

    /// Zero the whole image, then write the font at offset 0
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        let start = FONT_START as usize;
        self.bytes[start..start + self.font.len()].copy_from_slice(&self.font);
    }

    /// Reset, then copy `rom` to the program area.
    ///
    /// An oversized ROM is rejected and the image stays freshly reset.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        self.reset();

        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.bytes[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    pub fn read_u8(&self, addr: u16) -> u8 {
        self.bytes[(addr & ADDRESS_MASK) as usize]
    }

    /// Big-endian instruction word; the second byte wraps to 0x000 at the top
    pub fn read_u16_be(&self, addr: u16) -> u16 {
        let hi = self.read_u8(addr);
        let lo = self.read_u8(addr.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    pub fn write_u8(&mut self, addr: u16, data: u8) {
        self.bytes[(addr & ADDRESS_MASK) as usize] = data;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_writes_font() {
        let mut memory = Memory::new(DEFAULT_FONT);
        memory.write_u8(0x000, 0x00);
        memory.write_u8(0x300, 0xAA);

        memory.reset();

        assert_eq!(&memory.as_slice()[0..80], &DEFAULT_FONT[..]);
        assert!(memory.as_slice()[80..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_load_rom() {
        let mut memory = Memory::new(DEFAULT_FONT);

        memory.load(&[0x12, 0x34, 0x56]).unwrap();

        assert_eq!(memory.read_u8(0x200), 0x12);
        assert_eq!(memory.read_u8(0x201), 0x34);
        assert_eq!(memory.read_u8(0x202), 0x56);
        assert_eq!(memory.read_u16_be(0x200), 0x1234);
    }

    #[test]
    fn test_load_max_size_rom() {
        let mut memory = Memory::new(DEFAULT_FONT);
        let rom = vec![0xEE; MAX_ROM_SIZE];

        memory.load(&rom).unwrap();

        assert_eq!(memory.read_u8(0xFFF), 0xEE);
    }

    #[test]
    fn test_load_oversized_rom_leaves_reset_image() {
        let mut memory = Memory::new(DEFAULT_FONT);
        memory.load(&[0xAB, 0xCD]).unwrap();

        let res = memory.load(&vec![0x11; MAX_ROM_SIZE + 1]);

        assert!(matches!(
            res,
            Err(Chip8Error::RomTooLarge { size, max }) if size == MAX_ROM_SIZE + 1 && max == MAX_ROM_SIZE
        ));
        assert_eq!(&memory.as_slice()[0..80], &DEFAULT_FONT[..]);
        assert!(memory.as_slice()[80..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_address_mask() {
        let mut memory = Memory::new(DEFAULT_FONT);

        memory.write_u8(0x1234, 0x42);

        assert_eq!(memory.read_u8(0x0234), 0x42);
        assert_eq!(memory.read_u8(0xF234), 0x42);
    }

    #[test]
    fn test_read_u16_wraps_at_top() {
        let mut memory = Memory::new(DEFAULT_FONT);
        memory.write_u8(0xFFF, 0xAB);

        // Second byte comes from address 0x000, the first font byte
        assert_eq!(memory.read_u16_be(0xFFF), 0xABF0);
    }
}

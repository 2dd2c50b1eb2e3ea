use std::{io, path::PathBuf};

/// Failures surfaced to the caller of the CHIP-8 core.
///
/// Faults that happen while a program is running (stack overflow, unknown
/// opcodes) are not represented here, they are logged and execution goes on.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("failed to read ROM file {path:?}")]
    RomRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("font sprite must be 80 bytes, got {size}")]
    InvalidFont { size: usize },

    #[error("key code 0x{0:02x} is outside the keypad range 0x0-0xF")]
    InvalidKey(u8),
}

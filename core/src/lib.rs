//! CHIP-8 virtual machine core.
//!
//! [`Chip8`] owns the memory image, register file, display buffer and wait
//! state. A driver calls [`Chip8::step`] at the instruction rate, forwards
//! key events with [`Chip8::press`] / [`Chip8::release`] and reads the frame
//! through [`Chip8::display`].

mod chip8;
pub mod clock;
mod color;
mod debug;
mod display;
mod error;
pub mod instruction;
mod memory;
mod registers;

pub use chip8::{Chip8, Chip8Builder, ExecState, Quirks};
pub use clock::{Clock, ManualClock, MonotonicClock, FRAME_INTERVAL, FRAME_RATE};
pub use color::{
    pixel_bytes, render_pixels, Chip8Color, Chip8ColorParseError, DEFAULT_BACKGROUND_COLOR,
    DEFAULT_FOREGROUND_COLOR,
};
pub use debug::PrintMode;
pub use display::{DisplayBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use error::Chip8Error;
pub use memory::{DEFAULT_FONT, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START};
pub use registers::Key;

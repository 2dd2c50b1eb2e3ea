// CHIP-8 virtual CPU
//
// Useful links:
// * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
// * [Building a CHIP-8 Emulator](https://austinmorlan.com/posts/chip8_emulator/)
// * [CHIP-8 test suite](https://github.com/Timendus/chip8-test-suite)
//

use std::path::Path;

use log::{debug, error, trace, warn};
use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{
    clock::{Clock, FrameClock, MonotonicClock},
    debug::{dump_registers, PrintMode},
    display::{DisplayBuffer, SCREEN_HEIGHT, SCREEN_WIDTH},
    error::Chip8Error,
    instruction::Instruction,
    memory::{Memory, DEFAULT_FONT, FONT_GLYPH_SIZE, FONT_START},
    registers::{Key, Registers, StackOverflow, STACK_SIZE},
};

/// Behaviors that differ between historical interpreters.
///
/// The default set matches the original COSMAC VIP interpreter except for
/// FX55/FX65, which leave I untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// Logical ops (8XY1, 8XY2, 8XY3) reset VF to 0
    pub vf_reset: bool,
    /// Bitwise shift (8XY6 and 8XYE): VY is copied into VX before shifting
    pub shift_copies_vy: bool,
    /// Store and load memory (FX55/FX65): I is incremented by X + 1
    pub load_store_increments_i: bool,
    /// Sprites are clipped at the screen edges instead of wrapping around
    pub clip_sprites: bool,
    /// DXYN blocks execution until the next vblank
    pub vblank_wait: bool,
}

impl Default for Quirks {
    fn default() -> Quirks {
        Quirks {
            vf_reset: true,
            shift_copies_vy: true,
            load_store_increments_i: false,
            clip_sprites: true,
            vblank_wait: true,
        }
    }
}

/// What the CPU does on the next `step`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecState {
    /// Fetch, decode and execute
    Normal,
    /// Parked by FX0A until a key is released, the key goes to V`register`
    AwaitingKey { register: u8 },
    /// Parked by DXYN until the next frame boundary
    AwaitingVblank,
}

/// Program counter update after one instruction
enum Flow {
    Next,
    Skip,
    Jump(u16),
    Stay,
}

impl Flow {
    fn skip_if(cond: bool) -> Flow {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

pub struct Chip8Builder {
    /// ROM
    rom: Option<Vec<u8>>,
    /// Font sprite
    font: Option<Vec<u8>>,
    // PRNG Seed
    rng_seed: Option<u64>,
    /// Compatibility behaviors
    quirks: Quirks,
    /// Frame pacing time source
    clock: Option<Box<dyn Clock>>,
}

pub struct Chip8 {
    /// Register file, stack, timers and keypad
    regs: Registers,
    /// Memory
    memory: Memory,
    /// Display: 64x32 cells, 0 or 1
    display: DisplayBuffer,
    /// Wait state
    state: ExecState,
    /// Last key pressed while awaiting a key
    pending_key: Option<Key>,
    /// Compatibility behaviors
    quirks: Quirks,
    /// Next vblank deadline
    frames: FrameClock,
    clock: Box<dyn Clock>,
    /// PRNG Generator
    rng: StdRng,
}

impl Default for Chip8Builder {
    fn default() -> Chip8Builder {
        Chip8Builder::new()
    }
}

impl Chip8Builder {
    pub fn new() -> Chip8Builder {
        Chip8Builder {
            rom: None,
            font: None,
            rng_seed: None,
            quirks: Quirks::default(),
            clock: None,
        }
    }

    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    pub fn with_font(mut self, font: Vec<u8>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn build(self) -> Result<Chip8, Chip8Error> {
        let font: [u8; 80] = match &self.font {
            Some(font) => font
                .as_slice()
                .try_into()
                .map_err(|_| Chip8Error::InvalidFont { size: font.len() })?,
            None => DEFAULT_FONT,
        };

        // Pseudo random number generator
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Box::new(MonotonicClock::new()));

        let mut chip = Chip8 {
            regs: Registers::default(),
            memory: Memory::new(font),
            display: DisplayBuffer::default(),
            state: ExecState::Normal,
            pending_key: None,
            quirks: self.quirks,
            frames: FrameClock::new(clock.now()),
            clock,
            rng,
        };

        if let Some(rom) = &self.rom {
            chip.load_rom(rom)?;
        }

        Ok(chip)
    }
}

impl Chip8 {
    /// Return to power-on state: registers, stack, timers, keys and display
    /// cleared, memory zeroed with the font reloaded, pc at 0x200.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.memory.reset();
        self.display.clear();
        self.state = ExecState::Normal;
        self.pending_key = None;
        self.frames.reset(self.clock.now());
    }

    /// Reset, then copy `rom` to 0x200
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        self.reset();
        self.memory.load(rom)?;
        debug!("Loaded {} byte ROM", rom.len());
        Ok(())
    }

    pub fn load_rom_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Chip8Error> {
        let path = path.as_ref();
        let rom = std::fs::read(path).map_err(|source| {
            self.reset();
            Chip8Error::RomRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.load_rom(&rom)
    }

    /// Run one CPU cycle.
    ///
    /// While parked on a vblank or a key, nothing is fetched; the frame
    /// deadline is still checked so timers keep running.
    pub fn step(&mut self) {
        if self.state != ExecState::Normal {
            self.tick_vblank();
            return;
        }

        let pc = self.regs.pc();
        let inst = Instruction::decode(self.memory.read_u16_be(pc));
        trace!("0x{:03x}: 0x{:04x} {}", pc, inst.word, inst);

        match self.execute(inst) {
            Flow::Next => self.regs.advance_pc(1),
            Flow::Skip => self.regs.advance_pc(2),
            Flow::Jump(addr) => self.regs.set_pc(addr),
            Flow::Stay => {}
        }

        self.tick_vblank();
    }

    /// Check the frame deadline; on a boundary decrement both timers and
    /// release a pending vblank wait. Returns true on a boundary.
    pub fn tick_vblank(&mut self) -> bool {
        if !self.frames.poll(self.clock.now()) {
            return false;
        }

        self.regs.decrement_timers();
        if self.state == ExecState::AwaitingVblank {
            self.state = ExecState::Normal;
        }
        true
    }

    /// Key down event, `code` is taken modulo 16
    pub fn press(&mut self, code: u8) {
        let key = Key::from_nibble(code);
        self.regs.set_key(key, true);

        if let ExecState::AwaitingKey { .. } = self.state {
            self.pending_key = Some(key);
        }
    }

    /// Key up event, completes a pending FX0A
    pub fn release(&mut self, code: u8) {
        let key = Key::from_nibble(code);
        self.regs.set_key(key, false);

        if let ExecState::AwaitingKey { register } = self.state {
            let key = self.pending_key.take().unwrap_or(key);
            self.regs.set_v(register, key.code());
            self.regs.advance_pc(1);
            self.state = ExecState::Normal;
        }
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    /// The display buffer if it changed since the last call
    pub fn take_frame(&mut self) -> Option<&DisplayBuffer> {
        if self.display.take_dirty() {
            Some(&self.display)
        } else {
            None
        }
    }

    pub fn v(&self, reg: u8) -> u8 {
        self.regs.v(reg)
    }

    pub fn set_v(&mut self, reg: u8, value: u8) {
        self.regs.set_v(reg, value);
    }

    pub fn index(&self) -> u16 {
        self.regs.index()
    }

    pub fn pc(&self) -> u16 {
        self.regs.pc()
    }

    pub fn sp(&self) -> u8 {
        self.regs.sp()
    }

    pub fn stack(&self) -> &[u16; STACK_SIZE] {
        self.regs.stack()
    }

    pub fn delay_timer(&self) -> u8 {
        self.regs.delay_timer()
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.regs.set_delay_timer(value);
    }

    pub fn sound_timer(&self) -> u8 {
        self.regs.sound_timer()
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.regs.set_sound_timer(value);
    }

    /// The beeper is on while the sound timer is nonzero
    pub fn sound_active(&self) -> bool {
        self.regs.sound_timer() > 0
    }

    pub fn is_pressed(&self, code: u8) -> bool {
        self.regs.is_pressed(Key::from_nibble(code))
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    /// Text dump of registers, stack and keys
    pub fn dump(&self, mode: PrintMode) -> String {
        dump_registers(&self.regs, mode)
    }

    fn execute(&mut self, inst: Instruction) -> Flow {
        let Instruction { group, nnn, nn, n, x, y, .. } = inst;

        match (group, x, y, n) {
            // 00E0: Clear screen
            (0x0, 0x0, 0xE, 0x0) => {
                self.display.clear();
                Flow::Next
            }
            // 00EE: Return from subroutine
            (0x0, 0x0, 0xE, 0xE) => match self.regs.pop() {
                // The stack holds the address of the call itself
                Some(addr) => Flow::Jump(addr.wrapping_add(2)),
                None => {
                    warn!("Stack underflow: return at 0x{:03x} with empty stack", self.regs.pc());
                    Flow::Next
                }
            },
            // 0NNN: Machine code routine, not supported
            (0x0, _, _, _) => {
                debug!("Ignoring machine code call 0x{:04x}", inst.word);
                Flow::Next
            }
            // 1NNN: Jump to memory location NNN
            (0x1, _, _, _) => Flow::Jump(nnn),
            // 2NNN: Call subroutine at memory location NNN
            (0x2, _, _, _) => {
                if let Err(StackOverflow) = self.regs.push(self.regs.pc()) {
                    error!(
                        "Stack overflow: call at 0x{:03x} overwrote the top of the stack",
                        self.regs.pc()
                    );
                }
                Flow::Jump(nnn)
            }
            // 3XNN: Skip next instruction if VX == NN
            (0x3, _, _, _) => Flow::skip_if(self.regs.v(x) == nn),
            // 4XNN: Skip next instruction if VX != NN
            (0x4, _, _, _) => Flow::skip_if(self.regs.v(x) != nn),
            // 5XY0: Skip next instruction if VX == VY
            (0x5, _, _, 0x0) => Flow::skip_if(self.regs.v(x) == self.regs.v(y)),
            // 6XNN: Set register VX to the value NN
            (0x6, _, _, _) => {
                self.regs.set_v(x, nn);
                Flow::Next
            }
            // 7XNN: Add the value NN to VX, VF untouched
            (0x7, _, _, _) => {
                self.regs.set_v(x, self.regs.v(x).wrapping_add(nn));
                Flow::Next
            }
            (0x8, _, _, _) => self.execute_alu(inst),
            // 9XY0: Skip next instruction if VX != VY
            (0x9, _, _, 0x0) => Flow::skip_if(self.regs.v(x) != self.regs.v(y)),
            // ANNN: Set index register I to the value NNN
            (0xA, _, _, _) => {
                self.regs.set_index(nnn);
                Flow::Next
            }
            // BNNN: Jump to address NNN plus V0
            (0xB, _, _, _) => Flow::Jump(nnn + self.regs.v(0) as u16),
            // CXNN: Random number AND NN into VX
            (0xC, _, _, _) => {
                let r = self.rng.next_u32() as u8;
                self.regs.set_v(x, r & nn);
                Flow::Next
            }
            // DXYN: Draw an N rows tall sprite from I at (VX, VY)
            (0xD, _, _, _) => {
                self.draw_sprite(self.regs.v(x), self.regs.v(y), n);
                if self.quirks.vblank_wait {
                    self.state = ExecState::AwaitingVblank;
                }
                Flow::Next
            }
            // EX9E: Skip next instruction if key VX is pressed
            (0xE, _, 0x9, 0xE) => {
                Flow::skip_if(self.regs.is_pressed(Key::from_nibble(self.regs.v(x))))
            }
            // EXA1: Skip next instruction if key VX is not pressed
            (0xE, _, 0xA, 0x1) => {
                Flow::skip_if(!self.regs.is_pressed(Key::from_nibble(self.regs.v(x))))
            }
            (0xF, _, _, _) => self.execute_misc(inst),
            _ => self.unknown(inst),
        }
    }

    /// Group 8: register to register arithmetic. VF is written last so the
    /// flag wins when X is F.
    fn execute_alu(&mut self, inst: Instruction) -> Flow {
        let Instruction { x, y, n, .. } = inst;
        let vx = self.regs.v(x);
        let vy = self.regs.v(y);

        match n {
            // 8XY0: Set register VX to the value of VY
            0x0 => self.regs.set_v(x, vy),
            // 8XY1, 8XY2, 8XY3: Binary OR, AND, XOR
            0x1 | 0x2 | 0x3 => {
                let res = match n {
                    0x1 => vx | vy,
                    0x2 => vx & vy,
                    _ => vx ^ vy,
                };
                self.regs.set_v(x, res);
                if self.quirks.vf_reset {
                    self.regs.set_vf(0);
                }
            }
            // 8XY4: VX += VY, VF = carry
            0x4 => {
                let (res, carry) = vx.overflowing_add(vy);
                self.regs.set_v(x, res);
                self.regs.set_vf(carry as u8);
            }
            // 8XY5: VX -= VY, VF = not borrow
            0x5 => {
                let (res, borrow) = vx.overflowing_sub(vy);
                self.regs.set_v(x, res);
                self.regs.set_vf(!borrow as u8);
            }
            // 8XY6: Shift right, VF = shifted out bit
            0x6 => {
                let src = if self.quirks.shift_copies_vy { vy } else { vx };
                self.regs.set_v(x, src >> 1);
                self.regs.set_vf(src & 0x01);
            }
            // 8XY7: VX = VY - VX, VF = not borrow
            0x7 => {
                let (res, borrow) = vy.overflowing_sub(vx);
                self.regs.set_v(x, res);
                self.regs.set_vf(!borrow as u8);
            }
            // 8XYE: Shift left, VF = shifted out bit
            0xE => {
                let src = if self.quirks.shift_copies_vy { vy } else { vx };
                self.regs.set_v(x, src << 1);
                self.regs.set_vf((src & 0x80) >> 7);
            }
            _ => return self.unknown(inst),
        }

        Flow::Next
    }

    /// Group F: timers, keypad wait, index register and memory transfers
    fn execute_misc(&mut self, inst: Instruction) -> Flow {
        let Instruction { x, nn, .. } = inst;
        let vx = self.regs.v(x);

        match nn {
            // FX07: VX = delay timer
            0x07 => self.regs.set_v(x, self.regs.delay_timer()),
            // FX0A: Wait for a key, pc moves on when the key is released
            0x0A => {
                self.state = ExecState::AwaitingKey { register: x };
                self.pending_key = None;
                return Flow::Stay;
            }
            // FX15: delay timer = VX
            0x15 => self.regs.set_delay_timer(vx),
            // FX18: sound timer = VX
            0x18 => self.regs.set_sound_timer(vx),
            // FX1E: I += VX, VF untouched
            0x1E => self.regs.set_index(self.regs.index().wrapping_add(vx as u16)),
            // FX29: I = address of the glyph for the low nibble of VX
            0x29 => self
                .regs
                .set_index(FONT_START + (vx & 0x0F) as u16 * FONT_GLYPH_SIZE),
            // FX33: BCD of VX at I, I + 1, I + 2
            0x33 => {
                let i = self.regs.index();
                self.memory.write_u8(i, vx / 100);
                self.memory.write_u8(i.wrapping_add(1), (vx / 10) % 10);
                self.memory.write_u8(i.wrapping_add(2), vx % 10);
            }
            // FX55: Store V0 to VX at I
            0x55 => {
                let i = self.regs.index();
                for reg in 0..=x {
                    self.memory.write_u8(i.wrapping_add(reg as u16), self.regs.v(reg));
                }
                self.increment_index_after_transfer(x);
            }
            // FX65: Load V0 to VX from I
            0x65 => {
                let i = self.regs.index();
                for reg in 0..=x {
                    let data = self.memory.read_u8(i.wrapping_add(reg as u16));
                    self.regs.set_v(reg, data);
                }
                self.increment_index_after_transfer(x);
            }
            _ => return self.unknown(inst),
        }

        Flow::Next
    }

    fn increment_index_after_transfer(&mut self, x: u8) {
        if self.quirks.load_store_increments_i {
            self.regs
                .set_index(self.regs.index().wrapping_add(x as u16 + 1));
        }
    }

    /// XOR an 8 pixel wide, `rows` tall sprite from I onto the display.
    /// VF ends up 1 if any set cell was erased.
    fn draw_sprite(&mut self, vx: u8, vy: u8, rows: u8) {
        // Origin where we start to draw
        let ox = vx as usize % SCREEN_WIDTH;
        let oy = vy as usize % SCREEN_HEIGHT;

        // Reset collision flag
        self.regs.set_vf(0);
        let mut collision = false;

        for row in 0..rows as usize {
            let mut y = oy + row;
            if y >= SCREEN_HEIGHT {
                if self.quirks.clip_sprites {
                    break;
                }
                y %= SCREEN_HEIGHT;
            }

            // Read row(8-bit) of sprite data from memory
            let data = self
                .memory
                .read_u8(self.regs.index().wrapping_add(row as u16));

            for column in 0..8 {
                if data & (0x80 >> column) == 0 {
                    continue;
                }

                let mut x = ox + column;
                if x >= SCREEN_WIDTH {
                    if self.quirks.clip_sprites {
                        break;
                    }
                    x %= SCREEN_WIDTH;
                }

                collision |= self.display.flip(x, y);
            }
        }

        self.regs.set_vf(collision as u8);
    }

    fn unknown(&mut self, inst: Instruction) -> Flow {
        warn!(
            "Unknown opcode 0x{:04x} at 0x{:03x}, ignored",
            inst.word,
            self.regs.pc()
        );
        Flow::Next
    }
}

use crate::{error::Chip8Error, memory::{ADDRESS_MASK, PROGRAM_START}};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_SIZE: usize = 16;
pub const KEY_COUNT: usize = 16;

/// Flag register VF
pub const VF: u8 = 0xF;

/// A hexadecimal keypad code, 0x0 to 0xF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(u8);

impl Key {
    /// Take the low nibble of `code`; any byte names some key
    pub const fn from_nibble(code: u8) -> Key {
        Key(code & 0x0F)
    }

    pub const fn code(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Key {
    type Error = Chip8Error;

    fn try_from(code: u8) -> Result<Key, Chip8Error> {
        if code as usize >= KEY_COUNT {
            return Err(Chip8Error::InvalidKey(code));
        }
        Ok(Key(code))
    }
}

/// Outcome of pushing onto a full call stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackOverflow;

/// Register file and control state of the CPU
#[derive(Debug, Clone)]
pub struct Registers {
    /// General purpose registers
    v: [u8; REGISTER_COUNT],
    /// Index register, 12 bits wide
    index: u16,
    /// Program counter
    pc: u16,
    /// Call stack
    stack: [u16; STACK_SIZE],
    /// Stack pointer, next free slot
    sp: u8,
    /// Delay Timer
    delay_timer: u8,
    /// Sound Timer
    sound_timer: u8,
    /// Keypad state
    keys: [bool; KEY_COUNT],
}

impl Default for Registers {
    fn default() -> Registers {
        Registers {
            v: [0u8; REGISTER_COUNT],
            index: 0,
            pc: PROGRAM_START,
            stack: [0u16; STACK_SIZE],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; KEY_COUNT],
        }
    }
}

impl Registers {
    /// Value of general purpose register V`reg`, `reg` is taken modulo 16
    pub fn v(&self, reg: u8) -> u8 {
        self.v[(reg & 0xF) as usize]
    }

    pub fn set_v(&mut self, reg: u8, value: u8) {
        self.v[(reg & 0xF) as usize] = value;
    }

    pub fn set_vf(&mut self, value: u8) {
        self.v[VF as usize] = value;
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    /// Load I, dropping the high nibble
    pub fn set_index(&mut self, value: u16) {
        self.index = value & ADDRESS_MASK;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Move the program counter forward by `words` instructions
    pub fn advance_pc(&mut self, words: u16) {
        self.pc = self.pc.wrapping_add(2 * words);
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn stack(&self) -> &[u16; STACK_SIZE] {
        &self.stack
    }

    /// Push a return address.
    ///
    /// When the stack is full the address replaces the top slot, the
    /// pointer stays at its limit and `StackOverflow` is reported.
    pub fn push(&mut self, addr: u16) -> Result<(), StackOverflow> {
        if self.sp as usize >= STACK_SIZE {
            self.stack[STACK_SIZE - 1] = addr;
            return Err(StackOverflow);
        }
        self.stack[self.sp as usize] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pop the last pushed address, `None` if the stack is empty
    pub fn pop(&mut self) -> Option<u16> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        Some(self.stack[self.sp as usize])
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    /// One frame worth of countdown, both timers stop at zero
    pub fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys[key.code() as usize]
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        self.keys[key.code() as usize] = pressed;
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let regs = Registers::default();

        assert_eq!(regs.pc(), 0x200);
        assert_eq!(regs.sp(), 0);
        assert_eq!(regs.index(), 0);
        assert!(regs.keys().iter().all(|k| !k));
    }

    #[test]
    fn test_index_masked() {
        let mut regs = Registers::default();

        regs.set_index(0xFABC);

        assert_eq!(regs.index(), 0x0ABC);
    }

    #[test]
    fn test_push_pop_order() {
        let mut regs = Registers::default();

        regs.push(0x200).unwrap();
        regs.push(0x300).unwrap();

        assert_eq!(regs.sp(), 2);
        assert_eq!(regs.pop(), Some(0x300));
        assert_eq!(regs.pop(), Some(0x200));
        assert_eq!(regs.pop(), None);
        assert_eq!(regs.sp(), 0);
    }

    #[test]
    fn test_push_overflow_overwrites_top() {
        let mut regs = Registers::default();
        for i in 0..STACK_SIZE as u16 {
            regs.push(0x200 + i * 2).unwrap();
        }

        let res = regs.push(0xABC);

        assert_eq!(res, Err(StackOverflow));
        assert_eq!(regs.sp() as usize, STACK_SIZE);
        assert_eq!(regs.stack()[STACK_SIZE - 1], 0xABC);
        assert_eq!(regs.stack()[STACK_SIZE - 2], 0x200 + 14 * 2);
    }

    #[test]
    fn test_timers_saturate() {
        let mut regs = Registers::default();
        regs.set_delay_timer(1);

        regs.decrement_timers();
        regs.decrement_timers();

        assert_eq!(regs.delay_timer(), 0);
        assert_eq!(regs.sound_timer(), 0);
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::try_from(0xF).unwrap().code(), 0xF);
        assert!(matches!(Key::try_from(0x10), Err(Chip8Error::InvalidKey(0x10))));
        assert_eq!(Key::from_nibble(0x3A).code(), 0xA);
    }
}

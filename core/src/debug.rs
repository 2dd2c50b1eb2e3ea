use std::fmt;

use crate::registers::{Registers, KEY_COUNT, REGISTER_COUNT, STACK_SIZE};

/// Number base for the register dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    Dec,
    #[default]
    Hex,
    Bin,
}

impl PrintMode {
    fn byte(self, value: u8) -> String {
        match self {
            PrintMode::Dec => format!("{:03}", value),
            PrintMode::Hex => format!("{:02X}", value),
            PrintMode::Bin => format!("{:08b}", value),
        }
    }

    fn word(self, value: u16) -> String {
        match self {
            PrintMode::Dec => format!("{:05}", value),
            PrintMode::Hex => format!("{:04X}", value),
            PrintMode::Bin => format!("{:016b}", value),
        }
    }
}

/// Registers in two columns, then I, PC, timers and SP, then the stack and
/// the keypad in four columns.
pub struct RegisterDump<'a> {
    regs: &'a Registers,
    mode: PrintMode,
}

impl<'a> RegisterDump<'a> {
    pub fn new(regs: &'a Registers, mode: PrintMode) -> RegisterDump<'a> {
        RegisterDump { regs, mode }
    }
}

impl fmt::Display for RegisterDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let RegisterDump { regs, mode } = *self;

        let half = REGISTER_COUNT / 2;
        for i in 0..half as u8 {
            let j = i + half as u8;
            writeln!(
                f,
                "V{:X}: {}     V{:X}: {}",
                i,
                mode.byte(regs.v(i)),
                j,
                mode.byte(regs.v(j))
            )?;
        }
        writeln!(f)?;

        writeln!(f, "I: {}   PC: {}", mode.word(regs.index()), mode.word(regs.pc()))?;
        writeln!(
            f,
            "Delay Timer: {}   Sound Timer: {}",
            mode.byte(regs.delay_timer()),
            mode.byte(regs.sound_timer())
        )?;
        writeln!(f, "SP: {}", mode.word(regs.sp() as u16))?;
        writeln!(f)?;

        let quarter = STACK_SIZE / 4;
        for i in 0..quarter {
            for c in 0..4 {
                let slot = i + c * quarter;
                if c > 0 {
                    write!(f, "    ")?;
                }
                write!(f, "S{:X}: {}", slot, mode.word(regs.stack()[slot]))?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        let quarter = KEY_COUNT / 4;
        for i in 0..quarter {
            for c in 0..4 {
                let key = i + c * quarter;
                if c > 0 {
                    write!(f, "    ")?;
                }
                write!(f, "Key{:X}: {}", key, regs.keys()[key] as u8)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

pub fn dump_registers(regs: &Registers, mode: PrintMode) -> String {
    RegisterDump::new(regs, mode).to_string()
}

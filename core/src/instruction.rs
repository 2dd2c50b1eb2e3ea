use std::fmt;

/// Operand fields of one fetched instruction word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Raw 16-bit word
    pub word: u16,
    /// Opcode group, top nibble
    pub group: u8,
    /// 12-bit address
    pub nnn: u16,
    /// 8-bit immediate
    pub nn: u8,
    /// 4-bit count
    pub n: u8,
    /// First register index
    pub x: u8,
    /// Second register index
    pub y: u8,
}

impl Instruction {
    pub const fn decode(word: u16) -> Instruction {
        Instruction {
            word,
            group: (word >> 12) as u8,
            nnn: word & 0x0FFF,
            nn: (word & 0x00FF) as u8,
            n: (word & 0x000F) as u8,
            x: ((word & 0x0F00) >> 8) as u8,
            y: ((word & 0x00F0) >> 4) as u8,
        }
    }
}

/// Assembly-like rendering used for trace output
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Instruction { word, group, nnn, nn, n, x, y } = *self;
        match (group, x, y, n) {
            (0x0, 0x0, 0xE, 0x0) => write!(f, "CLEAR"),
            (0x0, 0x0, 0xE, 0xE) => write!(f, "RET"),
            (0x0, _, _, _) => write!(f, "SYS 0x{:03x}", nnn),
            (0x1, _, _, _) => write!(f, "JMP 0x{:03x}", nnn),
            (0x2, _, _, _) => write!(f, "CALL 0x{:03x}", nnn),
            (0x3, _, _, _) => write!(f, "SKIP V{:x}==0x{:02x}", x, nn),
            (0x4, _, _, _) => write!(f, "SKIP V{:x}!=0x{:02x}", x, nn),
            (0x5, _, _, 0x0) => write!(f, "SKIP V{:x}==V{:x}", x, y),
            (0x6, _, _, _) => write!(f, "SET V{:x} 0x{:02x}", x, nn),
            (0x7, _, _, _) => write!(f, "ADD V{:x} 0x{:02x}", x, nn),
            (0x8, _, _, 0x0) => write!(f, "SET V{:x} V{:x}", x, y),
            (0x8, _, _, 0x1) => write!(f, "OR V{:x} V{:x}", x, y),
            (0x8, _, _, 0x2) => write!(f, "AND V{:x} V{:x}", x, y),
            (0x8, _, _, 0x3) => write!(f, "XOR V{:x} V{:x}", x, y),
            (0x8, _, _, 0x4) => write!(f, "ADD V{:x} V{:x}", x, y),
            (0x8, _, _, 0x5) => write!(f, "SUB V{:x} V{:x}", x, y),
            (0x8, _, _, 0x6) => write!(f, "SHR V{:x} V{:x}", x, y),
            (0x8, _, _, 0x7) => write!(f, "SUBN V{:x} V{:x}", x, y),
            (0x8, _, _, 0xE) => write!(f, "SHL V{:x} V{:x}", x, y),
            (0x9, _, _, 0x0) => write!(f, "SKIP V{:x}!=V{:x}", x, y),
            (0xA, _, _, _) => write!(f, "SET I 0x{:03x}", nnn),
            (0xB, _, _, _) => write!(f, "JMP 0x{:03x} V0", nnn),
            (0xC, _, _, _) => write!(f, "RNG V{:x} 0x{:02x}", x, nn),
            (0xD, _, _, _) => write!(f, "DRAW V{:x} V{:x} {:x}", x, y, n),
            (0xE, _, 0x9, 0xE) => write!(f, "SKIP KEY V{:x}", x),
            (0xE, _, 0xA, 0x1) => write!(f, "SKIP NKEY V{:x}", x),
            (0xF, _, 0x0, 0x7) => write!(f, "GET V{:x} DT", x),
            (0xF, _, 0x0, 0xA) => write!(f, "WAIT KEY V{:x}", x),
            (0xF, _, 0x1, 0x5) => write!(f, "SET DT V{:x}", x),
            (0xF, _, 0x1, 0x8) => write!(f, "SET ST V{:x}", x),
            (0xF, _, 0x1, 0xE) => write!(f, "ADD I V{:x}", x),
            (0xF, _, 0x2, 0x9) => write!(f, "FONT V{:x}", x),
            (0xF, _, 0x3, 0x3) => write!(f, "BCD V{:x}", x),
            (0xF, _, 0x5, 0x5) => write!(f, "STORE V{:x}", x),
            (0xF, _, 0x6, 0x5) => write!(f, "LOAD V{:x}", x),
            _ => write!(f, "DATA 0x{:04x}", word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fields() {
        let inst = Instruction::decode(0xD12A);

        assert_eq!(inst.group, 0xD);
        assert_eq!(inst.nnn, 0x12A);
        assert_eq!(inst.nn, 0x2A);
        assert_eq!(inst.n, 0xA);
        assert_eq!(inst.x, 0x1);
        assert_eq!(inst.y, 0x2);
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::decode(0x00E0).to_string(), "CLEAR");
        assert_eq!(Instruction::decode(0x2ABA).to_string(), "CALL 0xaba");
        assert_eq!(Instruction::decode(0x8AB6).to_string(), "SHR Va Vb");
        assert_eq!(Instruction::decode(0xF30A).to_string(), "WAIT KEY V3");
        assert_eq!(Instruction::decode(0x5121).to_string(), "DATA 0x5121");
        assert_eq!(Instruction::decode(0xFFFF).to_string(), "DATA 0xffff");
    }
}

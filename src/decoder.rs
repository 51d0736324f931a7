use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation tag; discriminants are the 6-bit opcodes of the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Op {
    Mov = 0x01,
    Add = 0x02,
    Sub = 0x03,
    Mul = 0x04,
    Cmp = 0x05,
    Push = 0x06,
    Pop = 0x07,
    Jmp = 0x08,
    Be = 0x09,
    Bne = 0x0A,
    Print = 0x0B,
}

impl Op {
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Some(match opcode {
            0x01 => Op::Mov,
            0x02 => Op::Add,
            0x03 => Op::Sub,
            0x04 => Op::Mul,
            0x05 => Op::Cmp,
            0x06 => Op::Push,
            0x07 => Op::Pop,
            0x08 => Op::Jmp,
            0x09 => Op::Be,
            0x0A => Op::Bne,
            0x0B => Op::Print,
            _ => return None,
        })
    }

    pub fn opcode(self) -> u8 {
        self as u8
    }
}

/// Operand addressing mode ("flag" field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mode {
    /// `src` and `dest` both name registers.
    RegReg = 0b00,
    /// `src` is an immediate, `dest` names a register.
    RegVal = 0b01,
    /// Single register operand carried in `dest`.
    RegOnly = 0b10,
    /// Single immediate operand carried in `dest`.
    ValOnly = 0b11,
}

impl Mode {
    /// Total over the two low bits; higher bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Mode::RegReg,
            0b01 => Mode::RegVal,
            0b10 => Mode::RegOnly,
            _ => Mode::ValOnly,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::RegReg => "REG_REG",
            Mode::RegVal => "REG_VAL",
            Mode::RegOnly => "REG_ONLY",
            Mode::ValOnly => "VAL_ONLY",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04b})", self.name(), self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub mode: Mode,
    pub src: u8,  // operand A
    pub dest: u8, // operand B
}

pub trait Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded>;
}

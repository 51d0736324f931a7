use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::decoder::{Mode, Op};

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSet: u8 {
const REG_REG = 1 << 0;
const REG_VAL = 1 << 1;
const REG_ONLY = 1 << 2;
const VAL_ONLY = 1 << 3;
const TWO_OPERAND = Self::REG_REG.bits() | Self::REG_VAL.bits();
const ONE_OPERAND = Self::REG_ONLY.bits() | Self::VAL_ONLY.bits();
}
}

impl From<Mode> for ModeSet {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::RegReg => ModeSet::REG_REG,
            Mode::RegVal => ModeSet::REG_VAL,
            Mode::RegOnly => ModeSet::REG_ONLY,
            Mode::ValOnly => ModeSet::VAL_ONLY,
        }
    }
}

impl ModeSet {
    pub fn allows(self, mode: Mode) -> bool {
        self.contains(ModeSet::from(mode))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub modes: ModeSet,
}

/// Ordered by opcode, starting at 0x01.
pub const TABLE: &[InstrDesc] = &[
    InstrDesc {
        op: Op::Mov,
        mnemonic: "mov",
        modes: ModeSet::TWO_OPERAND,
    },
    InstrDesc {
        op: Op::Add,
        mnemonic: "add",
        modes: ModeSet::TWO_OPERAND,
    },
    InstrDesc {
        op: Op::Sub,
        mnemonic: "sub",
        modes: ModeSet::TWO_OPERAND,
    },
    InstrDesc {
        op: Op::Mul,
        mnemonic: "mul",
        modes: ModeSet::TWO_OPERAND,
    },
    InstrDesc {
        op: Op::Cmp,
        mnemonic: "cmp",
        modes: ModeSet::TWO_OPERAND,
    },
    InstrDesc {
        op: Op::Push,
        mnemonic: "push",
        modes: ModeSet::ONE_OPERAND,
    },
    InstrDesc {
        op: Op::Pop,
        mnemonic: "pop",
        modes: ModeSet::REG_ONLY,
    },
    InstrDesc {
        op: Op::Jmp,
        mnemonic: "jmp",
        modes: ModeSet::ONE_OPERAND,
    },
    InstrDesc {
        op: Op::Be,
        mnemonic: "be",
        modes: ModeSet::ONE_OPERAND,
    },
    InstrDesc {
        op: Op::Bne,
        mnemonic: "bne",
        modes: ModeSet::ONE_OPERAND,
    },
    InstrDesc {
        op: Op::Print,
        mnemonic: "print",
        modes: ModeSet::ONE_OPERAND,
    },
];

pub fn desc(op: Op) -> &'static InstrDesc {
    &TABLE[op.opcode() as usize - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_opcode() {
        for (i, d) in TABLE.iter().enumerate() {
            assert_eq!(d.op.opcode() as usize, i + 1, "{}", d.mnemonic);
            assert_eq!(desc(d.op).mnemonic, d.mnemonic);
        }
        assert_eq!(TABLE.len(), 11);
    }

    #[test]
    fn pop_only_takes_a_register() {
        let pop = desc(Op::Pop).modes;
        assert!(pop.allows(Mode::RegOnly));
        assert!(!pop.allows(Mode::ValOnly));
        assert!(!pop.allows(Mode::RegReg));
        assert!(!pop.allows(Mode::RegVal));
    }

    #[test]
    fn two_and_one_operand_sets_are_disjoint() {
        assert!(ModeSet::TWO_OPERAND.intersection(ModeSet::ONE_OPERAND).is_empty());
        assert!(desc(Op::Mul).modes.allows(Mode::RegVal));
        assert!(!desc(Op::Mul).modes.allows(Mode::ValOnly));
        assert!(desc(Op::Print).modes.allows(Mode::ValOnly));
        assert!(!desc(Op::Print).modes.allows(Mode::RegReg));
    }
}

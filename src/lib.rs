pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod registers;

pub mod isa {
    pub mod v1; // 6-bit opcode / 2-bit mode / src / dest words
}

pub use cpu::{Halt, Machine, MachineConfig, Step, Trap};
pub use memory::{CodeImage, LoadError, Stack};
pub use registers::{Reg, RegisterFile};

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::decoder::{Decoder, Mode};
use crate::disasm::fmt_decoded;
use crate::exec::Executor;
use crate::instructions;
use crate::isa::v1::opcode_field;
use crate::memory::{CodeImage, Stack};
use crate::registers::{Reg, RegisterFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Stop `run` after this many executed instructions.
    pub max_steps: Option<u64>,
    /// Unknown register ids in operands trap instead of reading 0 / dropping writes.
    pub strict_registers: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            strict_registers: true,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Unknown opcode {opcode:#04x} at PC={pc}")]
    UnknownOpcode { pc: u8, opcode: u8 },
    #[error("Operand type error at PC={pc}: {op} does not accept mode {mode}")]
    IllegalMode { pc: u8, op: &'static str, mode: Mode },
    #[error("Invalid register id {id:#04x} at PC={pc}")]
    InvalidRegister { pc: u8, id: u8 },
    #[error("Output error at PC={pc}")]
    Output {
        pc: u8,
        #[source]
        source: std::io::Error,
    },
}

impl Trap {
    /// Unknown opcodes end the run gracefully; everything else aborts it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Trap::UnknownOpcode { .. })
    }

    pub fn pc(&self) -> u8 {
        match *self {
            Trap::UnknownOpcode { pc, .. }
            | Trap::IllegalMode { pc, .. }
            | Trap::InvalidRegister { pc, .. }
            | Trap::Output { pc, .. } => pc,
        }
    }
}

/// Outcome of a single fetch/execute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed,
    EndOfCode,
}

/// Why `run` stopped without a fatal trap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    EndOfCode,
    UnknownOpcode { pc: u8, opcode: u8 },
    StepLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub registers: &'a RegisterFile,
    pub stack: &'a [u8],
    pub steps: u64,
}

#[derive(Debug, Clone)]
pub struct Machine {
    pub regs: RegisterFile,
    pub stack: Stack,
    pub code: CodeImage,
    pub cfg: MachineConfig,
    pub steps: u64,
}

impl Machine {
    pub fn new(code: CodeImage, cfg: MachineConfig) -> Self {
        Self {
            regs: RegisterFile::new(),
            stack: Stack::new(),
            code,
            cfg,
            steps: 0,
        }
    }

    /// Zero registers and stack; the code image is kept.
    pub fn reset(&mut self) {
        self.regs = RegisterFile::new();
        self.stack = Stack::new();
        self.steps = 0;
    }

    pub fn step<D: Decoder, X: Executor, W: Write>(
        &mut self,
        dec: &D,
        exec: &X,
        out: &mut W,
    ) -> Result<Step, Trap> {
        let pc = self.regs.pc();
        let Some(raw32) = self.code.fetch(pc as usize) else {
            return Ok(Step::EndOfCode);
        };
        let d = dec.decode(raw32).ok_or(Trap::UnknownOpcode {
            pc,
            opcode: opcode_field(raw32),
        })?;
        // Nothing may change before the mode is known to be legal.
        let desc = instructions::desc(d.op);
        if !desc.modes.allows(d.mode) {
            return Err(Trap::IllegalMode {
                pc,
                op: desc.mnemonic,
                mode: d.mode,
            });
        }
        trace!(pc, raw = raw32, insn = %fmt_decoded(&d), "exec");

        exec.exec(self, d, out)?;
        self.steps += 1;
        if self.regs.pc() == pc {
            self.regs.set_pc(pc.wrapping_add(1));
        }
        Ok(Step::Executed)
    }

    /// Step until the code runs out, an unknown opcode is fetched, the step
    /// budget is spent, or a fatal trap is raised.
    pub fn run<D: Decoder, X: Executor, W: Write>(
        &mut self,
        dec: &D,
        exec: &X,
        out: &mut W,
    ) -> Result<Halt, Trap> {
        loop {
            if let Some(limit) = self.cfg.max_steps {
                if self.steps >= limit {
                    warn!(limit, pc = self.regs.pc(), "step budget exhausted");
                    return Ok(Halt::StepLimit);
                }
            }
            match self.step(dec, exec, out) {
                Ok(Step::Executed) => {}
                Ok(Step::EndOfCode) => {
                    debug!(steps = self.steps, pc = self.regs.pc(), "end of code");
                    return Ok(Halt::EndOfCode);
                }
                Err(trap) if trap.is_fatal() => return Err(trap),
                Err(trap) => {
                    let (pc, opcode) = match trap {
                        Trap::UnknownOpcode { pc, opcode } => (pc, opcode),
                        _ => (trap.pc(), 0),
                    };
                    debug!(steps = self.steps, pc, opcode, "unknown opcode");
                    return Ok(Halt::UnknownOpcode { pc, opcode });
                }
            }
        }
    }

    pub fn push(&mut self, val: u8) {
        let sp = self.regs.sp();
        self.stack.write(sp, val);
        self.regs.set_sp(sp.wrapping_add(1));
    }

    pub fn pop(&mut self) -> u8 {
        let sp = self.regs.sp().wrapping_sub(1);
        self.regs.set_sp(sp);
        self.stack.read(sp)
    }

    /// Register named by an operand byte. `Ok(None)` only in lenient mode.
    pub fn operand_reg(&self, pc: u8, id: u8) -> Result<Option<Reg>, Trap> {
        match Reg::from_id(id) {
            Some(r) => Ok(Some(r)),
            None if self.cfg.strict_registers => Err(Trap::InvalidRegister { pc, id }),
            None => Ok(None),
        }
    }

    pub fn load(&self, r: Option<Reg>) -> u8 {
        r.map_or(0, |r| self.regs.get(r))
    }

    pub fn store(&mut self, r: Option<Reg>, val: u8) {
        if let Some(r) = r {
            self.regs.set(r, val);
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            registers: &self.regs,
            stack: &self.stack.as_slice()[..self.regs.sp() as usize],
            steps: self.steps,
        }
    }
}

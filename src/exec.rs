use std::io::Write;

use crate::cpu::{Machine, Trap};
use crate::decoder::{Decoded, Mode, Op};
use crate::registers::Reg;

pub trait Executor {
    fn exec<W: Write>(&self, m: &mut Machine, d: Decoded, out: &mut W) -> Result<(), Trap>;
}

/// Status bits produced by the arithmetic helpers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub zf: bool,
    pub cf: bool,
    pub of: bool,
}

pub fn add8(a: u8, b: u8) -> (u8, Flags) {
    let wide = a as u16 + b as u16;
    let res = wide as u8;
    let (sa, sb, sr) = (a as i8, b as i8, res as i8);
    let of = (sa > 0 && sb > 0 && sr < 0) || (sa < 0 && sb < 0 && sr > 0);
    (
        res,
        Flags {
            zf: res == 0,
            cf: wide > 0xFF,
            of,
        },
    )
}

pub fn sub8(a: u8, b: u8) -> (u8, Flags) {
    let res = (a as u16).wrapping_sub(b as u16) as u8;
    let (sa, sb, sr) = (a as i8, b as i8, res as i8);
    let of = (sa > 0 && sb < 0 && sr < 0) || (sa < 0 && sb > 0 && sr > 0);
    (
        res,
        Flags {
            zf: res == 0,
            cf: a < b,
            of,
        },
    )
}

pub fn mul8(a: u8, b: u8) -> u8 {
    (a as u16 * b as u16) as u8
}

/// Signed compare: CF means "greater", OF means "less".
pub fn cmp8(a: u8, b: u8) -> Flags {
    let diff = a as i8 as i16 - b as i8 as i16;
    Flags {
        zf: diff == 0,
        cf: diff >= 1,
        of: diff <= -1,
    }
}

fn set_flags(m: &mut Machine, f: Flags) {
    m.regs.set_flag(Reg::Zf, f.zf);
    m.regs.set_flag(Reg::Cf, f.cf);
    m.regs.set_flag(Reg::Of, f.of);
}

/// Value of the source operand (two-operand modes) or the single operand.
fn resolve(m: &Machine, pc: u8, d: &Decoded) -> Result<u8, Trap> {
    Ok(match d.mode {
        Mode::RegReg => m.load(m.operand_reg(pc, d.src)?),
        Mode::RegVal => d.src,
        Mode::RegOnly => m.load(m.operand_reg(pc, d.dest)?),
        Mode::ValOnly => d.dest,
    })
}

pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec<W: Write>(&self, m: &mut Machine, d: Decoded, out: &mut W) -> Result<(), Trap> {
        let pc = m.regs.pc();
        match d.op {
            Op::Mov => {
                let dst = m.operand_reg(pc, d.dest)?;
                let val = resolve(m, pc, &d)?;
                m.store(dst, val);
            }
            Op::Add => {
                let dst = m.operand_reg(pc, d.dest)?;
                let b = resolve(m, pc, &d)?;
                let (res, flags) = add8(m.load(dst), b);
                m.store(dst, res);
                set_flags(m, flags);
            }
            Op::Sub => {
                let dst = m.operand_reg(pc, d.dest)?;
                let b = resolve(m, pc, &d)?;
                let (res, flags) = sub8(m.load(dst), b);
                m.store(dst, res);
                set_flags(m, flags);
            }
            Op::Mul => {
                let dst = m.operand_reg(pc, d.dest)?;
                let b = resolve(m, pc, &d)?;
                let res = mul8(m.load(dst), b);
                m.store(dst, res);
            }
            Op::Cmp => {
                let dst = m.operand_reg(pc, d.dest)?;
                let b = resolve(m, pc, &d)?;
                let flags = cmp8(m.load(dst), b);
                set_flags(m, flags);
            }
            Op::Push => {
                let val = resolve(m, pc, &d)?;
                m.push(val);
            }
            Op::Pop => {
                // Validate the target before SP moves.
                let dst = m.operand_reg(pc, d.dest)?;
                let val = m.pop();
                m.store(dst, val);
            }
            Op::Jmp => {
                let target = resolve(m, pc, &d)?;
                m.regs.set_pc(target);
            }
            Op::Be => {
                let target = resolve(m, pc, &d)?;
                if m.regs.get(Reg::Zf) == 1 {
                    m.regs.set_pc(target);
                }
            }
            Op::Bne => {
                let target = resolve(m, pc, &d)?;
                if m.regs.get(Reg::Zf) != 1 {
                    m.regs.set_pc(target);
                }
            }
            Op::Print => {
                let val = resolve(m, pc, &d)?;
                writeln!(out, "{val}").map_err(|source| Trap::Output { pc, source })?;
            }
        }
        Ok(())
    }
}

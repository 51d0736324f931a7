use bytevm::exec::IntExecutor;
use bytevm::isa::v1::V1Decoder;
use bytevm::{CodeImage, Machine, MachineConfig, Reg};
use pretty_assertions::assert_eq;

const MOV: u8 = 0x01;
const ADD: u8 = 0x02;
const SUB: u8 = 0x03;
const MUL: u8 = 0x04;
const CMP: u8 = 0x05;

const REG_REG: u8 = 0b00;
const REG_VAL: u8 = 0b01;

const R0: u8 = 0x01;
const R1: u8 = 0x02;
const ZF: u8 = 0x07;

fn enc(op: u8, mode: u8, src: u8, dest: u8) -> [u8; 4] {
    [(op << 2) | mode, 0, src, dest]
}

fn run(words: &[[u8; 4]]) -> Machine {
    let code = CodeImage::from_bytes(words.concat()).unwrap();
    let mut m = Machine::new(code, MachineConfig::default());
    let mut out = Vec::new();
    m.run(&V1Decoder::new(), &IntExecutor, &mut out).unwrap();
    m
}

fn flags(m: &Machine) -> (u8, u8, u8) {
    (m.regs.get(Reg::Zf), m.regs.get(Reg::Cf), m.regs.get(Reg::Of))
}

#[test]
fn add_sets_carry_and_zero_on_wrap() {
    let m = run(&[enc(MOV, REG_VAL, 0xFF, R0), enc(ADD, REG_VAL, 1, R0)]);
    assert_eq!(m.regs.get(Reg::R0), 0);
    assert_eq!(flags(&m), (1, 1, 0));
}

#[test]
fn add_register_source_sets_signed_overflow() {
    // 100 + 100 = 200 (-56 signed)
    let m = run(&[
        enc(MOV, REG_VAL, 100, R0),
        enc(MOV, REG_VAL, 100, R1),
        enc(ADD, REG_REG, R1, R0),
    ]);
    assert_eq!(m.regs.get(Reg::R0), 200);
    assert_eq!(m.regs.get(Reg::R1), 100);
    assert_eq!(flags(&m), (0, 0, 1));
}

#[test]
fn sub_borrows_below_zero() {
    let m = run(&[enc(MOV, REG_VAL, 3, R0), enc(SUB, REG_VAL, 5, R0)]);
    assert_eq!(m.regs.get(Reg::R0), 254);
    assert_eq!(flags(&m), (0, 1, 0));
}

#[test]
fn sub_to_zero_sets_only_zf() {
    let m = run(&[
        enc(MOV, REG_VAL, 0x42, R0),
        enc(MOV, REG_VAL, 0x42, R1),
        enc(SUB, REG_REG, R1, R0),
    ]);
    assert_eq!(m.regs.get(Reg::R0), 0);
    assert_eq!(flags(&m), (1, 0, 0));
}

#[test]
fn mul_truncates_and_leaves_flags_alone() {
    let m = run(&[
        enc(MOV, REG_VAL, 0xFF, R0),
        enc(ADD, REG_VAL, 1, R0), // ZF=1 CF=1
        enc(MOV, REG_VAL, 20, R0),
        enc(MUL, REG_VAL, 13, R0),
    ]);
    assert_eq!(m.regs.get(Reg::R0), (20u16 * 13 % 256) as u8);
    assert_eq!(flags(&m), (1, 1, 0));
}

#[test]
fn cmp_min_against_max_reports_less() {
    // dest = -128, src = 127: diff = -255
    let m = run(&[enc(MOV, REG_VAL, 0x80, R0), enc(CMP, REG_VAL, 0x7F, R0)]);
    assert_eq!(flags(&m), (0, 0, 1));
    assert_eq!(m.regs.get(Reg::R0), 0x80);
}

#[test]
fn cmp_greater_and_equal() {
    let m = run(&[
        enc(MOV, REG_VAL, 5, R0),
        enc(MOV, REG_VAL, 0xFB, R1), // -5
        enc(CMP, REG_REG, R1, R0),
    ]);
    assert_eq!(flags(&m), (0, 1, 0));

    let m = run(&[enc(MOV, REG_VAL, 9, R0), enc(CMP, REG_VAL, 9, R0)]);
    assert_eq!(flags(&m), (1, 0, 0));
}

#[test]
fn flag_registers_hold_one_only_when_one_is_written() {
    let m = run(&[enc(MOV, REG_VAL, 1, ZF)]);
    assert_eq!(m.regs.get(Reg::Zf), 1);
    let m = run(&[enc(MOV, REG_VAL, 3, ZF)]);
    assert_eq!(m.regs.get(Reg::Zf), 0);
    let m = run(&[enc(MOV, REG_VAL, 2, ZF)]);
    assert_eq!(m.regs.get(Reg::Zf), 0);
}

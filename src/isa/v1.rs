use crate::decoder::{Decoded, Decoder, Mode, Op};

/// Decoder for the 32-bit word layout
///
/// ```text
///  31      26 25 24 23      16 15       8 7        0
/// +----------+-----+----------+----------+----------+
/// |  opcode  | mode| reserved |   src    |   dest   |
/// +----------+-----+----------+----------+----------+
/// ```
///
/// Words are assembled big-endian from four consecutive code bytes, so
/// `src` is the third byte of an instruction and `dest` the last one.
pub struct V1Decoder;

impl V1Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for V1Decoder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn opcode_field(raw32: u32) -> u8 {
    ((raw32 >> 26) & 0x3F) as u8
}

pub fn mode_field(raw32: u32) -> u8 {
    ((raw32 >> 24) & 0x03) as u8
}

pub fn src_field(raw32: u32) -> u8 {
    ((raw32 >> 8) & 0xFF) as u8
}

pub fn dest_field(raw32: u32) -> u8 {
    (raw32 & 0xFF) as u8
}

impl Decoder for V1Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded> {
        let op = Op::from_opcode(opcode_field(raw32))?;
        Some(Decoded {
            op,
            mode: Mode::from_bits(mode_field(raw32)),
            src: src_field(raw32),
            dest: dest_field(raw32),
        })
    }
}

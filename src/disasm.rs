use crate::decoder::{Decoded, Mode};
use crate::instructions::desc;
use crate::registers::Reg;

/// Render in `op dest, src` order; immediates carry a `#` prefix.
pub fn fmt_decoded(d: &Decoded) -> String {
    let info = desc(d.op);
    let mn = info.mnemonic;
    let text = match d.mode {
        Mode::RegReg => format!("{mn} {}, {}", reg(d.dest), reg(d.src)),
        Mode::RegVal => format!("{mn} {}, #{}", reg(d.dest), d.src),
        Mode::RegOnly => format!("{mn} {}", reg(d.dest)),
        Mode::ValOnly => format!("{mn} #{}", d.dest),
    };
    if info.modes.allows(d.mode) {
        text
    } else {
        format!("{text} ; ?mode {}", d.mode.name())
    }
}

fn reg(id: u8) -> String {
    match Reg::from_id(id) {
        Some(r) => r.name().to_string(),
        None => format!("?r{id:#04x}"),
    }
}

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;

use bytevm::decoder::{Decoded, Decoder, Mode, Op};
use bytevm::disasm::fmt_decoded;
use bytevm::instructions::desc;
use bytevm::isa::v1::V1Decoder;
use bytevm::{CodeImage, Reg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
    #[serde(rename = "ft")]
    Fallthrough,
    #[serde(rename = "br")]
    Branch,
    #[serde(rename = "cbr")]
    CondBranch,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            EdgeKind::Fallthrough => "ft",
            EdgeKind::Branch => "br",
            EdgeKind::CondBranch => "cbr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: u8,
    pub to: u8,
    pub kind: EdgeKind,
}

/// Reachable instruction indices plus the points where a path ends:
/// unknown opcodes, illegal modes and register-indirect jumps.
#[derive(Debug, Default)]
pub struct Walk {
    pub visited: BTreeSet<u8>,
    pub edges: Vec<Edge>,
    pub stops: BTreeSet<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub start: u8,
    pub end: u8, // inclusive
    pub insns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Vec<u8>,
    pub blocks: Vec<Block>,
    pub edges: Vec<Edge>,
    pub stops: Vec<u8>,
}

fn in_code(code: &CodeImage, idx: u8) -> bool {
    (idx as usize) < code.len_words()
}

fn decode_at(code: &CodeImage, idx: u8) -> Option<Decoded> {
    let raw32 = code.fetch(idx as usize)?;
    V1Decoder::new()
        .decode(raw32)
        .filter(|d| desc(d.op).modes.allows(d.mode))
}

// Any register write landing in PC makes the successor unknown.
fn writes_pc(d: &Decoded) -> bool {
    let pc = Reg::Pc.id();
    match d.op {
        Op::Mov | Op::Add | Op::Sub | Op::Mul | Op::Pop => d.dest == pc,
        _ => false,
    }
}

pub fn analyze_entries(code: &CodeImage, entries: &[u8], max_instr: usize) -> Walk {
    let mut queue: VecDeque<u8> = entries.iter().copied().filter(|&e| in_code(code, e)).collect();
    let mut walk = Walk::default();

    let link = |walk: &mut Walk, queue: &mut VecDeque<u8>, from: u8, to: u8, kind: EdgeKind| {
        // Out-of-range branch targets are kept: jumping there halts the machine.
        if kind != EdgeKind::Fallthrough || in_code(code, to) {
            walk.edges.push(Edge { from, to, kind });
        }
        if in_code(code, to) && !walk.visited.contains(&to) {
            queue.push_back(to);
        }
    };

    while let Some(pc) = queue.pop_front() {
        if walk.visited.len() >= max_instr {
            break;
        }
        if !walk.visited.insert(pc) {
            continue;
        }
        let Some(d) = decode_at(code, pc) else {
            walk.stops.insert(pc);
            continue;
        };
        let ft = pc.wrapping_add(1);
        match (d.op, d.mode) {
            (Op::Jmp, Mode::ValOnly) => link(&mut walk, &mut queue, pc, d.dest, EdgeKind::Branch),
            (Op::Be | Op::Bne, Mode::ValOnly) => {
                link(&mut walk, &mut queue, pc, d.dest, EdgeKind::CondBranch);
                link(&mut walk, &mut queue, pc, ft, EdgeKind::Fallthrough);
            }
            (Op::Jmp, _) => {
                walk.stops.insert(pc);
            }
            (Op::Be | Op::Bne, _) => {
                walk.stops.insert(pc);
                link(&mut walk, &mut queue, pc, ft, EdgeKind::Fallthrough);
            }
            _ if writes_pc(&d) => {
                walk.stops.insert(pc);
            }
            _ => link(&mut walk, &mut queue, pc, ft, EdgeKind::Fallthrough),
        }
    }
    walk
}

/// Split the visited instructions into basic blocks. Blocks start at entries,
/// branch targets and successors of path stops, and end before the next
/// start, after an unconditional jump, or at a path stop.
pub fn build_blocks(code: &CodeImage, entries: &[u8], walk: &Walk) -> Vec<Block> {
    let mut starts: BTreeSet<u8> = entries.iter().copied().collect();
    starts.extend(
        walk.edges
            .iter()
            .filter(|e| e.kind != EdgeKind::Fallthrough || walk.stops.contains(&e.from))
            .map(|e| e.to),
    );

    let mut blocks = Vec::new();
    for &start in &starts {
        if !walk.visited.contains(&start) {
            continue;
        }
        let mut insns = Vec::new();
        let mut cur = start;
        loop {
            insns.push(match decode_at(code, cur) {
                Some(d) => fmt_decoded(&d),
                None => format!(".word {:#010x}", code.fetch(cur as usize).unwrap_or(0)),
            });
            let next = cur.wrapping_add(1);
            let is_uncond = walk
                .edges
                .iter()
                .any(|e| e.from == cur && e.kind == EdgeKind::Branch);
            let should_end = is_uncond
                || walk.stops.contains(&cur)
                || next == 0
                || !walk.visited.contains(&next)
                || starts.contains(&next);
            if should_end {
                break;
            }
            cur = next;
        }
        blocks.push(Block {
            start,
            end: cur,
            insns,
        });
    }
    blocks
}

pub fn report(code: &CodeImage, entries: &[u8], max_instr: usize) -> Report {
    let walk = analyze_entries(code, entries, max_instr);
    let blocks = build_blocks(code, entries, &walk);
    Report {
        entries: entries.to_vec(),
        blocks,
        edges: walk.edges.clone(),
        stops: walk.stops.iter().copied().collect(),
    }
}

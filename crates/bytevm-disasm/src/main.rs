use std::fmt::Write as _;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use bytevm::decoder::Decoder;
use bytevm::disasm::fmt_decoded;
use bytevm::isa::v1::V1Decoder;
use bytevm::CodeImage;

mod analyze;
use analyze::report;

#[derive(Parser, Debug)]
#[command(author, version, about = "bytevm disassembler CLI", long_about = None)]
struct Cli {
    /// Input binary path
    #[arg(value_name = "BINFILE")]
    input: String,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble instruction indices [start, end)
    Range {
        /// First instruction index (hex or dec)
        #[arg(long)]
        start: Option<String>,
        /// End index, exclusive (hex or dec); defaults to the end of the code
        #[arg(long)]
        end: Option<String>,
        /// Show instruction bytes
        #[arg(long)]
        show_bytes: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Follow control flow from entry points and report basic blocks
    Analyze {
        /// Entry indices (hex or dec). Repeat flag to add multiple entries.
        #[arg(long = "entry", value_name = "INDEX", num_args = 1.., required = false)]
        entries: Vec<String>,
        /// Maximum instructions to decode before stopping
        #[arg(long, default_value_t = 256usize)]
        max_instr: usize,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write analysis output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn emit(buf: &str, out: Option<String>) -> Result<()> {
    if let Some(path) = out {
        std::fs::write(path, buf)?;
    } else {
        print!("{buf}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let code = CodeImage::load(&cli.input)?;

    match cli.cmd {
        Command::Range {
            start,
            end,
            show_bytes,
            out,
        } => {
            let start = start.as_deref().map(parse_u32).transpose()?.unwrap_or(0) as usize;
            let end = match end.as_deref() {
                Some(e) => parse_u32(e)? as usize,
                None => code.len_words(),
            };
            anyhow::ensure!(end >= start, "end must be >= start");

            let dec = V1Decoder::new();
            let mut buf = String::new();
            for idx in start..end {
                let (Some(raw32), Some(bytes)) = (code.fetch(idx), code.word_bytes(idx)) else {
                    let _ = writeln!(buf, "{idx:04}: <oob>");
                    break;
                };
                let _ = write!(buf, "{idx:04}: ");
                if show_bytes {
                    for b in bytes {
                        let _ = write!(buf, "{b:02x} ");
                    }
                    buf.push(' ');
                }
                match dec.decode(raw32) {
                    Some(d) => {
                        let _ = writeln!(buf, "{}", fmt_decoded(&d));
                    }
                    None => {
                        let _ = writeln!(buf, ".word {raw32:#010x}");
                    }
                }
            }
            emit(&buf, out)?;
        }
        Command::Analyze {
            entries,
            max_instr,
            format,
            out,
        } => {
            let mut seeds: Vec<u8> = Vec::new();
            for e in &entries {
                let idx = parse_u32(e)?;
                seeds.push(u8::try_from(idx).map_err(|_| anyhow::anyhow!("entry {idx} exceeds the 8-bit PC"))?);
            }
            if seeds.is_empty() {
                seeds.push(0);
            }
            seeds.sort_unstable();
            seeds.dedup();

            let rep = report(&code, &seeds, max_instr);
            let buf = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&rep)? + "\n",
                OutputFormat::Text => {
                    let mut buf = String::new();
                    for b in &rep.blocks {
                        let _ = writeln!(buf, "block {:04}..={:04}:", b.start, b.end);
                        for (i, insn) in b.insns.iter().enumerate() {
                            let _ = writeln!(buf, "  {:04}: {insn}", b.start as usize + i);
                        }
                    }
                    let _ = writeln!(buf, "edges:");
                    for e in &rep.edges {
                        let _ = writeln!(buf, "  {:04} -> {:04} {}", e.from, e.to, e.kind.label());
                    }
                    if !rep.stops.is_empty() {
                        let stops: Vec<String> = rep.stops.iter().map(|s| format!("{s:04}")).collect();
                        let _ = writeln!(buf, "stops: {}", stops.join(", "));
                    }
                    buf
                }
            };
            emit(&buf, out)?;
        }
    }

    Ok(())
}

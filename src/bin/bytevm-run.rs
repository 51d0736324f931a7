use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bytevm::{exec::IntExecutor, isa::v1::V1Decoder, CodeImage, Halt, Machine, MachineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a bytevm binary")]
struct Opts {
    /// Stop after this many executed instructions
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,
    /// Read unknown register ids as 0 and ignore writes to them instead of trapping
    #[arg(long)]
    lenient_registers: bool,
    /// Print the final machine state as JSON to stderr
    #[arg(long)]
    dump_state: bool,
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&opts) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<ExitCode> {
    let code = CodeImage::load(&opts.input)?;

    let cfg = MachineConfig {
        max_steps: opts.max_steps,
        strict_registers: !opts.lenient_registers,
    };
    let mut machine = Machine::new(code, cfg);
    let dec = V1Decoder::new();
    let exec = IntExecutor;

    let mut out = std::io::stdout().lock();
    let status = match machine.run(&dec, &exec, &mut out) {
        Ok(Halt::UnknownOpcode { pc, .. }) => {
            eprintln!("Unknown opcode at PC={pc}");
            ExitCode::SUCCESS
        }
        Ok(Halt::EndOfCode | Halt::StepLimit) => ExitCode::SUCCESS,
        Err(trap) => {
            eprintln!("TRAP: {:#}", anyhow::Error::new(trap));
            ExitCode::FAILURE
        }
    };

    if opts.dump_state {
        eprintln!("{}", serde_json::to_string_pretty(&machine.snapshot())?);
    }
    Ok(status)
}

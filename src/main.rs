use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{Result, WrapErr};

use lace_vm::device::{InputDevice, OutputSink};
use lace_vm::image;
use lace_vm::output::{MsgColor, Output};
use lace_vm::term::Terminal;
use lace_vm::{Features, Memory, RunError, RunState, PC_START};

/// Run binary LC3 images on a virtual machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.obj` images to load, in order
    #[arg(required = true)]
    images: Vec<PathBuf>,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print every executed instruction to stderr
    #[arg(short, long)]
    trace: bool,
    /// Extra trap routines to enable, comma separated (`putn`, `reg`)
    #[arg(short, long, env = "LACE_VM_FEATURES", default_value = "")]
    features: Features,
}

/// Exit code after the user interrupts a run with `Ctrl+C`.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let out = Output::new(args.minimal);

    let mut mem = Memory::new();
    for path in &args.images {
        out.file_message(MsgColor::Green, "Loading", path);
        let loaded = image::load_file(path, &mut mem)
            .wrap_err_with(|| format!("failed to load image {}", path.display()))?;
        out.message(
            MsgColor::Green,
            "Loaded",
            &format!("{} words at 0x{:04x}", loaded.len, loaded.origin),
        );
    }

    let features = args.features.to_string();
    if !features.is_empty() {
        out.message(MsgColor::Cyan, "Features", &features);
    }
    out.message(MsgColor::Green, "Running", &format!("from 0x{PC_START:04x}"));

    let terminal = Terminal::new();
    let mut state = RunState::new(mem, terminal.keyboard(), terminal.console())
        .with_features(args.features);
    let result = if args.trace {
        run_traced(&mut state, &out)
    } else {
        state.run()
    };

    match result {
        Ok(cycles) => {
            out.message(
                MsgColor::Cyan,
                "Halted",
                &format!("after {cycles} instructions"),
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(error) if error.is_interrupt() => {
            out.message(MsgColor::Red, "Interrupted", "by user");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Err(error) => {
            out.message(MsgColor::Red, "Faulted", &error.to_string());
            out.print_registers(state.registers());
            Err(error.into())
        }
    }
}

/// Run to completion, printing each instruction as it executes.
fn run_traced<I, O>(state: &mut RunState<I, O>, out: &Output) -> Result<u64, RunError>
where
    I: InputDevice,
    O: OutputSink,
{
    let start_cycles = state.cycles();
    while state.is_running() {
        let pc = state.registers().pc();
        let instr = state.step()?;
        out.trace(pc, &instr);
    }
    Ok(state.cycles() - start_cycles)
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use editopt::parser::parse_sequence;
use editopt::{Block, Expression, Result};

/// Optimize a sequence of INSERT/REMOVE/REPLACE edit instructions into
/// an equivalent sequence applicable in one forward pass.
#[derive(Parser, Debug)]
#[command(name = "editopt", version, about, long_about = None)]
struct Cli {
    /// Optimization level (0-3)
    #[arg(short = 'O', long = "optimize", value_name = "LEVEL", default_value_t = 0)]
    optimize: u8,

    /// Instruction sequence given inline (newlines and `;` separate
    /// instructions)
    #[arg(short = 's', long = "sequence", value_name = "SEQ")]
    sequence: Option<String>,

    /// Read the instruction sequence from a file
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: Option<PathBuf>,

    /// Dump per-step snapshots to debug/original-<N>.txt and
    /// debug/optimized-<N>.txt instead of printing the result
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut expression = Expression::with_level(cli.optimize);

    let mut input = String::new();
    if let Some(sequence) = &cli.sequence {
        input.push_str(sequence);
        input.push('\n');
    }
    if let Some(path) = &cli.file {
        input.push_str(&fs::read_to_string(path)?);
    }

    let blocks = parse_sequence(&input)?;

    if cli.debug {
        run_debug(&mut expression, blocks)?;
    } else {
        for block in blocks {
            expression.append(block);
        }
        println!("{expression}");
    }
    Ok(())
}

/// Feeds the instructions one at a time, snapshotting the raw sequence
/// and the optimized expression after every step.
fn run_debug(expression: &mut Expression, blocks: Vec<Block>) -> Result<()> {
    let debug_dir = Path::new("debug");
    fs::create_dir_all(debug_dir)?;
    clear_stale_dumps(debug_dir)?;

    let mut original = String::new();
    for (step, block) in blocks.into_iter().enumerate() {
        let step = step + 1;
        let line = block.to_instruction();
        println!("adding instruction: {line}");

        original.push_str(&line);
        original.push('\n');
        expression.append(block);

        println!("instruction sequence at step {step}:");
        println!("{expression}");

        fs::write(debug_dir.join(format!("original-{step}.txt")), &original)?;
        fs::write(
            debug_dir.join(format!("optimized-{step}.txt")),
            expression.to_instructions(),
        )?;
    }
    Ok(())
}

fn clear_stale_dumps(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use devtree_abi::decode::DevTree;
use devtree_compiler::dump::Listing;
use devtree_compiler::logger::StderrLogger;
use devtree_compiler::{compile, compile_to_file, decompile, load_board};
use log::info;
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = StderrLogger::new(cli.log_level()).init() {
        eprintln!("warning: logger already installed: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            board,
            output,
            layout,
        } => {
            let devices = load_board(&board)
                .with_context(|| format!("failed to load board {}", board.display()))?;
            let blob = compile_to_file(&devices, &layout.config(), &output)
                .with_context(|| format!("failed to compile {}", board.display()))?;
            info!(
                "compiled {} devices from {} into {} bytes",
                devices.len(),
                board.display(),
                blob.len()
            );
        }
        Command::Check { board, layout } => {
            let devices = load_board(&board)
                .with_context(|| format!("failed to load board {}", board.display()))?;
            let blob = compile(&devices, &layout.config())
                .with_context(|| format!("failed to compile {}", board.display()))?;
            println!("{}: {} devices, {} bytes", board.display(), devices.len(), blob.len());
        }
        Command::Dump { blob } => dump(&blob)?,
    }
    Ok(())
}

fn dump(path: &Path) -> Result<()> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let tree = DevTree::parse(&bytes)
        .map_err(devtree_compiler::CompileError::from)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    print!("{}", Listing(tree));
    decompile(&bytes).with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(())
}

//! Command-line arguments for `devtreec`.

use clap::{Parser, Subcommand};
use devtree_compiler::CompilerConfig;
use devtree_compiler::config::DEFAULT_MMIO_ALIGNMENT;
use log::LevelFilter;
use std::path::PathBuf;

/// Device tree compiler: board JSON in, early-boot device tree blob out.
#[derive(Parser, Debug)]
#[command(name = "devtreec", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compile a board description into a blob
    Compile {
        /// Board description (JSON)
        board: PathBuf,

        /// Output blob
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Validate and encode a board description without writing anything
    Check {
        /// Board description (JSON)
        board: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Decode a blob and print its contents
    Dump {
        /// Compiled blob
        blob: PathBuf,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct LayoutArgs {
    /// Required MMIO base alignment in bytes (power of two)
    #[arg(long = "mmio-align", value_name = "BYTES", default_value_t = DEFAULT_MMIO_ALIGNMENT, value_parser = parse_alignment)]
    pub mmio_alignment: u64,

    /// Global header flags
    #[arg(long = "flags", value_name = "BITS", default_value_t = 0, value_parser = parse_u32)]
    pub header_flags: u32,
}

impl LayoutArgs {
    #[must_use]
    pub fn config(self) -> CompilerConfig {
        CompilerConfig::default()
            .with_mmio_alignment(self.mmio_alignment)
            .with_header_flags(self.header_flags)
    }
}

impl Cli {
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn parse_u64(text: &str) -> Result<u64, String> {
    let text = text.trim().replace('_', "");
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("{text:?}: {e}"))
}

fn parse_u32(text: &str) -> Result<u32, String> {
    let value = parse_u64(text)?;
    u32::try_from(value).map_err(|_| format!("{value:#x} does not fit 32 bits"))
}

fn parse_alignment(text: &str) -> Result<u64, String> {
    let value = parse_u64(text)?;
    if value.is_power_of_two() {
        Ok(value)
    } else {
        Err(format!("{value:#x} is not a power of two"))
    }
}

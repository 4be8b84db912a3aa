//! # Device Tree Compiler
//!
//! Host-side producer of the early-boot device tree blob defined by
//! [`devtree_abi`]. A compile is one synchronous pass:
//!
//! ```text
//! board file ──▶ DeviceDescriptor list ──▶ validate_all
//!                                             │
//!                       NameTable::intern ◀───┘  (first-occurrence offsets)
//!                             │
//!                    EntryEncoder::push           (72-byte records, LE)
//!                             │
//!                    header::assemble             (count, name_list_offset)
//!                             │
//!                    writer::assemble             (header || entries || names)
//!                             │
//!                    writer::write_atomic         (temp file + rename)
//! ```
//!
//! The transform is deterministic: the same list in the same order always yields
//! byte-identical output. Nothing is emitted unless every stage succeeds.

pub mod board;
pub mod config;
pub mod decompile;
pub mod descriptor;
pub mod dump;
pub mod encoder;
pub mod error;
pub mod header;
pub mod logger;
pub mod name_table;
pub mod writer;

pub use board::{load_board, parse_board};
pub use config::CompilerConfig;
pub use decompile::decompile;
pub use descriptor::{DeviceDescriptor, validate_all};
pub use error::{CompileError, ValidationError};
pub use writer::Blob;

use encoder::EntryEncoder;
use log::debug;
use name_table::NameTable;
use std::path::Path;

/// Compile `devices` into a blob.
///
/// # Errors
/// [`CompileError::Validation`] before anything is encoded,
/// [`CompileError::EncodingOverflow`] if a value exceeds its wire width, or
/// [`CompileError::LayoutOverflow`] if the blob's global offsets overflow.
pub fn compile(
    devices: &[DeviceDescriptor],
    config: &CompilerConfig,
) -> Result<Blob, CompileError> {
    validate_all(devices, config)?;

    let name_bytes = devices.iter().map(|d| d.name.len() + 1).sum();
    let mut names = NameTable::with_capacity(devices.len(), name_bytes);
    let mut offsets = Vec::with_capacity(devices.len());
    for (index, device) in devices.iter().enumerate() {
        let off = names
            .intern(&device.name)
            .ok_or_else(|| CompileError::EncodingOverflow {
                index,
                name: device.name.clone(),
                field: devtree_abi::layout::entry::REL_NAME_OFFSET.name,
                value: u64::try_from(names.len()).unwrap_or(u64::MAX),
            })?;
        offsets.push(off);
    }
    debug!(
        "name table: {} distinct of {} names, {} bytes",
        names.distinct(),
        devices.len(),
        names.len()
    );

    let mut entries = EntryEncoder::with_capacity(devices.len());
    for (index, (device, off)) in devices.iter().zip(offsets).enumerate() {
        entries.push(index, device, off)?;
    }

    let header = header::assemble(entries.count(), config.header_flags)?;
    Ok(writer::assemble(&header, &entries.finish(), names.as_bytes()))
}

/// Compile `devices` and atomically write the blob to `output`.
///
/// On any error no file is created at `output`, and an existing file there is
/// left untouched.
///
/// # Errors
/// As [`compile`], plus [`CompileError::Io`].
pub fn compile_to_file(
    devices: &[DeviceDescriptor],
    config: &CompilerConfig,
    output: &Path,
) -> Result<Blob, CompileError> {
    let blob = compile(devices, config)?;
    writer::write_atomic(output, &blob)?;
    Ok(blob)
}

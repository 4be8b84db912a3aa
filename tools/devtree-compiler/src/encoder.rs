//! # Entry Encoder
//!
//! Turns validated descriptors into 72-byte records in one pre-sized buffer.
//! Every field is narrowed to its wire width first; only once the whole
//! [`Entry`] is known to fit does any byte reach the buffer.

use crate::descriptor::DeviceDescriptor;
use crate::error::CompileError;
use devtree_abi::layout::{Field, entry};
use devtree_abi::{ENTRY_SIZE, Entry};

/// Narrow a model value into a 32-bit wire field.
fn narrow(
    index: usize,
    device: &DeviceDescriptor,
    field: Field,
    value: u64,
) -> Result<u32, CompileError> {
    debug_assert_eq!(field.width, 4);
    u32::try_from(value).map_err(|_| CompileError::EncodingOverflow {
        index,
        name: device.name.clone(),
        field: field.name,
        value,
    })
}

/// Build the wire record for `device`, whose name sits at `rel_name_offset`
/// within the name table.
///
/// # Errors
/// [`CompileError::EncodingOverflow`] if a value exceeds its field width.
pub fn encode_entry(
    index: usize,
    device: &DeviceDescriptor,
    rel_name_offset: u32,
) -> Result<Entry, CompileError> {
    Ok(Entry {
        device_type: device.device_type.tag(),
        flags: device.flags.bits(),
        region_base: device.region_base,
        region_size: device.region_size,
        irq_lane: narrow(index, device, entry::IRQ_LANE, device.irq_lane)?,
        irq_flags: device.irq_flags.bits(),
        irq_priority: narrow(index, device, entry::IRQ_PRIORITY, device.irq_priority)?,
        rel_name_offset,
        aux: device.aux,
    })
}

/// Accumulates encoded entries back to back.
#[derive(Debug)]
pub struct EntryEncoder {
    buf: Vec<u8>,
}

impl EntryEncoder {
    #[must_use]
    pub fn with_capacity(entries: usize) -> Self {
        Self {
            buf: Vec::with_capacity(entries.saturating_mul(ENTRY_SIZE)),
        }
    }

    /// Encode and append one entry.
    ///
    /// # Errors
    /// See [`encode_entry`]. On error the buffer is left unchanged.
    pub fn push(
        &mut self,
        index: usize,
        device: &DeviceDescriptor,
        rel_name_offset: u32,
    ) -> Result<(), CompileError> {
        let entry = encode_entry(index, device, rel_name_offset)?;
        self.buf.extend_from_slice(&entry.to_bytes());
        Ok(())
    }

    /// Number of entries written so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.buf.len() / ENTRY_SIZE
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

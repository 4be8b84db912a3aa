//! Blob → descriptor list, through the same loader view the kernel uses.

use crate::descriptor::DeviceDescriptor;
use crate::error::CompileError;
use devtree_abi::decode::DevTree;

/// Decode `blob` back into descriptors.
///
/// For any list `d` that compiles, `decompile(compile(d)) == d`.
///
/// # Errors
/// [`CompileError::CorruptBlob`] for any structural problem, including unknown
/// device type tags.
pub fn decompile(blob: &[u8]) -> Result<Vec<DeviceDescriptor>, CompileError> {
    let tree = DevTree::parse(blob)?;
    let mut devices = Vec::with_capacity(tree.len());

    for device in tree.entries() {
        let device = device?;
        let entry = device.entry;
        devices.push(DeviceDescriptor {
            device_type: device.device_type()?,
            flags: entry.entry_flags(),
            region_base: entry.region_base,
            region_size: entry.region_size,
            irq_lane: u64::from(entry.irq_lane),
            irq_flags: entry.irq_flags(),
            irq_priority: u64::from(entry.irq_priority),
            name: device.name.to_owned(),
            aux: entry.aux,
        });
    }

    Ok(devices)
}

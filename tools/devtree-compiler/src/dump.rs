//! Human-readable listing of a decoded blob.

use devtree_abi::decode::DevTree;
use devtree_abi::{aux_layout, layout};
use std::fmt;

/// Renders header fields and one block per entry, naming aux slots by their
/// meaning for the entry's type.
pub struct Listing<'a>(pub DevTree<'a>);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = &self.0;
        let h = tree.header();
        let sig_len = h
            .signature
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(h.signature.len());

        writeln!(
            f,
            "signature: {}",
            String::from_utf8_lossy(&h.signature[..sig_len])
        )?;
        writeln!(f, "revision: {}", h.revision)?;
        writeln!(f, "flags: {:#x}", h.flags)?;
        writeln!(f, "entries: {}", h.entries_count)?;
        writeln!(
            f,
            "name table: {:#x} ({} bytes)",
            h.name_list_offset,
            tree.name_table().len()
        )?;

        for (i, device) in tree.entries().enumerate() {
            let device = match device {
                Ok(device) => device,
                Err(e) => {
                    writeln!(f, "[{i}] <{e}>")?;
                    continue;
                }
            };
            let e = &device.entry;
            match device.device_type() {
                Ok(ty) => writeln!(f, "[{i}] {} {ty}", device.name)?,
                Err(_) => writeln!(f, "[{i}] {} <type {}>", device.name, e.device_type)?,
            }
            writeln!(f, "    flags: {:?}", e.entry_flags())?;
            writeln!(f, "    region: {:#x} + {:#x}", e.region_base, e.region_size)?;
            writeln!(
                f,
                "    irq: lane {} flags {:?} priority {}",
                e.irq_lane,
                e.irq_flags(),
                e.irq_priority
            )?;

            let slots = e.kind().map(aux_layout).unwrap_or_default();
            for ((slot, field), value) in slots.iter().zip(layout::entry::AUX).zip(e.aux) {
                match slot {
                    Some(slot) => writeln!(f, "    {}: {value}", slot.name())?,
                    None if value != 0 => writeln!(f, "    {}: {value:#x}", field.name)?,
                    None => {}
                }
            }
        }
        Ok(())
    }
}

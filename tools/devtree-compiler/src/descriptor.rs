//! # Device Descriptor Model
//!
//! The in-memory form of one board's device list. Descriptors are plain data;
//! [`validate_all`] decides whether a list may be encoded at all.

use crate::config::CompilerConfig;
use crate::error::ValidationError;
use devtree_abi::{DeviceType, EntryFlags, IrqFlags, aux_layout, layout};

/// One hardware device, before encoding.
///
/// `irq_lane` and `irq_priority` are held wider than their 32-bit wire fields;
/// narrowing happens (and can fail) in the entry encoder.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeviceDescriptor {
    pub device_type: DeviceType,
    pub flags: EntryFlags,
    pub region_base: u64,
    pub region_size: u64,
    pub irq_lane: u64,
    pub irq_flags: IrqFlags,
    pub irq_priority: u64,
    pub name: String,
    pub aux: [u64; 4],
}

impl DeviceDescriptor {
    /// A descriptor with no region, no interrupt and zeroed aux slots.
    #[must_use]
    pub fn new(device_type: DeviceType, name: impl Into<String>) -> Self {
        Self {
            device_type,
            flags: EntryFlags::empty(),
            region_base: 0,
            region_size: 0,
            irq_lane: 0,
            irq_flags: IrqFlags::empty(),
            irq_priority: 0,
            name: name.into(),
            aux: [0; 4],
        }
    }

    /// Mark the device memory-mapped at `base..base + size`.
    #[must_use]
    pub fn with_mmio(mut self, base: u64, size: u64) -> Self {
        self.flags |= EntryFlags::MMIO;
        self.region_base = base;
        self.region_size = size;
        self
    }

    /// Set the region without the MMIO flag (port I/O, RAM banks).
    #[must_use]
    pub const fn with_region(mut self, base: u64, size: u64) -> Self {
        self.region_base = base;
        self.region_size = size;
        self
    }

    #[must_use]
    pub const fn with_irq(mut self, lane: u64, flags: IrqFlags, priority: u64) -> Self {
        self.irq_lane = lane;
        self.irq_flags = flags;
        self.irq_priority = priority;
        self
    }

    #[must_use]
    pub const fn with_aux(mut self, aux: [u64; 4]) -> Self {
        self.aux = aux;
        self
    }

    #[must_use]
    pub const fn is_mmio(&self) -> bool {
        self.flags.contains(EntryFlags::MMIO)
    }

    fn out_of_range(&self, index: usize, field: &'static str, reason: String) -> ValidationError {
        ValidationError::FieldOutOfRange {
            index,
            name: self.name.clone(),
            field,
            reason,
        }
    }

    /// Check this descriptor in isolation.
    ///
    /// # Errors
    /// The first [`ValidationError`] found.
    pub fn validate(&self, index: usize, config: &CompilerConfig) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::InvalidName {
                index,
                name: self.name.clone(),
                reason: "name is empty",
            });
        }
        if self.name.as_bytes().contains(&0) {
            return Err(ValidationError::InvalidName {
                index,
                name: self.name.clone(),
                reason: "name contains a NUL byte",
            });
        }

        let unknown = self.flags.bits() & !EntryFlags::all().bits();
        if unknown != 0 {
            return Err(self.out_of_range(
                index,
                layout::entry::FLAGS.name,
                format!("undefined bits {unknown:#x}"),
            ));
        }

        let unknown = self.irq_flags.bits() & !IrqFlags::all().bits();
        if unknown != 0 {
            return Err(self.out_of_range(
                index,
                layout::entry::IRQ_FLAGS.name,
                format!("undefined bits {unknown:#x}"),
            ));
        }

        if self.region_base.checked_add(self.region_size).is_none() {
            return Err(self.out_of_range(
                index,
                layout::entry::REGION_SIZE.name,
                format!(
                    "region {:#x}+{:#x} wraps the address space",
                    self.region_base, self.region_size
                ),
            ));
        }

        if self.is_mmio()
            && (self.region_base == 0 || !self.region_base.is_multiple_of(config.mmio_alignment))
        {
            return Err(ValidationError::AlignmentViolation {
                index,
                name: self.name.clone(),
                base: self.region_base,
                alignment: config.mmio_alignment,
            });
        }

        // Slots the type does not define are reserved.
        let slots = aux_layout(self.device_type);
        for (i, (slot, value)) in slots.iter().zip(self.aux).enumerate() {
            if slot.is_none() && value != 0 {
                return Err(self.out_of_range(
                    index,
                    layout::entry::AUX[i].name,
                    format!("slot is reserved for {} devices, got {value:#x}", self.device_type),
                ));
            }
        }

        Ok(())
    }
}

/// Validate a whole list, in order, stopping at the first failure.
///
/// # Errors
/// The first [`ValidationError`] found.
pub fn validate_all(
    devices: &[DeviceDescriptor],
    config: &CompilerConfig,
) -> Result<(), ValidationError> {
    devices
        .iter()
        .enumerate()
        .try_for_each(|(index, device)| device.validate(index, config))
}

//! # Device Tree Blob ABI
//!
//! Binary contract between the host-side device tree compiler and the kernel's
//! early-boot loader. The kernel reads this blob before any general-purpose
//! parser is available, so everything here is fixed-width, little-endian and
//! free of padding.
//!
//! ## Layout
//!
//! ```text
//! offset 0                 ┌──────────────────────────────┐
//!                          │ Header (24 bytes)            │
//! HEADER_SIZE              ├──────────────────────────────┤
//!                          │ Entry[0] (72 bytes)          │
//!                          │ ...                          │
//!                          │ Entry[entries_count - 1]     │
//! name_list_offset         ├──────────────────────────────┤
//!                          │ "uart0\0rtc\0..."            │
//!                          └──────────────────────────────┘
//! ```
//!
//! Each entry stores its name as `rel_name_offset`, an offset **relative to
//! `name_list_offset`**. Names are NUL-terminated, deduplicated and stored in
//! first-occurrence order.
//!
//! The per-field schema lives in [`layout`]; the meaning of the auxiliary slots
//! per device type lives in [`auxiliary`]. With the `decode` feature (default)
//! the [`decode`] module provides the loader-side view.
#![cfg_attr(not(test), no_std)]

pub mod auxiliary;
pub mod layout;

#[cfg(feature = "decode")]
pub mod decode;

pub use auxiliary::{AuxSlot, aux_layout};

/// Format signature: ASCII `odtr3`, NUL-padded to the full 8-byte field.
pub const DEVTREE_SIGNATURE: [u8; 8] = *b"odtr3\0\0\0";

/// Layout revision. Bumped only on incompatible layout changes; decoders reject
/// anything else.
pub const DEVTREE_REVISION: u32 = 1;

/// Size of the [`Header`] record in bytes.
pub const HEADER_SIZE: usize = 24;

/// Size of one [`Entry`] record in bytes.
pub const ENTRY_SIZE: usize = 72;

/// Absolute offset of the name table for a blob with `entries_count` entries.
///
/// Returns `None` if the arithmetic overflows.
#[must_use]
pub const fn name_list_offset(entries_count: usize) -> Option<usize> {
    match entries_count.checked_mul(ENTRY_SIZE) {
        Some(entries) => entries.checked_add(HEADER_SIZE),
        None => None,
    }
}

/// Closed set of device kinds. The discriminant is the on-wire `type` tag.
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeviceType {
    Io = 0,
    Framebuffer = 1,
    Uart = 2,
    Ram = 3,
    Storage = 4,
    BusController = 5,
    Rtc = 6,
}

impl DeviceType {
    pub const ALL: [Self; 7] = [
        Self::Io,
        Self::Framebuffer,
        Self::Uart,
        Self::Ram,
        Self::Storage,
        Self::BusController,
        Self::Rtc,
    ];

    /// On-wire tag.
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => Self::Io,
            1 => Self::Framebuffer,
            2 => Self::Uart,
            3 => Self::Ram,
            4 => Self::Storage,
            5 => Self::BusController,
            6 => Self::Rtc,
            _ => return None,
        })
    }

    /// Canonical upper-case name, as written in board files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "IO",
            Self::Framebuffer => "FRAMEBUFFER",
            Self::Uart => "UART",
            Self::Ram => "RAM",
            Self::Storage => "STORAGE",
            Self::BusController => "BUS_CONTROLLER",
            Self::Rtc => "RTC",
        }
    }

    /// Parse a board-file type name. Case-insensitive; `FB` is accepted for
    /// [`DeviceType::Framebuffer`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("FB") {
            return Some(Self::Framebuffer);
        }
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(name))
    }
}

impl core::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Per-entry device flags.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
    pub struct EntryFlags: u32 {
        /// The device's region is memory-mapped I/O.
        ///
        /// `region_base` must then be non-zero and aligned to the platform's
        /// MMIO alignment.
        const MMIO = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Interrupt line configuration. Maps 1:1 onto the kernel's IRQ flags.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
    pub struct IrqFlags: u32 {
        /// Edge-triggered rather than level-triggered.
        const EDGE_TRIGGER = 1 << 0;
    }
}

/// Fixed header at offset 0 of every blob.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Header {
    /// Always [`DEVTREE_SIGNATURE`] in blobs this crate accepts.
    pub signature: [u8; 8],

    /// Layout revision, see [`DEVTREE_REVISION`].
    pub revision: u32,

    /// Global flags. No bits are defined yet; carried opaquely.
    pub flags: u32,

    /// Number of [`Entry`] records following the header.
    pub entries_count: u32,

    /// Absolute offset of the name table from the start of the blob.
    pub name_list_offset: u32,
}

impl Header {
    /// Header for the current signature and revision.
    #[must_use]
    pub const fn new(entries_count: u32, name_list_offset: u32, flags: u32) -> Self {
        Self {
            signature: DEVTREE_SIGNATURE,
            revision: DEVTREE_REVISION,
            flags,
            entries_count,
            name_list_offset,
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        use crate::layout::header::{ENTRIES_COUNT, FLAGS, NAME_LIST_OFFSET, REVISION, SIGNATURE};

        let mut out = [0u8; HEADER_SIZE];
        out[SIGNATURE.offset..SIGNATURE.end()].copy_from_slice(&self.signature);
        REVISION.write(&mut out, u64::from(self.revision));
        FLAGS.write(&mut out, u64::from(self.flags));
        ENTRIES_COUNT.write(&mut out, u64::from(self.entries_count));
        NAME_LIST_OFFSET.write(&mut out, u64::from(self.name_list_offset));
        out
    }

    /// Read the raw header fields. No validation happens here.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        use crate::layout::header::{ENTRIES_COUNT, FLAGS, NAME_LIST_OFFSET, REVISION, SIGNATURE};

        let mut signature = [0u8; 8];
        signature.copy_from_slice(&bytes[SIGNATURE.offset..SIGNATURE.end()]);
        Self {
            signature,
            revision: REVISION.read_u32(bytes),
            flags: FLAGS.read_u32(bytes),
            entries_count: ENTRIES_COUNT.read_u32(bytes),
            name_list_offset: NAME_LIST_OFFSET.read_u32(bytes),
        }
    }
}

/// One device record, exactly as stored on the wire.
///
/// `device_type`, `flags` and `irq_flags` are kept raw so that a decoder can
/// represent (and reject) tags it does not know.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Entry {
    pub device_type: u32,
    pub flags: u32,
    pub region_base: u64,
    pub region_size: u64,
    pub irq_lane: u32,
    pub irq_flags: u32,
    pub irq_priority: u32,
    /// Offset of the NUL-terminated name, relative to the name table start.
    pub rel_name_offset: u32,
    pub aux: [u64; 4],
}

impl Entry {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        use crate::layout::entry::{
            AUX, FLAGS, IRQ_FLAGS, IRQ_LANE, IRQ_PRIORITY, REGION_BASE, REGION_SIZE,
            REL_NAME_OFFSET, TYPE,
        };

        let mut out = [0u8; ENTRY_SIZE];
        TYPE.write(&mut out, u64::from(self.device_type));
        FLAGS.write(&mut out, u64::from(self.flags));
        REGION_BASE.write(&mut out, self.region_base);
        REGION_SIZE.write(&mut out, self.region_size);
        IRQ_LANE.write(&mut out, u64::from(self.irq_lane));
        IRQ_FLAGS.write(&mut out, u64::from(self.irq_flags));
        IRQ_PRIORITY.write(&mut out, u64::from(self.irq_priority));
        REL_NAME_OFFSET.write(&mut out, u64::from(self.rel_name_offset));
        for (field, value) in AUX.iter().zip(self.aux) {
            field.write(&mut out, value);
        }
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: &[u8; ENTRY_SIZE]) -> Self {
        use crate::layout::entry::{
            AUX, FLAGS, IRQ_FLAGS, IRQ_LANE, IRQ_PRIORITY, REGION_BASE, REGION_SIZE,
            REL_NAME_OFFSET, TYPE,
        };

        Self {
            device_type: TYPE.read_u32(bytes),
            flags: FLAGS.read_u32(bytes),
            region_base: REGION_BASE.read(bytes),
            region_size: REGION_SIZE.read(bytes),
            irq_lane: IRQ_LANE.read_u32(bytes),
            irq_flags: IRQ_FLAGS.read_u32(bytes),
            irq_priority: IRQ_PRIORITY.read_u32(bytes),
            rel_name_offset: REL_NAME_OFFSET.read_u32(bytes),
            aux: AUX.map(|field| field.read(bytes)),
        }
    }

    /// Typed device kind, or `None` for an unknown tag.
    #[must_use]
    pub const fn kind(&self) -> Option<DeviceType> {
        DeviceType::from_tag(self.device_type)
    }

    #[must_use]
    pub const fn entry_flags(&self) -> EntryFlags {
        EntryFlags::from_bits_retain(self.flags)
    }

    #[must_use]
    pub const fn irq_flags(&self) -> IrqFlags {
        IrqFlags::from_bits_retain(self.irq_flags)
    }

    /// Value of the aux slot carrying `slot`, if this entry's type defines it.
    #[must_use]
    pub fn aux_value(&self, slot: AuxSlot) -> Option<u64> {
        let kind = self.kind()?;
        auxiliary::slot_index(kind, slot).map(|i| self.aux[i])
    }
}

//! # Record Schema
//!
//! Every field of the header and of an entry record is declared here with its
//! name, byte offset and byte width. Encoding and decoding go through these
//! declarations only; nothing derives the layout from Rust struct layout.
//!
//! All integer fields are **little-endian**. The header's signature is the only
//! non-integer field and is copied as raw bytes.
//!
//! The `const` assertions at the bottom of this module pin the schema: fields
//! must be contiguous, in declaration order, and sum to [`HEADER_SIZE`] /
//! [`ENTRY_SIZE`].

use crate::{ENTRY_SIZE, HEADER_SIZE};

/// One fixed-width field within a record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Field {
    /// Field name, used in diagnostics.
    pub name: &'static str,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// Width in bytes (4 or 8 for integers).
    pub width: usize,
}

impl Field {
    const fn new(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// One past the last byte of this field.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }

    /// Largest integer that fits into this field.
    #[must_use]
    pub const fn max_value(&self) -> u64 {
        if self.width >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.width * 8)) - 1
        }
    }

    /// Store `value` little-endian into `record`.
    ///
    /// Only the low [`Field::width`] bytes are written; callers narrow and check
    /// values before they get here.
    ///
    /// # Panics
    /// Panics if `record` is shorter than [`Field::end`].
    pub fn write(&self, record: &mut [u8], value: u64) {
        debug_assert!(value <= self.max_value(), "{} overflows", self.name);
        let bytes = value.to_le_bytes();
        record[self.offset..self.end()].copy_from_slice(&bytes[..self.width]);
    }

    /// Load this field little-endian from `record`.
    ///
    /// # Panics
    /// Panics if `record` is shorter than [`Field::end`].
    #[must_use]
    pub fn read(&self, record: &[u8]) -> u64 {
        let mut bytes = [0u8; 8];
        bytes[..self.width].copy_from_slice(&record[self.offset..self.end()]);
        u64::from_le_bytes(bytes)
    }

    /// Load a 32-bit field.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_u32(&self, record: &[u8]) -> u32 {
        debug_assert_eq!(self.width, 4, "{} is not a 32-bit field", self.name);
        self.read(record) as u32
    }
}

/// Header fields, in wire order.
pub mod header {
    use super::Field;

    pub const SIGNATURE: Field = Field::new("signature", 0, 8);
    pub const REVISION: Field = Field::new("revision", 8, 4);
    pub const FLAGS: Field = Field::new("flags", 12, 4);
    pub const ENTRIES_COUNT: Field = Field::new("entries_count", 16, 4);
    pub const NAME_LIST_OFFSET: Field = Field::new("name_list_offset", 20, 4);

    pub const FIELDS: [Field; 5] = [SIGNATURE, REVISION, FLAGS, ENTRIES_COUNT, NAME_LIST_OFFSET];
}

/// Entry fields, in wire order.
pub mod entry {
    use super::Field;

    pub const TYPE: Field = Field::new("type", 0, 4);
    pub const FLAGS: Field = Field::new("flags", 4, 4);
    pub const REGION_BASE: Field = Field::new("region_base", 8, 8);
    pub const REGION_SIZE: Field = Field::new("region_size", 16, 8);
    pub const IRQ_LANE: Field = Field::new("irq_lane", 24, 4);
    pub const IRQ_FLAGS: Field = Field::new("irq_flags", 28, 4);
    pub const IRQ_PRIORITY: Field = Field::new("irq_priority", 32, 4);
    pub const REL_NAME_OFFSET: Field = Field::new("rel_name_offset", 36, 4);
    pub const AUX1: Field = Field::new("aux1", 40, 8);
    pub const AUX2: Field = Field::new("aux2", 48, 8);
    pub const AUX3: Field = Field::new("aux3", 56, 8);
    pub const AUX4: Field = Field::new("aux4", 64, 8);

    /// The four auxiliary slots, indexable by slot number.
    pub const AUX: [Field; 4] = [AUX1, AUX2, AUX3, AUX4];

    pub const FIELDS: [Field; 12] = [
        TYPE,
        FLAGS,
        REGION_BASE,
        REGION_SIZE,
        IRQ_LANE,
        IRQ_FLAGS,
        IRQ_PRIORITY,
        REL_NAME_OFFSET,
        AUX1,
        AUX2,
        AUX3,
        AUX4,
    ];
}

const fn is_packed(fields: &[Field], size: usize) -> bool {
    let mut cursor = 0;
    let mut i = 0;
    while i < fields.len() {
        if fields[i].offset != cursor {
            return false;
        }
        cursor += fields[i].width;
        i += 1;
    }
    cursor == size
}

const _: () = assert!(is_packed(&header::FIELDS, HEADER_SIZE));
const _: () = assert!(is_packed(&entry::FIELDS, ENTRY_SIZE));

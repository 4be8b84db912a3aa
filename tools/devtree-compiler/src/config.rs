/// Default MMIO alignment: one 4 KiB page, the granularity the kernel maps
/// device regions with.
pub const DEFAULT_MMIO_ALIGNMENT: u64 = 0x1000;

/// Everything a compile needs besides the device list.
///
/// Built by the CLI and passed into [`crate::compile`]; the compiler reads no
/// process arguments or environment of its own.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CompilerConfig {
    /// Required alignment of `region_base` for MMIO devices. Must be a power of two.
    pub mmio_alignment: u64,

    /// Value written to the header's global `flags` field.
    pub header_flags: u32,
}

impl CompilerConfig {
    #[must_use]
    pub const fn with_mmio_alignment(mut self, alignment: u64) -> Self {
        self.mmio_alignment = alignment;
        self
    }

    #[must_use]
    pub const fn with_header_flags(mut self, flags: u32) -> Self {
        self.header_flags = flags;
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            mmio_alignment: DEFAULT_MMIO_ALIGNMENT,
            header_flags: 0,
        }
    }
}

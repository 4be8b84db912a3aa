//! # Auxiliary Slot Table
//!
//! Each entry carries four 64-bit auxiliary slots (`aux1..aux4`). What a slot
//! means depends on the entry's [`DeviceType`]; this table is the single place
//! that assigns those meanings. Adding a device type means adding one arm to
//! [`aux_layout`].
//!
//! | Type             | aux1         | aux2        | aux3     | aux4           |
//! |------------------|--------------|-------------|----------|----------------|
//! | `IO`             | -            | -           | -        | -              |
//! | `FRAMEBUFFER`    | `width`      | `height`    | `stride` | `pixel_format` |
//! | `UART`           | `clock_hz`   | `baud_rate` | -        | -              |
//! | `RAM`            | -            | -           | -        | -              |
//! | `STORAGE`        | `block_size` | -           | -        | -              |
//! | `BUS_CONTROLLER` | `bus_start`  | `bus_end`   | -        | -              |
//! | `RTC`            | -            | -           | -        | -              |
//!
//! Unassigned slots are reserved and must be zero.

use crate::DeviceType;

/// Meaning of one auxiliary slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AuxSlot {
    /// Framebuffer visible width in pixels.
    Width,
    /// Framebuffer visible height in pixels.
    Height,
    /// Framebuffer scanline length in bytes.
    Stride,
    /// Framebuffer pixel format tag.
    PixelFormat,
    /// UART input clock in Hz.
    ClockHz,
    /// UART default baud rate.
    BaudRate,
    /// Storage block size in bytes.
    BlockSize,
    /// First bus number decoded by the controller.
    BusStart,
    /// Last bus number decoded by the controller.
    BusEnd,
}

impl AuxSlot {
    /// Name used in board files and listings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::Stride => "stride",
            Self::PixelFormat => "pixel_format",
            Self::ClockHz => "clock_hz",
            Self::BaudRate => "baud_rate",
            Self::BlockSize => "block_size",
            Self::BusStart => "bus_start",
            Self::BusEnd => "bus_end",
        }
    }
}

/// Slot meanings for `aux1..aux4` of the given device type.
#[must_use]
pub const fn aux_layout(device_type: DeviceType) -> [Option<AuxSlot>; 4] {
    match device_type {
        DeviceType::Io | DeviceType::Ram | DeviceType::Rtc => [None; 4],
        DeviceType::Framebuffer => [
            Some(AuxSlot::Width),
            Some(AuxSlot::Height),
            Some(AuxSlot::Stride),
            Some(AuxSlot::PixelFormat),
        ],
        DeviceType::Uart => [Some(AuxSlot::ClockHz), Some(AuxSlot::BaudRate), None, None],
        DeviceType::Storage => [Some(AuxSlot::BlockSize), None, None, None],
        DeviceType::BusController => [Some(AuxSlot::BusStart), Some(AuxSlot::BusEnd), None, None],
    }
}

/// Slot number (0-based) that holds `slot` for `device_type`, if any.
#[must_use]
pub fn slot_index(device_type: DeviceType, slot: AuxSlot) -> Option<usize> {
    aux_layout(device_type)
        .iter()
        .position(|s| *s == Some(slot))
}

/// Resolve a board-file aux key for `device_type`.
///
/// Accepts the positional names `aux1`..`aux4` and the semantic names from the
/// table. Returns the 0-based slot number.
#[must_use]
pub fn resolve_key(device_type: DeviceType, key: &str) -> Option<usize> {
    match key {
        "aux1" => return Some(0),
        "aux2" => return Some(1),
        "aux3" => return Some(2),
        "aux4" => return Some(3),
        _ => {}
    }

    aux_layout(device_type)
        .iter()
        .position(|s| s.is_some_and(|s| s.name() == key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uart_clock_lives_in_aux1() {
        assert_eq!(slot_index(DeviceType::Uart, AuxSlot::ClockHz), Some(0));
        assert_eq!(slot_index(DeviceType::Uart, AuxSlot::Width), None);
    }

    #[test]
    fn keys_resolve_positionally_and_by_name() {
        assert_eq!(resolve_key(DeviceType::Framebuffer, "stride"), Some(2));
        assert_eq!(resolve_key(DeviceType::Framebuffer, "aux4"), Some(3));
        assert_eq!(resolve_key(DeviceType::Ram, "aux2"), Some(1));
        assert_eq!(resolve_key(DeviceType::Ram, "width"), None);
        assert_eq!(resolve_key(DeviceType::Uart, "bogus"), None);
    }

    #[test]
    fn every_type_has_a_layout() {
        for ty in DeviceType::ALL {
            let named = aux_layout(ty).iter().flatten().count();
            assert!(named <= 4);
        }
    }
}

//! # Board Description Files
//!
//! A board is a JSON document listing its devices:
//!
//! ```json
//! {
//!   "devices": [
//!     {
//!       "name": "uart0",
//!       "type": "UART",
//!       "flags": ["MMIO"],
//!       "mem": { "base": "0x10000000", "size": "0x1000" },
//!       "irq": { "lane": 33, "flags": ["EDGE_TRIGGER"], "priority": 1 },
//!       "aux": { "clock_hz": 24000000 }
//!     }
//!   ]
//! }
//! ```
//!
//! Numbers may be JSON integers or strings (`"0x…"` hex or decimal). `mem` and
//! `irq` are optional. Aux values are keyed either by slot (`aux1`..`aux4`) or
//! by the slot's meaning for the device type (see [`devtree_abi::auxiliary`]).
//! Top-level `aux1`..`aux4` keys are accepted as well.
//!
//! Syntax problems are [`CompileError::Board`]; well-formed JSON that names an
//! unknown type, flag or aux slot becomes a [`ValidationError`].

use crate::descriptor::DeviceDescriptor;
use crate::error::{CompileError, ValidationError};
use devtree_abi::{DeviceType, EntryFlags, IrqFlags, auxiliary, layout};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardFile {
    pub devices: Vec<BoardDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardDevice {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: TypeTag,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub mem: Option<Region>,
    #[serde(default)]
    pub irq: Option<Irq>,
    #[serde(default)]
    pub aux: BTreeMap<String, Number>,
    #[serde(default)]
    pub aux1: Option<Number>,
    #[serde(default)]
    pub aux2: Option<Number>,
    #[serde(default)]
    pub aux3: Option<Number>,
    #[serde(default)]
    pub aux4: Option<Number>,
}

/// Device type as written: a name such as `"UART"`, or a raw numeric tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeTag {
    Tag(u64),
    Name(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    #[serde(default)]
    pub base: Number,
    #[serde(default)]
    pub size: Number,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Irq {
    #[serde(default)]
    pub lane: Number,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub priority: Number,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(u64),
    Text(String),
}

impl Default for Number {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl Number {
    fn parse(&self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(s) => {
                let s = s.trim().replace('_', "");
                match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16).ok(),
                    None => s.parse().ok(),
                }
            }
        }
    }
}

/// Converts one board entry; `index` and the entry's name end up in every error.
struct Conversion<'a> {
    index: usize,
    name: &'a str,
}

impl Conversion<'_> {
    fn out_of_range(&self, field: &'static str, reason: String) -> ValidationError {
        ValidationError::FieldOutOfRange {
            index: self.index,
            name: self.name.to_owned(),
            field,
            reason,
        }
    }

    fn number(&self, field: &'static str, n: &Number) -> Result<u64, ValidationError> {
        n.parse()
            .ok_or_else(|| self.out_of_range(field, format!("{n:?} is not a number")))
    }

    fn device_type(&self, tag: &TypeTag) -> Result<DeviceType, ValidationError> {
        let ty = match tag {
            TypeTag::Name(name) => DeviceType::from_name(name),
            TypeTag::Tag(raw) => u32::try_from(*raw).ok().and_then(DeviceType::from_tag),
        };
        ty.ok_or_else(|| ValidationError::UnknownDeviceType {
            index: self.index,
            name: self.name.to_owned(),
            tag: match tag {
                TypeTag::Name(name) => name.clone(),
                TypeTag::Tag(raw) => raw.to_string(),
            },
        })
    }

    fn entry_flags(&self, names: &[String]) -> Result<EntryFlags, ValidationError> {
        names.iter().try_fold(EntryFlags::empty(), |acc, name| {
            EntryFlags::from_name(&name.to_ascii_uppercase())
                .map(|f| acc | f)
                .ok_or_else(|| {
                    self.out_of_range(layout::entry::FLAGS.name, format!("unknown flag {name:?}"))
                })
        })
    }

    fn irq_flags(&self, names: &[String]) -> Result<IrqFlags, ValidationError> {
        names.iter().try_fold(IrqFlags::empty(), |acc, name| {
            IrqFlags::from_name(&name.to_ascii_uppercase())
                .map(|f| acc | f)
                .ok_or_else(|| {
                    self.out_of_range(
                        layout::entry::IRQ_FLAGS.name,
                        format!("unknown IRQ flag {name:?}"),
                    )
                })
        })
    }

    fn aux(&self, ty: DeviceType, dev: &BoardDevice) -> Result<[u64; 4], ValidationError> {
        let mut values = [None; 4];

        let positional = [&dev.aux1, &dev.aux2, &dev.aux3, &dev.aux4];
        let keyed = dev.aux.iter().map(|(k, v)| (k.as_str(), v));
        let top = positional
            .into_iter()
            .zip(layout::entry::AUX)
            .filter_map(|(v, field)| v.as_ref().map(|v| (field.name, v)));

        for (key, value) in top.chain(keyed) {
            let slot = auxiliary::resolve_key(ty, key).ok_or_else(|| {
                self.out_of_range("aux", format!("{ty} devices have no aux slot {key:?}"))
            })?;
            let field = layout::entry::AUX[slot];
            if values[slot].is_some() {
                return Err(self.out_of_range(field.name, "given more than once".to_owned()));
            }
            values[slot] = Some(self.number(field.name, value)?);
        }

        Ok(values.map(|v| v.unwrap_or(0)))
    }

    fn convert(&self, dev: &BoardDevice) -> Result<DeviceDescriptor, ValidationError> {
        use layout::entry::{IRQ_LANE, IRQ_PRIORITY, REGION_BASE, REGION_SIZE};

        let device_type = self.device_type(&dev.device_type)?;
        let mem = dev.mem.as_ref();
        let irq = dev.irq.as_ref();

        Ok(DeviceDescriptor {
            device_type,
            flags: self.entry_flags(&dev.flags)?,
            region_base: mem.map_or(Ok(0), |m| self.number(REGION_BASE.name, &m.base))?,
            region_size: mem.map_or(Ok(0), |m| self.number(REGION_SIZE.name, &m.size))?,
            irq_lane: irq.map_or(Ok(0), |i| self.number(IRQ_LANE.name, &i.lane))?,
            irq_flags: irq.map_or(Ok(IrqFlags::empty()), |i| self.irq_flags(&i.flags))?,
            irq_priority: irq.map_or(Ok(0), |i| self.number(IRQ_PRIORITY.name, &i.priority))?,
            name: dev.name.clone(),
            aux: self.aux(device_type, dev)?,
        })
    }
}

impl BoardFile {
    /// Convert every device, in file order.
    ///
    /// # Errors
    /// The first [`ValidationError`] hit while converting.
    pub fn into_descriptors(self) -> Result<Vec<DeviceDescriptor>, ValidationError> {
        self.devices
            .iter()
            .enumerate()
            .map(|(index, dev)| {
                Conversion {
                    index,
                    name: &dev.name,
                }
                .convert(dev)
            })
            .collect()
    }
}

/// Parse a board description from JSON text.
///
/// # Errors
/// [`CompileError::Board`] for malformed JSON, [`CompileError::Validation`] for
/// unknown types, flags or aux slots.
pub fn parse_board(text: &str) -> Result<Vec<DeviceDescriptor>, CompileError> {
    let board: BoardFile = serde_json::from_str(text)?;
    Ok(board.into_descriptors()?)
}

/// Read and parse a board description file.
///
/// # Errors
/// As [`parse_board`], plus [`CompileError::Io`] if the file cannot be read.
pub fn load_board(path: &Path) -> Result<Vec<DeviceDescriptor>, CompileError> {
    let text = std::fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    parse_board(&text)
}

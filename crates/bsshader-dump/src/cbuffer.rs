//! Rendering one group's constants as an HLSL `cbuffer` declaration.
//!
//! Every field is pinned with a `packoffset` so that recompiling the declaration reproduces the
//! byte layout of the live binary exactly.

use core::fmt;

use crate::classify::ClassifiedEntry;
use crate::error::FormatError;
use crate::group::{cbuffer_binding, CbufferBinding};
use crate::shader::{BufferDesc, ConstantOffsets};

/// Column the `: packoffset(...)` annotation starts at (after the leading tab).
const DECLARATION_COLUMN: usize = 45;
/// Width reserved for the packoffset text before the trailing offset comment.
const PACKOFFSET_COLUMN: usize = 20;

/// Type used for constants the catalogue does not give a type for.
pub const DEFAULT_TYPE: &str = "float4";

/// Component of a 16-byte constant register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
    Z,
    W,
}

impl Component {
    fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            3 => Some(Self::W),
            _ => None,
        }
    }

    pub const fn selector(self) -> u8 {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::W => 3,
        }
    }
}

/// A `packoffset(cN[.yzw])` placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOffset {
    /// Constant register (`cN`), i.e. the 16-byte row.
    pub register: u8,
    pub component: Component,
}

impl PackOffset {
    /// Splits an offset in 4-byte units into register and component.
    pub fn from_offset(offset: u8) -> Result<Self, FormatError> {
        let selector = offset % 4;
        let component = Component::from_selector(selector)
            .ok_or(FormatError::CorruptOffset { offset, selector })?;
        Ok(Self {
            register: offset / 4,
            component,
        })
    }

    /// Offset in 4-byte units this placement encodes.
    pub const fn offset(self) -> u16 {
        self.register as u16 * 4 + self.component.selector() as u16
    }
}

impl fmt::Display for PackOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Component::X => write!(f, "packoffset(c{})", self.register),
            Component::Y => write!(f, "packoffset(c{}.y)", self.register),
            Component::Z => write!(f, "packoffset(c{}.z)", self.register),
            Component::W => write!(f, "packoffset(c{}.w)", self.register),
        }
    }
}

/// Splits a type override into its type and optional array suffix.
///
/// `"float4[3]"` yields `("float4", "[3]")` and `"float3x4"` yields `("float3x4", "")`. Returns
/// `None` for overrides that are empty, start with `[`, contain more than one `[`, or whose
/// `[` is not closed by a trailing `]`.
pub fn split_type_override(type_override: &str) -> Option<(&str, &str)> {
    if type_override.trim().is_empty() {
        return None;
    }
    match type_override.find('[') {
        None if type_override.contains(']') => None,
        None => Some((type_override, "")),
        Some(0) => None,
        Some(open) => {
            let (ty, suffix) = type_override.split_at(open);
            let well_formed = suffix.ends_with(']')
                && suffix[1..].find('[').is_none()
                && suffix.find(']') == Some(suffix.len() - 1);
            well_formed.then_some((ty, suffix))
        }
    }
}

/// Builds `"<type> <name><array suffix>"` for one constant.
pub fn declaration(name: &str, type_override: Option<&str>) -> Result<String, FormatError> {
    let Some(type_override) = type_override else {
        return Ok(format!("{DEFAULT_TYPE} {name}"));
    };
    let (ty, suffix) =
        split_type_override(type_override).ok_or_else(|| FormatError::MalformedTypeOverride {
            name: name.to_string(),
            type_override: type_override.to_string(),
        })?;
    Ok(format!("{ty} {name}{suffix}"))
}

/// One field line of a `cbuffer` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbufferField {
    pub index: usize,
    pub name: String,
    pub declaration: String,
    /// Offset in 4-byte units, as stored in the shader's offset table.
    pub offset: u8,
    pub pack: PackOffset,
}

impl CbufferField {
    pub fn byte_offset(&self) -> u16 {
        u16::from(self.offset) * 4
    }
}

impl fmt::Display for CbufferField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pack = self.pack.to_string();
        write!(
            f,
            "\t{:<decl_width$}: {};{:pad$}// @ {} - 0x{:04X}",
            self.declaration,
            pack,
            "",
            self.offset,
            self.byte_offset(),
            decl_width = DECLARATION_COLUMN,
            pad = PACKOFFSET_COLUMN.saturating_sub(pack.len()),
        )
    }
}

/// A rendered `cbuffer` declaration, fields in ascending offset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbufferBlock {
    pub binding: CbufferBinding,
    /// Allocated size of the backing buffer, when it has one.
    pub byte_width: Option<u32>,
    pub fields: Vec<CbufferField>,
}

impl CbufferBlock {
    /// Lays out `entries` into the `cbuffer` bound at numeric slot `slot`.
    pub fn build(
        entries: &[ClassifiedEntry<'_>],
        offsets: &ConstantOffsets,
        slot: u32,
        buffer: &BufferDesc,
    ) -> Result<Self, FormatError> {
        let binding = *cbuffer_binding(slot).ok_or(FormatError::UnmappedRegister(slot))?;

        let mut placed = entries
            .iter()
            .map(|entry| {
                offsets
                    .get(entry.index)
                    .map(|offset| (entry, offset))
                    .ok_or(FormatError::SlotOutOfRange {
                        index: entry.index,
                        len: offsets.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        placed.sort_by_key(|&(_, offset)| offset);

        let mut fields = Vec::with_capacity(placed.len());
        for (entry, offset) in placed {
            let field = CbufferField {
                index: entry.index,
                name: entry.name.to_string(),
                declaration: declaration(entry.name, entry.type_override())?,
                offset,
                pack: PackOffset::from_offset(offset)?,
            };
            check_field(binding.name, fields.last(), &field, buffer.byte_width);
            fields.push(field);
        }

        Ok(Self {
            binding,
            byte_width: buffer.byte_width,
            fields,
        })
    }
}

// Layout problems that don't stop the report but mean the offset table disagrees with the
// catalogue or with the buffer allocation.
fn check_field(
    cbuffer: &str,
    previous: Option<&CbufferField>,
    field: &CbufferField,
    byte_width: Option<u32>,
) {
    if let Some(previous) = previous.filter(|p| p.offset == field.offset) {
        tracing::warn!(
            cbuffer,
            offset = field.offset,
            first = %previous.name,
            second = %field.name,
            "two constants share one offset"
        );
    }
    if let Some(width) = byte_width.filter(|&w| u32::from(field.byte_offset()) >= w) {
        tracing::warn!(
            cbuffer,
            constant = %field.name,
            byte_offset = field.byte_offset(),
            byte_width = width,
            "constant offset lies outside the allocated buffer"
        );
    }
}

impl fmt::Display for CbufferBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Buffers can be unused by a shader and still occupy their slot.
        if let Some(width) = self.byte_width {
            writeln!(f, "// Dynamic buffer: Size = {width} (0x{width:X})")?;
        }
        writeln!(
            f,
            "cbuffer {} : register({})",
            self.binding.name, self.binding.register
        )?;
        writeln!(f, "{{")?;
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        writeln!(f, "}}")?;
        writeln!(f)
    }
}

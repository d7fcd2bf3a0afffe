//! Constant groups and the fixed `cbuffer` register bindings they are emitted under.

use core::fmt;

use serde::Deserialize;

/// How often a constant is expected to change, which selects the buffer it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstantGroup {
    PerGeometry,
    PerMaterial,
    PerTechnique,
}

impl ConstantGroup {
    /// Groups in the order their blocks appear in a report.
    pub const REPORT_ORDER: [ConstantGroup; 3] =
        [Self::PerGeometry, Self::PerMaterial, Self::PerTechnique];

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::REPORT_ORDER
            .into_iter()
            .find(|group| name.eq_ignore_ascii_case(group.as_str()))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerGeometry => "PerGeometry",
            Self::PerMaterial => "PerMaterial",
            Self::PerTechnique => "PerTechnique",
        }
    }

    /// Numeric slot passed to [`cbuffer_binding`] when this group's block is emitted.
    ///
    /// This is the block's position in the report, *not* the binding whose name matches the
    /// group: the per-geometry block is declared as `PerTechnique : register(b0)`.
    pub const fn register_slot(self) -> u32 {
        match self {
            Self::PerGeometry => 0,
            Self::PerMaterial => 1,
            Self::PerTechnique => 2,
        }
    }

    /// Position of this group's backing buffer in a shader's buffer descriptor array.
    pub const fn buffer_index(self) -> usize {
        match self {
            Self::PerGeometry => 0,
            Self::PerMaterial => 1,
            Self::PerTechnique => 2,
        }
    }
}

impl fmt::Display for ConstantGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group as written in the catalogue. Unknown spellings are kept so validation can report them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum GroupTag {
    Valid(ConstantGroup),
    Invalid(String),
}

impl GroupTag {
    pub fn group(&self) -> Option<ConstantGroup> {
        match self {
            Self::Valid(group) => Some(*group),
            Self::Invalid(_) => None,
        }
    }
}

impl From<String> for GroupTag {
    fn from(value: String) -> Self {
        match ConstantGroup::parse(&value) {
            Some(group) => Self::Valid(group),
            None => Self::Invalid(value),
        }
    }
}

impl From<ConstantGroup> for GroupTag {
    fn from(value: ConstantGroup) -> Self {
        Self::Valid(value)
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(group) => group.fmt(f),
            Self::Invalid(raw) => write!(f, "{raw:?}"),
        }
    }
}

/// A `cbuffer` name and register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CbufferBinding {
    pub slot: u32,
    pub name: &'static str,
    pub register: &'static str,
}

// Must match the register layout the engine's shader compiler was built against.
const CBUFFER_BINDINGS: &[CbufferBinding] = &[
    CbufferBinding {
        slot: 0,
        name: "PerTechnique",
        register: "b0",
    },
    CbufferBinding {
        slot: 1,
        name: "PerMaterial",
        register: "b1",
    },
    CbufferBinding {
        slot: 2,
        name: "PerGeometry",
        register: "b2",
    },
    CbufferBinding {
        slot: 11,
        name: "AlphaTestRefCB",
        register: "b11",
    },
    CbufferBinding {
        slot: 12,
        name: "PerFrame",
        register: "b12",
    },
];

/// Looks up the `cbuffer` declaration used for numeric slot `slot`.
pub fn cbuffer_binding(slot: u32) -> Option<&'static CbufferBinding> {
    CBUFFER_BINDINGS.iter().find(|binding| binding.slot == slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_blocks_keep_the_fixed_register_pairing() {
        let names: Vec<_> = ConstantGroup::REPORT_ORDER
            .iter()
            .map(|group| cbuffer_binding(group.register_slot()).unwrap())
            .map(|b| (b.name, b.register))
            .collect();
        assert_eq!(
            names,
            vec![
                ("PerTechnique", "b0"),
                ("PerMaterial", "b1"),
                ("PerGeometry", "b2"),
            ]
        );
    }

    #[test]
    fn unmapped_slot_has_no_binding() {
        assert!(cbuffer_binding(3).is_none());
        assert_eq!(cbuffer_binding(12).unwrap().name, "PerFrame");
    }

    #[test]
    fn group_tag_keeps_unknown_spellings() {
        assert_eq!(
            GroupTag::from("pergeometry".to_string()),
            GroupTag::Valid(ConstantGroup::PerGeometry)
        );
        let tag = GroupTag::from("PerFrame".to_string());
        assert_eq!(tag, GroupTag::Invalid("PerFrame".into()));
        assert_eq!(tag.group(), None);
    }
}

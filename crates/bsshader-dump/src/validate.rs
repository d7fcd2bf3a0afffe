//! Offline consistency check of a whole catalogue.
//!
//! Finds typos in the mapping rows before they turn into a misleading report: bad groups,
//! repeated slots, slots whose name is missing or a placeholder, repeated names and type
//! overrides the formatter cannot splice. Every problem is reported; nothing stops early.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::catalogue::Catalogue;
use crate::cbuffer::split_type_override;
use crate::ShaderStage;

/// One problem found in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    UnknownKind {
        kind: String,
    },
    InvalidGroup {
        kind: String,
        stage: ShaderStage,
        index: usize,
        group: String,
    },
    IndexOutOfRange {
        kind: String,
        stage: ShaderStage,
        index: usize,
    },
    DuplicateIndex {
        kind: String,
        stage: ShaderStage,
        index: usize,
    },
    InvalidName {
        kind: String,
        stage: ShaderStage,
        index: usize,
    },
    DuplicateName {
        kind: String,
        stage: ShaderStage,
        name: String,
    },
    MalformedTypeOverride {
        kind: String,
        stage: ShaderStage,
        index: usize,
        type_override: String,
    },
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VALIDATION FAILURE: ")?;
        match self {
            Self::UnknownKind { kind } => write!(f, "Unknown shader type {kind}"),
            Self::InvalidGroup {
                kind,
                stage,
                index,
                group,
            } => write!(
                f,
                "Group type for [{kind} {stage}, param index {index}] is {group}"
            ),
            Self::IndexOutOfRange { kind, stage, index } => write!(
                f,
                "Parameter index {index} for {kind} {stage} exceeds the {}-entry offset table",
                stage.constant_table_size()
            ),
            Self::DuplicateIndex { kind, stage, index } => {
                write!(f, "Duplicate parameter index {index} for {kind} {stage}")
            }
            Self::InvalidName { kind, stage, index } => {
                write!(f, "Invalid parameter name for index {index} in {kind} {stage}")
            }
            Self::DuplicateName { kind, stage, name } => {
                write!(f, "Duplicate parameter name {name} for {kind} {stage}")
            }
            Self::MalformedTypeOverride {
                kind,
                stage,
                index,
                type_override,
            } => write!(
                f,
                "Malformed type override {type_override:?} for [{kind} {stage}, param index {index}]"
            ),
        }
    }
}

#[derive(Default)]
struct Partition<'a> {
    indexes: HashSet<usize>,
    names: HashSet<&'a str>,
}

/// Checks every row of `catalogue`, partitioned by (kind, stage), in table order.
pub fn validate(catalogue: &Catalogue) -> Vec<Defect> {
    let mut defects = Vec::new();
    let mut partitions: HashMap<(String, ShaderStage), Partition<'_>> = HashMap::new();
    let mut unknown_kinds = HashSet::new();

    for entry in catalogue.entries() {
        let kind = entry.kind.as_str();
        let stage = entry.stage;
        let index = entry.index;
        let partition = partitions
            .entry((kind.to_ascii_lowercase(), stage))
            .or_default();

        if entry.group.group().is_none() {
            defects.push(Defect::InvalidGroup {
                kind: kind.to_string(),
                stage,
                index,
                group: entry.group.to_string(),
            });
        }

        if let Some(type_override) = entry.type_override.as_deref() {
            if split_type_override(type_override).is_none() {
                defects.push(Defect::MalformedTypeOverride {
                    kind: kind.to_string(),
                    stage,
                    index,
                    type_override: type_override.to_string(),
                });
            }
        }

        if index >= stage.constant_table_size() {
            defects.push(Defect::IndexOutOfRange {
                kind: kind.to_string(),
                stage,
                index,
            });
        }

        if !partition.indexes.insert(index) {
            defects.push(Defect::DuplicateIndex {
                kind: kind.to_string(),
                stage,
                index,
            });
            continue;
        }

        let Some(resolver) = catalogue.resolver(kind) else {
            if unknown_kinds.insert(kind.to_ascii_lowercase()) {
                defects.push(Defect::UnknownKind {
                    kind: kind.to_string(),
                });
            }
            continue;
        };

        let name = match resolver.constant_name(stage, index) {
            Some(name) if !catalogue.is_sentinel(name) => name,
            _ => {
                defects.push(Defect::InvalidName {
                    kind: kind.to_string(),
                    stage,
                    index,
                });
                continue;
            }
        };

        if !partition.names.insert(name) {
            defects.push(Defect::DuplicateName {
                kind: kind.to_string(),
                stage,
                name: name.to_string(),
            });
        }
    }

    if defects.is_empty() {
        tracing::debug!(rows = catalogue.entries().len(), "catalogue validated cleanly");
    } else {
        tracing::warn!(
            rows = catalogue.entries().len(),
            defects = defects.len(),
            "catalogue has defects"
        );
    }
    defects
}

use std::path::PathBuf;

use thiserror::Error;

use crate::ShaderStage;

/// Failure to load a catalogue or a shader descriptor.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("duplicate shader kind: {0}")]
    DuplicateKind(String),
    #[error("{stage} constant-offset table has {found} entries, expected {expected}")]
    OffsetTableSize {
        stage: ShaderStage,
        expected: usize,
        found: usize,
    },
}

/// A contract violation while rendering one constant buffer block.
///
/// Fatal to the report being built, never to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("packoffset selector {selector} for offset {offset} is out of range")]
    CorruptOffset { offset: u8, selector: u8 },
    #[error("no cbuffer binding registered for slot {0}")]
    UnmappedRegister(u32),
    #[error("type override {type_override:?} for constant {name} is malformed")]
    MalformedTypeOverride { name: String, type_override: String },
    #[error("constant index {index} is outside the {len}-entry offset table")]
    SlotOutOfRange { index: usize, len: usize },
}

/// Failure to assemble or persist a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("refusing to overwrite existing shader dump {path}")]
    AlreadyExists { path: PathBuf },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    /// A name collision means two instances mapped to the same technique identity. Callers
    /// should stop the whole run rather than continue with other instances.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Invalid environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {0}")]
    InvalidEnv(&'static str),
}

//! Constant-buffer reports for compiled Bethesda `BSShader` instances.
//!
//! A [`Catalogue`] maps every (shader kind, stage, constant index) triple to the constant
//! buffer group it belongs to, plus an optional HLSL type. Given a live [`ShaderInstance`]
//! (its kind, stage, technique id and per-index packed offsets) the crate reconstructs the
//! `cbuffer` declarations with exact `packoffset` annotations and writes a text report
//! next to the raw bytecode.
//!
//! The catalogue can also be checked offline with [`validate`] so that mapping typos show
//! up before a dump run.

#![forbid(unsafe_code)]

mod catalogue;
mod cbuffer;
mod classify;
mod config;
mod error;
mod group;
mod number;
mod report;
mod resolver;
mod shader;
mod stage;
mod validate;

pub use catalogue::{Catalogue, CatalogueEntry, CatalogueHit};
pub use cbuffer::{
    declaration, split_type_override, CbufferBlock, CbufferField, Component, PackOffset,
    DEFAULT_TYPE,
};
pub use classify::{classify, classify_until, Classification, ClassifiedEntry};
pub use config::{DumpConfig, DEFAULT_OUTPUT_ROOT, DEFAULT_SENTINEL};
pub use error::{CatalogueError, ConfigError, FormatError, ReportError};
pub use group::{cbuffer_binding, CbufferBinding, ConstantGroup, GroupTag};
pub use number::{parse_u64_literal, LiteralU32, LiteralU64};
pub use report::{
    dump_shader, sanitize_technique_name, write_artifacts, ArtifactPaths, Report, ReportHeader,
    UndefinedConstant,
};
pub use resolver::{
    KindResolver, KindTable, ResolverRegistry, TableResolver, TechniqueDefines, TechniqueName,
    TechniqueSamplers,
};
pub use shader::{BufferDesc, ConstantOffsets, ShaderInstance};
pub use stage::ShaderStage;
pub use validate::{validate, Defect};

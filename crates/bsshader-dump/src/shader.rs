//! The compiled shader instance a report is generated for.

use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogueError;
use crate::number::{LiteralU32, LiteralU64};
use crate::{ConstantGroup, ShaderStage};

/// Allocation info for one of the shader's constant buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct BufferDesc {
    /// Allocated size in bytes, when the buffer has a backing store.
    #[serde(default)]
    pub byte_width: Option<u32>,
}

impl BufferDesc {
    pub const fn with_byte_width(byte_width: u32) -> Self {
        Self {
            byte_width: Some(byte_width),
        }
    }
}

/// Per-slot offsets into the constant buffers, in 4-byte units.
///
/// Always exactly [`ShaderStage::constant_table_size`] entries long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantOffsets {
    stage: ShaderStage,
    offsets: Vec<u8>,
}

impl ConstantOffsets {
    pub fn new(stage: ShaderStage, offsets: Vec<u8>) -> Result<Self, CatalogueError> {
        let expected = stage.constant_table_size();
        if offsets.len() != expected {
            return Err(CatalogueError::OffsetTableSize {
                stage,
                expected,
                found: offsets.len(),
            });
        }
        Ok(Self { stage, offsets })
    }

    /// Builds a full-size table from a prefix, zero-filling the remaining slots.
    pub fn from_prefix(stage: ShaderStage, prefix: &[u8]) -> Result<Self, CatalogueError> {
        let expected = stage.constant_table_size();
        if prefix.len() > expected {
            return Err(CatalogueError::OffsetTableSize {
                stage,
                expected,
                found: prefix.len(),
            });
        }
        let mut offsets = prefix.to_vec();
        offsets.resize(expected, 0);
        Ok(Self { stage, offsets })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.offsets.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// A compiled shader: identity, constant layout and the verbatim bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInstance {
    kind: String,
    technique: u32,
    input_signature: Option<u64>,
    buffers: [BufferDesc; 3],
    offsets: ConstantOffsets,
    bytecode: Vec<u8>,
}

impl ShaderInstance {
    pub fn new(
        kind: impl Into<String>,
        technique: u32,
        offsets: ConstantOffsets,
        bytecode: Vec<u8>,
    ) -> Self {
        Self {
            kind: kind.into(),
            technique,
            input_signature: None,
            buffers: [BufferDesc::default(); 3],
            offsets,
            bytecode,
        }
    }

    /// Records the hash of the shader's input layout (vertex description).
    pub fn with_input_signature(mut self, signature: u64) -> Self {
        self.input_signature = Some(signature);
        self
    }

    pub fn with_buffer(mut self, group: ConstantGroup, desc: BufferDesc) -> Self {
        self.buffers[group.buffer_index()] = desc;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn stage(&self) -> ShaderStage {
        self.offsets.stage()
    }

    pub fn technique(&self) -> u32 {
        self.technique
    }

    pub fn input_signature(&self) -> Option<u64> {
        self.input_signature
    }

    pub fn buffer(&self, group: ConstantGroup) -> &BufferDesc {
        &self.buffers[group.buffer_index()]
    }

    pub fn offsets(&self) -> &ConstantOffsets {
        &self.offsets
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Loads a JSON descriptor. `bytecode` is resolved relative to the descriptor's directory.
    pub fn load_descriptor(path: &Path) -> Result<Self, CatalogueError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_descriptor(&json, base)
    }

    pub fn parse_descriptor(json: &str, base: &Path) -> Result<Self, CatalogueError> {
        let desc: ShaderDescriptor = serde_json::from_str(json)?;

        let bytecode = match &desc.bytecode {
            Some(file) => {
                let path = base.join(file);
                std::fs::read(&path).map_err(|source| CatalogueError::Io { path, source })?
            }
            None => Vec::new(),
        };

        let offsets = ConstantOffsets::new(desc.stage, desc.constant_offsets)?;
        let mut shader = Self::new(desc.kind, desc.technique.0, offsets, bytecode);
        shader.buffers = desc.buffers;
        shader.input_signature = desc.vertex_description.map(|v| v.0);
        Ok(shader)
    }
}

#[derive(Debug, Deserialize)]
struct ShaderDescriptor {
    kind: String,
    stage: ShaderStage,
    technique: LiteralU32,
    #[serde(default)]
    vertex_description: Option<LiteralU64>,
    /// Per-geometry, per-material, per-technique.
    #[serde(default)]
    buffers: [BufferDesc; 3],
    constant_offsets: Vec<u8>,
    #[serde(default)]
    bytecode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_table_must_match_stage_size() {
        let err = ConstantOffsets::new(ShaderStage::Vertex, vec![0; 19]).unwrap_err();
        assert!(matches!(
            err,
            CatalogueError::OffsetTableSize {
                expected: 20,
                found: 19,
                ..
            }
        ));
        assert_eq!(
            ConstantOffsets::from_prefix(ShaderStage::Pixel, &[1, 2])
                .unwrap()
                .len(),
            64
        );
        assert!(ConstantOffsets::from_prefix(ShaderStage::Vertex, &[0; 21]).is_err());
    }

    #[test]
    fn parses_descriptor_with_bytecode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sky.cso"), [0x44, 0x58, 0x42, 0x43]).unwrap();

        let offsets = serde_json::to_string(&vec![0u8; 20]).unwrap();
        let json = format!(
            r#"{{
              "kind": "Sky",
              "stage": "vertex",
              "technique": "0x1A",
              "vertex_description": "0x380000000000401",
              "buffers": [{{ "byte_width": 128 }}, {{}}, {{ "byte_width": 16 }}],
              "constant_offsets": {offsets},
              "bytecode": "sky.cso"
            }}"#
        );
        let shader = ShaderInstance::parse_descriptor(&json, dir.path()).unwrap();

        assert_eq!(shader.kind(), "Sky");
        assert_eq!(shader.stage(), ShaderStage::Vertex);
        assert_eq!(shader.technique(), 0x1A);
        assert_eq!(shader.input_signature(), Some(0x380000000000401));
        assert_eq!(
            shader.buffer(ConstantGroup::PerGeometry).byte_width,
            Some(128)
        );
        assert_eq!(shader.buffer(ConstantGroup::PerMaterial).byte_width, None);
        assert_eq!(shader.bytecode(), b"DXBC");
    }

    #[test]
    fn missing_bytecode_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{ "kind": "Sky", "stage": "compute", "technique": 0,
                        "constant_offsets": [], "bytecode": "missing.cso" }"#;
        let err = ShaderInstance::parse_descriptor(json, dir.path()).unwrap_err();
        assert!(matches!(err, CatalogueError::Io { .. }));
    }
}

use core::fmt;

use serde::Deserialize;

/// Pipeline stage a compiled shader belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Compute,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 3] = [Self::Vertex, Self::Pixel, Self::Compute];

    /// Number of entries in this stage's constant-offset table.
    ///
    /// Fixed by the layout of the engine's shader objects, not by the shader itself.
    pub const fn constant_table_size(self) -> usize {
        match self {
            Self::Vertex => 20,
            Self::Pixel => 64,
            Self::Compute => 32,
        }
    }

    /// Short tag used in artifact file names (`vs`, `ps`, `cs`).
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Vertex => "vs",
            Self::Pixel => "ps",
            Self::Compute => "cs",
        }
    }

    /// Whether reports for this stage carry a sampler listing.
    pub const fn lists_samplers(self) -> bool {
        matches!(self, Self::Pixel | Self::Compute)
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|stage| {
            name.eq_ignore_ascii_case(stage.as_str())
                || name.eq_ignore_ascii_case(stage.file_suffix())
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Pixel => "pixel",
            Self::Compute => "compute",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Per-shader-kind name resolution.
//!
//! Every shader kind contributes the same four capabilities (constant names, technique names,
//! sampler names and preprocessor defines). They are bundled behind [`KindResolver`] and looked
//! up by kind tag in a [`ResolverRegistry`], so callers never branch on the kind themselves.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::number::LiteralU32;
use crate::ShaderStage;

/// Name tables for one shader kind.
pub trait KindResolver: Send + Sync {
    /// Name of constant slot `index` for `stage`, or `None` past the end of the table.
    fn constant_name(&self, stage: ShaderStage, index: usize) -> Option<&str>;

    /// Display name of `technique`, if the kind knows it.
    fn technique_name(&self, technique: u32) -> Option<String>;

    /// Name bound to sampler slot `slot` when running `technique`.
    fn sampler_name(&self, slot: usize, technique: u32) -> Option<&str>;

    /// Ordered `(macro, value)` pairs active for `technique`.
    fn defines(&self, technique: u32) -> Vec<(String, String)>;
}

/// Case-insensitive map from shader kind tag to its resolver.
#[derive(Default)]
pub struct ResolverRegistry {
    kinds: HashMap<String, Box<dyn KindResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resolver` for `kind`, returning the resolver it replaced.
    pub fn register(
        &mut self,
        kind: &str,
        resolver: impl KindResolver + 'static,
    ) -> Option<Box<dyn KindResolver>> {
        self.kinds.insert(kind.to_ascii_lowercase(), Box::new(resolver))
    }

    pub fn get(&self, kind: &str) -> Option<&dyn KindResolver> {
        self.kinds
            .get(&kind.to_ascii_lowercase())
            .map(|resolver| resolver.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(&kind.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds.keys().collect();
        kinds.sort();
        f.debug_struct("ResolverRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechniqueName {
    pub id: LiteralU32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechniqueDefines {
    pub id: LiteralU32,
    #[serde(default)]
    pub defines: Vec<(String, String)>,
}

/// Sampler table used by techniques where `technique & mask == value`.
#[derive(Debug, Clone, Deserialize)]
pub struct TechniqueSamplers {
    pub mask: LiteralU32,
    pub value: LiteralU32,
    pub samplers: Vec<String>,
}

/// Catalogue description of one shader kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KindTable {
    pub name: String,
    #[serde(default)]
    pub vertex_constants: Vec<String>,
    #[serde(default)]
    pub pixel_constants: Vec<String>,
    #[serde(default)]
    pub compute_constants: Vec<String>,
    #[serde(default)]
    pub samplers: Vec<String>,
    #[serde(default)]
    pub technique_samplers: Vec<TechniqueSamplers>,
    #[serde(default)]
    pub techniques: Vec<TechniqueName>,
    #[serde(default)]
    pub defines: Vec<TechniqueDefines>,
}

/// [`KindResolver`] backed by a [`KindTable`].
#[derive(Debug, Clone)]
pub struct TableResolver {
    table: KindTable,
    techniques: HashMap<u32, String>,
    defines: HashMap<u32, Vec<(String, String)>>,
}

impl TableResolver {
    pub fn new(table: KindTable) -> Self {
        // Later entries win, matching how the catalogue is edited by appending overrides.
        let techniques = table
            .techniques
            .iter()
            .map(|t| (t.id.0, t.name.clone()))
            .collect();
        let defines = table
            .defines
            .iter()
            .map(|d| (d.id.0, d.defines.clone()))
            .collect();
        Self {
            table,
            techniques,
            defines,
        }
    }

    fn constants(&self, stage: ShaderStage) -> &[String] {
        match stage {
            ShaderStage::Vertex => &self.table.vertex_constants,
            ShaderStage::Pixel => &self.table.pixel_constants,
            ShaderStage::Compute => &self.table.compute_constants,
        }
    }

    fn samplers_for(&self, technique: u32) -> &[String] {
        self.table
            .technique_samplers
            .iter()
            .find(|rule| technique & rule.mask.0 == rule.value.0)
            .map_or(&self.table.samplers, |rule| &rule.samplers)
    }
}

impl KindResolver for TableResolver {
    fn constant_name(&self, stage: ShaderStage, index: usize) -> Option<&str> {
        self.constants(stage).get(index).map(String::as_str)
    }

    fn technique_name(&self, technique: u32) -> Option<String> {
        self.techniques.get(&technique).cloned()
    }

    fn sampler_name(&self, slot: usize, technique: u32) -> Option<&str> {
        self.samplers_for(technique).get(slot).map(String::as_str)
    }

    fn defines(&self, technique: u32) -> Vec<(String, String)> {
        self.defines.get(&technique).cloned().unwrap_or_default()
    }
}

//! The constant catalogue: which slot of which shader kind belongs to which group.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::DEFAULT_SENTINEL;
use crate::error::CatalogueError;
use crate::group::GroupTag;
use crate::resolver::{KindResolver, KindTable, ResolverRegistry, TableResolver};
use crate::ShaderStage;

/// One row of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogueEntry {
    pub kind: String,
    pub stage: ShaderStage,
    pub index: usize,
    pub group: GroupTag,
    /// HLSL type to declare instead of `float4`, optionally with an array suffix (`float4[3]`).
    #[serde(default, rename = "type")]
    pub type_override: Option<String>,
}

impl CatalogueEntry {
    pub fn new(
        kind: impl Into<String>,
        stage: ShaderStage,
        index: usize,
        group: impl Into<GroupTag>,
    ) -> Self {
        Self {
            kind: kind.into(),
            stage,
            index,
            group: group.into(),
            type_override: None,
        }
    }

    pub fn with_type(mut self, type_override: impl Into<String>) -> Self {
        self.type_override = Some(type_override.into());
        self
    }
}

/// Result of a successful [`Catalogue::lookup`].
#[derive(Debug, Clone, Copy)]
pub struct CatalogueHit<'a> {
    pub entry: &'a CatalogueEntry,
}

impl CatalogueHit<'_> {
    pub fn group(&self) -> &GroupTag {
        &self.entry.group
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    sentinel: Option<String>,
    #[serde(default)]
    kinds: Vec<KindTable>,
    #[serde(default)]
    entries: Vec<CatalogueEntry>,
}

type SlotKey = (String, ShaderStage, usize);

/// Read-only catalogue of constant mappings plus the per-kind name resolvers.
#[derive(Debug)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
    by_slot: HashMap<SlotKey, usize>,
    resolvers: ResolverRegistry,
    sentinel: String,
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL)
    }
}

impl Catalogue {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            by_slot: HashMap::new(),
            resolvers: ResolverRegistry::new(),
            sentinel: sentinel.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&json)
    }

    pub fn parse_str(json: &str) -> Result<Self, CatalogueError> {
        let file: CatalogueFile = serde_json::from_str(json)?;

        let mut catalogue = Self::new(file.sentinel.unwrap_or_else(|| DEFAULT_SENTINEL.into()));
        for table in file.kinds {
            let name = table.name.clone();
            if catalogue.resolvers.contains(&name) {
                return Err(CatalogueError::DuplicateKind(name));
            }
            catalogue.register_kind(&name, TableResolver::new(table));
        }
        for entry in file.entries {
            catalogue.push_entry(entry);
        }

        tracing::debug!(
            kinds = catalogue.resolvers.len(),
            entries = catalogue.entries.len(),
            "catalogue loaded"
        );
        Ok(catalogue)
    }

    pub fn register_kind(&mut self, kind: &str, resolver: impl KindResolver + 'static) {
        self.resolvers.register(kind, resolver);
    }

    /// Appends a row. Rows keep their table order; a repeated slot is kept for validation but
    /// lookups keep answering with the first row.
    pub fn push_entry(&mut self, entry: CatalogueEntry) {
        let key = (entry.kind.to_ascii_lowercase(), entry.stage, entry.index);
        let position = self.entries.len();
        self.by_slot.entry(key).or_insert(position);
        self.entries.push(entry);
    }

    pub fn set_sentinel(&mut self, sentinel: impl Into<String>) {
        self.sentinel = sentinel.into();
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Whether `name` is the placeholder that terminates a name table.
    pub fn is_sentinel(&self, name: &str) -> bool {
        name.contains(self.sentinel.as_str())
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn resolver(&self, kind: &str) -> Option<&dyn KindResolver> {
        self.resolvers.get(kind)
    }

    pub fn constant_name(&self, kind: &str, stage: ShaderStage, index: usize) -> Option<&str> {
        self.resolver(kind)?.constant_name(stage, index)
    }

    /// Finds the row describing slot `index` of `kind`'s `stage` table.
    ///
    /// `None` is the ordinary "undefined constant" outcome, not an error.
    pub fn lookup(&self, kind: &str, stage: ShaderStage, index: usize) -> Option<CatalogueHit<'_>> {
        let key = (kind.to_ascii_lowercase(), stage, index);
        let entry = &self.entries[*self.by_slot.get(&key)?];
        Some(CatalogueHit { entry })
    }
}

//! Sorting a shader's constant slots into their catalogue groups.

use crate::catalogue::{Catalogue, CatalogueEntry};
use crate::{ConstantGroup, ShaderStage};

/// A populated constant slot and what the catalogue says about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedEntry<'a> {
    pub index: usize,
    pub name: &'a str,
    /// `None` for slots the catalogue has no (usable) row for.
    pub entry: Option<&'a CatalogueEntry>,
}

impl ClassifiedEntry<'_> {
    pub fn type_override(&self) -> Option<&str> {
        self.entry.and_then(|e| e.type_override.as_deref())
    }
}

/// Populated slots split by group, each list in ascending slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification<'a> {
    pub per_geometry: Vec<ClassifiedEntry<'a>>,
    pub per_material: Vec<ClassifiedEntry<'a>>,
    pub per_technique: Vec<ClassifiedEntry<'a>>,
    pub undefined: Vec<ClassifiedEntry<'a>>,
}

impl<'a> Classification<'a> {
    pub fn group(&self, group: ConstantGroup) -> &[ClassifiedEntry<'a>] {
        match group {
            ConstantGroup::PerGeometry => &self.per_geometry,
            ConstantGroup::PerMaterial => &self.per_material,
            ConstantGroup::PerTechnique => &self.per_technique,
        }
    }

    fn group_mut(&mut self, group: ConstantGroup) -> &mut Vec<ClassifiedEntry<'a>> {
        match group {
            ConstantGroup::PerGeometry => &mut self.per_geometry,
            ConstantGroup::PerMaterial => &mut self.per_material,
            ConstantGroup::PerTechnique => &mut self.per_technique,
        }
    }

    /// Number of populated slots across all four lists.
    pub fn len(&self) -> usize {
        self.per_geometry.len()
            + self.per_material.len()
            + self.per_technique.len()
            + self.undefined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walks `kind`'s `stage` slots in index order and classifies each one.
///
/// Scanning stops at the first slot whose name is the catalogue's sentinel placeholder, or
/// where the kind's name table runs out. Slots past that point are never examined.
pub fn classify<'a>(
    catalogue: &'a Catalogue,
    kind: &str,
    stage: ShaderStage,
) -> Classification<'a> {
    classify_until(catalogue, kind, stage, catalogue.sentinel())
}

/// Like [`classify`], but ends the scan at names containing `sentinel` instead of the
/// catalogue's own marker.
pub fn classify_until<'a>(
    catalogue: &'a Catalogue,
    kind: &str,
    stage: ShaderStage,
    sentinel: &str,
) -> Classification<'a> {
    let mut out = Classification::default();

    if catalogue.resolver(kind).is_none() {
        tracing::warn!(kind, "no name tables registered for shader kind");
        return out;
    }

    for index in 0..stage.constant_table_size() {
        let Some(name) = catalogue.constant_name(kind, stage, index) else {
            tracing::warn!(
                kind,
                %stage,
                index,
                "constant name table ends without a sentinel"
            );
            break;
        };
        if name.contains(sentinel) {
            break;
        }

        let hit = catalogue.lookup(kind, stage, index);
        let group = hit.and_then(|hit| hit.group().group());
        match (hit, group) {
            (Some(hit), Some(group)) => {
                tracing::debug!(index, name, %group, "classified constant");
                out.group_mut(group).push(ClassifiedEntry {
                    index,
                    name,
                    entry: Some(hit.entry),
                });
            }
            (Some(hit), None) => {
                tracing::warn!(
                    kind,
                    %stage,
                    index,
                    group = %hit.group(),
                    "catalogue row has an invalid group; treating constant as undefined"
                );
                out.undefined.push(ClassifiedEntry {
                    index,
                    name,
                    entry: None,
                });
            }
            (None, _) => out.undefined.push(ClassifiedEntry {
                index,
                name,
                entry: None,
            }),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupTag;
    use crate::resolver::{KindTable, TableResolver};

    fn catalogue(names: &[&str], rows: Vec<CatalogueEntry>) -> Catalogue {
        let mut catalogue = Catalogue::default();
        catalogue.register_kind(
            "Effect",
            TableResolver::new(KindTable {
                name: "Effect".into(),
                vertex_constants: names.iter().map(|s| s.to_string()).collect(),
                ..KindTable::default()
            }),
        );
        for row in rows {
            catalogue.push_entry(row);
        }
        catalogue
    }

    fn names(entries: &[ClassifiedEntry<'_>]) -> Vec<(usize, String)> {
        entries.iter().map(|e| (e.index, e.name.to_string())).collect()
    }

    #[test]
    fn splits_slots_by_group_and_stops_at_sentinel() {
        let catalogue = catalogue(
            &["Foo", "Bar", "Baz", "Add-your-constants-above", "Late"],
            vec![
                CatalogueEntry::new("Effect", ShaderStage::Vertex, 0, ConstantGroup::PerTechnique),
                CatalogueEntry::new("Effect", ShaderStage::Vertex, 1, ConstantGroup::PerMaterial),
                CatalogueEntry::new("Effect", ShaderStage::Vertex, 4, ConstantGroup::PerGeometry),
            ],
        );

        let classes = classify(&catalogue, "effect", ShaderStage::Vertex);
        assert_eq!(names(&classes.per_technique), vec![(0, "Foo".into())]);
        assert_eq!(names(&classes.per_material), vec![(1, "Bar".into())]);
        assert!(classes.per_geometry.is_empty(), "slot past the sentinel was examined");
        assert_eq!(names(&classes.undefined), vec![(2, "Baz".into())]);
        assert!(classes.undefined[0].entry.is_none());
        assert_eq!(classes.len(), 3);
    }

    #[test]
    fn explicit_sentinel_overrides_the_catalogue_marker() {
        let catalogue = catalogue(&["Foo", "END-MARK", "Bar", "Add-your-"], Vec::new());

        let classes = classify_until(&catalogue, "Effect", ShaderStage::Vertex, "END-MARK");
        assert_eq!(names(&classes.undefined), vec![(0, "Foo".into())]);

        let classes = classify(&catalogue, "Effect", ShaderStage::Vertex);
        assert_eq!(classes.undefined.len(), 3);
    }

    #[test]
    fn invalid_group_rows_become_undefined() {
        let mut row =
            CatalogueEntry::new("Effect", ShaderStage::Vertex, 0, ConstantGroup::PerGeometry);
        row.group = GroupTag::Invalid("PerFrame".into());
        let catalogue = catalogue(&["Foo", "Add-your-"], vec![row]);

        let classes = classify(&catalogue, "Effect", ShaderStage::Vertex);
        assert_eq!(names(&classes.undefined), vec![(0, "Foo".into())]);
        assert_eq!(classes.len(), 1);
    }

    #[test]
    fn name_table_without_sentinel_ends_the_scan() {
        let catalogue = catalogue(&["Foo"], Vec::new());
        let classes = classify(&catalogue, "Effect", ShaderStage::Vertex);
        assert_eq!(names(&classes.undefined), vec![(0, "Foo".into())]);
    }

    #[test]
    fn unknown_kind_yields_nothing() {
        let catalogue = catalogue(&["Foo"], Vec::new());
        assert!(classify(&catalogue, "Water", ShaderStage::Vertex).is_empty());
    }

    #[test]
    fn scan_is_bounded_by_the_stage_table() {
        let many: Vec<String> = (0..40).map(|i| format!("C{i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let catalogue = catalogue(&refs, Vec::new());
        let classes = classify(&catalogue, "Effect", ShaderStage::Vertex);
        assert_eq!(classes.undefined.len(), ShaderStage::Vertex.constant_table_size());
    }
}

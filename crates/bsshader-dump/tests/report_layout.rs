use std::collections::BTreeSet;

use bsshader_dump::{
    Catalogue, CatalogueEntry, ConstantGroup, ConstantOffsets, GroupTag, KindTable, Report,
    ShaderInstance, ShaderStage, TableResolver,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const SENTINEL_NAME: &str = "Add-your-constants-above-this-line";

fn catalogue_for(names: &[String], rows: Vec<CatalogueEntry>) -> Catalogue {
    let mut vertex_constants = names.to_vec();
    vertex_constants.push(SENTINEL_NAME.to_string());

    let mut catalogue = Catalogue::default();
    catalogue.register_kind(
        "Lighting",
        TableResolver::new(KindTable {
            name: "Lighting".into(),
            vertex_constants,
            ..KindTable::default()
        }),
    );
    for row in rows {
        catalogue.push_entry(row);
    }
    catalogue
}

fn field_names(report: &Report, group: ConstantGroup) -> Vec<(String, String)> {
    report
        .block(group)
        .map(|block| {
            block
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.pack.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn scan_stops_at_sentinel_and_routes_unmapped_slots_to_undefined() {
    let names = ["Foo", "Bar", "Baz"].map(String::from);
    let catalogue = catalogue_for(
        &names,
        vec![
            CatalogueEntry::new("Lighting", ShaderStage::Vertex, 0, ConstantGroup::PerTechnique),
            CatalogueEntry::new("Lighting", ShaderStage::Vertex, 1, ConstantGroup::PerMaterial),
        ],
    );
    let offsets = ConstantOffsets::from_prefix(ShaderStage::Vertex, &[0, 4, 8, 255]).unwrap();
    let shader = ShaderInstance::new("Lighting", 0x1, offsets, Vec::new());

    let report = Report::assemble(&catalogue, &shader).unwrap();

    assert_eq!(
        field_names(&report, ConstantGroup::PerTechnique),
        vec![("Foo".to_string(), "packoffset(c0)".to_string())]
    );
    assert_eq!(
        field_names(&report, ConstantGroup::PerMaterial),
        vec![("Bar".to_string(), "packoffset(c1)".to_string())]
    );
    assert!(field_names(&report, ConstantGroup::PerGeometry).is_empty());

    assert_eq!(report.undefined.len(), 1);
    assert_eq!(report.undefined[0].index, 2);
    assert_eq!(report.undefined[0].name, "Baz");
    assert_eq!(report.undefined[0].offset, 8);

    let text = report.to_string();
    assert!(text.contains("// UNDEFINED PARAMETER: Index: 02 Offset: 0x0020 Name: Baz"));
    assert!(!text.contains(SENTINEL_NAME));
}

fn group_tag(choice: u8) -> Option<GroupTag> {
    match choice {
        0 => Some(ConstantGroup::PerGeometry.into()),
        1 => Some(ConstantGroup::PerMaterial.into()),
        2 => Some(ConstantGroup::PerTechnique.into()),
        3 => Some(GroupTag::Invalid("PerFrame".into())),
        _ => None,
    }
}

proptest! {
    #[test]
    fn every_populated_slot_is_reported_exactly_once(
        slots in prop::collection::vec((0u8..5, any::<u8>()), 1..=20),
    ) {
        let names: Vec<String> = (0..slots.len()).map(|i| format!("Constant{i}")).collect();
        let rows = slots
            .iter()
            .enumerate()
            .filter_map(|(index, &(choice, _))| {
                group_tag(choice)
                    .map(|tag| CatalogueEntry::new("Lighting", ShaderStage::Vertex, index, tag))
            })
            .collect();
        let catalogue = catalogue_for(&names, rows);

        let prefix: Vec<u8> = slots.iter().map(|&(_, offset)| offset).collect();
        let offsets = ConstantOffsets::from_prefix(ShaderStage::Vertex, &prefix).unwrap();
        let shader = ShaderInstance::new("Lighting", 0, offsets, Vec::new());

        let report = Report::assemble(&catalogue, &shader).unwrap();

        let mut seen = Vec::new();
        for (_, block) in &report.blocks {
            seen.extend(block.fields.iter().map(|field| field.index));
        }
        seen.extend(report.undefined.iter().map(|entry| entry.index));

        let unique: BTreeSet<usize> = seen.iter().copied().collect();
        prop_assert_eq!(unique.len(), seen.len());
        prop_assert_eq!(unique, (0..slots.len()).collect::<BTreeSet<_>>());
    }
}

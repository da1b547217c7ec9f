//! Integration test: end-to-end export scenarios.
//!
//! Each test builds or imports a project, runs it through the full
//! export path (keys, validation, compile, assembly), and inspects either
//! the resulting archive or the aggregated refusal.

use jokerforge_core::identifiers::{SequentialIds, assign_identifiers, engine_keys};
use jokerforge_core::model::{Effect, Rule};
use jokerforge_core::test_utils::*;
use jokerforge_core::{ObjectId, Problem, Trigger};
use jokerforge_data::{ExportConfig, import_project};
use jokerforge_package::{AssetBundle, ExportError, export_mod};
use std::io::{Cursor, Read};

fn read_entry(bytes: &[u8], path: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut out = String::new();
    archive.by_name(path).unwrap().read_to_string(&mut out).unwrap();
    out
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[test]
fn single_object_gets_prefixed_slug_key() {
    let mut p = empty_project();
    p.add_object(lucky_charm("j1"));
    assert_eq!(engine_keys(&p), ["mc_lucky_charm"]);

    let exported = export_mod(&p, &AssetBundle::new(), &ExportConfig::default()).unwrap();
    let jokers = read_entry(&exported.bytes, "src/jokers.lua");
    assert!(jokers.contains("key = \"lucky_charm\","));
    assert!(jokers.contains("local function mc_lucky_charm__hand_played(self, card, context)"));
}

#[test]
fn duplicated_names_get_distinct_keys() {
    let mut p = empty_project();
    p.add_object(lucky_charm("j1"));
    let copy = p
        .duplicate_object(&ObjectId::new("j1"), &mut SequentialIds::new("dup"))
        .unwrap();
    assert_eq!(engine_keys(&p), ["mc_lucky_charm", "mc_lucky_charm_2"]);

    let keyed = assign_identifiers(p, &mut SequentialIds::new("unused"));
    assert_eq!(keyed.object(&copy).unwrap().key, "lucky_charm_2");

    let exported = export_mod(&keyed, &AssetBundle::new(), &ExportConfig::default()).unwrap();
    let jokers = read_entry(&exported.bytes, "src/jokers.lua");
    assert!(jokers.contains("key = \"lucky_charm\","));
    assert!(jokers.contains("key = \"lucky_charm_2\","));
}

#[test]
fn deleted_reference_fails_only_its_owner() {
    let mut p = empty_project();
    p.add_object(lucky_charm("j1"));
    p.add_object(joker("j2", "Summoner").with_rule(
        Rule::new(Trigger::RoundEnd).then(Effect::new("create_joker").with("joker", "j3")),
    ));
    p.add_object(joker("j3", "Target"));
    p.add_object(tarot("c1", "Fortune"));
    p.remove_object(&ObjectId::new("j3")).unwrap();

    let err = export_mod(&p, &AssetBundle::new(), &ExportConfig::default()).unwrap_err();
    let ExportError::Rejected(report) = err else {
        panic!("expected a rejected export");
    };
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].object_id(), Some(&ObjectId::new("j2")));
    assert!(matches!(
        &report.errors[0].problem,
        Problem::UnresolvedReference { target, .. } if target == "j3"
    ));
    let compiled: Vec<_> = report.compiled.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(compiled, ["j1", "c1"]);

    let text = report.to_string();
    assert!(text.contains("Summoner"));
    assert!(text.contains("Lucky Charm"));
    assert!(text.contains("Fortune"));
}

#[test]
fn missing_consumable_sets_import_as_empty() {
    let text = r#"{
        "formatVersion": 2,
        "metadata": { "id": "MyCollection", "name": "My Collection", "author": ["Tester"], "prefix": "mc" },
        "jokers": [],
        "consumables": [],
        "rarities": []
    }"#;
    let p = import_project(text).unwrap();
    assert!(p.consumable_sets.is_empty());
    assert!(p.vouchers.is_empty());
}

#[test]
fn full_project_archive_layout() {
    let p = full_project();
    let exported = export_mod(&p, &AssetBundle::new(), &ExportConfig::default()).unwrap();
    assert_eq!(
        entry_names(&exported.bytes),
        [
            "MyCollection.json",
            "main.lua",
            "config.lua",
            "src/helpers.lua",
            "src/rarities.lua",
            "src/consumable_sets.lua",
            "src/jokers.lua",
            "src/consumables.lua",
            "src/boosters.lua",
            "src/enhancements.lua",
            "src/seals.lua",
            "src/editions.lua",
            "src/vouchers.lua",
            "project.jokerforge.json",
        ]
    );

    let main = read_entry(&exported.bytes, "main.lua");
    let rarities = main.find("src/rarities.lua").unwrap();
    let jokers = main.find("src/jokers.lua").unwrap();
    assert!(rarities < jokers);

    assert!(read_entry(&exported.bytes, "src/rarities.lua").contains("key = \"mc_mythic\","));
    assert!(read_entry(&exported.bytes, "src/jokers.lua").contains("rarity = \"mc_mythic\","));

    let manifest: serde_json::Value =
        serde_json::from_str(&read_entry(&exported.bytes, "MyCollection.json")).unwrap();
    assert_eq!(manifest["prefix"], "mc");
}

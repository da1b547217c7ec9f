//! Property-based tests for key assignment and compiler determinism.
//!
//! Uses proptest to generate projects with colliding, empty, and unicode
//! names, then verifies the identifier and compiler invariants hold.

use jokerforge_core::compile;
use jokerforge_core::identifiers::{KeyTable, SequentialIds, assign_identifiers, slugify};
use jokerforge_core::model::GameObject;
use jokerforge_core::nodes::NodeRegistry;
use jokerforge_core::test_utils::*;
use jokerforge_core::{ObjectKind, Project};
use proptest::prelude::*;
use std::collections::HashSet;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Lucky Charm".to_string()),
        Just("lucky charm".to_string()),
        Just("Lucky-Charm!".to_string()),
        Just(String::new()),
        Just("???".to_string()),
        Just("Épée".to_string()),
        "[A-Za-z ]{1,12}",
    ]
}

fn arb_kind() -> impl Strategy<Value = ObjectKind> {
    (0..ObjectKind::ALL.len()).prop_map(|i| ObjectKind::ALL[i])
}

fn arb_project(max: usize) -> impl Strategy<Value = Project> {
    proptest::collection::vec((arb_kind(), arb_name()), 0..=max).prop_map(|objects| {
        let mut p = empty_project();
        for (i, (kind, name)) in objects.into_iter().enumerate() {
            p.add_object(GameObject::new(kind, &name).with_id(&format!("o{i}")));
        }
        p
    })
}

fn assigned(p: Project) -> Project {
    assign_identifiers(p, &mut SequentialIds::new("gen"))
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Keys are unique across every kind.
    #[test]
    fn keys_are_unique(p in arb_project(40)) {
        let table = KeyTable::derive(&p);
        let keys: HashSet<_> = table.entries().iter().map(|e| e.key.key.clone()).collect();
        prop_assert_eq!(keys.len(), table.len());
    }

    /// Running assignment twice changes nothing.
    #[test]
    fn assignment_is_idempotent(p in arb_project(30)) {
        let once = assigned(p);
        let twice = assigned(once.clone());
        prop_assert_eq!(once, twice);
    }

    /// Appending an object never changes an existing key.
    #[test]
    fn appending_keeps_existing_keys(p in arb_project(30), name in arb_name()) {
        let before = assigned(p);
        let mut grown = before.clone();
        grown.add_object(GameObject::new(ObjectKind::Joker, &name).with_id("appended"));
        let after = assigned(grown);
        for object in before.objects() {
            let same = after.object(&object.id).map(|o| o.key.clone());
            prop_assert_eq!(Some(object.key.clone()), same);
        }
    }

    /// Inserting at the front of a collection never steals a stored key.
    #[test]
    fn front_insertion_keeps_existing_keys(p in arb_project(30), name in arb_name()) {
        let before = assigned(p);
        let mut grown = before.clone();
        grown.jokers.insert(0, GameObject::new(ObjectKind::Joker, &name).with_id("front"));
        let after = assigned(grown);
        for object in before.objects() {
            let same = after.object(&object.id).map(|o| o.key.clone());
            prop_assert_eq!(Some(object.key.clone()), same);
        }
    }

    /// Keys are lowercase slugs usable as Lua identifiers.
    #[test]
    fn keys_are_identifier_safe(p in arb_project(30)) {
        for entry in KeyTable::derive(&p).entries() {
            let key = &entry.key.key;
            prop_assert!(!key.is_empty());
            prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }
    }

    /// Slugs never start or end with a separator.
    #[test]
    fn slugs_are_trimmed(name in ".{0,24}") {
        let slug = slugify(&name);
        prop_assert!(!slug.starts_with('_'));
        prop_assert!(!slug.ends_with('_'));
        prop_assert!(!slug.contains("__"));
    }

    /// Compiling the same project twice gives identical files.
    #[test]
    fn compile_is_deterministic(count in 1usize..40) {
        let project = large_project(count);
        let nodes = NodeRegistry::builtin();
        let a = compile(&project, &nodes).unwrap();
        let b = compile(&project.clone(), &nodes).unwrap();
        prop_assert_eq!(a, b);
    }
}

//! Project to Lua compiler.
//!
//! [`compile`] validates the whole project and lowers every object whose
//! checks pass. Any problem anywhere refuses the compile as a whole; the
//! refusal still lists the objects that compiled cleanly.
//!
//! Output is deterministic: objects are visited in canonical kind order,
//! rules keep their authored order, and helpers are emitted in a fixed
//! order, so the same project always yields byte-identical files.

pub mod lua;
pub mod objects;

use crate::diagnostic::{Diagnostic, ExportReport, ObjectLabel, Subject};
use crate::id::ObjectKind;
use crate::identifiers::KeyTable;
use crate::nodes::{NodeRegistry, helpers};
use crate::project::Project;
use crate::validation::{check_object, duplicate_ids, validate_metadata, validate_taxonomies};
use crate::xref::CrossRefs;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const HELPERS_FILE: &str = "src/helpers.lua";
pub const RARITIES_FILE: &str = "src/rarities.lua";
pub const CONSUMABLE_SETS_FILE: &str = "src/consumable_sets.lua";

/// Archive path of the generated file for an object kind.
pub fn kind_file(kind: ObjectKind) -> String {
    format!("src/{}.lua", kind.collection())
}

/// One generated Lua file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub contents: String,
}

/// Everything the compiler produced for one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledMod {
    /// Non-empty files in load order: helpers, taxonomies, then kinds.
    pub files: Vec<SourceFile>,
    /// Compiled objects in canonical order.
    pub objects: Vec<ObjectLabel>,
    /// Kinds with at least one object drawing from a sprite atlas.
    pub atlas_kinds: BTreeSet<ObjectKind>,
}

impl CompiledMod {
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.contents.as_str())
    }
}

/// Validate and compile `project` against the node kinds in `nodes`.
pub fn compile(project: &Project, nodes: &NodeRegistry) -> Result<CompiledMod, ExportReport> {
    let keys = KeyTable::derive(project);
    let refs = CrossRefs::build(project, &keys, nodes);

    let mut errors: Vec<Diagnostic> = validate_metadata(&project.metadata);
    errors.extend(validate_taxonomies(project));
    errors.extend(duplicate_ids(project));

    let mut compiled = Vec::new();
    let mut sections: BTreeMap<ObjectKind, Vec<String>> = BTreeMap::new();
    let mut used_helpers: BTreeSet<&'static str> = BTreeSet::new();
    let mut file_helpers: BTreeSet<ObjectKind> = BTreeSet::new();
    let mut atlas_kinds = BTreeSet::new();

    for (index, object) in project.objects().enumerate() {
        let label = ObjectLabel::of(object);
        let rules = match check_object(object, &refs, nodes) {
            Ok(rules) => rules,
            Err(problems) => {
                errors.extend(problems);
                continue;
            }
        };
        let Some(key) = keys.key_at(index) else {
            continue;
        };
        match objects::render_object(object, key, &rules, &refs) {
            Ok(source) => {
                debug!(object = %label, key = %key, rules = rules.len(), "compiled object");
                if !source.helpers.is_empty() {
                    file_helpers.insert(object.kind());
                }
                used_helpers.extend(source.helpers);
                if object.sprite.is_some() {
                    atlas_kinds.insert(object.kind());
                }
                sections.entry(object.kind()).or_default().push(source.code);
                compiled.push(label);
            }
            Err(problem) => errors.push(Diagnostic::new(Subject::Object(label), problem)),
        }
    }

    if !errors.is_empty() {
        return Err(ExportReport {
            errors,
            compiled,
        });
    }

    let mut files = Vec::new();
    if !used_helpers.is_empty() {
        files.push(SourceFile {
            path: HELPERS_FILE.to_string(),
            contents: helpers::render(&used_helpers),
        });
    }

    let rarities: Vec<String> = project
        .rarities
        .iter()
        .filter_map(|r| {
            keys.rarity_key(&r.id)
                .map(|k| objects::render_rarity(r, &format!("{}_{k}", keys.prefix())))
        })
        .collect();
    if !rarities.is_empty() {
        files.push(SourceFile {
            path: RARITIES_FILE.to_string(),
            contents: rarities.join("\n"),
        });
    }

    let sets: Vec<String> = project
        .consumable_sets
        .iter()
        .filter_map(|s| {
            keys.consumable_set_key(&s.id)
                .map(|k| objects::render_consumable_set(s, &format!("{}_{k}", keys.prefix())))
        })
        .collect();
    if !sets.is_empty() {
        files.push(SourceFile {
            path: CONSUMABLE_SETS_FILE.to_string(),
            contents: sets.join("\n"),
        });
    }

    for kind in ObjectKind::ALL {
        let Some(blocks) = sections.remove(&kind) else {
            continue;
        };
        let mut contents = String::new();
        if file_helpers.contains(&kind) {
            contents.push_str(&objects::helper_binding());
            contents.push_str("\n\n");
        }
        contents.push_str(&blocks.join("\n"));
        files.push(SourceFile {
            path: kind_file(kind),
            contents,
        });
    }

    Ok(CompiledMod {
        files,
        objects: compiled,
        atlas_kinds,
    })
}

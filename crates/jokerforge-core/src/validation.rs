//! Export-time validation.
//!
//! Checks mod metadata, taxonomies and every object, collecting all
//! problems instead of stopping at the first. Checking an object also binds
//! its rule nodes, and the compiler consumes those [`BoundRule`]s directly.

use crate::diagnostic::{Diagnostic, Location, NodeRole, ObjectLabel, Problem, Subject};
use crate::id::{ObjectId, ObjectKind};
use crate::model::{BoosterPool, GameObject, KindData, ModMetadata, Params, Rule};
use crate::nodes::{Args, NodeRegistry, NodeSpec};
use crate::project::Project;
use crate::trigger::Trigger;
use crate::xref::CrossRefs;
use std::collections::BTreeMap;

/// A rule node whose parameters passed every check.
#[derive(Debug, Clone)]
pub struct BoundNode<'r> {
    pub spec: &'r NodeSpec,
    pub args: Args,
    pub negate: bool,
}

/// A rule ready for lowering.
#[derive(Debug, Clone)]
pub struct BoundRule<'r> {
    pub trigger: Trigger,
    pub conditions: Vec<BoundNode<'r>>,
    pub effects: Vec<BoundNode<'r>>,
}

/// `^[A-Za-z][A-Za-z0-9_]*$`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Six hex digits, no leading `#`.
pub fn is_hex_colour(s: &str) -> bool {
    s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// A relative archive path: `/`-separated, no empty, `.` or `..`
/// components, no backslashes or drive colons.
pub fn is_archive_path(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(['\\', ':'])
        && s.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
}

/// An image name, used as a single file stem under `assets/1x` and `assets/2x`.
pub fn is_image_name(s: &str) -> bool {
    is_archive_path(s) && !s.contains('/')
}

fn field(field: &'static str, reason: impl Into<String>) -> Problem {
    Problem::InvalidField {
        field,
        reason: reason.into(),
    }
}

fn check_colour(out: &mut Vec<Problem>, name: &'static str, value: &str) {
    if !is_hex_colour(value) {
        out.push(field(name, format!("'{value}' is not a 6-digit hex colour")));
    }
}

fn check_finite(out: &mut Vec<Problem>, name: &'static str, value: f64) {
    if !value.is_finite() {
        out.push(field(name, format!("{value} is not a finite number")));
    }
}

fn check_weight(out: &mut Vec<Problem>, name: &'static str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        out.push(field(name, format!("{value} must be a non-negative number")));
    }
}

// ===========================================================================
// Metadata and taxonomies
// ===========================================================================

pub fn validate_metadata(meta: &ModMetadata) -> Vec<Diagnostic> {
    let mut problems = Vec::new();
    if meta.name.trim().is_empty() {
        problems.push(Problem::MissingName);
    }
    if !meta.author.iter().any(|a| !a.trim().is_empty()) {
        problems.push(field("author", "at least one author is required"));
    }
    if !is_identifier(&meta.id) {
        problems.push(field(
            "id",
            format!("'{}' must start with a letter and contain only letters, digits and '_'", meta.id),
        ));
    }
    if !is_identifier(&meta.prefix) {
        problems.push(field(
            "prefix",
            format!("'{}' must start with a letter and contain only letters, digits and '_'", meta.prefix),
        ));
    }
    if meta.version.trim().is_empty() {
        problems.push(field("version", "version is empty"));
    }
    if !meta.main_file.ends_with(".lua") {
        problems.push(field("mainFile", format!("'{}' is not a .lua file", meta.main_file)));
    } else if !is_archive_path(&meta.main_file) {
        problems.push(field(
            "mainFile",
            format!("'{}' must be a relative path inside the mod", meta.main_file),
        ));
    }
    for (name, image) in [("iconImage", &meta.icon_image), ("gameImage", &meta.game_image)] {
        if let Some(image) = image.as_deref().filter(|i| !is_image_name(i)) {
            problems.push(field(name, format!("'{image}' is not a plain image name")));
        }
    }
    check_colour(&mut problems, "badgeColour", &meta.badge_colour);
    check_colour(&mut problems, "badgeTextColour", &meta.badge_text_colour);

    problems
        .into_iter()
        .map(|p| Diagnostic::new(Subject::Metadata, p))
        .collect()
}

pub fn validate_taxonomies(project: &Project) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for rarity in &project.rarities {
        let subject = Subject::Rarity {
            id: rarity.id.clone(),
            name: rarity.name.clone(),
        };
        let mut problems = Vec::new();
        if rarity.name.trim().is_empty() {
            problems.push(Problem::MissingName);
        }
        check_colour(&mut problems, "badgeColour", &rarity.badge_colour);
        check_weight(&mut problems, "defaultWeight", rarity.default_weight);
        out.extend(problems.into_iter().map(|p| Diagnostic::new(subject.clone(), p)));
    }
    for set in &project.consumable_sets {
        let subject = Subject::ConsumableSet {
            id: set.id.clone(),
            name: set.name.clone(),
        };
        let mut problems = Vec::new();
        if set.name.trim().is_empty() {
            problems.push(Problem::MissingName);
        }
        check_colour(&mut problems, "primaryColour", &set.primary_colour);
        check_colour(&mut problems, "secondaryColour", &set.secondary_colour);
        check_weight(&mut problems, "shopRate", set.shop_rate);
        out.extend(problems.into_iter().map(|p| Diagnostic::new(subject.clone(), p)));
    }
    out
}

// ===========================================================================
// Objects
// ===========================================================================

fn check_static_fields(object: &GameObject, refs: &CrossRefs) -> Vec<Problem> {
    let mut problems = Vec::new();
    match &object.data {
        KindData::Joker(joker) => {
            if let Err(p) = refs.resolve_rarity(&joker.rarity) {
                problems.push(p);
            }
        }
        KindData::Consumable(card) => {
            if let Err(p) = refs.resolve_set(&card.set) {
                problems.push(p);
            }
        }
        KindData::Booster(booster) => {
            match &booster.pool {
                BoosterPool::Joker { rarity: Some(rarity) } => {
                    if let Err(p) = refs.resolve_rarity(rarity) {
                        problems.push(p);
                    }
                }
                BoosterPool::Consumable { set } => {
                    if let Err(p) = refs.resolve_set(set) {
                        problems.push(p);
                    }
                }
                BoosterPool::Specific { objects } => {
                    if objects.is_empty() {
                        problems.push(field("pool", "a specific pool needs at least one object"));
                    }
                    for id in objects {
                        if refs.object(id).is_none() {
                            problems.push(Problem::UnresolvedReference {
                                target: id.to_string(),
                                expected: "object",
                            });
                        }
                    }
                }
                BoosterPool::Joker { rarity: None } | BoosterPool::PlayingCard => {}
            }
            if booster.choose == 0 {
                problems.push(field("choose", "must be at least 1"));
            }
            if booster.choose > booster.extra {
                problems.push(field(
                    "choose",
                    format!("{} exceeds the {} cards shown", booster.choose, booster.extra),
                ));
            }
            check_weight(&mut problems, "weight", booster.weight);
        }
        KindData::Enhancement(enh) => {
            check_finite(&mut problems, "bonusChips", enh.bonus_chips);
            check_finite(&mut problems, "bonusMult", enh.bonus_mult);
            check_weight(&mut problems, "weight", enh.weight);
            check_weight(&mut problems, "xMult", enh.x_mult);
        }
        KindData::Seal(seal) => check_colour(&mut problems, "badgeColour", &seal.badge_colour),
        KindData::Edition(edition) => {
            check_finite(&mut problems, "chips", edition.chips);
            check_finite(&mut problems, "mult", edition.mult);
            check_weight(&mut problems, "weight", edition.weight);
            check_weight(&mut problems, "xMult", edition.x_mult);
        }
        KindData::Voucher(voucher) => {
            for id in &voucher.requires {
                if id == &object.id {
                    problems.push(field("requires", "a voucher cannot require itself"));
                } else if let Err(p) = refs.resolve_object(id.as_str(), ObjectKind::Voucher) {
                    problems.push(p);
                }
            }
        }
    }
    problems
}

fn bind_node<'r>(
    nodes: &'r NodeRegistry,
    role: NodeRole,
    kind: &str,
    params: &Params,
    trigger: Trigger,
    refs: &CrossRefs,
) -> Result<(&'r NodeSpec, Args), Vec<Problem>> {
    let spec = nodes.get(role, kind).ok_or_else(|| {
        vec![Problem::UnknownNodeKind {
            role,
            name: kind.to_string(),
        }]
    })?;
    let mut problems: Vec<Problem> = spec.check_trigger(trigger).into_iter().collect();
    match spec.bind(params, refs) {
        Ok(args) => {
            if problems.is_empty() {
                if let Some(validator) = spec.validator {
                    if let Err(p) = validator(&args, trigger) {
                        problems.push(p);
                    }
                }
            }
            if problems.is_empty() {
                Ok((spec, args))
            } else {
                Err(problems)
            }
        }
        Err(mut bind_problems) => {
            problems.append(&mut bind_problems);
            Err(problems)
        }
    }
}

fn bind_rule<'r>(
    kind: ObjectKind,
    index: usize,
    rule: &Rule,
    nodes: &'r NodeRegistry,
    refs: &CrossRefs,
    out: &mut Vec<(Option<Location>, Problem)>,
) -> Option<BoundRule<'r>> {
    let before = out.len();
    if rule.trigger == Trigger::Unknown {
        out.push((Some(Location::rule(index)), Problem::UnknownTrigger));
    } else if !rule.trigger.allowed_for(kind) {
        out.push((
            Some(Location::rule(index)),
            Problem::TriggerNotAllowed {
                trigger: rule.trigger,
                kind,
            },
        ));
    }

    let mut bound = BoundRule {
        trigger: rule.trigger,
        conditions: Vec::with_capacity(rule.conditions.len()),
        effects: Vec::with_capacity(rule.effects.len()),
    };
    for (i, condition) in rule.conditions.iter().enumerate() {
        let role = NodeRole::Condition;
        match bind_node(nodes, role, &condition.kind, &condition.params, rule.trigger, refs) {
            Ok((spec, args)) => bound.conditions.push(BoundNode {
                spec,
                args,
                negate: condition.negate,
            }),
            Err(problems) => out.extend(
                problems
                    .into_iter()
                    .map(|p| (Some(Location::node(index, role, i)), p)),
            ),
        }
    }
    for (i, effect) in rule.effects.iter().enumerate() {
        let role = NodeRole::Effect;
        match bind_node(nodes, role, &effect.kind, &effect.params, rule.trigger, refs) {
            Ok((spec, args)) => bound.effects.push(BoundNode {
                spec,
                args,
                negate: false,
            }),
            Err(problems) => out.extend(
                problems
                    .into_iter()
                    .map(|p| (Some(Location::node(index, role, i)), p)),
            ),
        }
    }

    (out.len() == before).then_some(bound)
}

/// Check one object and bind its rules. Returns every problem found.
pub fn check_object<'r>(
    object: &GameObject,
    refs: &CrossRefs,
    nodes: &'r NodeRegistry,
) -> Result<Vec<BoundRule<'r>>, Vec<Diagnostic>> {
    let mut found: Vec<(Option<Location>, Problem)> = Vec::new();
    if object.name.trim().is_empty() {
        found.push((None, Problem::MissingName));
    }
    if object.id.is_empty() {
        found.push((None, Problem::MissingId));
    }
    found.extend(check_static_fields(object, refs).into_iter().map(|p| (None, p)));

    let kind = object.kind();
    let mut rules = Vec::with_capacity(object.rules.len());
    for (index, rule) in object.rules.iter().enumerate() {
        if let Some(bound) = bind_rule(kind, index, rule, nodes, refs, &mut found) {
            rules.push(bound);
        }
    }

    if found.is_empty() {
        Ok(rules)
    } else {
        let label = ObjectLabel::of(object);
        Err(found
            .into_iter()
            .map(|(location, problem)| Diagnostic {
                subject: Subject::Object(label.clone()),
                location,
                problem,
            })
            .collect())
    }
}

/// Objects sharing an id with an earlier object.
pub fn duplicate_ids(project: &Project) -> Vec<Diagnostic> {
    let mut seen: BTreeMap<&ObjectId, usize> = BTreeMap::new();
    let mut out = Vec::new();
    for object in project.objects().filter(|o| !o.id.is_empty()) {
        let count = seen.entry(&object.id).or_default();
        *count += 1;
        if *count == 2 {
            out.push(Diagnostic::new(
                Subject::Object(ObjectLabel::of(object)),
                Problem::DuplicateId(object.id.clone()),
            ));
        }
    }
    out
}

/// Every problem in the project, without compiling.
pub fn validate_project(project: &Project, refs: &CrossRefs, nodes: &NodeRegistry) -> Vec<Diagnostic> {
    let mut out = validate_metadata(&project.metadata);
    out.extend(validate_taxonomies(project));
    out.extend(duplicate_ids(project));
    for object in project.objects() {
        if let Err(errors) = check_object(object, refs, nodes) {
            out.extend(errors);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::KeyTable;
    use crate::model::{
        Condition, EditionData, Effect, EnhancementData, JokerData, RarityRef, VoucherData,
    };

    fn metadata() -> ModMetadata {
        ModMetadata {
            id: "MyCollection".to_string(),
            name: "My Collection".to_string(),
            author: vec!["Someone".to_string()],
            prefix: "mc".to_string(),
            ..ModMetadata::default()
        }
    }

    fn check(p: &Project) -> Vec<Diagnostic> {
        let nodes = NodeRegistry::builtin();
        let refs = CrossRefs::build(p, &KeyTable::derive(p), &nodes);
        validate_project(p, &refs, &nodes)
    }

    #[test]
    fn identifiers_and_colours() {
        assert!(is_identifier("mc"));
        assert!(is_identifier("My_Mod2"));
        assert!(!is_identifier("2mod"));
        assert!(!is_identifier("my-mod"));
        assert!(!is_identifier(""));
        assert!(is_hex_colour("FFaa00"));
        assert!(!is_hex_colour("#FFAA00"));
        assert!(!is_hex_colour("FFF"));
    }

    #[test]
    fn archive_paths_stay_inside_the_mod() {
        assert!(is_archive_path("main.lua"));
        assert!(is_archive_path("src/entry.lua"));
        assert!(!is_archive_path("../main.lua"));
        assert!(!is_archive_path("/etc/main.lua"));
        assert!(!is_archive_path("src//main.lua"));
        assert!(!is_archive_path("C:main.lua"));
        assert!(!is_archive_path("src\\main.lua"));
        assert!(is_image_name("icon"));
        assert!(!is_image_name("art/icon"));
        assert!(!is_image_name(".."));
    }

    #[test]
    fn escaping_file_names_are_rejected() {
        let meta = ModMetadata {
            main_file: "../../outside.lua".to_string(),
            icon_image: Some("../icon".to_string()),
            game_image: Some("logo".to_string()),
            ..metadata()
        };
        let fields: Vec<_> = validate_metadata(&meta)
            .into_iter()
            .map(|d| match d.problem {
                Problem::InvalidField { field, .. } => field,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(fields, ["mainFile", "iconImage"]);
    }

    #[test]
    fn non_finite_bonuses_are_rejected() {
        let mut p = Project::new(metadata());
        let mut glass = GameObject::new(ObjectKind::Enhancement, "Glass").with_id("e1");
        glass.data = KindData::Enhancement(EnhancementData {
            bonus_chips: f64::NAN,
            ..EnhancementData::default()
        });
        p.add_object(glass);
        let mut foil = GameObject::new(ObjectKind::Edition, "Foil").with_id("d1");
        foil.data = KindData::Edition(EditionData {
            mult: f64::INFINITY,
            ..EditionData::default()
        });
        p.add_object(foil);

        let errors = check(&p);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0].problem, Problem::InvalidField { field: "bonusChips", .. }));
        assert!(matches!(errors[1].problem, Problem::InvalidField { field: "mult", .. }));
    }

    #[test]
    fn metadata_problems_are_all_reported() {
        let meta = ModMetadata {
            badge_colour: "red".to_string(),
            ..ModMetadata::default()
        };
        let problems = validate_metadata(&meta);
        // name, author, id, prefix, badge colour
        assert_eq!(problems.len(), 5);
        assert!(problems.iter().all(|d| d.subject == Subject::Metadata));
    }

    #[test]
    fn clean_project_has_no_problems() {
        let mut p = Project::new(metadata());
        p.add_object(
            GameObject::new(ObjectKind::Joker, "Lucky Charm")
                .with_id("j1")
                .with_rule(
                    Rule::new(Trigger::HandPlayed)
                        .when(Condition::new("hand_type").with("hand", "Flush"))
                        .then(Effect::new("add_mult").with("amount", 4.0)),
                ),
        );
        assert!(check(&p).is_empty(), "{:?}", check(&p));
    }

    #[test]
    fn every_broken_object_is_reported() {
        let mut p = Project::new(metadata());
        p.add_object(GameObject::new(ObjectKind::Joker, "").with_id("j1"));
        p.add_object(
            GameObject::new(ObjectKind::Joker, "Dragon")
                .with_id("j2")
                .with_rule(
                    Rule::new(Trigger::HandPlayed).then(Effect::new("summon_dragon")),
                ),
        );
        p.add_object(GameObject::new(ObjectKind::Joker, "Fine").with_id("j3"));
        let errors = check(&p);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].problem, Problem::MissingName);
        assert_eq!(errors[1].location, Some(Location::node(0, NodeRole::Effect, 0)));
    }

    #[test]
    fn one_object_collects_every_node_problem() {
        let mut p = Project::new(metadata());
        p.add_object(
            GameObject::new(ObjectKind::Joker, "Messy")
                .with_id("j1")
                .with_rule(
                    Rule::new(Trigger::BlindSelected)
                        .when(Condition::new("card_suit").with("suit", "Hearts"))
                        .then(Effect::new("add_chips"))
                        .then(Effect::new("create_joker").with("joker", "gone")),
                ),
        );
        let errors = check(&p);
        let problems: Vec<_> = errors.iter().map(|d| &d.problem).collect();
        assert!(problems.iter().any(|p| matches!(p, Problem::NeedsTriggeringCard { .. })));
        assert!(problems.iter().any(|p| matches!(p, Problem::NodeNotAllowed { .. })));
        assert!(problems.iter().any(|p| matches!(p, Problem::MissingParam { .. })));
        assert!(problems.iter().any(|p| matches!(p, Problem::UnresolvedReference { .. })));
    }

    #[test]
    fn trigger_placement_is_per_kind() {
        let mut p = Project::new(metadata());
        p.add_object(
            GameObject::new(ObjectKind::Consumable, "Scroll")
                .with_id("c1")
                .with_rule(Rule::new(Trigger::HandPlayed).then(Effect::new("add_dollars").with("amount", 2.0))),
        );
        p.add_object(
            GameObject::new(ObjectKind::Joker, "Odd")
                .with_id("j1")
                .with_rule(Rule::new(Trigger::Unknown)),
        );
        let errors = check(&p);
        // Jokers come first in canonical order.
        assert_eq!(errors[0].problem, Problem::UnknownTrigger);
        assert!(matches!(
            errors[1].problem,
            Problem::TriggerNotAllowed {
                kind: ObjectKind::Consumable,
                ..
            }
        ));
    }

    #[test]
    fn dangling_static_references() {
        let mut p = Project::new(metadata());
        let mut joker = GameObject::new(ObjectKind::Joker, "Mythic One").with_id("j1");
        joker.data = KindData::Joker(JokerData {
            rarity: RarityRef::Custom("deleted".to_string()),
            ..JokerData::default()
        });
        p.add_object(joker);
        let mut voucher = GameObject::new(ObjectKind::Voucher, "Tier 2").with_id("v2");
        voucher.data = KindData::Voucher(VoucherData {
            requires: vec![ObjectId::new("j1")],
        });
        p.add_object(voucher);
        let errors = check(&p);
        assert!(matches!(errors[0].problem, Problem::UnresolvedReference { expected: "rarity", .. }));
        assert!(matches!(errors[1].problem, Problem::WrongReferenceKind { .. }));
    }

    #[test]
    fn duplicate_ids_are_flagged_once() {
        let mut p = Project::new(metadata());
        p.add_object(GameObject::new(ObjectKind::Joker, "A").with_id("x"));
        p.add_object(GameObject::new(ObjectKind::Seal, "B").with_id("x"));
        p.add_object(GameObject::new(ObjectKind::Edition, "C").with_id("x"));
        let errors = check(&p);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].problem, Problem::DuplicateId(ObjectId::new("x")));
    }

    #[test]
    fn bound_rules_keep_order() {
        let nodes = NodeRegistry::builtin();
        let object = GameObject::new(ObjectKind::Joker, "Order")
            .with_id("j1")
            .with_rule(Rule::new(Trigger::HandPlayed).then(Effect::new("add_mult").with("amount", 1.0)))
            .with_rule(Rule::new(Trigger::RoundEnd).then(Effect::new("add_dollars").with("amount", 1.0)))
            .with_rule(Rule::new(Trigger::HandPlayed).then(Effect::new("add_chips").with("amount", 1.0)));
        let mut p = Project::new(metadata());
        p.add_object(object.clone());
        let refs = CrossRefs::build(&p, &KeyTable::derive(&p), &nodes);
        let rules = check_object(&object, &refs, &nodes).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.effects[0].spec.name).collect();
        assert_eq!(names, ["add_mult", "add_dollars", "add_chips"]);
    }
}

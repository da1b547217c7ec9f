//! Data-driven registry of condition and effect kinds.
//!
//! Each kind is a [`NodeSpec`]: its parameter schema, trigger restrictions,
//! an optional extra validator, and a template that lowers bound arguments
//! to a Lua [`Fragment`]. Adding a kind is one `register` call; the
//! validator and compiler never branch on kind names.
//!
//! Lifecycle mirrors the other registries: register into a
//! [`NodeRegistryBuilder`], then [`build`](NodeRegistryBuilder::build) an
//! immutable [`NodeRegistry`].

pub mod conditions;
pub mod effects;
pub mod helpers;

use crate::diagnostic::{NodeRole, Problem};
use crate::id::{EngineKey, ObjectKind};
use crate::model::{ParamValue, Params, RarityRef, SetRef};
use crate::trigger::Trigger;
use crate::xref::{CrossRefs, RarityValue};
use std::collections::BTreeMap;

// ===========================================================================
// Parameter schema
// ===========================================================================

/// Domain of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamType {
    Number { min: Option<f64>, max: Option<f64> },
    Integer { min: Option<i64>, max: Option<i64> },
    Text,
    Bool,
    Choice(&'static [&'static str]),
    /// Id of another object of the given kind.
    Object(ObjectKind),
    /// Builtin rarity number or custom rarity id.
    Rarity,
    /// Builtin set name or custom consumable-set id.
    ConsumableSet,
}

/// What happens when a parameter is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Required,
    /// May be omitted; the template sees [`Arg::Absent`].
    Optional,
    Number(f64),
    Text(&'static str),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub default: ParamDefault,
}

impl ParamSpec {
    pub const fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            default: ParamDefault::Required,
        }
    }

    pub const fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            default: ParamDefault::Optional,
        }
    }

    pub const fn with_default(name: &'static str, ty: ParamType, default: ParamDefault) -> Self {
        Self { name, ty, default }
    }
}

// ===========================================================================
// Bound arguments
// ===========================================================================

/// A parameter value after domain checks and reference resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Number(f64),
    Integer(i64),
    Text(String),
    Bool(bool),
    Choice(&'static str),
    Object(EngineKey),
    Rarity(RarityValue),
    Set(String),
    Absent,
}

/// Bound arguments of one rule node, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: BTreeMap<&'static str, Arg>,
}

impl Args {
    pub fn get(&self, name: &str) -> &Arg {
        self.values.get(name).unwrap_or(&Arg::Absent)
    }

    pub fn number(&self, name: &str) -> f64 {
        match self.get(name) {
            Arg::Number(n) => *n,
            Arg::Integer(i) => *i as f64,
            _ => 0.0,
        }
    }

    pub fn integer(&self, name: &str) -> i64 {
        match self.get(name) {
            Arg::Integer(i) => *i,
            Arg::Number(n) => *n as i64,
            _ => 0,
        }
    }

    pub fn text(&self, name: &str) -> &str {
        match self.get(name) {
            Arg::Text(s) | Arg::Set(s) => s,
            Arg::Choice(c) => c,
            _ => "",
        }
    }

    pub fn object(&self, name: &str) -> Option<&EngineKey> {
        match self.get(name) {
            Arg::Object(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_present(&self, name: &str) -> bool {
        !matches!(self.get(name), Arg::Absent)
    }
}

// ===========================================================================
// Templates
// ===========================================================================

/// Source produced by one rule node.
///
/// For conditions `code` is a Lua expression; for effects it is one or
/// more statements separated by newlines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub code: String,
    /// Names of shared helpers (see [`helpers`]) this fragment calls.
    pub helpers: Vec<&'static str>,
    /// Whether the fragment writes to the callback's `ret` table.
    pub uses_return: bool,
}

impl Fragment {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn helper(mut self, name: &'static str) -> Self {
        if !self.helpers.contains(&name) {
            self.helpers.push(name);
        }
        self
    }

    /// Append another statement.
    pub fn and(mut self, code: impl AsRef<str>) -> Self {
        if !self.code.is_empty() {
            self.code.push('\n');
        }
        self.code.push_str(code.as_ref());
        self
    }

    pub fn returning(mut self) -> Self {
        self.uses_return = true;
        self
    }
}

/// Context a template is lowered in.
#[derive(Debug, Clone, Copy)]
pub struct EmitCtx<'a> {
    /// Key of the object owning the rule.
    pub object: &'a EngineKey,
    pub kind: ObjectKind,
    pub trigger: Trigger,
}

impl EmitCtx<'_> {
    /// Expression for the card that caused the trigger.
    pub fn card(&self) -> &'static str {
        match self.kind {
            ObjectKind::Enhancement | ObjectKind::Seal | ObjectKind::Edition => "card",
            _ => "context.other_card",
        }
    }

    /// Whether the surrounding callback returns an effect table to the
    /// engine, as opposed to acting directly.
    pub fn returns_effects(&self) -> bool {
        !matches!(self.trigger, Trigger::OnUse | Trigger::OnRedeem)
    }
}

pub type TemplateFn = fn(&Args, &EmitCtx<'_>) -> Fragment;
pub type ValidatorFn = fn(&Args, Trigger) -> Result<(), Problem>;

/// Everything the pipeline knows about one node kind.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: &'static str,
    pub role: NodeRole,
    pub params: Vec<ParamSpec>,
    /// Requires a trigger with an originating card.
    pub needs_card: bool,
    /// Allow-list of triggers; `None` allows every trigger the owning
    /// object kind allows.
    pub triggers: Option<&'static [Trigger]>,
    pub validator: Option<ValidatorFn>,
    pub template: TemplateFn,
}

impl NodeSpec {
    pub fn condition(name: &'static str, template: TemplateFn) -> Self {
        Self {
            name,
            role: NodeRole::Condition,
            params: Vec::new(),
            needs_card: false,
            triggers: None,
            validator: None,
            template,
        }
    }

    pub fn effect(name: &'static str, template: TemplateFn) -> Self {
        Self {
            role: NodeRole::Effect,
            ..Self::condition(name, template)
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn needs_card(mut self) -> Self {
        self.needs_card = true;
        self
    }

    pub fn only_under(mut self, triggers: &'static [Trigger]) -> Self {
        self.triggers = Some(triggers);
        self
    }

    pub fn validated_by(mut self, validator: ValidatorFn) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Trigger compatibility problems for this node, if any.
    pub fn check_trigger(&self, trigger: Trigger) -> Option<Problem> {
        if self.needs_card && !trigger.has_card() {
            return Some(Problem::NeedsTriggeringCard {
                node: self.name.to_string(),
                trigger,
            });
        }
        match self.triggers {
            Some(allowed) if !allowed.contains(&trigger) => Some(Problem::NodeNotAllowed {
                node: self.name.to_string(),
                trigger,
            }),
            _ => None,
        }
    }

    /// Check and resolve every parameter, collecting all problems.
    pub fn bind(&self, params: &Params, refs: &CrossRefs) -> Result<Args, Vec<Problem>> {
        let mut problems = Vec::new();
        let mut args = Args::default();

        for name in params.keys() {
            if !self.params.iter().any(|p| p.name == name) {
                problems.push(Problem::UnknownParam {
                    node: self.name.to_string(),
                    param: name.clone(),
                });
            }
        }

        for spec in &self.params {
            let value = match (params.get(spec.name), spec.default) {
                (Some(value), _) => value.clone(),
                (None, ParamDefault::Required) => {
                    problems.push(Problem::MissingParam {
                        node: self.name.to_string(),
                        param: spec.name,
                    });
                    continue;
                }
                (None, ParamDefault::Optional) => {
                    args.values.insert(spec.name, Arg::Absent);
                    continue;
                }
                (None, ParamDefault::Number(n)) => ParamValue::Number(n),
                (None, ParamDefault::Text(s)) => ParamValue::Text(s.to_string()),
                (None, ParamDefault::Bool(b)) => ParamValue::Bool(b),
            };
            match bind_value(spec.ty, &value, refs) {
                Ok(arg) => {
                    args.values.insert(spec.name, arg);
                }
                Err(BindError::Domain(reason)) => problems.push(Problem::InvalidParam {
                    node: self.name.to_string(),
                    param: spec.name,
                    reason,
                }),
                Err(BindError::Reference(problem)) => problems.push(problem),
            }
        }

        if problems.is_empty() {
            Ok(args)
        } else {
            Err(problems)
        }
    }
}

enum BindError {
    Domain(String),
    Reference(Problem),
}

fn expect_text(value: &ParamValue) -> Result<&str, BindError> {
    value
        .as_text()
        .ok_or_else(|| BindError::Domain(format!("expected text, got {value}")))
}

fn bind_value(ty: ParamType, value: &ParamValue, refs: &CrossRefs) -> Result<Arg, BindError> {
    match ty {
        ParamType::Number { min, max } => {
            let n = value
                .as_number()
                .filter(|n| n.is_finite())
                .ok_or_else(|| BindError::Domain(format!("expected a number, got {value}")))?;
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                return Err(BindError::Domain(out_of_range(n, min, max)));
            }
            Ok(Arg::Number(n))
        }
        ParamType::Integer { min, max } => {
            let n = value
                .as_number()
                .filter(|n| n.is_finite() && n.fract() == 0.0)
                .ok_or_else(|| {
                    BindError::Domain(format!("expected a whole number, got {value}"))
                })? as i64;
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                return Err(BindError::Domain(out_of_range(
                    n as f64,
                    min.map(|m| m as f64),
                    max.map(|m| m as f64),
                )));
            }
            Ok(Arg::Integer(n))
        }
        ParamType::Text => {
            let s = expect_text(value)?;
            if s.trim().is_empty() {
                return Err(BindError::Domain("text is empty".to_string()));
            }
            Ok(Arg::Text(s.to_string()))
        }
        ParamType::Bool => match value {
            ParamValue::Bool(b) => Ok(Arg::Bool(*b)),
            other => Err(BindError::Domain(format!("expected true or false, got {other}"))),
        },
        ParamType::Choice(options) => {
            let s = expect_text(value)?;
            options
                .iter()
                .find(|&&o| o == s)
                .map(|&o| Arg::Choice(o))
                .ok_or_else(|| {
                    BindError::Domain(format!("'{s}' is not one of: {}", options.join(", ")))
                })
        }
        ParamType::Object(kind) => {
            let id = expect_text(value)?;
            refs.resolve_object(id, kind)
                .map(|key| Arg::Object(key.clone()))
                .map_err(BindError::Reference)
        }
        ParamType::Rarity => {
            let rarity = match value {
                ParamValue::Number(n) if n.fract() == 0.0 && (0.0..=255.0).contains(n) => {
                    RarityRef::Builtin(*n as u8)
                }
                ParamValue::Text(id) => RarityRef::Custom(id.clone()),
                other => {
                    return Err(BindError::Domain(format!(
                        "expected a rarity number or id, got {other}"
                    )));
                }
            };
            refs.resolve_rarity(&rarity)
                .map(Arg::Rarity)
                .map_err(BindError::Reference)
        }
        ParamType::ConsumableSet => {
            let set = SetRef::from(expect_text(value)?.to_string());
            refs.resolve_set(&set)
                .map(Arg::Set)
                .map_err(BindError::Reference)
        }
    }
}

fn out_of_range(n: f64, min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("{n} is outside {lo}..={hi}"),
        (Some(lo), None) => format!("{n} is below the minimum {lo}"),
        (None, Some(hi)) => format!("{n} is above the maximum {hi}"),
        (None, None) => format!("{n} is out of range"),
    }
}

// ===========================================================================
// Registry
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum NodeRegistryError {
    #[error("{role} kind '{name}' is already registered")]
    Duplicate { role: NodeRole, name: &'static str },
}

/// Collects node kinds before freezing them into a [`NodeRegistry`].
#[derive(Debug, Default)]
pub struct NodeRegistryBuilder {
    conditions: BTreeMap<&'static str, NodeSpec>,
    effects: BTreeMap<&'static str, NodeSpec>,
}

impl NodeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node kind under its role. Names are unique per role.
    pub fn register(&mut self, spec: NodeSpec) -> Result<(), NodeRegistryError> {
        let table = match spec.role {
            NodeRole::Condition => &mut self.conditions,
            NodeRole::Effect => &mut self.effects,
        };
        if table.contains_key(spec.name) {
            return Err(NodeRegistryError::Duplicate {
                role: spec.role,
                name: spec.name,
            });
        }
        table.insert(spec.name, spec);
        Ok(())
    }

    /// Register every built-in condition and effect, stopping at the first
    /// clash with a kind already in the builder.
    pub fn register_builtins(&mut self) -> Result<(), NodeRegistryError> {
        for spec in conditions::all().into_iter().chain(effects::all()) {
            self.register(spec)?;
        }
        Ok(())
    }

    pub fn build(self) -> NodeRegistry {
        NodeRegistry {
            conditions: self.conditions,
            effects: self.effects,
        }
    }
}

/// Immutable node-kind registry.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    conditions: BTreeMap<&'static str, NodeSpec>,
    effects: BTreeMap<&'static str, NodeSpec>,
}

impl NodeRegistry {
    /// Registry with every built-in condition and effect.
    pub fn try_builtin() -> Result<Self, NodeRegistryError> {
        let mut builder = NodeRegistryBuilder::new();
        builder.register_builtins()?;
        Ok(builder.build())
    }

    /// Like [`try_builtin`](Self::try_builtin), for callers that rely on
    /// the built-in set being well formed.
    ///
    /// # Panics
    ///
    /// Panics if two built-in node kinds share a name under one role.
    pub fn builtin() -> Self {
        match Self::try_builtin() {
            Ok(registry) => registry,
            Err(e) => panic!("built-in node kinds clash: {e}"),
        }
    }

    pub fn condition(&self, name: &str) -> Option<&NodeSpec> {
        self.conditions.get(name)
    }

    pub fn effect(&self, name: &str) -> Option<&NodeSpec> {
        self.effects.get(name)
    }

    pub fn get(&self, role: NodeRole, name: &str) -> Option<&NodeSpec> {
        match role {
            NodeRole::Condition => self.condition(name),
            NodeRole::Effect => self.effect(name),
        }
    }

    pub fn condition_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.conditions.keys().copied()
    }

    pub fn effect_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.effects.keys().copied()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

//! Validation and compile problems, collected rather than thrown.
//!
//! Every problem is attached to a [`Subject`] (the mod metadata, an object,
//! or a taxonomy entry) and optionally to a position inside the object's
//! rules, so an export attempt can report everything wrong in one pass.

use crate::id::{ObjectId, ObjectKind};
use crate::model::GameObject;
use crate::trigger::Trigger;
use std::fmt;

/// Which list a rule node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Condition,
    Effect,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Condition => f.write_str("condition"),
            NodeRole::Effect => f.write_str("effect"),
        }
    }
}

/// A single problem found while validating or compiling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Problem {
    #[error("name is empty")]
    MissingName,
    #[error("id is empty")]
    MissingId,
    #[error("id '{0}' is used by more than one object")]
    DuplicateId(ObjectId),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("rule has an unrecognised trigger")]
    UnknownTrigger,
    #[error("a {kind} cannot use the '{trigger}' trigger")]
    TriggerNotAllowed { trigger: Trigger, kind: ObjectKind },
    #[error("unknown {role} kind '{name}'")]
    UnknownNodeKind { role: NodeRole, name: String },
    #[error("'{node}' cannot be used under the '{trigger}' trigger")]
    NodeNotAllowed { node: String, trigger: Trigger },
    #[error("'{node}' needs a triggering card, but '{trigger}' has none")]
    NeedsTriggeringCard { node: String, trigger: Trigger },
    #[error("'{node}' is missing required parameter '{param}'")]
    MissingParam { node: String, param: &'static str },
    #[error("'{node}' has unknown parameter '{param}'")]
    UnknownParam { node: String, param: String },
    #[error("'{node}' parameter '{param}': {reason}")]
    InvalidParam {
        node: String,
        param: &'static str,
        reason: String,
    },
    #[error("reference to missing {expected} '{target}'")]
    UnresolvedReference {
        target: String,
        expected: &'static str,
    },
    #[error("'{target}' is a {found}, expected a {expected}")]
    WrongReferenceKind {
        target: String,
        expected: ObjectKind,
        found: ObjectKind,
    },
}

/// Display identity of an object for reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLabel {
    pub kind: ObjectKind,
    pub id: ObjectId,
    pub name: String,
}

impl ObjectLabel {
    pub fn of(object: &GameObject) -> Self {
        Self {
            kind: object.kind(),
            id: object.id.clone(),
            name: object.name.clone(),
        }
    }
}

impl fmt::Display for ObjectLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.trim().is_empty() {
            "<unnamed>"
        } else {
            &self.name
        };
        if self.id.is_empty() {
            write!(f, "{} '{name}'", self.kind)
        } else {
            write!(f, "{} '{name}' ({})", self.kind, self.id)
        }
    }
}

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Metadata,
    Object(ObjectLabel),
    Rarity { id: String, name: String },
    ConsumableSet { id: String, name: String },
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Metadata => f.write_str("mod metadata"),
            Subject::Object(label) => write!(f, "{label}"),
            Subject::Rarity { id, name } => write!(f, "rarity '{name}' ({id})"),
            Subject::ConsumableSet { id, name } => write!(f, "consumable set '{name}' ({id})"),
        }
    }
}

/// Position of a problem inside an object's rules (zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub rule: usize,
    pub node: Option<(NodeRole, usize)>,
}

impl Location {
    pub fn rule(rule: usize) -> Self {
        Self { rule, node: None }
    }

    pub fn node(rule: usize, role: NodeRole, index: usize) -> Self {
        Self {
            rule,
            node: Some((role, index)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}", self.rule + 1)?;
        if let Some((role, index)) = self.node {
            write!(f, ", {role} {}", index + 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub subject: Subject,
    pub location: Option<Location>,
    pub problem: Problem,
}

impl Diagnostic {
    pub fn new(subject: Subject, problem: Problem) -> Self {
        Self {
            subject,
            location: None,
            problem,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The object this diagnostic belongs to, if any.
    pub fn object_id(&self) -> Option<&ObjectId> {
        match &self.subject {
            Subject::Object(label) => Some(&label.id),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)?;
        if let Some(location) = self.location {
            write!(f, ", {location}")?;
        }
        write!(f, ": {}", self.problem)
    }
}

/// Aggregated outcome of a refused export: every problem, plus the objects
/// that compiled cleanly but were held back because the export is atomic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub errors: Vec<Diagnostic>,
    pub compiled: Vec<ObjectLabel>,
}

impl ExportReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Distinct objects that have at least one error.
    pub fn failed_objects(&self) -> Vec<&ObjectId> {
        let mut ids: Vec<&ObjectId> = Vec::new();
        for id in self.errors.iter().filter_map(Diagnostic::object_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "export refused: {} problem(s)", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  - {error}")?;
        }
        if !self.compiled.is_empty() {
            writeln!(
                f,
                "{} object(s) compiled cleanly but were not exported:",
                self.compiled.len()
            )?;
            for label in &self.compiled {
                writeln!(f, "  - {label}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> ObjectLabel {
        ObjectLabel {
            kind: ObjectKind::Joker,
            id: ObjectId::new("j1"),
            name: "Lucky Charm".to_string(),
        }
    }

    #[test]
    fn diagnostic_display_includes_location() {
        let d = Diagnostic::new(
            Subject::Object(label()),
            Problem::UnknownNodeKind {
                role: NodeRole::Effect,
                name: "summon_dragon".to_string(),
            },
        )
        .at(Location::node(0, NodeRole::Effect, 1));
        assert_eq!(
            d.to_string(),
            "joker 'Lucky Charm' (j1), rule 1, effect 2: unknown effect kind 'summon_dragon'"
        );
    }

    #[test]
    fn unnamed_objects_are_labelled() {
        let mut l = label();
        l.name.clear();
        assert_eq!(l.to_string(), "joker '<unnamed>' (j1)");
    }

    #[test]
    fn report_lists_failed_objects_once() {
        let report = ExportReport {
            errors: vec![
                Diagnostic::new(Subject::Object(label()), Problem::MissingName),
                Diagnostic::new(Subject::Object(label()), Problem::UnknownTrigger),
                Diagnostic::new(Subject::Metadata, Problem::MissingName),
            ],
            compiled: vec![],
        };
        assert_eq!(report.failed_objects(), vec![&ObjectId::new("j1")]);
        let text = report.to_string();
        assert!(text.contains("3 problem(s)"));
        assert!(text.contains("mod metadata: name is empty"));
    }
}

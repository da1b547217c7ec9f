//! Jokerforge Core -- the content-to-source compiler for card-battler mods.
//!
//! This crate holds the authored data model and everything needed to turn
//! it into engine source: identifier assignment, schema normalization and
//! migration, the data-driven rule-node registry, validation, cross
//! references, and the Lua compiler.
//!
//! # Export Pipeline
//!
//! Each export runs over an immutable [`project::Project`] snapshot:
//!
//! 1. **Keys** -- [`identifiers::KeyTable::derive`] assigns a deterministic,
//!    collision-free key to every object and taxonomy entry.
//! 2. **References** -- [`xref::CrossRefs::build`] derives lookup tables from
//!    the snapshot and its keys.
//! 3. **Validation** -- [`validation`] checks metadata, taxonomies and every
//!    object, binding rule nodes against the [`nodes::NodeRegistry`].
//! 4. **Lowering** -- [`compiler::compile`] emits one callback per trigger
//!    and one registration call per object, grouped into files by kind.
//!
//! Problems never stop the pipeline early. They are collected into an
//! [`diagnostic::ExportReport`] and the export is refused as a whole.
//!
//! # Key Types
//!
//! - [`model::GameObject`] -- An authored object: common fields plus a
//!   tagged kind payload.
//! - [`model::Rule`] -- Trigger, ordered conditions, ordered effects.
//! - [`nodes::NodeSpec`] -- Parameter schema, trigger restrictions and Lua
//!   template of one condition or effect kind.
//! - [`normalize::normalize`] -- Raw JSON to schema-complete project.
//! - [`migration::MigrationRegistry`] -- Chained format-version upgrades.

pub mod compiler;
pub mod diagnostic;
pub mod id;
pub mod identifiers;
pub mod migration;
pub mod model;
pub mod nodes;
pub mod normalize;
pub mod project;
pub mod trigger;
pub mod validation;
pub mod xref;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use compiler::{CompiledMod, SourceFile, compile};
pub use diagnostic::{Diagnostic, ExportReport, ObjectLabel, Problem};
pub use id::{EngineKey, ObjectId, ObjectKind};
pub use normalize::{NormalizeError, normalize};
pub use project::{FORMAT_VERSION, Project};
pub use trigger::Trigger;

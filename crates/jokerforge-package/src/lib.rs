//! Jokerforge Package -- turns a compiled project into an installable mod
//! archive.
//!
//! [`export::export_mod`] is the single entry point: it compiles the
//! project, refuses the export if anything failed, and otherwise lays out
//! the manifest, loader, generated sources and images in a zip.

pub mod assembler;
pub mod assets;
pub mod error;
pub mod export;
pub mod manifest;

pub use assets::{AssetBundle, ImageAsset};
pub use error::{AssetError, ExportError, InternalError};
pub use export::{ExportedMod, export_mod, export_mod_with};
pub use manifest::Manifest;

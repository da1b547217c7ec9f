//! Archive layout and zip writing.
//!
//! Entries are laid out in a fixed order and stamped with a fixed
//! timestamp, so the same inputs always produce the same bytes.

use crate::assets::{AssetBundle, ImageAsset};
use crate::error::{ExportError, InternalError};
use crate::manifest::Manifest;
use jokerforge_core::compiler::lua::{LuaWriter, lua_number, lua_string};
use jokerforge_core::compiler::{CompiledMod, HELPERS_FILE};
use jokerforge_core::model::ModMetadata;
use jokerforge_core::Project;
use jokerforge_data::{Compression, ExportConfig, save_project};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

pub const CONFIG_FILE: &str = "config.lua";
pub const PROJECT_FILE: &str = "project.jokerforge.json";

const CONFIG_TEMPLATE: &str = "return {}\n";

const ICON_ATLAS: &str = "modicon";
const ICON_SIZE: (u32, u32) = (34, 34);
const GAME_ATLAS: &str = "balatro";
const GAME_SIZE: (u32, u32) = (333, 216);

/// One file in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// An `SMODS.Atlas` registration and the image behind it.
#[derive(Debug, Clone, PartialEq)]
struct AtlasDecl<'a> {
    key: &'static str,
    image: &'a str,
    size: (u32, u32),
    unprefixed: bool,
}

/// Every atlas the mod registers, resolved against the bundle. A sprite
/// atlas or metadata image that the bundle lacks is an error.
fn atlas_decls<'a>(
    compiled: &CompiledMod,
    metadata: &'a ModMetadata,
    assets: &AssetBundle,
    config: &ExportConfig,
) -> Result<Vec<AtlasDecl<'a>>, ExportError> {
    let mut decls = Vec::new();
    if let Some(icon) = &metadata.icon_image {
        assets.require(icon)?;
        decls.push(AtlasDecl {
            key: ICON_ATLAS,
            image: icon,
            size: ICON_SIZE,
            unprefixed: false,
        });
    }
    if let Some(game) = &metadata.game_image {
        assets.require(game)?;
        decls.push(AtlasDecl {
            key: GAME_ATLAS,
            image: game,
            size: GAME_SIZE,
            unprefixed: true,
        });
    }
    for kind in &compiled.atlas_kinds {
        let name = kind.collection();
        assets.require(name)?;
        decls.push(AtlasDecl {
            key: name,
            image: name,
            size: (config.atlas.px, config.atlas.py),
            unprefixed: false,
        });
    }
    Ok(decls)
}

fn render_main(compiled: &CompiledMod, atlases: &[AtlasDecl<'_>]) -> String {
    let mut w = LuaWriter::new();
    if compiled.file(HELPERS_FILE).is_some() {
        w.line(&format!(
            "SMODS.current_mod.jokerforge_helpers = assert(SMODS.load_file({}))()",
            lua_string(HELPERS_FILE)
        ));
        w.blank();
    }
    for atlas in atlases {
        w.open("SMODS.Atlas {");
        w.field("key", &lua_string(atlas.key));
        w.field("path", &lua_string(&format!("{}.png", atlas.image)));
        w.field("px", &lua_number(f64::from(atlas.size.0)));
        w.field("py", &lua_number(f64::from(atlas.size.1)));
        if atlas.unprefixed {
            w.field("prefix_config", "{ key = false }");
        }
        w.close("}");
    }
    if !atlases.is_empty() {
        w.blank();
    }
    for file in &compiled.files {
        if file.path == HELPERS_FILE {
            continue;
        }
        w.line(&format!("assert(SMODS.load_file({}))()", lua_string(&file.path)));
    }
    w.finish()
}

fn image_entries(atlases: &[AtlasDecl<'_>], assets: &AssetBundle) -> Result<Vec<ArchiveEntry>, ExportError> {
    let mut images: Vec<(&str, &ImageAsset)> = Vec::new();
    for atlas in atlases {
        if images.iter().any(|(name, _)| *name == atlas.image) {
            continue;
        }
        images.push((atlas.image, assets.require(atlas.image)?));
    }
    images.sort_by_key(|(name, _)| *name);
    let mut entries: Vec<ArchiveEntry> = images
        .iter()
        .map(|(name, image)| ArchiveEntry::new(format!("assets/1x/{name}.png"), image.x1.clone()))
        .collect();
    entries.extend(
        images
            .iter()
            .map(|(name, image)| ArchiveEntry::new(format!("assets/2x/{name}.png"), image.x2.clone())),
    );
    Ok(entries)
}

/// Archive entries in their final order: manifest, main file, config,
/// generated sources, images, then the optional project file.
pub fn plan_entries(
    compiled: &CompiledMod,
    project: &Project,
    assets: &AssetBundle,
    config: &ExportConfig,
) -> Result<Vec<ArchiveEntry>, ExportError> {
    let metadata = &project.metadata;
    let atlases = atlas_decls(compiled, metadata, assets, config)?;
    let manifest = Manifest::from_metadata(metadata);

    let mut entries = vec![
        ArchiveEntry::new(
            manifest.file_name(),
            manifest.to_json().map_err(InternalError::from)?,
        ),
        ArchiveEntry::new(metadata.main_file.clone(), render_main(compiled, &atlases)),
        ArchiveEntry::new(CONFIG_FILE, CONFIG_TEMPLATE),
    ];
    entries.extend(
        compiled
            .files
            .iter()
            .map(|f| ArchiveEntry::new(f.path.clone(), f.contents.clone())),
    );
    entries.extend(image_entries(&atlases, assets)?);
    if config.include_project {
        let json = save_project(project).map_err(InternalError::from)?;
        entries.push(ArchiveEntry::new(PROJECT_FILE, json));
    }
    Ok(entries)
}

/// Write `entries` into an in-memory zip.
pub fn write_zip(entries: &[ArchiveEntry], compression: Compression) -> Result<Vec<u8>, InternalError> {
    let method = match compression {
        Compression::Stored => CompressionMethod::Stored,
        Compression::Deflated => CompressionMethod::Deflated,
    };
    let options = FileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        zip.start_file(entry.path.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Lay out and zip a compiled mod.
pub fn assemble(
    compiled: &CompiledMod,
    project: &Project,
    assets: &AssetBundle,
    config: &ExportConfig,
) -> Result<Vec<u8>, ExportError> {
    let entries = plan_entries(compiled, project, assets, config)?;
    Ok(write_zip(&entries, config.compression)?)
}

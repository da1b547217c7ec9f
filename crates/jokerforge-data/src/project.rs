//! Project file I/O and the autosave store.
//!
//! The editable project is JSON. Importing always goes through the schema
//! normalizer and the identifier registry, so whatever comes back is
//! schema-complete and fully keyed.

use jokerforge_core::identifiers::{IdGenerator, UuidIds, assign_identifiers};
use jokerforge_core::{NormalizeError, Project, normalize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Store key of the autosaved working copy.
pub const AUTOSAVE_KEY: &str = "jokerforge-autosave";

// ===========================================================================
// Import / save
// ===========================================================================

/// Parse, normalize, and key a project document.
pub fn import_project(text: &str) -> Result<Project, NormalizeError> {
    import_project_with(text, &mut UuidIds)
}

/// [`import_project`] with an explicit id source for objects lacking one.
pub fn import_project_with(
    text: &str,
    ids: &mut dyn IdGenerator,
) -> Result<Project, NormalizeError> {
    let doc: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| NormalizeError::Structural(format!("not valid JSON: {e}")))?;
    let project = assign_identifiers(normalize(doc)?, ids);
    info!(
        id = %project.metadata.id,
        objects = project.object_count(),
        "imported project"
    );
    Ok(project)
}

/// Canonical pretty JSON at the current format version.
pub fn save_project(project: &Project) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(project)
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectFileError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("could not serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn read_project_file(path: &Path) -> Result<Project, ProjectFileError> {
    let text = fs::read_to_string(path)?;
    Ok(import_project(&text)?)
}

pub fn write_project_file(path: &Path, project: &Project) -> Result<(), ProjectFileError> {
    fs::write(path, save_project(project)?)?;
    Ok(())
}

// ===========================================================================
// Autosave store
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// String storage keyed by name, standing in for browser local storage.
pub trait ProjectStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError>;
    fn clear(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Creates `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ProjectStore for DirStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        fs::write(self.path(key), contents)?;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Outcome of [`restore_autosave`].
#[derive(Debug)]
pub enum Restored {
    Project(Project),
    /// Nothing usable was stored; start an empty project.
    Fresh,
}

/// Write the working copy under [`AUTOSAVE_KEY`].
pub fn autosave(store: &mut dyn ProjectStore, project: &Project) -> Result<(), StoreError> {
    store.save(AUTOSAVE_KEY, &save_project(project)?)
}

/// Load the autosaved working copy. A snapshot that cannot be normalized
/// is cleared from the store.
pub fn restore_autosave(store: &mut dyn ProjectStore) -> Result<Restored, StoreError> {
    let Some(text) = store.load(AUTOSAVE_KEY)? else {
        return Ok(Restored::Fresh);
    };
    match import_project(&text) {
        Ok(project) => Ok(Restored::Project(project)),
        Err(error) => {
            warn!(%error, "discarding unreadable autosave");
            store.clear(AUTOSAVE_KEY)?;
            Ok(Restored::Fresh)
        }
    }
}

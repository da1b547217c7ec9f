//! The `<id>.json` mod manifest read by the mod loader.

use jokerforge_core::model::ModMetadata;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub author: Vec<String>,
    pub description: String,
    pub prefix: String,
    pub main_file: String,
    pub priority: i32,
    pub badge_colour: String,
    pub badge_text_colour: String,
    pub version: String,
    pub dependencies: Vec<String>,
    pub conflicts: Vec<String>,
    pub provides: Vec<String>,
}

impl Manifest {
    pub fn from_metadata(metadata: &ModMetadata) -> Self {
        // An empty display name falls back to the plain name.
        let display_name = if metadata.display_name.trim().is_empty() {
            metadata.name.clone()
        } else {
            metadata.display_name.clone()
        };
        Self {
            id: metadata.id.clone(),
            name: metadata.name.clone(),
            display_name,
            author: metadata.author.clone(),
            description: metadata.description.clone(),
            prefix: metadata.prefix.clone(),
            main_file: metadata.main_file.clone(),
            priority: metadata.priority,
            badge_colour: metadata.badge_colour.clone(),
            badge_text_colour: metadata.badge_text_colour.clone(),
            version: metadata.version.clone(),
            dependencies: metadata.dependencies.clone(),
            conflicts: metadata.conflicts.clone(),
            provides: metadata.provides.clone(),
        }
    }

    /// Archive path: `<id>.json` at the mod root.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

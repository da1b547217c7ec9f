pub mod config;
pub mod loader;
pub mod project;

pub use config::{AtlasConfig, Compression, ExportConfig, find_export_config, load_export_config};
pub use loader::DataLoadError;
pub use project::{
    AUTOSAVE_KEY, DirStore, MemoryStore, ProjectFileError, ProjectStore, Restored, StoreError,
    autosave, import_project, read_project_file, restore_autosave, save_project,
    write_project_file,
};

//! The export entry point: compile, then assemble, all or nothing.

use crate::assembler::assemble;
use crate::assets::AssetBundle;
use crate::error::ExportError;
use jokerforge_core::nodes::NodeRegistry;
use jokerforge_core::{ObjectLabel, Project, compile};
use jokerforge_data::ExportConfig;
use tracing::{info, warn};

/// A finished mod archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMod {
    /// Suggested download name, `<id>.zip`.
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Exported objects in canonical order.
    pub objects: Vec<ObjectLabel>,
}

/// Export with the built-in condition and effect kinds.
pub fn export_mod(
    project: &Project,
    assets: &AssetBundle,
    config: &ExportConfig,
) -> Result<ExportedMod, ExportError> {
    export_mod_with(project, &NodeRegistry::builtin(), assets, config)
}

pub fn export_mod_with(
    project: &Project,
    nodes: &NodeRegistry,
    assets: &AssetBundle,
    config: &ExportConfig,
) -> Result<ExportedMod, ExportError> {
    let compiled = match compile(project, nodes) {
        Ok(compiled) => compiled,
        Err(report) => {
            warn!(
                id = %project.metadata.id,
                problems = report.errors.len(),
                failed = report.failed_objects().len(),
                "export refused"
            );
            return Err(ExportError::Rejected(report));
        }
    };
    let bytes = assemble(&compiled, project, assets, config)?;
    info!(
        id = %project.metadata.id,
        objects = compiled.objects.len(),
        files = compiled.files.len(),
        bytes = bytes.len(),
        "exported mod"
    );
    Ok(ExportedMod {
        file_name: format!("{}.zip", project.metadata.id),
        bytes,
        objects: compiled.objects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jokerforge_core::test_utils::*;
    use jokerforge_core::Problem;

    #[test]
    fn exports_full_project() {
        let exported = export_mod(&full_project(), &AssetBundle::new(), &ExportConfig::default()).unwrap();
        assert_eq!(exported.file_name, "MyCollection.zip");
        assert_eq!(exported.objects.len(), 8);
        assert!(!exported.bytes.is_empty());
    }

    #[test]
    fn rejection_carries_report() {
        let mut p = empty_project();
        p.add_object(lucky_charm("j1"));
        p.add_object(broken_joker("j2"));
        let err = export_mod(&p, &AssetBundle::new(), &ExportConfig::default()).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(report.errors[0].problem, Problem::UnknownNodeKind { .. }));
        assert_eq!(report.compiled.len(), 1);
        assert!(err.to_string().contains("Dragon Tamer"));
    }

    #[test]
    fn escaping_entry_paths_are_refused() {
        let mut p = empty_project();
        p.add_object(lucky_charm("j1"));
        p.metadata.main_file = "../main.lua".to_string();
        p.metadata.icon_image = Some("/tmp/icon".to_string());
        let err = export_mod(&p, &AssetBundle::new(), &ExportConfig::default()).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|d| matches!(d.problem, Problem::InvalidField { .. })));
    }
}

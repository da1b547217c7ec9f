//! `jokerforge` -- export, check, and normalize mod projects from the
//! command line.

use clap::{Parser, Subcommand};
use jokerforge_core::compile;
use jokerforge_core::nodes::NodeRegistry;
use jokerforge_data::{
    DataLoadError, ExportConfig, ProjectFileError, find_export_config, load_export_config,
    read_project_file, save_project,
};
use jokerforge_package::{AssetBundle, AssetError, ExportError, export_mod};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jokerforge")]
#[command(about = "Compile card-battler mod projects into installable archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a project and write the mod archive
    Export {
        /// Project file (.json)
        project: PathBuf,

        /// Output archive path
        #[arg(short, long)]
        output: PathBuf,

        /// Export config (.ron, .toml or .json); defaults to jokerforge.* next to the project
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding 1x/ and 2x/ images
        #[arg(long)]
        assets: Option<PathBuf>,
    },
    /// Validate a project and print every problem found
    Check {
        /// Project file (.json)
        project: PathBuf,
    },
    /// Print the canonical, upgraded form of a project file
    Normalize {
        /// Project file (.json)
        file: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Project(#[from] ProjectFileError),
    #[error("config: {0}")]
    Config(#[from] DataLoadError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize project: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The project has problems; the report was already printed.
    #[error("check failed")]
    CheckFailed,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jokerforge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Export {
            project,
            output,
            config,
            assets,
        } => run_export(&project, &output, config.as_deref(), assets.as_deref()),
        Command::Check { project } => run_check(&project),
        Command::Normalize { file } => run_normalize(&file),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::CheckFailed) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn export_config(project: &Path, explicit: Option<&Path>) -> Result<ExportConfig, DataLoadError> {
    match explicit {
        Some(path) => load_export_config(path),
        None => {
            let dir = project.parent().unwrap_or_else(|| Path::new("."));
            find_export_config(dir)
        }
    }
}

fn run_export(
    project_path: &Path,
    output: &Path,
    config: Option<&Path>,
    assets: Option<&Path>,
) -> Result<(), CliError> {
    let project = read_project_file(project_path)?;
    let config = export_config(project_path, config)?;
    debug!(?config, "export config");
    let assets = match assets {
        Some(dir) => AssetBundle::from_dir(dir)?,
        None => AssetBundle::new(),
    };
    let exported = export_mod(&project, &assets, &config)?;
    std::fs::write(output, &exported.bytes).map_err(|source| CliError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    println!(
        "wrote {} ({} objects, {} bytes)",
        output.display(),
        exported.objects.len(),
        exported.bytes.len()
    );
    Ok(())
}

fn run_check(project_path: &Path) -> Result<(), CliError> {
    let project = read_project_file(project_path)?;
    match compile(&project, &NodeRegistry::builtin()) {
        Ok(compiled) => {
            println!("ok: {} object(s) compile cleanly", compiled.objects.len());
            Ok(())
        }
        Err(report) => {
            print!("{report}");
            Err(CliError::CheckFailed)
        }
    }
}

fn run_normalize(path: &Path) -> Result<(), CliError> {
    let project = read_project_file(path)?;
    println!("{}", save_project(&project)?);
    Ok(())
}

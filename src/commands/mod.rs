use crate::cli::{Cli, Commands};
use crate::workspace::{find_workspace_file, WORKSPACE_FILE_NAME};
use crate::Workspace;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

mod check;
mod fmt;
mod run;
mod tool;
mod workspace;

pub fn execute(cli: Cli) -> Result<()> {
    let location = cli.workspace.as_deref();

    match cli.command {
        Commands::Workspace(action) => workspace::execute(location, action),

        Commands::Tool(action) => tool::execute(location, action),

        Commands::Run {
            tool,
            command,
            args,
        } => run::execute(location, &tool, &command, &args),

        Commands::Fmt { check } => fmt::execute(location, check),

        Commands::Check => check::execute(location),

        Commands::External(args) => run::execute_external(location, args),
    }
}

/// Find the workspace file named by `--workspace`, or search upwards from the current directory.
pub(crate) fn locate_workspace_file(location: Option<&Path>) -> Result<PathBuf> {
    let start = match location {
        Some(path) if path.is_file() => return Ok(path.to_path_buf()),
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().context("Cannot get current directory")?,
    };

    find_workspace_file(&start).with_context(|| {
        format!("Run 'nimsforestpm workspace init <organization>' to create {WORKSPACE_FILE_NAME}")
    })
}

pub(crate) fn load_workspace(location: Option<&Path>) -> Result<Workspace> {
    let path = locate_workspace_file(location)?;
    Workspace::load(&path).with_context(|| format!("Failed to load workspace file {:?}", path))
}

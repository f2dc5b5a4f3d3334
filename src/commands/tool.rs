use crate::cli::ToolAction;
use crate::{ui, InstallMode, ToolEntry, ToolManager};
use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;

use super::load_workspace;

pub fn execute(location: Option<&Path>, action: ToolAction) -> Result<()> {
    match action {
        ToolAction::Add {
            name,
            mode,
            path,
            version,
        } => add(location, name, mode, path, version),
        ToolAction::Remove { name } => remove(location, &name),
        ToolAction::List => list(location),
        ToolAction::Commands { name } => commands(location, &name),
        ToolAction::Check { name } => check(location, name.as_deref()),
    }
}

fn add(
    location: Option<&Path>,
    name: String,
    mode: InstallMode,
    path: String,
    version: String,
) -> Result<()> {
    // Binary paths are run as written, so pin relative ones to where the user typed them.
    let path = if mode == InstallMode::Binary && Path::new(&path).is_relative() {
        env::current_dir()
            .context("Cannot get current directory")?
            .join(&path)
            .display()
            .to_string()
    } else {
        path
    };

    let entry = ToolEntry::new(name.clone(), mode, path, version);
    let problems = entry.problems();
    if !problems.is_empty() {
        bail!("Refusing to save: {}", problems.join("; "));
    }

    let mut manager = ToolManager::new(load_workspace(location)?);
    manager.add_tool(entry);
    manager.save().context("Failed to save workspace")?;

    let tool = manager.get_tool(&name)?;
    ui::success("Registered", format!("{} ({}) at {}", tool.name(), tool.mode(), tool.path()));
    if let Err(err) = tool.validate() {
        ui::warn(err);
    }
    Ok(())
}

fn remove(location: Option<&Path>, name: &str) -> Result<()> {
    let mut manager = ToolManager::new(load_workspace(location)?);
    manager.get_tool(name)?;
    manager.remove_tool(name);
    manager.save().context("Failed to save workspace")?;

    ui::success("Removed", name);
    Ok(())
}

fn list(location: Option<&Path>) -> Result<()> {
    let manager = ToolManager::new(load_workspace(location)?);
    let tools = manager.list_tools();

    if tools.is_empty() {
        ui::info("No tools registered. Use 'nimsforestpm tool add' to register one.");
        return Ok(());
    }

    for tool in tools {
        let executable = match tool.executable_path() {
            Ok(path) => path.display().to_string(),
            Err(err) => format!("unresolved ({err})"),
        };
        ui::status(
            tool.name(),
            format!("{} {} {} -> {executable}", tool.mode(), tool.path(), tool.version()),
        );
    }
    Ok(())
}

fn commands(location: Option<&Path>, name: &str) -> Result<()> {
    let manager = ToolManager::new(load_workspace(location)?);
    let commands = manager.find_tool(name)?.commands()?;

    if commands.is_empty() {
        ui::info(format!("No commands discovered for {name}"));
    }
    for command in commands {
        println!("{command}");
    }
    Ok(())
}

fn check(location: Option<&Path>, name: Option<&str>) -> Result<()> {
    let manager = ToolManager::new(load_workspace(location)?);
    let tools = match name {
        Some(name) => vec![manager.find_tool(name)?],
        None => manager.list_tools(),
    };

    let mut failures = 0usize;
    for tool in &tools {
        match tool.validate() {
            Ok(()) => ui::success("Ok", tool.name()),
            Err(err) => {
                failures += 1;
                ui::error(err);
            }
        }
    }

    if failures > 0 {
        bail!("Tool check failed ({failures} of {} tool(s)).", tools.len());
    }
    Ok(())
}

use crate::manager::short_name;
use crate::{ui, ToolManager};
use anyhow::{anyhow, bail, Result};
use std::path::Path;

use super::load_workspace;

pub fn execute(location: Option<&Path>, tool: &str, command: &str, args: &[String]) -> Result<()> {
    let manager = ToolManager::new(load_workspace(location)?);
    manager.find_tool(tool)?.execute(command, args)?;
    Ok(())
}

/// `nimsforestpm <tool> <command> [args...]`
pub fn execute_external(location: Option<&Path>, args: Vec<String>) -> Result<()> {
    let mut args = args.into_iter();
    let tool_name = args
        .next()
        .ok_or_else(|| anyhow!("Missing tool name"))?;

    let manager = ToolManager::new(load_workspace(location)?);
    let tool = manager
        .find_tool(&tool_name)
        .map_err(|_| anyhow!("Unrecognized subcommand or tool '{tool_name}'"))?;

    let Some(command) = args.next() else {
        let commands = tool.commands()?;
        if !commands.is_empty() {
            ui::status("Commands", commands.join("\n"));
        }
        bail!(
            "Usage: nimsforestpm {} <COMMAND> [ARGS]...",
            short_name(tool.name())
        );
    };

    let rest: Vec<String> = args.collect();
    tool.execute(&command, &rest)?;
    Ok(())
}

use crate::{ui, Error, ToolManager};
use anyhow::Result;
use std::path::Path;

use super::load_workspace;

pub fn execute(location: Option<&Path>) -> Result<()> {
    let workspace = load_workspace(location)?;
    let mut issues = Vec::new();

    // Surface every path problem, not just the first.
    match workspace.validate() {
        Ok(()) => {}
        Err(Error::Validation { problems }) => issues.extend(problems),
        Err(err) => issues.push(err.to_string()),
    }

    let manager = ToolManager::new(workspace);
    let tools = manager.list_tools();
    for tool in &tools {
        if let Err(err) = tool.validate() {
            issues.push(err.to_string());
        }
    }

    if issues.is_empty() {
        ui::success(
            "Check",
            format!("Workspace and {} tool(s) are valid.", tools.len()),
        );
        Ok(())
    } else {
        for issue in &issues {
            ui::error(issue);
        }
        anyhow::bail!("Workspace check failed ({} issue(s)).", issues.len());
    }
}

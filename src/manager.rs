use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime_tool::RuntimeTool;
use crate::workspace::{ToolEntry, Workspace};

/// Owns a loaded workspace and hands out [`RuntimeTool`] views of its tools.
#[derive(Debug, Clone)]
pub struct ToolManager {
    workspace: Workspace,
}

impl ToolManager {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    pub fn get_tool(&self, name: &str) -> Result<RuntimeTool<'_>> {
        let entry = self.workspace.get_tool(name)?;
        Ok(RuntimeTool::new(entry, &self.workspace))
    }

    pub fn list_tools(&self) -> Vec<RuntimeTool<'_>> {
        self.workspace
            .tools
            .iter()
            .map(|entry| RuntimeTool::new(entry, &self.workspace))
            .collect()
    }

    /// Look a tool up by its exact name, then as `nimsforest<name>`.
    pub fn find_tool(&self, name: &str) -> Result<RuntimeTool<'_>> {
        self.get_tool(name)
            .or_else(|_| self.get_tool(&format!("nimsforest{name}")))
            .map_err(|_| Error::ToolNotFound(name.to_string()))
    }

    pub fn execute_command(&self, name: &str, command: &str, args: &[String]) -> Result<()> {
        self.get_tool(name)?.execute(command, args)
    }

    pub fn tool_commands(&self, name: &str) -> Result<Vec<String>> {
        self.get_tool(name)?.commands()
    }

    /// Validate every tool, stopping at the first that is not usable.
    pub fn validate_all_tools(&self) -> Result<()> {
        for tool in self.list_tools() {
            debug!(tool = tool.name(), "validating tool");
            tool.validate()?;
        }
        Ok(())
    }

    pub fn add_tool(&mut self, entry: ToolEntry) {
        self.workspace.add_tool(entry);
    }

    pub fn remove_tool(&mut self, name: &str) {
        self.workspace.remove_tool(name);
    }

    pub fn save(&self) -> Result<()> {
        self.workspace.save()
    }
}

/// Name shown for a tool on the command line, without the `nimsforest` prefix.
pub fn short_name(name: &str) -> &str {
    match name.strip_prefix("nimsforest") {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{InstallMode, WORKSPACE_FILE_NAME};
    use rstest::rstest;
    use tempfile::TempDir;

    fn manager_with_tools() -> ToolManager {
        let mut workspace = Workspace::new();
        workspace.add_tool(ToolEntry::new(
            "nimsforestwork",
            InstallMode::Binary,
            "bin/nimsforestwork",
            "latest",
        ));
        workspace.add_tool(ToolEntry::new(
            "helper",
            InstallMode::Clone,
            "tools/helper",
            "main",
        ));
        ToolManager::new(workspace)
    }

    #[test]
    fn get_and_list_tools() {
        let manager = manager_with_tools();

        let names: Vec<_> = manager.list_tools().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["nimsforestwork", "helper"]);

        let tool = manager.get_tool("helper").unwrap();
        assert_eq!(tool.mode(), InstallMode::Clone);
        assert_eq!(tool.version(), "main");
        assert!(matches!(
            manager.get_tool("missing"),
            Err(Error::ToolNotFound(_))
        ));
    }

    #[test]
    fn find_tool_accepts_short_names() {
        let manager = manager_with_tools();
        assert_eq!(manager.find_tool("work").unwrap().name(), "nimsforestwork");
        assert_eq!(manager.find_tool("helper").unwrap().name(), "helper");

        let err = manager.find_tool("nope").unwrap_err();
        assert_eq!(err.to_string(), "tool nope not found in workspace");
    }

    #[test]
    fn add_remove_and_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(WORKSPACE_FILE_NAME);

        let mut workspace = Workspace::new();
        workspace.save_to(&path).unwrap();

        let mut manager = ToolManager::new(workspace);
        manager.add_tool(ToolEntry::new("x", InstallMode::Binary, "/bin/x", "1"));
        manager.add_tool(ToolEntry::new("y", InstallMode::Binary, "/bin/y", "1"));
        manager.remove_tool("y");
        manager.save().unwrap();

        let reloaded = Workspace::load(&path).unwrap();
        assert_eq!(reloaded.tools.len(), 1);
        assert_eq!(reloaded.tools[0].name, "x");
        assert_eq!(manager.into_workspace(), reloaded);
    }

    #[test]
    fn validate_all_tools_reports_first_failure() {
        let manager = manager_with_tools();
        let err = manager.validate_all_tools().unwrap_err();
        assert!(err.to_string().contains("nimsforestwork"), "{err}");
    }

    #[rstest]
    #[case("nimsforestwork", "work")]
    #[case("nimsforest", "nimsforest")]
    #[case("example-tool", "example-tool")]
    fn short_names(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(short_name(name), expected);
    }
}

// Public API
pub mod cli;
pub mod commands;

// Core domain types
mod error;
mod manager;
pub mod parser;
mod runtime_tool;
pub mod ui;
mod workspace;

// Re-export main types
pub use error::{Error, Result};
pub use manager::{short_name, ToolManager};
pub use runtime_tool::{
    discover_commands, executable_path, execute, parse_commands_from_help, RuntimeTool,
};
pub use workspace::{
    find_workspace_file, AbsolutePaths, InstallMode, ToolEntry, Workspace, DEFAULT_VERSION,
    WORKSPACE_FILE_NAME,
};

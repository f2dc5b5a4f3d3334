use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::workspace::InstallMode;

/// NimsForest Package Manager - Bootstrap and manage organizational workspaces
///
/// nimsforestpm keeps a `nimsforest.workspace` file describing an
/// organization, its products and the tools installed for it, and runs
/// those tools however they were installed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace file, or a directory to search upwards from
    #[arg(
        short,
        long,
        global = true,
        value_name = "PATH",
        env = "NIMSFOREST_WORKSPACE"
    )]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the workspace file
    #[command(subcommand)]
    Workspace(WorkspaceAction),

    /// Manage tools registered in the workspace
    #[command(subcommand)]
    Tool(ToolAction),

    /// Run a command of an installed tool
    Run {
        /// Tool name as recorded in the workspace file
        #[arg(value_name = "TOOL")]
        tool: String,

        /// Command passed to the tool
        #[arg(value_name = "COMMAND")]
        command: String,

        /// Arguments passed after the command
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Normalize the layout of the workspace file
    Fmt {
        /// Only report whether the file is already formatted
        #[arg(long)]
        check: bool,
    },

    /// Validate the workspace file, its paths and every tool
    Check,

    /// Any other subcommand is looked up as an installed tool
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceAction {
    /// Create nimsforest.workspace in the current directory
    Init {
        /// Organization workspace path recorded in the file
        #[arg(value_name = "ORGANIZATION")]
        organization: String,
    },

    /// Show workspace contents, validation and resolved paths
    Status {
        /// Print the workspace as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a product path to the workspace file
    Add {
        /// Relative to the workspace file, or absolute
        #[arg(value_name = "PRODUCT_PATH")]
        path: String,
    },

    /// Remove a product path from the workspace file
    Remove {
        /// Must match the stored path exactly
        #[arg(value_name = "PRODUCT_PATH")]
        path: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ToolAction {
    /// Register a tool, replacing any tool with the same name
    Add {
        #[arg(value_name = "NAME")]
        name: String,

        /// How the tool was installed (binary, clone, submodule)
        #[arg(short, long, value_name = "MODE")]
        mode: InstallMode,

        /// Executable for binary installs, checkout directory otherwise
        #[arg(short, long, value_name = "PATH")]
        path: String,

        /// Version label
        #[arg(long, value_name = "VERSION", default_value = "latest")]
        version: String,
    },

    /// Unregister a tool
    Remove {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List registered tools
    List,

    /// Show the commands a tool advertises in its help output
    Commands {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Check that tools are installed and runnable
    Check {
        /// Tool to check (checks all if not specified)
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },
}

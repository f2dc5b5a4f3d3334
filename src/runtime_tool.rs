use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::workspace::{resolve_path, InstallMode, ToolEntry, Workspace};

/// Flags tried, in order, when asking a tool to describe itself.
const HELP_FLAGS: &[&str] = &["--help", "-h", "help"];

/// Resolved view of one installed tool, computed on demand from its entry.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeTool<'a> {
    entry: &'a ToolEntry,
    workspace: &'a Workspace,
}

impl<'a> RuntimeTool<'a> {
    pub fn new(entry: &'a ToolEntry, workspace: &'a Workspace) -> Self {
        Self { entry, workspace }
    }

    pub fn name(&self) -> &'a str {
        &self.entry.name
    }

    pub fn mode(&self) -> InstallMode {
        self.entry.mode
    }

    pub fn path(&self) -> &'a str {
        &self.entry.path
    }

    pub fn version(&self) -> &'a str {
        &self.entry.version
    }

    pub fn entry(&self) -> &'a ToolEntry {
        self.entry
    }

    pub fn executable_path(&self) -> Result<PathBuf> {
        executable_path(self.entry, self.workspace)
    }

    /// Check the tool is installed and, for binaries, runnable.
    pub fn validate(&self) -> Result<()> {
        let path = self.executable_path()?;
        check_installed(self.entry, &path)
    }

    /// Subcommands the tool advertises in its help output; empty when unknown.
    pub fn commands(&self) -> Result<Vec<String>> {
        let path = self.executable_path()?;
        Ok(discover_commands(&path))
    }

    /// Run `command args...` with the caller's stdio attached.
    pub fn execute(&self, command: &str, args: &[String]) -> Result<()> {
        execute(self.entry, self.workspace, command, args)
    }
}

/// Work out which file to run for `entry`.
///
/// Binary installs are used verbatim. Clone and submodule installs are looked
/// up relative to the descriptor's directory as `<path>/<name>`, then
/// `<path>/bin/<name>`; when neither exists the checkout directory itself is
/// returned and callers decide whether that is usable.
pub fn executable_path(entry: &ToolEntry, workspace: &Workspace) -> Result<PathBuf> {
    match entry.mode {
        InstallMode::Binary => Ok(PathBuf::from(&entry.path)),
        InstallMode::Clone | InstallMode::Submodule => {
            if entry.path.is_empty() {
                return Err(Error::Resolution {
                    tool: entry.name.clone(),
                    reason: "tool path is empty".to_string(),
                });
            }

            let root = match workspace.base_dir() {
                Some(base) => resolve_path(base, &entry.path),
                None => PathBuf::from(&entry.path),
            };

            let candidates = [
                root.join(&entry.name),
                root.join("bin").join(&entry.name),
            ];
            for candidate in candidates {
                if candidate.is_file() {
                    debug!(tool = %entry.name, path = ?candidate, "resolved executable");
                    return Ok(candidate);
                }
            }

            debug!(tool = %entry.name, path = ?root, "no executable found, using checkout root");
            Ok(root)
        }
    }
}

fn check_installed(entry: &ToolEntry, path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|_| Error::Resolution {
        tool: entry.name.clone(),
        reason: format!("tool path does not exist: {}", path.display()),
    })?;

    if entry.mode == InstallMode::Binary && !is_executable(&metadata) {
        return Err(Error::Resolution {
            tool: entry.name.clone(),
            reason: format!("tool binary is not executable: {}", path.display()),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.is_file()
}

/// Ask the executable for its subcommands by scraping help output.
///
/// Tries `--help`, `-h` and `help`, then no arguments at all, and returns the
/// first non-empty list. Runs that fail to spawn or exit unsuccessfully are
/// skipped. A tool with no recognisable help yields an empty list.
pub fn discover_commands(executable: &Path) -> Vec<String> {
    let attempts = HELP_FLAGS
        .iter()
        .map(|flag| Some(*flag))
        .chain(std::iter::once(None));

    for flag in attempts {
        let Some(output) = capture_output(executable, flag) else {
            continue;
        };

        let commands = parse_commands_from_help(&output);
        if !commands.is_empty() {
            debug!(path = ?executable, ?flag, count = commands.len(), "discovered commands");
            return commands;
        }
    }

    debug!(path = ?executable, "no commands discovered");
    Vec::new()
}

fn capture_output(executable: &Path, flag: Option<&str>) -> Option<String> {
    let mut command = Command::new(executable);
    command.args(flag).stdin(Stdio::null());

    let output = match command.output() {
        Ok(output) => output,
        Err(err) => {
            trace!(path = ?executable, ?flag, error = %err, "help probe failed to spawn");
            return None;
        }
    };

    if !output.status.success() {
        trace!(path = ?executable, ?flag, status = %output.status, "help probe exited unsuccessfully");
        return None;
    }

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Some(combined)
}

/// Pull command names out of a `Commands:` style section of help text.
///
/// A line mentioning "command" (any case) and containing `:` opens a
/// section; each following indented line contributes its first word if that
/// word is made of letters, digits, `-` and `_`. A blank or unindented line
/// closes the section. Names are returned in order, repeats included.
pub fn parse_commands_from_help(output: &str) -> Vec<String> {
    let mut commands: Vec<String> = Vec::new();
    let mut in_section = false;

    for line in output.lines() {
        if in_section {
            let indented = line.starts_with([' ', '\t']);
            if indented && !line.trim().is_empty() {
                if let Some(name) = line.split_whitespace().next() {
                    if is_valid_command_name(name) {
                        commands.push(name.to_string());
                    }
                }
                continue;
            }
            in_section = false;
        }

        if line.to_lowercase().contains("command") && line.contains(':') {
            in_section = true;
        }
    }

    commands
}

fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Resolve, check and run a tool command, passing stdio straight through.
///
/// A non-zero exit becomes [`Error::ExitStatus`] carrying the child's code.
pub fn execute(
    entry: &ToolEntry,
    workspace: &Workspace,
    command: &str,
    args: &[String],
) -> Result<()> {
    let path = executable_path(entry, workspace)?;
    check_installed(entry, &path)?;

    debug!(tool = %entry.name, path = ?path, command, ?args, "running tool");

    let status = Command::new(&path)
        .arg(command)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| Error::Spawn {
            path: path.clone(),
            source,
        })?;

    debug!(tool = %entry.name, %status, "tool finished");

    if status.success() {
        return Ok(());
    }

    Err(Error::ExitStatus {
        tool: entry.name.clone(),
        command: command.to_string(),
        code: exit_code(status),
    })
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

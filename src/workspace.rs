use serde::Serialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser;

/// Standard name of the workspace descriptor file.
pub const WORKSPACE_FILE_NAME: &str = "nimsforest.workspace";

/// Version written into freshly created descriptors.
pub const DEFAULT_VERSION: &str = "1.0";

/// How a tool was installed into the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    /// Standalone executable; `path` points straight at it.
    Binary,
    /// Full source checkout.
    Clone,
    /// Source checkout embedded as a git submodule.
    Submodule,
}

impl InstallMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallMode::Binary => "binary",
            InstallMode::Clone => "clone",
            InstallMode::Submodule => "submodule",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "binary" => Ok(InstallMode::Binary),
            "clone" => Ok(InstallMode::Clone),
            "submodule" => Ok(InstallMode::Submodule),
            other => Err(format!(
                "invalid tool mode '{other}', expected 'binary', 'clone', or 'submodule'"
            )),
        }
    }
}

/// A tool installation recorded in the workspace descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolEntry {
    pub name: String,
    pub mode: InstallMode,
    /// Relative to the descriptor's directory unless absolute.
    pub path: String,
    /// Free-form label, only displayed.
    pub version: String,
}

impl ToolEntry {
    pub fn new(
        name: impl Into<String>,
        mode: InstallMode,
        path: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            path: path.into(),
            version: version.into(),
        }
    }

    /// Fields that would not survive a write and re-read of the descriptor.
    pub fn problems(&self) -> Vec<String> {
        [
            ("name", &self.name),
            ("path", &self.path),
            ("version", &self.version),
        ]
        .into_iter()
        .filter(|(field, value)| {
            !is_single_token(value) || (*field == "name" && value.starts_with('#'))
        })
        .map(|(field, value)| format!("tool '{}' has an invalid {field}: {value:?}", self.name))
        .collect()
    }
}

/// Organization and product paths resolved against the descriptor's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsolutePaths {
    pub organization: Option<PathBuf>,
    pub products: Vec<PathBuf>,
}

/// In-memory model of a `nimsforest.workspace` file.
///
/// Two values loaded from the same file are independent copies. Saving is
/// last-writer-wins: concurrent load/mutate/save cycles from separate
/// processes can silently drop each other's changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub products: Vec<String>,
    pub tools: Vec<ToolEntry>,
    /// Absolute path the descriptor was loaded from or last saved to.
    #[serde(rename = "file", skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            organization: None,
            products: Vec::new(),
            tools: Vec::new(),
            source_path: None,
        }
    }

    /// Load and parse a descriptor file, remembering where it came from.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        let mut workspace = parser::parse(&contents)?;
        workspace.source_path = Some(absolute(path)?);
        debug!(path = ?path, tools = workspace.tools.len(), "loaded workspace");
        Ok(workspace)
    }

    /// Locate the descriptor by walking up from `dir`, then load it.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let file = find_workspace_file(dir)?;
        Self::load(&file)
    }

    /// Write the descriptor to its `source_path`.
    pub fn save(&self) -> Result<()> {
        let path = self.source_path.as_deref().ok_or(Error::SourcePathUnset)?;
        write_descriptor(path, &parser::serialize(self))
    }

    /// Write the descriptor to `path` and adopt it as the new `source_path`.
    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        write_descriptor(path, &parser::serialize(self))?;
        self.source_path = Some(absolute(path)?);
        Ok(())
    }

    /// Directory relative paths are resolved against, once a source path is known.
    pub fn base_dir(&self) -> Option<&Path> {
        self.source_path.as_deref().and_then(Path::parent)
    }

    pub fn set_organization(&mut self, path: impl Into<String>) {
        self.organization = Some(path.into());
    }

    /// Append a product unless the exact same path is already listed.
    pub fn add_product(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.products.contains(&path) {
            self.products.push(path);
        }
    }

    pub fn remove_product(&mut self, path: &str) {
        if let Some(index) = self.products.iter().position(|p| p == path) {
            self.products.remove(index);
        }
    }

    pub fn has_product(&self, path: &str) -> bool {
        self.products.iter().any(|p| p == path)
    }

    /// Insert a tool, replacing any entry with the same name in place.
    pub fn add_tool(&mut self, entry: ToolEntry) {
        match self.tools.iter_mut().find(|t| t.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.tools.push(entry),
        }
    }

    pub fn remove_tool(&mut self, name: &str) {
        self.tools.retain(|t| t.name != name);
    }

    pub fn get_tool(&self, name: &str) -> Result<&ToolEntry> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))
    }

    /// Values that would not survive a write and re-read of the descriptor.
    ///
    /// Covers the version, the organization, every product and every tool
    /// entry. Paths are not checked against the filesystem.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.version.is_empty() {
            problems.push("version cannot be empty".to_string());
        } else if !parser::is_valid_version(&self.version) {
            problems.push(format!(
                "invalid version format, expected format like '1.0', got: {}",
                self.version
            ));
        }

        if let Some(organization) = &self.organization {
            if !is_single_token(organization) {
                problems.push(format!(
                    "organization must be a single non-empty path without whitespace, got: {organization:?}"
                ));
            }
        }

        for product in &self.products {
            if !is_storable_line(product) {
                problems.push(format!("invalid product path: {product:?}"));
            }
        }

        for tool in &self.tools {
            problems.extend(tool.problems());
        }

        problems
    }

    /// Check required fields and that referenced directories exist.
    ///
    /// Relative paths are only checked once `source_path` is set; without it
    /// there is nothing to resolve them against, so they are skipped rather
    /// than reported. Every problem found is listed in the returned error.
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.problems();

        let base = self.base_dir();

        if let Some(organization) = &self.organization {
            if let Some(path) = existence_target(base, organization) {
                if !path.exists() {
                    problems.push(format!(
                        "organization path does not exist: {}",
                        path.display()
                    ));
                }
            }
        }

        for product in &self.products {
            if let Some(path) = existence_target(base, product) {
                if !path.exists() {
                    problems.push(format!("product path does not exist: {}", path.display()));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { problems })
        }
    }

    /// Resolve organization and product paths against the descriptor's directory.
    pub fn absolute_paths(&self) -> Result<AbsolutePaths> {
        let base = self.base_dir().ok_or(Error::SourcePathUnset)?;

        Ok(AbsolutePaths {
            organization: self.organization.as_deref().map(|o| resolve_path(base, o)),
            products: self
                .products
                .iter()
                .map(|p| resolve_path(base, p))
                .collect(),
        })
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&parser::serialize(self))
    }
}

/// Walk from `start` towards the filesystem root looking for the descriptor.
pub fn find_workspace_file(start: &Path) -> Result<PathBuf> {
    let start = absolute(start)?;

    for dir in start.ancestors() {
        let candidate = dir.join(WORKSPACE_FILE_NAME);
        if candidate.is_file() {
            debug!(path = ?candidate, "found workspace file");
            return Ok(candidate);
        }
    }

    Err(Error::DescriptorNotFound { start })
}

/// Join a possibly relative descriptor path onto `base`, dropping `.` components.
pub fn resolve_path(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let mut resolved = base.to_path_buf();
    for component in path.components() {
        if component != Component::CurDir {
            resolved.push(component);
        }
    }
    resolved
}

fn existence_target(base: Option<&Path>, path: &str) -> Option<PathBuf> {
    if Path::new(path).is_absolute() {
        Some(PathBuf::from(path))
    } else {
        base.map(|base| resolve_path(base, path))
    }
}

fn is_single_token(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

/// A block entry that reads back as itself: not blank, not a comment, not the
/// closing `)`, and without surrounding or embedded line breaks.
fn is_storable_line(value: &str) -> bool {
    !value.is_empty()
        && value.trim() == value
        && !value.contains(['\n', '\r'])
        && !value.starts_with('#')
        && value != ")"
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| Error::io(".", source))?;
    Ok(cwd.join(path))
}

fn write_descriptor(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::io(parent, source))?;
    }

    fs::write(path, contents).map_err(|source| Error::io(path, source))?;
    debug!(path = ?path, "saved workspace");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tool(name: &str, path: &str, version: &str) -> ToolEntry {
        ToolEntry::new(name, InstallMode::Binary, path, version)
    }

    #[test]
    fn new_workspace_has_defaults() {
        let workspace = Workspace::new();
        assert_eq!(workspace.version, "1.0");
        assert!(workspace.organization.is_none());
        assert!(workspace.products.is_empty());
        assert!(workspace.tools.is_empty());
        assert!(workspace.source_path.is_none());
    }

    #[test]
    fn add_product_is_idempotent() {
        let mut workspace = Workspace::new();
        workspace.add_product("./p");
        workspace.add_product("./p");
        assert_eq!(workspace.products, vec!["./p"]);
    }

    #[test]
    fn add_product_preserves_order() {
        let mut workspace = Workspace::new();
        workspace.add_product("./b");
        workspace.add_product("./a");
        workspace.add_product("./b");
        assert_eq!(workspace.products, vec!["./b", "./a"]);
    }

    #[test]
    fn remove_product_missing_is_noop() {
        let mut workspace = Workspace::new();
        workspace.add_product("./a");
        workspace.remove_product("./missing");
        workspace.remove_product("./a");
        assert!(workspace.products.is_empty());
    }

    #[test]
    fn add_tool_upserts_in_place() {
        let mut workspace = Workspace::new();
        workspace.add_tool(tool("x", "bin/x", "1.0"));
        workspace.add_tool(tool("y", "bin/y", "1.0"));
        workspace.add_tool(tool("x", "bin/x2", "2.0"));

        assert_eq!(workspace.tools.len(), 2);
        assert_eq!(workspace.tools[0], tool("x", "bin/x2", "2.0"));
        assert_eq!(workspace.tools[1].name, "y");
    }

    #[test]
    fn get_and_remove_tool() {
        let mut workspace = Workspace::new();
        workspace.add_tool(tool("x", "bin/x", "latest"));

        assert_eq!(workspace.get_tool("x").unwrap().path, "bin/x");
        workspace.remove_tool("x");
        workspace.remove_tool("x");

        let err = workspace.get_tool("x").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(name) if name == "x"));
    }

    #[test]
    fn validate_skips_relative_paths_without_source() {
        let mut workspace = Workspace::new();
        workspace.set_organization("./does-not-exist");
        workspace.add_product("./also-missing");
        assert!(workspace.validate().is_ok());
    }

    #[test]
    fn validate_reports_every_missing_path() {
        let temp = TempDir::new().unwrap();
        let mut workspace = Workspace::new();
        workspace.set_organization("./org");
        workspace.add_product("./present");
        workspace.add_product("./missing");
        fs::create_dir_all(temp.path().join("present")).unwrap();
        workspace
            .save_to(&temp.path().join(WORKSPACE_FILE_NAME))
            .unwrap();

        let err = workspace.validate().unwrap_err();
        let Error::Validation { problems } = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("organization path does not exist"));
        assert!(problems[1].contains("missing"));
    }

    #[test]
    fn validate_checks_absolute_paths_without_source() {
        let mut workspace = Workspace::new();
        workspace.add_product("/definitely/not/a/real/path");
        assert!(workspace.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_version_and_bad_tool_fields() {
        let mut workspace = Workspace::new();
        workspace.version = String::new();
        workspace.add_tool(tool("bad name", "bin/x", "latest"));

        let err = workspace.validate().unwrap_err().to_string();
        assert!(err.contains("version cannot be empty"));
        assert!(err.contains("invalid name"));
    }

    #[test]
    fn tool_entry_problems() {
        assert!(tool("ok", "bin/ok", "v1").problems().is_empty());

        let problems = tool("ok", "", "two words").problems();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("invalid path"));
        assert!(problems[1].contains("invalid version"));
    }

    #[test]
    fn absolute_paths_require_source_path() {
        let workspace = Workspace::new();
        assert!(matches!(
            workspace.absolute_paths(),
            Err(Error::SourcePathUnset)
        ));
    }

    #[test]
    fn absolute_paths_resolve_against_descriptor_dir() {
        let mut workspace = Workspace::new();
        workspace.set_organization("./acme-organization-workspace");
        workspace.add_product("./products-workspace/alpha");
        workspace.add_product("/opt/beta");
        workspace.source_path = Some(PathBuf::from("/work/acme/nimsforest.workspace"));

        let paths = workspace.absolute_paths().unwrap();
        assert_eq!(
            paths.organization,
            Some(PathBuf::from("/work/acme/acme-organization-workspace"))
        );
        assert_eq!(
            paths.products,
            vec![
                PathBuf::from("/work/acme/products-workspace/alpha"),
                PathBuf::from("/opt/beta"),
            ]
        );
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(WORKSPACE_FILE_NAME);

        let mut workspace = Workspace::new();
        workspace.set_organization("./acme-organization-workspace");
        workspace.add_product("./a");
        workspace.add_tool(tool("example-tool", "bin/example-tool", "latest"));
        workspace.save_to(&path).unwrap();

        let loaded = Workspace::load(&path).unwrap();
        assert_eq!(loaded, workspace);
        assert_eq!(loaded.source_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn save_without_source_path_fails() {
        let workspace = Workspace::new();
        assert!(matches!(workspace.save(), Err(Error::SourcePathUnset)));
    }

    #[test]
    fn load_missing_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(WORKSPACE_FILE_NAME);
        let err = Workspace::load(&path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains(WORKSPACE_FILE_NAME));
    }

    #[test]
    fn find_workspace_file_walks_up() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(WORKSPACE_FILE_NAME);
        fs::write(&file, "nimsforest 1.0\n").unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_workspace_file(&nested).unwrap(), file);

        let loaded = Workspace::load_from_dir(&nested).unwrap();
        assert_eq!(loaded.version, "1.0");
    }

    #[test]
    fn find_workspace_file_not_found() {
        let temp = TempDir::new().unwrap();
        // The temp dir's ancestors are not expected to hold a descriptor.
        let err = find_workspace_file(temp.path()).unwrap_err();
        assert!(matches!(err, Error::DescriptorNotFound { .. }));
    }
}

//! Reader and writer for the `nimsforest.workspace` descriptor format.
//!
//! ```text
//! nimsforest 1.0
//!
//! organization ./acme-organization-workspace
//!
//! products (
//!     ./products-workspace/alpha-workspace
//! )
//!
//! tools (
//!     example-tool binary bin/example-tool latest
//! )
//! ```
//!
//! Blank lines and lines starting with `#` are ignored anywhere.

use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::workspace::{InstallMode, ToolEntry, Workspace};

const VERSION_KEYWORD: &str = "nimsforest";
const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Products,
    Tools,
}

impl Block {
    fn keyword(self) -> &'static str {
        match self {
            Block::Products => "products",
            Block::Tools => "tools",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Header,
    InBlock(Block),
}

/// Whether `version` has the `<major>.<minor>` shape descriptors require.
pub fn is_valid_version(version: &str) -> bool {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    VERSION
        .get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("version pattern is valid"))
        .is_match(version)
}

/// Parse descriptor text into a [`Workspace`] with no `source_path`.
pub fn parse(content: &str) -> Result<Workspace> {
    let mut workspace = Workspace::new();
    let mut state = State::Start;
    let mut products: Vec<String> = Vec::new();
    let mut tools: Vec<ToolEntry> = Vec::new();
    let mut last_line = 0;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        last_line = line_no;
        let line = raw.trim();

        if is_ignorable(line) {
            continue;
        }

        match state {
            State::Start => {
                workspace.version = parse_version_line(line, line_no)?;
                state = State::Header;
            }
            State::Header => {
                state = parse_header_line(line, line_no, &mut workspace)?;
            }
            State::InBlock(block) if line == ")" => {
                match block {
                    Block::Products => {
                        for path in products.drain(..) {
                            workspace.add_product(path);
                        }
                    }
                    Block::Tools => {
                        for entry in tools.drain(..) {
                            workspace.add_tool(entry);
                        }
                    }
                }
                state = State::Header;
            }
            State::InBlock(Block::Products) => products.push(line.to_string()),
            State::InBlock(Block::Tools) => tools.push(parse_tool_line(line, line_no)?),
        }
    }

    match state {
        State::Start => Err(Error::format(
            last_line.max(1),
            "missing version line, expected 'nimsforest <version>'",
        )),
        State::InBlock(block) => Err(Error::format(
            last_line,
            format!("{} section not properly closed with ')'", block.keyword()),
        )),
        State::Header => Ok(workspace),
    }
}

fn is_ignorable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

fn parse_version_line(line: &str, line_no: usize) -> Result<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    match parts.as_slice() {
        [VERSION_KEYWORD, version] if is_valid_version(version) => Ok(version.to_string()),
        [VERSION_KEYWORD, version] => Err(Error::format(
            line_no,
            format!("invalid version format, expected format like '1.0', got: {version}"),
        )),
        _ => Err(Error::format(
            line_no,
            format!("invalid version line, expected 'nimsforest <version>', got: {line}"),
        )),
    }
}

fn parse_header_line(line: &str, line_no: usize, workspace: &mut Workspace) -> Result<State> {
    match leading_keyword(line) {
        "organization" => {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["organization", path] => {
                    workspace.set_organization(*path);
                    Ok(State::Header)
                }
                _ => Err(Error::format(
                    line_no,
                    format!(
                        "invalid organization line format, expected 'organization <path>', got: {line}"
                    ),
                )),
            }
        }
        keyword @ ("products" | "tools") => {
            let block = if keyword == "products" {
                Block::Products
            } else {
                Block::Tools
            };
            if opens_block(line, block) {
                Ok(State::InBlock(block))
            } else {
                Err(Error::format(
                    line_no,
                    format!("invalid {keyword} section start, expected '{keyword} (', got: {line}"),
                ))
            }
        }
        _ => Err(Error::format(
            line_no,
            format!("unexpected line in header section: {line}"),
        )),
    }
}

fn parse_tool_line(line: &str, line_no: usize) -> Result<ToolEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [name, mode, path, version] = parts.as_slice() else {
        return Err(Error::format(
            line_no,
            format!("invalid tool line format, expected 'name mode path version', got: {line}"),
        ));
    };

    let mode: InstallMode = mode
        .parse()
        .map_err(|reason: String| Error::format(line_no, reason))?;

    Ok(ToolEntry::new(*name, mode, *path, *version))
}

/// First word of a line, also stopping at `(` so `products(` yields `products`.
fn leading_keyword(line: &str) -> &str {
    line.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
}

fn opens_block(line: &str, block: Block) -> bool {
    line.strip_prefix(block.keyword())
        .is_some_and(|rest| rest.trim() == "(")
}

/// Render a workspace in canonical descriptor form.
///
/// The output is deterministic and parses back into an equal workspace.
pub fn serialize(workspace: &Workspace) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{VERSION_KEYWORD} {}", workspace.version);

    if let Some(organization) = workspace.organization.as_deref().filter(|o| !o.is_empty()) {
        let _ = write!(out, "\norganization {organization}\n");
    }

    if !workspace.products.is_empty() {
        let _ = write!(out, "\n{} (\n", Block::Products.keyword());
        for product in &workspace.products {
            let _ = writeln!(out, "{INDENT}{product}");
        }
        out.push_str(")\n");
    }

    if !workspace.tools.is_empty() {
        let _ = write!(out, "\n{} (\n", Block::Tools.keyword());
        for tool in &workspace.tools {
            let _ = writeln!(
                out,
                "{INDENT}{} {} {} {}",
                tool.name, tool.mode, tool.path, tool.version
            );
        }
        out.push_str(")\n");
    }

    out
}

/// Reformat hand-edited descriptor text without fully parsing it.
///
/// Lines are trimmed, block entries are indented by four spaces, block
/// openers become `products (` / `tools (`, and comment lines are kept
/// exactly as written. Blank lines are kept.
pub fn normalize(content: &str) -> String {
    let mut block: Option<Block> = None;

    content
        .split('\n')
        .map(|original| {
            let line = original.trim();

            if line.is_empty() {
                return String::new();
            }
            if line.starts_with('#') {
                return original.trim_end_matches('\r').to_string();
            }

            if block.is_none() {
                for candidate in [Block::Products, Block::Tools] {
                    if opens_block(line, candidate) {
                        block = Some(candidate);
                        return format!("{} (", candidate.keyword());
                    }
                }
                return line.to_string();
            }

            if line == ")" {
                block = None;
                return ")".to_string();
            }

            format!("{INDENT}{line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cheap check that `content` looks like a descriptor at all.
pub fn validate_format(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::format(1, "workspace content cannot be empty"));
    }

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if is_ignorable(line) {
            continue;
        }
        if leading_keyword(line) == VERSION_KEYWORD {
            return Ok(());
        }
        return Err(Error::format(
            index + 1,
            "first non-empty, non-comment line must be version line starting with 'nimsforest'",
        ));
    }

    Err(Error::format(
        content.lines().count().max(1),
        "version line starting with 'nimsforest' not found",
    ))
}

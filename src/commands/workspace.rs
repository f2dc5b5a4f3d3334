use crate::cli::WorkspaceAction;
use crate::workspace::WORKSPACE_FILE_NAME;
use crate::{ui, ToolManager, Workspace};
use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use super::load_workspace;

pub fn execute(location: Option<&Path>, action: WorkspaceAction) -> Result<()> {
    match action {
        WorkspaceAction::Init { organization } => init(location, &organization),
        WorkspaceAction::Status { json } => status(location, json),
        WorkspaceAction::Add { path } => add_product(location, &path),
        WorkspaceAction::Remove { path } => remove_product(location, &path),
    }
}

fn init(location: Option<&Path>, organization: &str) -> Result<()> {
    let organization = organization.trim();
    if organization.is_empty() {
        bail!("Organization cannot be empty");
    }

    let target = init_target(location)?;
    if target.exists() {
        bail!(
            "Workspace file already exists: {}\nUse 'nimsforestpm workspace status' to view current configuration",
            target.display()
        );
    }

    let mut workspace = Workspace::new();
    workspace.set_organization(organization);
    reject_unstorable(&workspace)?;
    workspace
        .save_to(&target)
        .with_context(|| format!("Failed to save workspace file {:?}", target))?;

    ui::success("Initialized", target.display());
    ui::status("Organization", organization);
    ui::status("Version", &workspace.version);
    ui::info(
        "Next steps:\n  nimsforestpm workspace add <path>   add products\n  nimsforestpm tool add <name> ...    register tools",
    );
    Ok(())
}

fn init_target(location: Option<&Path>) -> Result<PathBuf> {
    Ok(match location {
        Some(path) if path.is_dir() => path.join(WORKSPACE_FILE_NAME),
        Some(path) => path.to_path_buf(),
        None => env::current_dir()
            .context("Cannot get current directory")?
            .join(WORKSPACE_FILE_NAME),
    })
}

fn status(location: Option<&Path>, json: bool) -> Result<()> {
    let workspace = load_workspace(location)?;

    if json {
        let rendered = serde_json::to_string_pretty(&workspace)
            .context("Failed to serialize workspace")?;
        println!("{rendered}");
        return Ok(());
    }

    if let Some(path) = &workspace.source_path {
        ui::status("File", path.display());
    }
    ui::status("Version", &workspace.version);
    if let Some(organization) = &workspace.organization {
        ui::status("Organization", organization);
    }

    ui::status(
        "Products",
        listing(workspace.products.len(), workspace.products.iter().cloned()),
    );

    let manager = ToolManager::new(workspace);
    let tools = manager.list_tools();
    ui::status(
        "Tools",
        listing(
            tools.len(),
            tools
                .iter()
                .map(|t| format!("{} ({}) at {}", t.name(), t.mode(), t.path())),
        ),
    );

    let workspace = manager.workspace();
    match workspace.validate() {
        Ok(()) => ui::success("Valid", "workspace is valid"),
        Err(err) => ui::warn(err),
    }

    match workspace.absolute_paths() {
        Ok(paths) => {
            if let Some(organization) = paths.organization {
                ui::status("Resolved", format!("organization {}", organization.display()));
            }
            for product in paths.products {
                ui::status("Resolved", format!("product {}", product.display()));
            }
        }
        Err(err) => ui::warn(format!("Error resolving paths: {err}")),
    }

    Ok(())
}

fn listing(count: usize, items: impl Iterator<Item = String>) -> String {
    let mut out = format!("({count})");
    if count == 0 {
        out.push_str("\n(none)");
    }
    for item in items {
        out.push_str("\n- ");
        out.push_str(&item);
    }
    out
}

fn add_product(location: Option<&Path>, path: &str) -> Result<()> {
    let path = path.trim();
    if path.is_empty() {
        bail!("Product path cannot be empty");
    }

    let mut workspace = load_workspace(location)?;
    if workspace.has_product(path) {
        ui::info(format!("Product already exists in workspace: {path}"));
        return Ok(());
    }

    workspace.add_product(path);
    reject_unstorable(&workspace)?;
    workspace.save().context("Failed to save workspace")?;

    ui::success(
        "Added",
        format!("{path} (total products: {})", workspace.products.len()),
    );
    Ok(())
}

fn reject_unstorable(workspace: &Workspace) -> Result<()> {
    let problems = workspace.problems();
    if !problems.is_empty() {
        bail!("Refusing to save: {}", problems.join("; "));
    }
    Ok(())
}

fn remove_product(location: Option<&Path>, path: &str) -> Result<()> {
    let path = path.trim();
    if path.is_empty() {
        bail!("Product path cannot be empty");
    }

    let mut workspace = load_workspace(location)?;
    if !workspace.has_product(path) {
        ui::status(
            "Available",
            listing(workspace.products.len(), workspace.products.iter().cloned()),
        );
        bail!("Product not found in workspace: {path}");
    }

    workspace.remove_product(path);
    workspace.save().context("Failed to save workspace")?;

    ui::success(
        "Removed",
        format!("{path} (remaining products: {})", workspace.products.len()),
    );
    Ok(())
}

use crate::parser::{normalize, validate_format};
use crate::ui;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::locate_workspace_file;

pub fn execute(location: Option<&Path>, check: bool) -> Result<()> {
    let path = locate_workspace_file(location)?;
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read workspace file {:?}", path))?;

    validate_format(&contents)
        .with_context(|| format!("{} is not a workspace file", path.display()))?;

    let normalized = normalize(&contents);
    if normalized == contents {
        ui::success("Formatted", path.display());
        return Ok(());
    }

    if check {
        bail!(
            "{} is not formatted. Run 'nimsforestpm fmt' to fix it.",
            path.display()
        );
    }

    fs::write(&path, normalized)
        .with_context(|| format!("Failed to write workspace file {:?}", path))?;
    ui::success("Reformatted", path.display());
    Ok(())
}

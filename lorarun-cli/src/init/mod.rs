//! Initialize experiment directories based on templates.

pub mod experiment;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Error, Result};

// Initiate new experiment directory based on the template name
pub fn init_at_path(path_str: &str, template_str: &str) -> Result<()> {
    println!(
        "Initiating new experiment at: {path} (template: {template}) ",
        path = path_str,
        template = template_str
    );

    // test if directory doesn't already exist at path
    let path = Path::new(path_str);
    if path.exists() {
        return Err(Error::msg(format!(
            "Can't initialize experiment, path already exists ({path}). Try another path.",
            path = path_str
        )));
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("experiment");
    let template_files = experiment::collect_template_files(name, template_str)?.ok_or_else(|| {
        Error::msg(format!(
            "Failed getting experiment template files for template \"{}\"",
            template_str
        ))
    })?;

    fs::create_dir_all(path)
        .with_context(|| format!("failed creating directory: {}", path_str))?;
    create_template_files(path, template_files)
}

// Create actual files from the template file content
fn create_template_files(path: &Path, files: HashMap<String, String>) -> Result<()> {
    for (name, content) in files {
        let file_full_path = path.join(name);
        if let Some(parent) = file_full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_full_path, content).with_context(|| {
            format!(
                "Failed to create a template file \"{}\"",
                file_full_path.to_string_lossy()
            )
        })?;
    }
    Ok(())
}

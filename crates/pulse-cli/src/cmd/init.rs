use crate::output::print_json;
use anyhow::Context;
use pulse_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path, project: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project = project.map(|p| p.trim().to_ascii_uppercase());

    let dir = paths::pulse_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let data = serde_yaml::to_string(&Config::with_project(project.clone()))
        .context("failed to render config")?;
    let created = io::write_if_missing(&config_path, data.as_bytes())
        .context("failed to write config.yaml")?;

    if json {
        return print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config": paths::CONFIG_FILE,
            "created": created,
        }));
    }

    println!("Initializing pulse in: {}", root.display());
    if created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
        if project.is_some() {
            println!("  (existing config left unchanged; edit jira.project to change the default project)");
        }
    }
    Ok(())
}

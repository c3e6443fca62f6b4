use crate::output::{print_json, print_table};
use anyhow::Context;
use pulse_core::jira::JiraClient;
use pulse_core::tool_runner::SystemRunner;

pub fn run(json: bool) -> anyhow::Result<()> {
    let runner = SystemRunner;
    let projects = JiraClient::new(&runner)
        .list_projects()
        .context("failed to list Jira projects")?;

    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects visible to the jira CLI.");
        return Ok(());
    }
    let rows = projects
        .into_iter()
        .map(|p| vec![p.key, p.name])
        .collect();
    print_table(&["KEY", "NAME"], rows);
    Ok(())
}

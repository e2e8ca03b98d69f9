// UI layer: a simple interactive menu using `dialoguer`. Each entry runs
// one request against the server and prints the JSON it answered with.
// Failures are printed and the menu keeps going.

use crate::api::{ApiClient, Credentials, SubmissionRequest};
use crate::demo::{demo_workflow, DEFAULT_PROMPT};
use crate::error::ClientError;
use crate::workflow::WorkflowGraph;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Main interactive menu. Runs a select loop until the user chooses "Exit".
pub fn main_menu(api: &ApiClient) -> Result<()> {
    println!("Server URL: {}", api.base_url());
    println!("Client ID: {}", api.client_id());
    loop {
        let items = vec![
            "Check server",
            "Submit demo workflow",
            "Submit workflow from file",
            "Show queue",
            "Show history",
            "Upload image",
            "Exit",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => handle_check(api)?,
            1 => {
                let prompt: String = Input::new()
                    .with_prompt("Prompt")
                    .default(DEFAULT_PROMPT.to_string())
                    .interact_text()?;
                handle_submit(api, &demo_workflow(&prompt))?;
            }
            2 => {
                let path: String = Input::new()
                    .with_prompt("Workflow JSON file (API format)")
                    .interact_text()?;
                match load_workflow(Path::new(&path)) {
                    Ok(graph) => handle_submit(api, &graph)?,
                    Err(e) => println!("Could not load workflow: {:#}", e),
                }
            }
            3 => {
                let pb = spinner("Fetching queue...")?;
                let res = api.get_queue();
                pb.finish_and_clear();
                match res {
                    Ok(queue) => print_json(&queue)?,
                    Err(e) => report(&e),
                }
            }
            4 => handle_history(api)?,
            5 => handle_upload(api)?,
            6 => break,
            _ => {}
        }
    }
    Ok(())
}

fn handle_check(api: &ApiClient) -> Result<()> {
    let pb = spinner("Contacting server...")?;
    let reachable = api.check_connectivity();
    pb.finish_and_clear();
    if !reachable {
        println!("Server at {} is not reachable.", api.base_url());
        return Ok(());
    }
    println!("Server at {} is up.", api.base_url());
    match api.system_stats() {
        Ok(stats) => print_json(&stats)?,
        Err(e) => report(&e),
    }
    Ok(())
}

/// Print the payload outline with the workflow elided and the key masked,
/// then submit.
fn handle_submit(api: &ApiClient, graph: &WorkflowGraph) -> Result<()> {
    let credentials = api.credentials(None);
    let elided = WorkflowGraph::new();
    let outline = SubmissionRequest {
        prompt: &elided,
        client_id: api.client_id(),
        extra_data: credentials.as_ref().map(|c| Credentials::new(c.masked())),
    };
    println!("Payload structure ({} nodes in prompt):", graph.len());
    print_json(&outline)?;

    let pb = spinner("Sending request to /prompt...")?;
    let res = api.submit(graph, credentials.as_ref());
    pb.finish_and_clear();
    match res {
        Ok(result) => {
            println!("Success! Response:");
            print_json(&result)?;
            if let Some(id) = &result.request_id {
                println!("Prompt ID: {}", id);
                println!("Check the execution status at: {}", api.history_url(id));
            }
        }
        Err(e) => report(&e),
    }
    Ok(())
}

fn handle_history(api: &ApiClient) -> Result<()> {
    let id: String = Input::new()
        .with_prompt("Prompt ID (empty for all)")
        .allow_empty(true)
        .interact_text()?;
    let id = id.trim();
    let pb = spinner("Fetching history...")?;
    let res = api.get_history(if id.is_empty() { None } else { Some(id) });
    pb.finish_and_clear();
    match res {
        Ok(history) => print_json(&history)?,
        Err(e) => report(&e),
    }
    Ok(())
}

fn handle_upload(api: &ApiClient) -> Result<()> {
    let path: String = Input::new().with_prompt("Image file path").interact_text()?;
    let subfolder: String = Input::new()
        .with_prompt("Subfolder (empty for none)")
        .allow_empty(true)
        .interact_text()?;
    let overwrite = Confirm::new()
        .with_prompt("Overwrite existing file?")
        .default(false)
        .interact()?;
    let subfolder = subfolder.trim();

    let pb = spinner("Uploading...")?;
    let res = api.upload_image(
        Path::new(&path),
        if subfolder.is_empty() { None } else { Some(subfolder) },
        overwrite,
    );
    pb.finish_and_clear();
    match res {
        Ok(uploaded) => {
            println!("Upload successful");
            print_json(&uploaded)?;
        }
        Err(e) => report(&e),
    }
    Ok(())
}

fn load_workflow(path: &Path) -> Result<WorkflowGraph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    WorkflowGraph::from_json(&text).context("Parsing workflow json")
}

fn report(err: &ClientError) {
    match err {
        ClientError::Server { status, body } => {
            println!("Error! Status {}. Response:", status);
            println!("{}", body);
        }
        // Keep the raw body visible rather than hiding it behind a parse error.
        ClientError::MalformedResponse { status, body } => {
            println!("Status {} but the response was not JSON:", status);
            println!("{}", body);
        }
        other => println!("Request failed: {}", other),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_workflow_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"1": {{"class_type": "A", "inputs": {{"x": 1}}}}}}"#).unwrap();
        let graph = load_workflow(file.path()).unwrap();
        assert_eq!(graph.get("1").unwrap().class_type, "A");
    }

    #[test]
    fn missing_workflow_file_is_reported() {
        let err = load_workflow(Path::new("/nonexistent/workflow.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read"));
    }
}

// Entrypoint for the CLI application.
// Sets up logging, builds the API client from the environment and hands it
// to the menu loop.

use comfy_prompt_cli::{api::ApiClient, ui::main_menu};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Server address comes from COMFY_HOST / COMFY_PORT, defaulting to
    // 127.0.0.1:8188. See `config::ClientConfig::from_env`.
    let api = ApiClient::from_env()?;

    main_menu(&api)?;
    Ok(())
}

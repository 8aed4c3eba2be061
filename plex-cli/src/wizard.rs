//! Interactive `setup` command driving the config flow over stdin

use anyhow::{bail, Context, Result};
use plex_sdk::{AuthType, ConfigFlow, ConfigStore, FlowBackend, FlowError, FlowResult, FlowStep};
use std::io::{self, BufRead, Write};
use tracing::info;

/// Run the wizard to completion and save the resulting entry
pub async fn run_setup<B: FlowBackend>(
    flow: &mut ConfigFlow<B>,
    store: &ConfigStore,
) -> Result<()> {
    let mut result = flow.step_user().await;

    loop {
        result = match result {
            FlowResult::ShowForm {
                step,
                errors,
                placeholders,
            } => {
                for error in &errors {
                    println!("! {}", error_message(*error));
                }
                match step {
                    FlowStep::User => flow.step_user().await,
                    FlowStep::AuthType => {
                        let answer =
                            prompt("Authenticate with plex.tv PIN or manual token? [pin/manual]: ")
                                .await?;
                        flow.step_auth_type(Some(parse_auth_type(&answer))).await
                    }
                    FlowStep::Manual => {
                        let token = prompt("Plex token: ").await?;
                        flow.step_manual(Some(token)).await
                    }
                    FlowStep::Pin => {
                        let code = placeholders.get("code").map(String::as_str).unwrap_or("?");
                        let url = placeholders.get("url").map(String::as_str).unwrap_or("");
                        println!("Open {} and enter the code {}", url, code);
                        prompt("Press Enter once the code is linked...").await?;
                        flow.step_pin(true).await
                    }
                    FlowStep::Server => {
                        let url = prompt("Server URL (e.g. http://192.168.1.10:32400): ").await?;
                        flow.step_server(Some(url)).await
                    }
                }
            }
            FlowResult::CreateEntry { title, data } => {
                store
                    .save(&data)
                    .with_context(|| format!("Failed to save {}", store.path().display()))?;
                info!("Configured '{}' at {}", title, data.server_url);
                println!("Saved '{}' to {}", title, store.path().display());
                return Ok(());
            }
            FlowResult::Abort { reason } => bail!("Setup aborted: {}", reason),
        };
    }
}

fn parse_auth_type(answer: &str) -> AuthType {
    match answer.trim().to_ascii_lowercase().as_str() {
        "manual" | "m" | "token" => AuthType::Manual,
        _ => AuthType::Pin,
    }
}

fn error_message(error: FlowError) -> &'static str {
    match error {
        FlowError::NotAuthenticated => "The PIN has not been linked yet",
        FlowError::CannotConnect => "Cannot connect to that server with this token",
    }
}

async fn prompt(label: &str) -> Result<String> {
    let label = label.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{}", label);
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            bail!("Input closed");
        }
        Ok(line.trim().to_string())
    })
    .await
    .context("Prompt task failed")?
}

//! Local script enhancement through the Ollama CLI.
//!
//! Runs `ollama run <model> <prompt>` and takes stdout as the result. The
//! call is bounded by a timeout; a missing binary or non-zero exit becomes
//! an `AppError::Api`.

use std::time::Duration;

use tokio::process::Command;

use crate::error::AppError;
use crate::services::llm::{self, EnhancementStyle};

const OLLAMA_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn run_prompt(model: &str, prompt: &str) -> Result<String, AppError> {
    let mut command = Command::new("ollama");
    command.arg("run").arg(model).arg(prompt).kill_on_drop(true);

    let output = tokio::time::timeout(OLLAMA_TIMEOUT, command.output())
        .await
        .map_err(|_| {
            AppError::api(
                "Ollama timed out",
                format!("no response within {} seconds", OLLAMA_TIMEOUT.as_secs()),
            )
        })?
        .map_err(|e| AppError::api("Failed to start Ollama", e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("Ollama exited with {}: {}", output.status, stderr);
        return Err(AppError::api("Ollama failed", stderr.trim().to_string()));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        return Err(AppError::api("Ollama returned no output", model.to_string()));
    }
    Ok(text)
}

pub async fn enhance_script(
    model: &str,
    script: &str,
    guidance: &str,
    style: EnhancementStyle,
) -> Result<String, AppError> {
    run_prompt(model, &llm::enhancement_prompt(script, guidance, style)).await
}

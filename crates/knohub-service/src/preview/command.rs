//! External command execution for preview tools.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{error, info};

use knohub_core::error::AppError;
use knohub_core::result::AppResult;

/// Longest stderr excerpt carried in an error message.
const STDERR_EXCERPT: usize = 500;

/// Split `template` on whitespace and substitute `{{key}}` placeholders in
/// each argument.
pub fn expand_template(template: &str, values: &[(&str, &str)]) -> Vec<String> {
    template
        .split_whitespace()
        .map(|arg| {
            values.iter().fold(arg.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{{{key}}}}}"), value)
            })
        })
        .collect()
}

/// Run an expanded command line, failing with `Rendering` on a non-zero
/// exit, a spawn failure, or a timeout.
pub async fn run(args: &[String], working_dir: Option<&Path>, timeout_seconds: u64) -> AppResult<()> {
    let Some((program, rest)) = args.split_first() else {
        return Err(AppError::configuration("Preview command template is empty"));
    };

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let start = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(timeout_seconds), cmd.output()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(output)) if output.status.success() => {
            info!(command = %program, duration_ms, "Preview command finished");
            Ok(())
        }
        Ok(Ok(output)) => {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(STDERR_EXCERPT)
                .collect();
            let code = output.status.code().unwrap_or(-1);
            error!(command = %program, code, stderr = %stderr, "Preview command failed");
            Err(AppError::rendering(format!(
                "{program} exited with code {code}: {stderr}"
            )))
        }
        Ok(Err(e)) => {
            error!(command = %program, error = %e, "Failed to start preview command");
            Err(AppError::rendering(format!("Failed to start {program}: {e}")))
        }
        Err(_) => {
            error!(command = %program, timeout_seconds, "Preview command timed out");
            Err(AppError::rendering(format!(
                "{program} timed out after {timeout_seconds}s"
            )))
        }
    }
}

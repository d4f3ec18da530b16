//! Circuit diagram rasterizing.

use std::path::Path;

use async_trait::async_trait;

use knohub_core::config::CircuitPreviewConfig;
use knohub_core::result::AppResult;

use super::command;

/// Renders a circuit file to an image.
#[async_trait]
pub trait CircuitRenderer: Send + Sync + std::fmt::Debug + 'static {
    /// Write an image of `input` to `output`.
    async fn render(&self, input: &Path, output: &Path) -> AppResult<()>;
}

/// Renderer driven by an external command line.
#[derive(Debug, Clone)]
pub struct CommandCircuitRenderer {
    config: CircuitPreviewConfig,
}

impl CommandCircuitRenderer {
    pub fn new(config: CircuitPreviewConfig) -> Self {
        Self { config }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        command::expand_template(
            &self.config.command_template,
            &[
                ("jar", self.config.jar_path.as_str()),
                ("input", input.as_ref()),
                ("output", output.as_ref()),
            ],
        )
    }
}

#[async_trait]
impl CircuitRenderer for CommandCircuitRenderer {
    async fn render(&self, input: &Path, output: &Path) -> AppResult<()> {
        let args = self.args(input, output);
        command::run(&args, input.parent(), self.config.timeout_seconds).await
    }
}

//! External preview tool configuration.
//!
//! Command templates are split on whitespace first and placeholders are
//! substituted per argument, so paths containing spaces stay intact.

use serde::{Deserialize, Serialize};

/// Preview tooling configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Circuit-diagram raster renderer.
    #[serde(default)]
    pub circuit: CircuitPreviewConfig,
    /// Legacy document to HTML converter.
    #[serde(default)]
    pub document: DocumentPreviewConfig,
}

/// Circuit renderer settings.
///
/// Placeholders: `{{jar}}`, `{{input}}`, `{{output}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitPreviewConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to the renderer jar.
    #[serde(default = "default_jar_path")]
    pub jar_path: String,
    #[serde(default = "default_circuit_command")]
    pub command_template: String,
    #[serde(default = "default_circuit_timeout")]
    pub timeout_seconds: u64,
    /// Image extension produced next to the blob (e.g. `png`).
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// File types routed to the renderer.
    #[serde(default = "default_circuit_extensions")]
    pub extensions: Vec<String>,
}

impl Default for CircuitPreviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            jar_path: default_jar_path(),
            command_template: default_circuit_command(),
            timeout_seconds: default_circuit_timeout(),
            output_format: default_output_format(),
            extensions: default_circuit_extensions(),
        }
    }
}

/// Document converter settings.
///
/// Placeholders: `{{input}}`, `{{outdir}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPreviewConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_document_command")]
    pub command_template: String,
    #[serde(default = "default_document_timeout")]
    pub timeout_seconds: u64,
    /// File types routed to the converter.
    #[serde(default = "default_document_extensions")]
    pub extensions: Vec<String>,
}

impl Default for DocumentPreviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            command_template: default_document_command(),
            timeout_seconds: default_document_timeout(),
            extensions: default_document_extensions(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_jar_path() -> String {
    "./tools/logisim-evolution.jar".to_string()
}

fn default_circuit_command() -> String {
    "java -jar {{jar}} -export {{output}} {{input}}".to_string()
}

fn default_circuit_timeout() -> u64 {
    20
}

fn default_output_format() -> String {
    "png".to_string()
}

fn default_circuit_extensions() -> Vec<String> {
    vec!["circ".to_string()]
}

fn default_document_command() -> String {
    "soffice --headless --convert-to html --outdir {{outdir}} {{input}}".to_string()
}

fn default_document_timeout() -> u64 {
    60
}

fn default_document_extensions() -> Vec<String> {
    vec!["doc".to_string()]
}

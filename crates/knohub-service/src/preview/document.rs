//! Legacy document to HTML conversion.
//!
//! The converter writes its HTML and any extracted pictures into a scratch
//! directory. Pictures referenced from the HTML are inlined as `data:` URIs
//! so the result is a single self-contained page.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use knohub_core::config::DocumentPreviewConfig;
use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;

use super::command;

/// Turns a document into a standalone HTML page.
#[async_trait]
pub trait DocumentConverter: Send + Sync + std::fmt::Debug + 'static {
    /// Convert `data`, named `file_name`, to HTML.
    async fn convert(&self, file_name: &str, data: Bytes) -> AppResult<String>;
}

/// Converter driven by an external command line.
#[derive(Debug, Clone)]
pub struct CommandDocumentConverter {
    config: DocumentPreviewConfig,
    scratch_root: PathBuf,
}

impl CommandDocumentConverter {
    pub fn new(config: DocumentPreviewConfig) -> Self {
        Self {
            config,
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Use `root` for scratch directories instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    async fn convert_in(&self, workdir: &Path, file_name: &str, data: Bytes) -> AppResult<String> {
        let input = workdir.join(scratch_input_name(file_name));
        let outdir = workdir.join("out");
        fs::create_dir_all(&outdir).await.map_err(|e| {
            AppError::with_source(ErrorKind::IoFailure, "Failed to prepare scratch directory", e)
        })?;
        fs::write(&input, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::IoFailure, "Failed to write scratch document", e)
        })?;

        let input_str = input.to_string_lossy();
        let outdir_str = outdir.to_string_lossy();
        let args = command::expand_template(
            &self.config.command_template,
            &[("input", input_str.as_ref()), ("outdir", outdir_str.as_ref())],
        );
        command::run(&args, Some(workdir), self.config.timeout_seconds).await?;

        let mut html_path = None;
        let mut pictures = Vec::new();
        let mut entries = fs::read_dir(&outdir).await.map_err(|e| {
            AppError::with_source(ErrorKind::IoFailure, "Failed to read converter output", e)
        })?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::IoFailure, "Failed to read converter output", e)
        })? {
            let path = entry.path();
            match extension_of(&path).as_deref() {
                Some("html") | Some("htm") => html_path = Some(path),
                Some(ext) => {
                    if let Some(mime) = image_mime(ext) {
                        pictures.push((path, mime));
                    }
                }
                None => {}
            }
        }

        let html_path =
            html_path.ok_or_else(|| AppError::rendering("Converter produced no HTML output"))?;
        let raw = fs::read(&html_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::IoFailure, "Failed to read converted HTML", e)
        })?;
        let mut html = String::from_utf8_lossy(&raw).into_owned();

        for (path, mime) in pictures {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            match fs::read(&path).await {
                Ok(bytes) => html = inline_picture(&html, &name, mime, &bytes),
                Err(e) => warn!(picture = %name, error = %e, "Skipping unreadable picture"),
            }
        }

        Ok(html)
    }
}

#[async_trait]
impl DocumentConverter for CommandDocumentConverter {
    async fn convert(&self, file_name: &str, data: Bytes) -> AppResult<String> {
        let workdir = self.scratch_root.join(format!("knohub-doc-{}", Uuid::new_v4()));
        let result = self.convert_in(&workdir, file_name, data).await;

        if let Err(e) = fs::remove_dir_all(&workdir).await {
            debug!(dir = %workdir.display(), error = %e, "Failed to clean scratch directory");
        }
        result
    }
}

/// Scratch file name keeping only the extension of the original.
fn scratch_input_name(file_name: &str) -> String {
    match extension_of(Path::new(file_name)) {
        Some(ext) => format!("document.{ext}"),
        None => "document".to_string(),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn image_mime(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "wmf" => Some("image/x-wmf"),
        "emf" => Some("image/x-emf"),
        _ => None,
    }
}

/// Replace `src` references to `name` with a `data:` URI.
fn inline_picture(html: &str, name: &str, mime: &str, bytes: &[u8]) -> String {
    let uri = format!("data:{mime};base64,{}", STANDARD.encode(bytes));
    html.replace(&format!("src=\"{name}\""), &format!("src=\"{uri}\""))
        .replace(&format!("src='{name}'"), &format!("src='{uri}'"))
}

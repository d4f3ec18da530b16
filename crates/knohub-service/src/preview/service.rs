//! Preview orchestration for stored files.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use knohub_core::config::PreviewConfig;
use knohub_core::error::{AppError, ErrorKind};
use knohub_core::result::AppResult;
use knohub_core::types::FileItemId;
use knohub_entity::file_item::FileItem;

use super::circuit::{CircuitRenderer, CommandCircuitRenderer};
use super::document::{CommandDocumentConverter, DocumentConverter};
use crate::tree::FileTreeEngine;

/// Serves circuit preview images and document HTML renditions.
#[derive(Debug, Clone)]
pub struct PreviewService {
    engine: Arc<FileTreeEngine>,
    config: PreviewConfig,
    /// `None` when circuit previews are disabled.
    renderer: Option<Arc<dyn CircuitRenderer>>,
    /// `None` when document rendering is disabled.
    converter: Option<Arc<dyn DocumentConverter>>,
}

impl PreviewService {
    /// Build the service with command-line tools from `config`.
    pub fn new(engine: Arc<FileTreeEngine>, config: PreviewConfig) -> Self {
        let renderer = config.circuit.enabled.then(|| {
            Arc::new(CommandCircuitRenderer::new(config.circuit.clone())) as Arc<dyn CircuitRenderer>
        });
        let converter = config.document.enabled.then(|| {
            Arc::new(CommandDocumentConverter::new(config.document.clone()))
                as Arc<dyn DocumentConverter>
        });
        Self {
            engine,
            config,
            renderer,
            converter,
        }
    }

    /// Build the service with explicit tools.
    pub fn with_tools(
        engine: Arc<FileTreeEngine>,
        config: PreviewConfig,
        renderer: Option<Arc<dyn CircuitRenderer>>,
        converter: Option<Arc<dyn DocumentConverter>>,
    ) -> Self {
        Self {
            engine,
            config,
            renderer,
            converter,
        }
    }

    fn is_circuit(&self, item: &FileItem) -> bool {
        !item.is_folder
            && item.file_type.as_deref().is_some_and(|ext| {
                self.config
                    .circuit
                    .extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
    }

    fn is_document(&self, item: &FileItem) -> bool {
        !item.is_folder
            && item.file_type.as_deref().is_some_and(|ext| {
                self.config
                    .document
                    .extensions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(ext))
            })
    }

    /// Preview locator shown in tree listings.
    pub fn preview_url(&self, item: &FileItem) -> Option<String> {
        (self.renderer.is_some() && self.is_circuit(item))
            .then(|| format!("/api/files/{}/preview", item.id))
    }

    /// Where the preview image of `item` lives, if its backend is local.
    fn image_path(&self, item: &FileItem) -> Option<PathBuf> {
        let storage_path = item.storage_path.as_deref()?;
        let blob = self.engine.storage().local_path(storage_path)?;
        let mut name = blob.into_os_string();
        name.push(format!(".{}", self.config.circuit.output_format));
        Some(PathBuf::from(name))
    }

    async fn render(&self, item: &FileItem) -> AppResult<PathBuf> {
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| AppError::not_found("Circuit previews are disabled"))?;
        let input = item
            .storage_path
            .as_deref()
            .and_then(|path| self.engine.storage().local_path(path))
            .ok_or_else(|| AppError::not_found("Stored file is not available for preview"))?;
        let output = self
            .image_path(item)
            .ok_or_else(|| AppError::not_found("Stored file is not available for preview"))?;

        renderer.render(&input, &output).await?;
        info!(item_id = %item.id, output = %output.display(), "Rendered circuit preview");
        Ok(output)
    }

    /// Render the preview of a freshly uploaded file, if it needs one.
    ///
    /// Failures are logged; the upload itself stands.
    pub async fn after_upload(&self, item: &FileItem) {
        if self.renderer.is_none() || !self.is_circuit(item) {
            return;
        }
        if let Err(e) = self.render(item).await {
            warn!(item_id = %item.id, error = %e, "Circuit preview rendering failed");
        }
    }

    /// Path to the preview image of a circuit file, rendering it if missing.
    pub async fn preview_path(&self, file_id: FileItemId) -> AppResult<PathBuf> {
        let item = self.engine.get_item(file_id).await?;
        if !self.is_circuit(&item) {
            return Err(AppError::wrong_kind("This file has no image preview"));
        }

        if let Some(path) = self.image_path(&item) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(path);
            }
        }

        let path = match self.render(&item).await {
            Ok(path) => path,
            Err(e) => {
                warn!(item_id = %file_id, error = %e, "Lazy preview rendering failed");
                return Err(AppError::not_found("Preview image is not available"));
            }
        };
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(path)
        } else {
            Err(AppError::not_found("Preview image is not available"))
        }
    }

    /// Render a document file as a standalone HTML page.
    pub async fn render_doc_html(&self, file_id: FileItemId) -> AppResult<String> {
        let item = self.engine.get_item(file_id).await?;
        if !self.is_document(&item) {
            return Err(AppError::wrong_kind(
                "Only document files can be rendered as HTML",
            ));
        }
        let converter = self
            .converter
            .as_ref()
            .ok_or_else(|| AppError::rendering("Document rendering is disabled"))?;
        let storage_path = item
            .storage_path
            .as_deref()
            .ok_or_else(|| AppError::not_found("Stored file is missing"))?;

        let data = self.engine.storage().read_bytes(storage_path).await?;
        converter.convert(&item.name, data).await.map_err(|e| {
            if e.kind == ErrorKind::Rendering {
                e
            } else {
                AppError::with_source(ErrorKind::Rendering, "Document rendering failed", e)
            }
        })
    }
}

//! Conversion pipeline.
//!
//! One job per inbound document:
//!
//! ```text
//! Received -> Downloading -> Converting -> Registering -> Notifying
//!          -> Uploading -> CleaningUp -> Done
//! ```
//!
//! with `Failed` reachable from any non-terminal stage. Documents with an
//! unsupported extension are declined before a job is created.
//!
//! Cleanup rules:
//! - the input artifact is removed on every terminal path;
//! - the output artifact is removed on failure during or after conversion,
//!   and kept on success so the retrieval service can serve it.
//!
//! Notification and upload failures are best-effort: they are logged (the
//! upload failure also produces the generic failure notice) and the job still
//! completes, keeping its registry entry.

pub mod job;
pub mod messages;

pub use job::{Job, JobId, Stage};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::registry::SlugRegistry;
use crate::telegram::{ChatGateway, ChatId, DocumentDescriptor};
use crate::tools::{Converter, Downloader};
use crate::utils::filename::extension_lowercase;
use crate::utils::fs::remove_artifacts;
use crate::{Error, Result};

/// Extensions accepted for conversion (compared case-insensitively).
pub const ACCEPTED_EXTENSIONS: &[&str] = &[".fb2", ".txt"];

/// Whether `file_name` has an accepted extension.
pub fn is_accepted(file_name: &str) -> bool {
    extension_lowercase(file_name).is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding input and output artifacts.
    pub upload_dir: PathBuf,
    /// Public `host:port` of the retrieval service.
    pub public_host: String,
}

impl PipelineConfig {
    /// Public retrieval URL for a slug.
    pub fn retrieval_url(&self, slug: &str) -> String {
        format!("http://{}/{}", self.public_host, slug)
    }
}

/// Terminal result of one submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Unsupported extension; nothing was downloaded.
    Rejected,
    /// The job failed in `stage`; `error` is the operator-facing detail.
    Failed { stage: Stage, error: String },
    /// The artifact is registered under `slug`.
    Completed {
        slug: String,
        output: PathBuf,
        upload_ok: bool,
    },
}

/// What a failing stage has to remove.
#[derive(Debug, Clone, Copy)]
enum Cleanup {
    InputOnly,
    InputAndOutput,
}

/// Runs documents through download, conversion, registration and delivery.
pub struct ConversionPipeline {
    config: PipelineConfig,
    registry: Arc<SlugRegistry>,
    downloader: Arc<dyn Downloader>,
    converter: Arc<dyn Converter>,
    gateway: Arc<dyn ChatGateway>,
}

impl ConversionPipeline {
    pub fn new(
        config: PipelineConfig,
        registry: Arc<SlugRegistry>,
        downloader: Arc<dyn Downloader>,
        converter: Arc<dyn Converter>,
        gateway: Arc<dyn ChatGateway>,
    ) -> Self {
        Self {
            config,
            registry,
            downloader,
            converter,
            gateway,
        }
    }

    /// Process one inbound document to a terminal outcome. Never fails;
    /// every error is logged and turned into a user notice.
    pub async fn process(&self, chat_id: ChatId, document: &DocumentDescriptor) -> JobOutcome {
        if !is_accepted(&document.file_name) {
            info!(chat_id, file_name = %document.file_name, "Declining unsupported document");
            self.notify(chat_id, messages::UNSUPPORTED_FORMAT).await;
            return JobOutcome::Rejected;
        }

        self.notify(chat_id, messages::CONVERSION_STARTED).await;

        let mut job = Job::new(&self.config.upload_dir, chat_id, document);
        info!(
            job_id = %job.id,
            chat_id,
            file_name = %job.file_name,
            "Conversion job started"
        );
        self.run(&mut job).await
    }

    async fn run(&self, job: &mut Job) -> JobOutcome {
        job.advance(Stage::Downloading);
        if let Err(e) = self.download(job).await {
            return self.fail(job, e, Cleanup::InputOnly).await;
        }

        job.advance(Stage::Converting);
        if let Err(e) = self.convert(job).await {
            return self.fail(job, e, Cleanup::InputAndOutput).await;
        }

        job.advance(Stage::Registering);
        let slug = match self.registry.generate() {
            Ok(slug) => slug,
            Err(e) => return self.fail(job, e, Cleanup::InputAndOutput).await,
        };
        self.registry.insert(slug.clone(), job.output_path.clone());

        job.advance(Stage::Notifying);
        let url = self.config.retrieval_url(&slug);
        if let Err(e) = self
            .gateway
            .send_text(job.chat_id, &messages::conversion_completed(&url))
            .await
        {
            warn!(job_id = %job.id, chat_id = job.chat_id, error = %e, "Failed to send retrieval link");
        }

        job.advance(Stage::Uploading);
        let upload_ok = match self.upload(job).await {
            Ok(()) => true,
            Err(e) => {
                error!(job_id = %job.id, chat_id = job.chat_id, error = %e, "Failed to upload converted file");
                self.notify(job.chat_id, messages::PROCESSING_FAILED).await;
                false
            }
        };

        job.advance(Stage::CleaningUp);
        remove_artifacts(&[&job.input_path]).await;

        job.advance(Stage::Done);
        info!(job_id = %job.id, slug = %slug, url = %url, "Conversion job completed");
        JobOutcome::Completed {
            slug,
            output: job.output_path.clone(),
            upload_ok,
        }
    }

    async fn download(&self, job: &Job) -> Result<()> {
        let url = self.gateway.file_url(&job.file_id).await?;
        self.downloader.download(&url, &job.input_path).await
    }

    async fn convert(&self, job: &Job) -> Result<()> {
        self.converter
            .convert(&job.input_path, &job.output_path)
            .await?;

        // Only register artifacts that actually exist.
        let exists = tokio::fs::metadata(&job.output_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !exists {
            return Err(Error::Other(format!(
                "converter reported success but {} is missing",
                job.output_path.display()
            )));
        }
        Ok(())
    }

    async fn upload(&self, job: &Job) -> Result<()> {
        let bytes = tokio::fs::read(&job.output_path)
            .await
            .map_err(|e| Error::io_path("reading", &job.output_path, e))?;
        let name = artifact_file_name(&job.output_path);
        self.gateway
            .send_document(job.chat_id, &name, bytes, Some(messages::UPLOAD_CAPTION))
            .await
    }

    async fn fail(&self, job: &mut Job, err: Error, cleanup: Cleanup) -> JobOutcome {
        let stage = job.stage();
        error!(
            job_id = %job.id,
            chat_id = job.chat_id,
            stage = %stage,
            error = %err,
            "Conversion job failed"
        );
        job.advance(Stage::Failed);

        self.notify(job.chat_id, messages::PROCESSING_FAILED).await;

        match cleanup {
            Cleanup::InputOnly => remove_artifacts(&[&job.input_path]).await,
            Cleanup::InputAndOutput => {
                remove_artifacts(&[&job.input_path, &job.output_path]).await
            }
        }

        JobOutcome::Failed {
            stage,
            error: err.to_string(),
        }
    }

    /// Best-effort text notice.
    async fn notify(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.gateway.send_text(chat_id, text).await {
            warn!(chat_id, error = %e, "Failed to notify chat");
        }
    }
}

fn artifact_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("book.{}", job::OUTPUT_EXTENSION))
}

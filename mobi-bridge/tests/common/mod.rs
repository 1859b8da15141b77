//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mobi_bridge::pipeline::{ConversionPipeline, PipelineConfig};
use mobi_bridge::registry::{SlugGenerator, SlugRegistry};
use mobi_bridge::telegram::{ChatGateway, ChatId, DocumentDescriptor};
use mobi_bridge::tools::{Converter, Downloader};
use mobi_bridge::{Error, Result};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const SOURCE_BYTES: &[u8] = b"<FictionBook>Once upon a time</FictionBook>";
pub const MOBI_BYTES: &[u8] = b"BOOKMOBI\x00\x01converted";

/// Writes [`SOURCE_BYTES`] to the destination, or fails after writing a partial file.
#[derive(Default)]
pub struct FakeDownloader {
    pub fail: bool,
    pub calls: Mutex<Vec<(String, PathBuf)>>,
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.lock().push((url.to_string(), dest.to_path_buf()));
        if self.fail {
            tokio::fs::write(dest, b"<Fiction").await.unwrap();
            return Err(Error::ExternalTool {
                tool: "wget".to_string(),
                status: "exit status: 8".to_string(),
                output: "ERROR 404: Not Found.".to_string(),
            });
        }
        tokio::fs::write(dest, SOURCE_BYTES).await.unwrap();
        Ok(())
    }
}

/// Writes [`MOBI_BYTES`] to the output, or fails after writing a partial file.
#[derive(Default)]
pub struct FakeConverter {
    pub fail: bool,
    /// Report success without writing anything.
    pub skip_output: bool,
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

#[async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        self.calls
            .lock()
            .push((input.to_path_buf(), output.to_path_buf()));
        assert!(input.exists(), "converter ran before download finished");
        if self.fail {
            tokio::fs::write(output, b"BOOK").await.unwrap();
            return Err(Error::ExternalTool {
                tool: "ebook-convert".to_string(),
                status: "exit status: 1".to_string(),
                output: "ValueError: unsupported encoding".to_string(),
            });
        }
        if !self.skip_output {
            tokio::fs::write(output, MOBI_BYTES).await.unwrap();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Document {
        chat_id: ChatId,
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
}

/// Records outbound messages; can be told to fail uploads or link notices.
#[derive(Default)]
pub struct RecordingGateway {
    pub sent: Mutex<Vec<Sent>>,
    pub fail_uploads: bool,
    pub fail_texts_containing: Option<String>,
    pub file_url_calls: AtomicUsize,
}

impl RecordingGateway {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Text(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn documents(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .iter()
            .filter(|s| matches!(s, Sent::Document { .. }))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        if let Some(ref needle) = self.fail_texts_containing
            && text.contains(needle.as_str())
        {
            return Err(Error::telegram("chat not found"));
        }
        self.sent.lock().push(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        if self.fail_uploads {
            return Err(Error::telegram("Request Entity Too Large"));
        }
        self.sent.lock().push(Sent::Document {
            chat_id,
            file_name: file_name.to_string(),
            bytes,
            caption: caption.map(str::to_string),
        });
        Ok(())
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        self.file_url_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://files.test/{file_id}"))
    }
}

/// Always yields the same slug.
pub struct FixedSlug(pub &'static str);

impl SlugGenerator for FixedSlug {
    fn generate(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Simulates an unavailable entropy source.
pub struct BrokenEntropy;

impl SlugGenerator for BrokenEntropy {
    fn generate(&self) -> Result<String> {
        Err(Error::EntropySource("getrandom: unavailable".to_string()))
    }
}

/// A pipeline wired to fakes inside a fresh temp dir.
pub struct Harness {
    pub dir: TempDir,
    pub registry: Arc<SlugRegistry>,
    pub downloader: Arc<FakeDownloader>,
    pub converter: Arc<FakeConverter>,
    pub gateway: Arc<RecordingGateway>,
    pub pipeline: Arc<ConversionPipeline>,
}

impl Harness {
    pub fn new(
        slugs: Arc<dyn SlugGenerator>,
        downloader: FakeDownloader,
        converter: FakeConverter,
        gateway: RecordingGateway,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(SlugRegistry::with_generator(slugs));
        let downloader = Arc::new(downloader);
        let converter = Arc::new(converter);
        let gateway = Arc::new(gateway);
        let pipeline = Arc::new(ConversionPipeline::new(
            PipelineConfig {
                upload_dir: dir.path().to_path_buf(),
                public_host: "books.test:11477".to_string(),
            },
            registry.clone(),
            downloader.clone(),
            converter.clone(),
            gateway.clone(),
        ));
        Self {
            dir,
            registry,
            downloader,
            converter,
            gateway,
            pipeline,
        }
    }

    pub fn happy(slug: &'static str) -> Self {
        Self::new(
            Arc::new(FixedSlug(slug)),
            FakeDownloader::default(),
            FakeConverter::default(),
            RecordingGateway::default(),
        )
    }

    /// Files currently in the upload dir.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }
}

pub fn document(name: &str) -> DocumentDescriptor {
    DocumentDescriptor {
        file_name: name.to_string(),
        file_id: format!("file-{name}"),
    }
}

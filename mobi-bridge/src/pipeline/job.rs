//! Per-document job state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::telegram::{ChatId, DocumentDescriptor};
use crate::utils::filename::{file_stem, sanitize_filename};

/// Extension of converted artifacts.
pub const OUTPUT_EXTENSION: &str = "mobi";

/// Process-wide job sequence; disambiguates jobs started within the same second.
static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Stage of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    Downloading,
    Converting,
    Registering,
    Notifying,
    Uploading,
    CleaningUp,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Registering => "registering",
            Self::Notifying => "notifying",
            Self::Uploading => "uploading",
            Self::CleaningUp => "cleaning_up",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Next stage on the success path; `None` once terminal.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Received => Some(Self::Downloading),
            Self::Downloading => Some(Self::Converting),
            Self::Converting => Some(Self::Registering),
            Self::Registering => Some(Self::Notifying),
            Self::Notifying => Some(Self::Uploading),
            Self::Uploading => Some(Self::CleaningUp),
            Self::CleaningUp => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether `to` is a legal transition from this stage.
    pub fn can_transition_to(&self, to: Stage) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique job identifier: unix seconds plus a process-wide sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId {
    pub timestamp: i64,
    pub sequence: u64,
}

impl JobId {
    pub fn next() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            sequence: JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.timestamp, self.sequence)
    }
}

/// One document's trip through the pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub chat_id: ChatId,
    pub file_name: String,
    pub file_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    stage: Stage,
}

impl Job {
    pub fn new(upload_dir: &Path, chat_id: ChatId, document: &DocumentDescriptor) -> Self {
        Self::with_id(JobId::next(), upload_dir, chat_id, document)
    }

    pub fn with_id(
        id: JobId,
        upload_dir: &Path,
        chat_id: ChatId,
        document: &DocumentDescriptor,
    ) -> Self {
        let (input_name, output_name) = artifact_names(&id, &document.file_name);
        Self {
            id,
            chat_id,
            file_name: document.file_name.clone(),
            file_id: document.file_id.clone(),
            input_path: upload_dir.join(input_name),
            output_path: upload_dir.join(output_name),
            stage: Stage::Received,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to `to`. Illegal transitions are a bug in the pipeline.
    pub(crate) fn advance(&mut self, to: Stage) {
        debug_assert!(
            self.stage.can_transition_to(to),
            "illegal transition {} -> {}",
            self.stage,
            to
        );
        debug!(job_id = %self.id, from = %self.stage, to = %to, "Job stage transition");
        self.stage = to;
    }
}

/// Input and output artifact names for a job.
///
/// `<id>_<sanitized name>` and `<id>_<sanitized stem>.mobi`.
pub fn artifact_names(id: &JobId, file_name: &str) -> (String, String) {
    let sanitized = sanitize_filename(file_name);
    let input = format!("{id}_{sanitized}");
    let output = format!("{id}_{}.{OUTPUT_EXTENSION}", file_stem(&sanitized));
    (input, output)
}

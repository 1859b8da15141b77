//! External command-line tools: the downloader and the e-book converter.
//!
//! Both are invoked as child processes and awaited on the tokio runtime, so a
//! long conversion only parks its own job task. Neither invocation has a
//! timeout.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::{Error, Result};

/// Default downloader binary.
pub const DEFAULT_DOWNLOADER: &str = "wget";

/// Default converter binary (calibre).
pub const DEFAULT_CONVERTER: &str = "ebook-convert";

/// Fixed conversion profile passed to the converter.
pub const CONVERT_OPTIONS: &[&str] = &["--output-profile", "kindle", "--mobi-file-type", "both"];

/// Fetches a remote file to a local path.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Converts an input document into the target e-book format.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Exit status, wall time and combined stdout/stderr of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub duration: Duration,
    pub output: String,
}

/// Create a `tokio::process::Command` that never opens a console window on Windows.
pub fn tokio_command(program: impl AsRef<OsStr>) -> Command {
    #[allow(unused_mut)]
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    cmd
}

/// Run a command to completion, capturing stdout and stderr line by line into
/// one combined transcript.
pub async fn run_command(tool: &str, command: &mut Command) -> Result<CommandOutput> {
    let start = Instant::now();

    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| Error::ExternalTool {
        tool: tool.to_string(),
        status: "spawn failure".to_string(),
        output: e.to_string(),
    })?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("stdout: {}", line);
                let _ = tx.send(line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("stderr: {}", line);
                let _ = tx.send(line);
            }
        });
    }

    // Readers hold the remaining senders; the channel closes once both pipes hit EOF.
    drop(tx);

    let status = child.wait().await.map_err(|e| Error::ExternalTool {
        tool: tool.to_string(),
        status: "wait failure".to_string(),
        output: e.to_string(),
    })?;

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(line);
    }

    Ok(CommandOutput {
        status,
        duration: start.elapsed(),
        output: lines.join("\n"),
    })
}

/// Run a command and turn a non-zero exit into [`Error::ExternalTool`].
async fn run_checked(tool: &str, command: &mut Command) -> Result<CommandOutput> {
    let out = run_command(tool, command).await?;
    if !out.status.success() {
        return Err(Error::ExternalTool {
            tool: tool.to_string(),
            status: out.status.to_string(),
            output: out.output,
        });
    }
    Ok(out)
}

/// Downloader that shells out to a wget-compatible binary (`<bin> -O <dest> <url>`).
#[derive(Debug, Clone)]
pub struct ProcessDownloader {
    program: String,
}

impl ProcessDownloader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOADER)
    }
}

#[async_trait]
impl Downloader for ProcessDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut cmd = tokio_command(&self.program);
        cmd.arg("-O").arg(dest).arg(url);

        let out = run_checked(&self.program, &mut cmd).await?;
        debug!(
            dest = %dest.display(),
            elapsed_ms = out.duration.as_millis() as u64,
            "Download finished"
        );
        Ok(())
    }
}

/// Converter that shells out to calibre's `ebook-convert` (or a compatible binary).
#[derive(Debug, Clone)]
pub struct ProcessConverter {
    program: String,
}

impl ProcessConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessConverter {
    fn default() -> Self {
        Self::new(DEFAULT_CONVERTER)
    }
}

#[async_trait]
impl Converter for ProcessConverter {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = tokio_command(&self.program);
        cmd.arg(input).arg(output).args(CONVERT_OPTIONS);

        let out = run_checked(&self.program, &mut cmd).await?;
        info!(
            input = %input.display(),
            output = %output.display(),
            "Conversion completed in {:.2}s",
            out.duration.as_secs_f64()
        );
        Ok(())
    }
}

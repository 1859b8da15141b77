//! Update dispatcher: long-polls the Bot API and routes inbound events.
//!
//! Every document spawns its own task running the conversion pipeline. There
//! is no admission control: jobs run concurrently and unbounded, in no
//! particular order.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ChatGateway, InboundEvent, TelegramClient};
use crate::Result;
use crate::pipeline::{ConversionPipeline, JobOutcome, messages};

/// Pause after a failed `getUpdates` call before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Routes inbound chat events to the pipeline.
pub struct Dispatcher {
    gateway: Arc<dyn ChatGateway>,
    pipeline: Arc<ConversionPipeline>,
    poll_backoff: Duration,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn ChatGateway>, pipeline: Arc<ConversionPipeline>) -> Self {
        Self {
            gateway,
            pipeline,
            poll_backoff: POLL_ERROR_BACKOFF,
        }
    }

    /// Override the pause after a failed `getUpdates` call.
    pub fn with_poll_backoff(mut self, backoff: Duration) -> Self {
        self.poll_backoff = backoff;
        self
    }

    /// Handle one event. Returns the job handle when a document was handed
    /// to the pipeline.
    pub async fn dispatch(&self, event: InboundEvent) -> Option<JoinHandle<JobOutcome>> {
        if event.command.as_deref() == Some("start") {
            if let Err(e) = self.gateway.send_text(event.chat_id, messages::GREETING).await {
                warn!(chat_id = event.chat_id, error = %e, "Failed to send greeting");
            }
            return None;
        }

        let document = event.document?;
        let pipeline = self.pipeline.clone();
        let chat_id = event.chat_id;
        Some(tokio::spawn(async move {
            pipeline.process(chat_id, &document).await
        }))
    }

    /// Poll `client` for updates until `cancel` fires.
    pub async fn run(&self, client: &TelegramClient, cancel: CancellationToken) -> Result<()> {
        let mut offset = 0i64;
        info!("Polling Telegram for updates");

        loop {
            let updates = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Update polling stopped");
                    return Ok(());
                }
                result = client.get_updates(offset) => result,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "getUpdates failed, retrying in {:?}", self.poll_backoff);
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(self.poll_backoff) => continue,
                    }
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(event) = update.into_event() else {
                    continue;
                };
                debug!(
                    chat_id = event.chat_id,
                    command = ?event.command,
                    has_document = event.document.is_some(),
                    "Inbound event"
                );
                // Jobs are detached; their outcome is logged by the pipeline.
                let _ = self.dispatch(event).await;
            }
        }
    }
}

//! The audit trail singleton: bounded queue, single background writer,
//! batched JSON-Lines writes (spec §4.6).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::json;
use stinger_types::{StingerError, StingerResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::destination::{smart_defaults, is_production, Destination};
use crate::record::AuditRecord;
use crate::redact;
use crate::stats::{Stats, StatsSnapshot};

/// How many pending records the writer batches before an opportunistic
/// flush, independent of the periodic `flush_interval` tick.
const BATCH_SIZE: usize = 50;
const DEFAULT_BUFFER_SIZE: usize = 1000;
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Default, Clone)]
pub struct EnableOptions {
    pub destination: Option<String>,
    pub redact_pii: Option<bool>,
    pub buffer_size: Option<usize>,
    pub flush_interval_secs: Option<u64>,
}

#[derive(Clone)]
struct ActiveConfig {
    sender: mpsc::Sender<AuditRecord>,
    destination: Destination,
    redact_pii: bool,
    buffer_size: usize,
}

pub struct AuditTrail {
    active: RwLock<Option<ActiveConfig>>,
    writer_handle: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<Stats>,
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditTrail {
    /// A disabled trail; call `enable` to start logging.
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            writer_handle: Mutex::new(None),
            stats: Arc::new(Stats::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.active.read().is_some()
    }

    /// Sets up the bounded queue and background writer. Re-enabling while
    /// already enabled replaces the prior configuration (flushing it first).
    pub async fn enable(&self, options: EnableOptions) -> StingerResult<()> {
        let (default_destination, default_redact) = smart_defaults();
        let destination = match options.destination {
            Some(raw) => Destination::parse(&raw),
            None => default_destination,
        };
        let redact_pii = options.redact_pii.unwrap_or(default_redact);
        let buffer_size = options.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let flush_interval =
            Duration::from_secs(options.flush_interval_secs.unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS));

        self.shutdown_writer().await;

        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let stats = self.stats.clone();
        let writer_destination = destination.clone();
        let handle = tokio::spawn(run_writer(receiver, writer_destination, flush_interval, stats));
        *self.writer_handle.lock() = Some(handle);

        *self.active.write() = Some(ActiveConfig {
            sender,
            destination: destination.clone(),
            redact_pii,
            buffer_size,
        });

        self.enqueue(AuditRecord::AuditTrailEnabled {
            timestamp: chrono::Utc::now(),
            destination: destination.to_string(),
            redact_pii,
            buffer_size,
            flush_interval_secs: flush_interval.as_secs(),
        });
        Ok(())
    }

    /// Flushes and stops the writer. Refuses in a production environment,
    /// to prevent accidentally losing audit coverage; tests that need a
    /// clean slate should construct a fresh `AuditTrail` instead.
    pub async fn disable(&self) -> StingerResult<()> {
        if is_production() {
            return Err(StingerError::IllegalState(
                "cannot disable audit trail in production".to_string(),
            ));
        }
        self.shutdown_writer().await;
        Ok(())
    }

    async fn shutdown_writer(&self) {
        self.active.write().take();
        if let Some(handle) = self.writer_handle.lock().take() {
            let _ = handle.await;
        }
    }

    pub fn log_prompt(
        &self,
        prompt: &str,
        user_id: Option<&str>,
        conversation_id: Option<&str>,
        request_id: Option<&str>,
    ) {
        let Some(active) = self.active.read().clone() else {
            return;
        };
        let prompt = if active.redact_pii {
            redact::redact(prompt)
        } else {
            prompt.to_string()
        };
        self.enqueue(AuditRecord::UserPrompt {
            timestamp: chrono::Utc::now(),
            prompt,
            user_id: user_id.map(String::from),
            conversation_id: conversation_id.map(String::from),
            request_id: request_id.map(String::from),
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_response(
        &self,
        response: &str,
        user_id: Option<&str>,
        conversation_id: Option<&str>,
        request_id: Option<&str>,
        model_used: Option<&str>,
        processing_time_ms: Option<u64>,
    ) {
        let Some(active) = self.active.read().clone() else {
            return;
        };
        let response = if active.redact_pii {
            redact::redact(response)
        } else {
            response.to_string()
        };
        self.enqueue(AuditRecord::LlmResponse {
            timestamp: chrono::Utc::now(),
            response,
            user_id: user_id.map(String::from),
            conversation_id: conversation_id.map(String::from),
            request_id: request_id.map(String::from),
            model_used: model_used.map(String::from),
            processing_time_ms,
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_guardrail_decision(
        &self,
        guardrail_name: &str,
        decision: &str,
        reason: &str,
        confidence: Option<f64>,
        rule_triggered: Option<&str>,
        user_id: Option<&str>,
        conversation_id: Option<&str>,
        request_id: Option<&str>,
    ) {
        if self.active.read().is_none() {
            return;
        }
        self.enqueue(AuditRecord::GuardrailDecision {
            timestamp: chrono::Utc::now(),
            guardrail_name: guardrail_name.to_string(),
            decision: decision.to_string(),
            reason: reason.to_string(),
            confidence,
            rule_triggered: rule_triggered.map(String::from),
            user_id: user_id.map(String::from),
            conversation_id: conversation_id.map(String::from),
            request_id: request_id.map(String::from),
        });
    }

    pub fn log_error(&self, message: &str, context: std::collections::BTreeMap<String, serde_json::Value>) {
        if self.active.read().is_none() {
            return;
        }
        self.enqueue(AuditRecord::Error {
            timestamp: chrono::Utc::now(),
            message: message.to_string(),
            context,
        });
    }

    /// Non-blocking enqueue; falls back to a synchronous write if the
    /// queue is full, and only counts a drop if that fallback also fails.
    fn enqueue(&self, record: AuditRecord) {
        let Some(active) = self.active.read().clone() else {
            return;
        };
        match active.sender.try_send(record) {
            Ok(()) => self.stats.record_queued(),
            Err(mpsc::error::TrySendError::Full(record)) => {
                tracing::warn!("audit queue full, writing synchronously");
                match write_record_sync(&active.destination, &record) {
                    Ok(()) => self.stats.record_written(),
                    Err(e) => {
                        tracing::error!(error = %e, "audit fallback write failed, record dropped");
                        self.stats.record_dropped();
                    }
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        let queue_size = match self.active.read().as_ref() {
            Some(active) => active.buffer_size - active.sender.capacity(),
            None => 0,
        };
        self.stats.snapshot(queue_size)
    }

    pub fn destination(&self) -> Option<Destination> {
        self.active.read().as_ref().map(|a| a.destination.clone())
    }
}

async fn run_writer(
    mut receiver: mpsc::Receiver<AuditRecord>,
    destination: Destination,
    flush_interval: Duration,
    stats: Arc<Stats>,
) {
    let mut buffer = Vec::with_capacity(BATCH_SIZE);
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            received = receiver.recv() => {
                match received {
                    Some(record) => {
                        buffer.push(record);
                        if buffer.len() >= BATCH_SIZE {
                            flush_batch(&destination, &mut buffer, &stats);
                        }
                    }
                    None => {
                        flush_batch(&destination, &mut buffer, &stats);
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if !buffer.is_empty() {
                    flush_batch(&destination, &mut buffer, &stats);
                }
            }
        }
    }
}

fn flush_batch(destination: &Destination, buffer: &mut Vec<AuditRecord>, stats: &Stats) {
    for record in buffer.drain(..) {
        match write_record_sync(destination, &record) {
            Ok(()) => stats.record_written(),
            Err(e) => tracing::error!(error = %e, "failed to write audit record"),
        }
    }
}

fn write_record_sync(destination: &Destination, record: &AuditRecord) -> std::io::Result<()> {
    let line = serde_json::to_string(record).unwrap_or_else(|e| {
        json!({"event_type": "error", "message": format!("unserializable audit record: {e}")}).to_string()
    });
    match destination {
        Destination::Stdout => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{line}")?;
            handle.flush()
        }
        Destination::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{line}")?;
            file.flush()
        }
    }
}

/// Used by `query`/`export_*` to read a destination back. Exposed here
/// rather than in `query.rs` since it shares `Destination`'s file-vs-stdout
/// split.
pub(crate) fn read_lines(destination: &Path) -> std::io::Result<Vec<String>> {
    let contents = fs::read_to_string(destination)?;
    Ok(contents.lines().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn disabled_trail_ignores_log_calls() {
        let trail = AuditTrail::new();
        trail.log_prompt("hi", None, None, None);
        assert_eq!(trail.get_stats().queued, 0);
    }

    #[tokio::test]
    async fn enable_writes_enabled_record_and_flushes_on_disable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let trail = AuditTrail::new();
        trail
            .enable(EnableOptions {
                destination: Some(path.to_string_lossy().to_string()),
                redact_pii: Some(false),
                buffer_size: Some(10),
                flush_interval_secs: Some(60),
            })
            .await
            .unwrap();

        trail.log_prompt("hello", Some("u1"), None, Some("r1"));
        trail.disable().await.unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("audit_trail_enabled"));
        assert!(lines[1].contains("\"prompt\":\"hello\""));
    }

    #[tokio::test]
    async fn redact_pii_applies_to_prompt_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let trail = AuditTrail::new();
        trail
            .enable(EnableOptions {
                destination: Some(path.to_string_lossy().to_string()),
                redact_pii: Some(true),
                buffer_size: Some(10),
                flush_interval_secs: Some(60),
            })
            .await
            .unwrap();

        trail.log_prompt("email me at a@b.com", None, None, None);
        trail.disable().await.unwrap();

        let lines = read_lines(&path).unwrap();
        assert!(lines[1].contains("EMAIL_REDACTED"));
        assert!(!lines[1].contains("a@b.com"));
    }
}

//! Submission status reporting.
//!
//! While an ingestion request is in flight the controllers show a
//! transient status (for folders, the "uploading, this may take a while"
//! notice). The CLI surfaces those transitions through a
//! [`StatusReporter`]. Reports go to **stderr** so stdout stays parseable.

use std::io::Write;

use rag_console_core::messages::format_payload_size;

/// A status transition of one submission.
#[derive(Clone, Debug)]
pub enum StatusEvent {
    /// The request has been sent. `notice` is the optimistic status, if the
    /// controller shows one; `bytes` is the payload size when known.
    Submitting {
        operation: String,
        notice: Option<String>,
        bytes: Option<u64>,
    },
    /// The request finished, successfully or not.
    Settled { operation: String, success: bool },
}

/// Receives status transitions from the CLI commands.
pub trait StatusReporter: Send + Sync {
    fn report(&self, event: StatusEvent);
}

/// Human-friendly lines on stderr: "ingest-folder  sending 1,234,567 bytes (1.18MB)".
pub struct StderrStatus;

impl StatusReporter for StderrStatus {
    fn report(&self, event: StatusEvent) {
        let line = match &event {
            StatusEvent::Submitting {
                operation,
                notice,
                bytes,
            } => {
                let mut line = format!("{}  sending", operation);
                if let Some(b) = bytes {
                    line.push(' ');
                    line.push_str(&format_payload_size(*b));
                }
                if let Some(n) = notice {
                    line.push_str("  ");
                    line.push_str(n);
                }
                line
            }
            StatusEvent::Settled { operation, success } => {
                format!("{}  {}", operation, if *success { "done" } else { "failed" })
            }
        };
        emit(&line);
    }
}

/// Machine-readable status: one JSON object per line on stderr.
pub struct JsonStatus;

impl StatusReporter for JsonStatus {
    fn report(&self, event: StatusEvent) {
        let obj = match &event {
            StatusEvent::Submitting {
                operation,
                notice,
                bytes,
            } => serde_json::json!({
                "event": "status",
                "operation": operation,
                "phase": "submitting",
                "notice": notice,
                "bytes": bytes
            }),
            StatusEvent::Settled { operation, success } => serde_json::json!({
                "event": "status",
                "operation": operation,
                "phase": "settled",
                "success": success
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            emit(&line);
        }
    }
}

/// No-op reporter when status output is disabled.
pub struct NoStatus;

impl StatusReporter for NoStatus {
    fn report(&self, _event: StatusEvent) {}
}

/// Status output is best effort: a closed stderr must not fail the command.
fn emit(line: &str) {
    let mut err = std::io::stderr().lock();
    let _ = writeln!(err, "{}", line);
    let _ = err.flush();
}

/// Status mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human status when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn StatusReporter> {
        match self {
            ProgressMode::Off => Box::new(NoStatus),
            ProgressMode::Human => Box::new(StderrStatus),
            ProgressMode::Json => Box::new(JsonStatus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_accepts_events() {
        for mode in [ProgressMode::Off, ProgressMode::Human, ProgressMode::Json] {
            mode.reporter().report(StatusEvent::Settled {
                operation: "query".to_string(),
                success: true,
            });
        }
    }
}

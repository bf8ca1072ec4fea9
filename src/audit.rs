//! Structured audit sink for pipeline execution.
//!
//! Every stage of the pipeline emits one record: the user query, the
//! parsed query, the missing-information report, the execution plan,
//! each agent call, and the final response. The sink is an injected
//! dependency with an explicit lifecycle — opened once per process,
//! flushed on shutdown. The pipeline only ever writes to it.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;

use crate::error::OrchestratorError;

/// One audit record, tagged by pipeline stage.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditRecord<'a> {
    /// Raw user query received.
    UserQuery {
        /// The query text.
        query: &'a str,
    },
    /// Result of intent parsing.
    ParsedQuery {
        /// The parsed query as JSON.
        data: serde_json::Value,
    },
    /// Result of missing-information detection.
    MissingInfo {
        /// The report as JSON.
        data: serde_json::Value,
    },
    /// The execution plan that will run.
    ExecutionPlan {
        /// Plan steps as JSON.
        plan: serde_json::Value,
    },
    /// One query-agent invocation.
    AgentCall {
        /// Domain that was called.
        agent: &'a str,
        /// Goal text passed to the agent.
        goal: &'a str,
        /// Resolved filters at call time.
        filters: serde_json::Value,
        /// SQL actually run, or `"N/A"`.
        query: &'a str,
        /// Rows returned.
        row_count: usize,
        /// Elapsed time for the step.
        execution_time_ms: f64,
        /// Error, if the step failed.
        error: Option<&'a str>,
    },
    /// The synthesized response.
    FinalResponse {
        /// Response text.
        response: &'a str,
        /// Total pipeline time.
        total_execution_time_ms: f64,
    },
}

/// Destination for audit records.
///
/// Implementations must never fail the pipeline: emit errors are
/// logged and swallowed.
pub trait AuditSink: Send + Sync {
    /// Records one pipeline event.
    fn emit(&self, record: &AuditRecord<'_>);

    /// Flushes buffered records to durable storage.
    fn flush(&self);
}

/// Sink that discards every record. Useful when embedding the
/// orchestrator without audit requirements, and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAudit;

impl AuditSink for NoopAudit {
    fn emit(&self, _record: &AuditRecord<'_>) {}
    fn flush(&self) {}
}

/// JSONL file sink: one JSON object per line, timestamped at emit time.
pub struct JsonlAudit {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAudit {
    /// Opens a new audit file under `dir`, creating the directory if
    /// needed. File names carry the open timestamp, matching one file
    /// per process run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Io`] when the directory or file
    /// cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, OrchestratorError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("orchestrator_{stamp}.jsonl"));
        let file = File::create(&path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Path of the file records are written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAudit {
    fn emit(&self, record: &AuditRecord<'_>) {
        #[derive(Serialize)]
        struct Stamped<'a, 'b> {
            #[serde(flatten)]
            record: &'b AuditRecord<'a>,
            timestamp: String,
        }

        let stamped = Stamped {
            record,
            timestamp: Utc::now().to_rfc3339(),
        };

        let Ok(mut writer) = self.writer.lock() else {
            tracing::warn!("audit writer lock poisoned; record dropped");
            return;
        };
        match serde_json::to_string(&stamped) {
            Ok(line) => {
                if let Err(e) = writeln!(writer, "{line}") {
                    tracing::warn!(error = %e, "failed to write audit record");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize audit record"),
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writer.flush() {
                tracing::warn!(error = %e, "failed to flush audit log");
            }
        }
    }
}

impl std::fmt::Debug for JsonlAudit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlAudit")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

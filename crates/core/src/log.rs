//! Router log events and the sinks that receive them.
//!
//! The router reports its recoverable conditions (route misses, action
//! failures) as structured [`LogEvent`]s. Every event goes through `tracing`
//! with the correlation id attached, and is fanned out to the sinks attached
//! at build time, so an embedding application can observe routing behavior
//! without scraping its own log output.

use std::{
    collections::VecDeque,
    sync::{Arc, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};

use {serde::Serialize, uuid::Uuid};

// ── LogEvent ────────────────────────────────────────────────────────────────

/// Severity attached to router log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEventKind {
    /// No top-level route matched; the default response list ran.
    RouteMiss,
    /// An immediate action failed; the error response list ran (or, if the
    /// failure happened inside that list, was abandoned).
    DispatchError,
    /// A deferred action failed; terminal for that action only.
    DeferredActionFailure,
}

/// One structured router event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    pub kind: LogEventKind,
    pub severity: Severity,
    /// Id of the interface whose event was being handled.
    pub interface: String,
    /// Correlation id of the inbound event.
    pub event_id: Uuid,
    pub message: String,
    /// Unix millis when the event was recorded.
    pub ts: u64,
}

impl LogEvent {
    pub(crate) fn new(
        kind: LogEventKind,
        severity: Severity,
        interface: &str,
        event_id: Uuid,
        message: String,
    ) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            kind,
            severity,
            interface: interface.to_string(),
            event_id,
            message,
            ts,
        }
    }
}

// ── Sinks ───────────────────────────────────────────────────────────────────

/// Receives router log events.
///
/// Sinks run inline on the dispatching task, so implementations must be
/// cheap and non-blocking; hand off to a channel for anything slow.
pub trait LogSink: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Frozen fan-out over the attached sinks.
///
/// Every event is also emitted through `tracing`, so a core built with no
/// sinks still logs.
#[derive(Clone)]
pub(crate) struct LogFanout {
    sinks: Arc<[Arc<dyn LogSink>]>,
}

impl LogFanout {
    pub(crate) fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self {
            sinks: sinks.into(),
        }
    }

    pub(crate) fn emit(&self, event: LogEvent) {
        match event.severity {
            Severity::Error => tracing::error!(
                kind = ?event.kind,
                interface = %event.interface,
                event_id = %event.event_id,
                "{}",
                event.message
            ),
            Severity::Warn => tracing::warn!(
                kind = ?event.kind,
                interface = %event.interface,
                event_id = %event.event_id,
                "{}",
                event.message
            ),
            Severity::Info => tracing::info!(
                kind = ?event.kind,
                interface = %event.interface,
                event_id = %event.event_id,
                "{}",
                event.message
            ),
            Severity::Debug => tracing::debug!(
                kind = ?event.kind,
                interface = %event.interface,
                event_id = %event.event_id,
                "{}",
                event.message
            ),
        }
        for sink in self.sinks.iter() {
            sink.log(&event);
        }
    }
}

// ── BufferSink ──────────────────────────────────────────────────────────────

const DEFAULT_CAPACITY: usize = 256;

/// Bounded in-memory ring of recent events.
///
/// Cheap to clone (clones share the buffer). Useful for tests and for
/// embedders that surface recent router activity in a UI.
#[derive(Clone)]
pub struct BufferSink {
    buf: Arc<RwLock<VecDeque<LogEvent>>>,
    capacity: usize,
}

impl BufferSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<LogEvent> {
        match self.buf.read() {
            Ok(buf) => buf.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of recorded events of `kind`.
    pub fn count(&self, kind: LogEventKind) -> usize {
        match self.buf.read() {
            Ok(buf) => buf.iter().filter(|e| e.kind == kind).count(),
            Err(_) => 0,
        }
    }
}

impl Default for BufferSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogSink for BufferSink {
    fn log(&self, event: &LogEvent) {
        if let Ok(mut buf) = self.buf.write() {
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(event.clone());
        }
    }
}

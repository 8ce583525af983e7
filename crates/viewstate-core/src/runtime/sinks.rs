// crates/viewstate-core/src/runtime/sinks.rs
// ============================================================================
// Module: Resolution Sinks
// Description: Built-in resolution event sinks.
// Purpose: Route structured events to stderr, files, memory, or nowhere.
// Dependencies: crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! Sinks serialize each [`ResolutionEvent`] as one JSON line. Every write
//! error is swallowed; the resolver never learns about sink failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use crate::interfaces::ResolutionEvent;
use crate::interfaces::ResolutionSink;

// ============================================================================
// SECTION: Forwarding
// ============================================================================

impl<T: ResolutionSink + ?Sized> ResolutionSink for Box<T> {
    fn record(&self, event: &ResolutionEvent) {
        (**self).record(event);
    }
}

impl<T: ResolutionSink + ?Sized> ResolutionSink for Arc<T> {
    fn record(&self, event: &ResolutionEvent) {
        (**self).record(event);
    }
}

// ============================================================================
// SECTION: Noop Sink
// ============================================================================

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolutionSink;

impl ResolutionSink for NoopResolutionSink {
    fn record(&self, _event: &ResolutionEvent) {}
}

// ============================================================================
// SECTION: Stderr Sink
// ============================================================================

/// Sink writing JSON lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrResolutionSink;

impl ResolutionSink for StderrResolutionSink {
    fn record(&self, event: &ResolutionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

// ============================================================================
// SECTION: File Sink
// ============================================================================

/// Sink appending JSON lines to a file.
pub struct FileResolutionSink {
    /// Append-only log handle.
    file: Mutex<File>,
}

impl FileResolutionSink {
    /// Opens `path` in append mode, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ResolutionSink for FileResolutionSink {
    fn record(&self, event: &ResolutionEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

// ============================================================================
// SECTION: Memory Sink
// ============================================================================

/// Sink retaining events in memory for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryResolutionSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ResolutionEvent>>,
}

impl MemoryResolutionSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the labels of the recorded events.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.events().iter().map(ResolutionEvent::label).collect()
    }

    /// Removes and returns the recorded events.
    #[must_use]
    pub fn drain(&self) -> Vec<ResolutionEvent> {
        self.events.lock().map(|mut events| std::mem::take(&mut *events)).unwrap_or_default()
    }
}

impl ResolutionSink for MemoryResolutionSink {
    fn record(&self, event: &ResolutionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

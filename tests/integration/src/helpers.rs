//! Test helpers for integration tests
//!
//! Provides a dispatcher without built-in listeners, listeners that record
//! what they see, and a fault reporter that counts double faults.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use events_common::DispatchConfig;
use events_core::{Event, ListenerFailure};
use events_dispatch::{Dispatcher, FaultReporter, Listener};
use parking_lot::Mutex;

/// What a [`Recorder`] saw, in arrival order
#[derive(Default)]
pub struct Recording {
    events: Mutex<Vec<Arc<dyn Event>>>,
}

impl Recording {
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.resolved_name().to_string())
            .collect()
    }

    pub fn events(&self) -> Vec<Arc<dyn Event>> {
        self.events.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.resolved_name() == name)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

/// Listener that stores every event and optionally fails afterwards
pub struct Recorder {
    name: String,
    recording: Arc<Recording>,
    fail_with: Option<String>,
}

impl Recorder {
    pub fn new(name: &str) -> (Arc<Self>, Arc<Recording>) {
        Self::build(name, None)
    }

    /// A recorder that returns an error after recording
    pub fn failing(name: &str, message: &str) -> (Arc<Self>, Arc<Recording>) {
        Self::build(name, Some(message.to_string()))
    }

    fn build(name: &str, fail_with: Option<String>) -> (Arc<Self>, Arc<Recording>) {
        let recording = Arc::new(Recording::default());
        let recorder = Arc::new(Self {
            name: name.to_string(),
            recording: Arc::clone(&recording),
            fail_with,
        });
        (recorder, recording)
    }
}

#[async_trait]
impl Listener for Recorder {
    async fn handle(&self, event: Arc<dyn Event>) -> anyhow::Result<()> {
        self.recording.events.lock().push(event);
        match &self.fail_with {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fault reporter that counts and remembers sources
#[derive(Default)]
pub struct CountingFaultReporter {
    count: AtomicUsize,
    sources: Mutex<Vec<String>>,
}

impl CountingFaultReporter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().clone()
    }
}

impl FaultReporter for CountingFaultReporter {
    fn report(&self, source: &str, _failure: &ListenerFailure) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().push(source.to_string());
    }
}

/// Dispatch configuration used by tests: no built-in listeners
pub fn test_config() -> DispatchConfig {
    DispatchConfig {
        disable_default_listeners: true,
        ..DispatchConfig::default()
    }
}

/// A dispatcher on the current runtime plus its fault reporter
pub fn test_dispatcher() -> (Dispatcher, Arc<CountingFaultReporter>) {
    let reporter = Arc::new(CountingFaultReporter::default());
    let dispatcher = Dispatcher::builder()
        .config(test_config())
        .fault_reporter(Arc::clone(&reporter) as Arc<dyn FaultReporter>)
        .build()
        .expect("tests run inside a tokio runtime");
    (dispatcher, reporter)
}

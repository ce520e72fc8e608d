//! Listener trait and closure adapters

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use events_core::{downcast_arc, ErrorEvent, Event, EventName};

/// Something that reacts to dispatched events.
///
/// Returning an error (or panicking) never affects other listeners; the
/// failure is turned into an error event by the dispatcher.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn handle(&self, event: Arc<dyn Event>) -> anyhow::Result<()>;

    /// Name used in logs and error sources
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Listener backed by an async closure
pub struct FnListener<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> Listener for FnListener<F>
where
    F: Fn(Arc<dyn Event>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, event: Arc<dyn Event>) -> anyhow::Result<()> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap an async closure taking any event.
pub fn listener_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn Listener>
where
    F: Fn(Arc<dyn Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnListener {
        name: name.into(),
        f,
    })
}

/// Listener that only sees events of type `T`
///
/// Events of other types (e.g. from a wildcard registration) are skipped.
pub struct TypedListener<T, F> {
    name: &'static str,
    f: F,
    _event: PhantomData<fn(Arc<T>)>,
}

#[async_trait]
impl<T, F, Fut> Listener for TypedListener<T, F>
where
    T: Event,
    F: Fn(Arc<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn handle(&self, event: Arc<dyn Event>) -> anyhow::Result<()> {
        match downcast_arc::<T>(event) {
            Some(event) => (self.f)(event).await,
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

pub fn typed_listener<T, F, Fut>(f: F) -> Arc<dyn Listener>
where
    T: Event + EventName,
    F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(TypedListener {
        name: T::TYPE_NAME,
        f,
        _event: PhantomData,
    })
}

/// Wrap an async closure taking error events.
///
/// Error variants share one type, so the registration key decides which
/// variant the closure sees.
pub fn error_listener<F, Fut>(f: F) -> Arc<dyn Listener>
where
    F: Fn(Arc<ErrorEvent>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(TypedListener {
        name: "ErrorEvent",
        f,
        _event: PhantomData,
    })
}

/// Per-registration options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Hold the listener back until the dispatcher is marked ready
    pub delay_until_ready: bool,
    /// Built-in listener, replaced as soon as a user listener takes the key
    pub is_default: bool,
}

impl ListenerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn delay_until_ready(mut self, delay: bool) -> Self {
        self.delay_until_ready = delay;
        self
    }

    #[must_use]
    pub fn default_listener() -> Self {
        Self {
            delay_until_ready: false,
            is_default: true,
        }
    }
}

//! Event dispatcher
//!
//! Fans every dispatched event out to the listeners registered for its key
//! plus the wildcard listeners. Each invocation runs as its own tokio task,
//! so `dispatch` returns as soon as everything is scheduled.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use events_common::DispatchConfig;
use events_core::{
    downcast_arc, normalize_listener_key, translate, ContextKind, ErrorEvent, Event, EventName,
    GatewayPayload, InvocationContext, ListenerFailure, Ready, WILDCARD_KEY,
};
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::completion::{CompletionEmitter, InvocationOutcome, Invoker};
use crate::defaults;
use crate::error::{DispatchError, DispatchResult};
use crate::listener::{error_listener, typed_listener, Listener, ListenerOptions};
use crate::reclassify::{ErrorReclassifier, FaultReporter, TracingFaultReporter};
use crate::registry::{ListenerHandle, ListenerRegistry, RegisteredListener};
use crate::waiter::WaiterSet;

struct Inner {
    registry: ListenerRegistry,
    waiters: WaiterSet,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    ready: watch::Sender<bool>,
    runtime: Handle,
    fault_reporter: Arc<dyn FaultReporter>,
    config: DispatchConfig,
    /// Number of events dispatched so far
    sequence: AtomicU64,
}

/// Cheaply cloneable handle to one dispatcher
///
/// A listener that captures a clone keeps the dispatcher alive through the
/// registry; call [`close`](Self::close) or unregister it to release both.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

/// Builder for [`Dispatcher`]
#[derive(Default)]
pub struct DispatcherBuilder {
    config: Option<DispatchConfig>,
    fault_reporter: Option<Arc<dyn FaultReporter>>,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Where double faults and unobserved failures end up
    pub fn fault_reporter(mut self, reporter: Arc<dyn FaultReporter>) -> Self {
        self.fault_reporter = Some(reporter);
        self
    }

    /// Run listeners on this runtime instead of the current one
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the dispatcher.
    ///
    /// Fails with [`DispatchError::NoRuntime`] when no runtime handle was
    /// given and the caller is not inside a tokio runtime.
    pub fn build(self) -> DispatchResult<Dispatcher> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| DispatchError::NoRuntime)?,
        };
        let config = self.config.unwrap_or_default();
        let (ready, _) = watch::channel(false);

        let dispatcher = Dispatcher {
            inner: Arc::new(Inner {
                registry: ListenerRegistry::new(),
                waiters: WaiterSet::default(),
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                ready,
                runtime,
                fault_reporter: self
                    .fault_reporter
                    .unwrap_or_else(|| Arc::new(TracingFaultReporter)),
                config,
                sequence: AtomicU64::new(0),
            }),
        };

        if dispatcher.inner.config.disable_default_listeners {
            tracing::debug!("Default listeners disabled");
        } else {
            defaults::install(&dispatcher.inner.registry);
        }

        Ok(dispatcher)
    }
}

impl Dispatcher {
    /// Dispatcher with default configuration on the current runtime
    pub fn new() -> DispatchResult<Self> {
        DispatcherBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.inner.registry
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a listener with the configured default options.
    ///
    /// `key` may be a dispatch key, a type name, an `on_`-prefixed name or
    /// the wildcard `"*"`.
    pub fn register(&self, key: &str, listener: Arc<dyn Listener>) -> ListenerHandle {
        let options = ListenerOptions::new().delay_until_ready(self.inner.config.delay_until_ready);
        self.register_with(key, listener, options)
    }

    pub fn register_with(
        &self,
        key: &str,
        listener: Arc<dyn Listener>,
        options: ListenerOptions,
    ) -> ListenerHandle {
        self.inner.registry.register(key, listener, options)
    }

    /// Register an async closure for events of type `T`, keyed by `T`'s dispatch key.
    pub fn listen<T, F, Fut>(&self, f: F) -> ListenerHandle
    where
        T: Event + EventName,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(T::event_name(), typed_listener::<T, F, Fut>(f))
    }

    /// Register an async closure for the error events classified under `kind`
    /// (`ContextKind::None` is the generic `error` key).
    pub fn listen_error<F, Fut>(&self, kind: ContextKind, f: F) -> ListenerHandle
    where
        F: Fn(Arc<ErrorEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(ErrorEvent::key_for(kind), error_listener(f))
    }

    pub fn unregister(&self, handle: &ListenerHandle) -> bool {
        self.inner.registry.unregister(handle)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Dispatch an event. Returns the number of listener invocations scheduled.
    pub fn dispatch<E: Event>(&self, event: E) -> usize {
        self.dispatch_arc(Arc::new(event))
    }

    pub fn dispatch_arc(&self, event: Arc<dyn Event>) -> usize {
        if self.is_shut_down() {
            tracing::debug!(event = %event.resolved_name(), "Dispatcher shut down, dropping event");
            return 0;
        }

        let key = event.resolved_name();
        let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        if event.is::<Ready>() {
            self.mark_ready();
        }

        // Both snapshots are taken before anything is scheduled
        let listeners = self.inner.registry.listeners_for(key);
        let wildcard = if key == WILDCARD_KEY {
            Arc::from(Vec::new())
        } else {
            self.inner.registry.listeners_for(WILDCARD_KEY)
        };

        tracing::trace!(
            event = %key,
            seq = seq,
            listeners = listeners.len(),
            wildcard = wildcard.len(),
            "Dispatching event"
        );

        let mut scheduled = 0;
        for entry in listeners.iter().chain(wildcard.iter()) {
            self.schedule(entry.clone(), Arc::clone(&event));
            scheduled += 1;
        }

        self.inner.waiters.resolve(&event);

        scheduled
    }

    /// Translate a gateway payload and dispatch every resulting event.
    pub fn dispatch_payload(&self, payload: GatewayPayload) -> usize {
        tracing::trace!(payload = %payload, "Translating gateway payload");
        translate(payload)
            .into_iter()
            .map(|event| self.dispatch_arc(event))
            .sum()
    }

    /// Parse a JSON gateway payload and dispatch it.
    pub fn dispatch_json(&self, json: &str) -> DispatchResult<usize> {
        let payload = GatewayPayload::from_json(json)?;
        Ok(self.dispatch_payload(payload))
    }

    fn schedule(&self, entry: RegisteredListener, event: Arc<dyn Event>) {
        let dispatcher = self.clone();
        self.inner.tracker.spawn_on(
            async move { dispatcher.run_listener(entry, event).await },
            &self.inner.runtime,
        );
    }

    async fn run_listener(&self, entry: RegisteredListener, event: Arc<dyn Event>) {
        let token = &self.inner.shutdown;
        if token.is_cancelled() {
            tracing::trace!(listener = %entry.name(), "Skipping listener after shutdown");
            return;
        }

        if entry.options.delay_until_ready && event.family().respects_ready_gate() {
            let mut ready = self.inner.ready.subscribe();
            let became_ready = async { ready.wait_for(|is_ready| *is_ready).await.is_ok() };

            tokio::select! {
                () = token.cancelled() => return,
                ok = became_ready => {
                    if !ok {
                        return;
                    }
                }
            }
        }

        let outcome = AssertUnwindSafe(entry.listener.handle(Arc::clone(&event)))
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(error)) => ListenerFailure::new(error),
            Err(panic) => ListenerFailure::from_panic(panic),
        };

        self.reclassifier().listener_failed(&entry, &event, failure);
    }

    // ========================================================================
    // Readiness
    // ========================================================================

    /// Release listeners waiting for readiness.
    ///
    /// Dispatching [`Ready`] does this automatically.
    pub fn mark_ready(&self) {
        if !self.inner.ready.send_replace(true) {
            tracing::info!("Dispatcher ready");
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    // ========================================================================
    // Waiting
    // ========================================================================

    /// Wait for the next event under `key` that passes `check`.
    ///
    /// Without an explicit `timeout` the configured default applies; if that
    /// is unset too, this waits until the event arrives or the dispatcher
    /// shuts down.
    pub async fn wait_for<F>(
        &self,
        key: &str,
        check: F,
        timeout: Option<Duration>,
    ) -> DispatchResult<Arc<dyn Event>>
    where
        F: Fn(&Arc<dyn Event>) -> bool + Send + Sync + 'static,
    {
        if self.is_shut_down() {
            return Err(DispatchError::ShutDown);
        }

        let key = normalize_listener_key(key);
        let (id, rx) = self.inner.waiters.add(key.clone(), Box::new(check));
        if self.is_shut_down() {
            // Lost a race with shutdown; make sure the receiver sees it
            self.inner.waiters.clear();
        }

        let received = match timeout.or_else(|| self.inner.config.wait_timeout()) {
            Some(timeout) => match tokio::time::timeout(timeout, rx).await {
                Ok(received) => received,
                Err(_) => {
                    self.inner.waiters.remove(&key, id);
                    return Err(DispatchError::WaitTimeout { key, timeout });
                }
            },
            None => rx.await,
        };

        received.map_err(|_| DispatchError::ShutDown)
    }

    /// Typed form of [`wait_for`](Self::wait_for).
    pub async fn wait_for_event<T, F>(
        &self,
        check: F,
        timeout: Option<Duration>,
    ) -> DispatchResult<Arc<T>>
    where
        T: Event + EventName,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.wait_typed(T::event_name(), T::TYPE_NAME, check, timeout)
            .await
    }

    /// Wait for the next error event classified under `kind` that passes `check`.
    pub async fn wait_for_error<F>(
        &self,
        kind: ContextKind,
        check: F,
        timeout: Option<Duration>,
    ) -> DispatchResult<Arc<ErrorEvent>>
    where
        F: Fn(&ErrorEvent) -> bool + Send + Sync + 'static,
    {
        self.wait_typed(ErrorEvent::key_for(kind), "ErrorEvent", check, timeout)
            .await
    }

    async fn wait_typed<T, F>(
        &self,
        key: &str,
        expected: &'static str,
        check: F,
        timeout: Option<Duration>,
    ) -> DispatchResult<Arc<T>>
    where
        T: Event,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let event = self
            .wait_for(
                key,
                move |event| event.downcast_ref::<T>().is_some_and(|e| check(e)),
                timeout,
            )
            .await?;

        let found = event.type_name();
        downcast_arc::<T>(event).ok_or(DispatchError::TypeMismatch { expected, found })
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Stop accepting events and cancel invocations that have not started.
    ///
    /// Running listeners finish on their own; pending `wait_for` calls fail
    /// with [`DispatchError::ShutDown`].
    pub fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }

        self.inner.shutdown.cancel();
        self.inner.tracker.close();
        self.inner.waiters.clear();

        tracing::info!(pending = self.pending(), "Dispatcher shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Wait until every scheduled invocation has finished, including error
    /// events dispatched by failing listeners.
    pub async fn drain(&self) {
        // A closed tracker still accepts tasks; closing only lets `wait` finish
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }

    pub async fn drain_timeout(&self, timeout: Duration) -> DispatchResult<()> {
        tokio::time::timeout(timeout, self.drain())
            .await
            .map_err(|_| DispatchError::DrainTimeout {
                pending: self.pending(),
            })
    }

    /// Shut down, drain within the configured drain timeout, then drop
    /// every registered listener.
    ///
    /// Listeners that hold a clone of this dispatcher keep it alive until
    /// they are unregistered; closing releases them.
    pub async fn close(&self) -> DispatchResult<()> {
        self.shutdown();
        let drained = self.drain_timeout(self.inner.config.drain_timeout()).await;
        self.inner.registry.clear();
        drained
    }

    /// Number of invocations scheduled but not yet finished
    pub fn pending(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Number of events dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.inner.sequence.load(Ordering::Relaxed)
    }

    /// Number of `wait_for` calls still waiting for their event
    pub fn waiting(&self) -> usize {
        self.inner.waiters.len()
    }

    // ========================================================================
    // Failure and completion reporting
    // ========================================================================

    pub fn reclassifier(&self) -> ErrorReclassifier<'_> {
        ErrorReclassifier::new(self)
    }

    pub fn completions(&self) -> CompletionEmitter<'_> {
        CompletionEmitter::new(self)
    }

    pub fn invoker(&self) -> Invoker<'_> {
        Invoker::new(self)
    }

    /// Shorthand for `self.invoker().run(..)` without call arguments.
    pub async fn invoke<F>(
        &self,
        ctx: impl Into<InvocationContext>,
        callback: F,
    ) -> InvocationOutcome
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        self.invoker()
            .run(ctx, Vec::new(), serde_json::Map::new(), callback)
            .await
    }

    pub(crate) fn fault_reporter(&self) -> &dyn FaultReporter {
        self.inner.fault_reporter.as_ref()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.inner.registry)
            .field("pending", &self.pending())
            .field("waiting", &self.waiting())
            .field("ready", &self.is_ready())
            .field("shut_down", &self.is_shut_down())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

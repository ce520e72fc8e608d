//! # events-dispatch
//!
//! Runtime half of the event core. Listeners are registered per dispatch key
//! and every dispatched event fans out to them as independent tokio tasks.
//! Listener failures never reach the caller: they are reclassified into error
//! events and dispatched again, and a failure while handling a generic error
//! ends at the [`FaultReporter`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use events_core::{Event, Ready};
//! use events_dispatch::{listener_fn, Dispatcher};
//!
//! # async fn run() -> Result<(), events_dispatch::DispatchError> {
//! let dispatcher = Dispatcher::new()?;
//! dispatcher.register("on_ready", listener_fn("greet", |_event: Arc<dyn Event>| async {
//!     tracing::info!("ready");
//!     Ok(())
//! }));
//! dispatcher.dispatch(Ready);
//! dispatcher.drain().await;
//! # Ok(())
//! # }
//! ```

mod completion;
mod defaults;
mod dispatcher;
mod error;
mod listener;
mod reclassify;
mod registry;
mod waiter;

pub use completion::{CompletionEmitter, InvocationOutcome, Invoker};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, DispatchResult};
pub use listener::{
    error_listener, listener_fn, typed_listener, FnListener, Listener, ListenerOptions,
    TypedListener,
};
pub use reclassify::{ErrorReclassifier, FaultReporter, TracingFaultReporter};
pub use registry::{ListenerHandle, ListenerId, ListenerRegistry, RegisteredListener, Snapshot};

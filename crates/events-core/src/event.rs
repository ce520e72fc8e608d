//! The event capability
//!
//! Events are immutable envelopes handed to listeners behind an
//! `Arc<dyn Event>`. They deliberately implement none of `PartialEq`, `Eq`,
//! `Hash` or `Ord`: two occurrences may carry identical payloads, so the only
//! meaningful identity is the allocation itself (`Arc::ptr_eq`).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::context::InvocationContext;

/// Broad grouping of event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    /// Connection and client lifecycle (login, connect, ready, ...)
    Lifecycle,
    /// Gateway payloads passed through verbatim
    Raw,
    /// Component interactions
    Interaction,
    /// Successful invocation notifications
    Completion,
    /// Captured failures
    Error,
}

impl EventFamily {
    /// Whether listeners that wait for readiness may be held back for this family.
    ///
    /// Errors and raw gateway traffic are always delivered immediately.
    #[must_use]
    pub const fn respects_ready_gate(self) -> bool {
        !matches!(self, Self::Error | Self::Raw)
    }
}

/// Something that happened and can be dispatched to listeners.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// The dispatch key listeners are matched against.
    fn resolved_name(&self) -> &str;

    /// Rust type name, used in diagnostics.
    fn type_name(&self) -> &'static str;

    fn family(&self) -> EventFamily;

    /// The invocation context carried by this event, if any.
    fn context(&self) -> Option<InvocationContext> {
        None
    }

    /// Whether a listener failure while handling this event is a double fault.
    ///
    /// Double faults are reported through a side channel instead of being
    /// turned into another event.
    fn is_terminal_error(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl dyn Event {
    /// Check whether this event is of type `T`.
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow this event as `T`.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Convert a shared event into its concrete type.
///
/// Returns `None` when the event is not a `T`.
pub fn downcast_arc<T: Event>(event: Arc<dyn Event>) -> Option<Arc<T>> {
    if !event.is::<T>() {
        return None;
    }
    event.into_any().downcast::<T>().ok()
}

/// Implement [`EventName`](crate::EventName) and [`Event`] for a struct.
///
/// The family is one of the [`EventFamily`] variant names. Types that carry
/// an invocation context name the field holding it.
#[macro_export]
macro_rules! impl_event {
    ($ty:ident, $family:ident) => {
        $crate::impl_event_name!($ty);
        $crate::impl_event!(@event $ty, $family, |_this| ::core::option::Option::None);
    };
    ($ty:ident, $family:ident, override = $key:literal) => {
        $crate::impl_event_name!($ty, override = $key);
        $crate::impl_event!(@event $ty, $family, |_this| ::core::option::Option::None);
    };
    ($ty:ident, $family:ident, context = $field:ident) => {
        $crate::impl_event_name!($ty);
        $crate::impl_event!(@event $ty, $family, |this| ::core::option::Option::Some(
            $crate::InvocationContext::from(::std::sync::Arc::clone(&this.$field))
        ));
    };
    (@event $ty:ident, $family:ident, |$this:ident| $context:expr) => {
        impl $crate::Event for $ty {
            fn resolved_name(&self) -> &str {
                <Self as $crate::EventName>::event_name()
            }

            fn type_name(&self) -> &'static str {
                <Self as $crate::EventName>::TYPE_NAME
            }

            fn family(&self) -> $crate::EventFamily {
                $crate::EventFamily::$family
            }

            fn context(&self) -> ::core::option::Option<$crate::InvocationContext> {
                let $this = self;
                $context
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + ::core::marker::Send + ::core::marker::Sync>
            {
                self
            }
        }
    };
}

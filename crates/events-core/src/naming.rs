//! Dispatch key naming
//!
//! Every event type maps to a lower_snake_case dispatch key derived from its
//! CamelCase type name. Keys are computed once per type and cached.

/// Key that matches every dispatched event.
pub const WILDCARD_KEY: &str = "*";

/// Convert a CamelCase type name into its dispatch key.
///
/// An underscore is inserted before every ASCII uppercase letter that is not
/// the first character, then the whole name is lowercased. Acronyms are not
/// special-cased, so `HTTPError` becomes `h_t_t_p_error`.
#[must_use]
pub fn derive_dispatch_key(type_name: &str) -> String {
    let mut key = String::with_capacity(type_name.len() + 4);

    for (index, ch) in type_name.chars().enumerate() {
        if index > 0 && ch.is_ascii_uppercase() {
            key.push('_');
        }
        key.extend(ch.to_lowercase());
    }

    key
}

/// Resolve the key of a type, honouring an explicit override.
///
/// The override goes through the same derivation so that `"RawReady"` and
/// `"raw_ready"` name the same key.
#[must_use]
pub fn resolve_type_key(type_name: &str, override_name: Option<&str>) -> String {
    derive_dispatch_key(override_name.unwrap_or(type_name))
}

/// Normalize a key supplied by application code at registration time.
///
/// Accepts the wildcard, a dispatch key (`button_pressed`), a type name
/// (`ButtonPressed`) or a handler-style name (`on_button_pressed`).
#[must_use]
pub fn normalize_listener_key(key: &str) -> String {
    if key == WILDCARD_KEY {
        return key.to_string();
    }
    let key = key.strip_prefix("on_").unwrap_or(key);
    derive_dispatch_key(key)
}

/// Static naming information of an event type.
pub trait EventName {
    /// The Rust type name the key is derived from.
    const TYPE_NAME: &'static str;

    /// The dispatch key of this type, cached after the first call.
    fn event_name() -> &'static str;
}

/// Implement [`EventName`] for a type.
///
/// ```
/// use events_core::{impl_event_name, EventName};
///
/// struct GuildJoin;
/// impl_event_name!(GuildJoin);
///
/// struct Legacy;
/// impl_event_name!(Legacy, override = "LegacyPing");
///
/// assert_eq!(GuildJoin::event_name(), "guild_join");
/// assert_eq!(Legacy::event_name(), "legacy_ping");
/// ```
#[macro_export]
macro_rules! impl_event_name {
    ($ty:ident) => {
        $crate::impl_event_name!(@name $ty, ::core::option::Option::None);
    };
    ($ty:ident, override = $key:literal) => {
        $crate::impl_event_name!(@name $ty, ::core::option::Option::Some($key));
    };
    (@name $ty:ident, $override:expr) => {
        impl $crate::EventName for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn event_name() -> &'static str {
                static NAME: ::std::sync::OnceLock<::std::string::String> =
                    ::std::sync::OnceLock::new();
                NAME.get_or_init(|| $crate::naming::resolve_type_key(stringify!($ty), $override))
            }
        }
    };
}

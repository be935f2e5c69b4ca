//! Core runtime error types

use thiserror::Error;

use crate::lifecycle::Phase;

/// Error type returned by consumer hooks
///
/// Any `std::error::Error` converts with `?`, and plain messages convert
/// with `.into()`.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for consumer hooks
pub type HookResult = std::result::Result<(), HookError>;

/// Errors raised by the component runtime
#[derive(Error, Debug)]
pub enum CoreError {
    /// A property was written before being declared
    #[error("Unknown reactive property '{0}'")]
    UnknownProperty(String),

    /// A lifecycle event arrived in a phase that cannot accept it
    #[error("Cannot {event} a component that is {from}")]
    InvalidTransition { from: Phase, event: &'static str },

    /// A consumer hook failed; the lifecycle sequence stopped at that hook
    #[error("Hook '{hook}' failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: HookError,
    },

    /// The optional re-entrancy guard stopped a nested render pass
    #[error("Render depth limit of {limit} exceeded")]
    RenderDepthExceeded { limit: u32 },

    /// A tag name was registered twice
    #[error("Element '{0}' is already defined")]
    AlreadyDefined(String),

    /// Custom tag names must be lowercase and contain a hyphen
    #[error("Invalid custom element name '{0}'")]
    InvalidTagName(String),

    /// No constructor is registered for the tag
    #[error("Element '{0}' is not defined")]
    UnknownTag(String),

    /// Style acquisition failed
    #[error(transparent)]
    Style(#[from] sprig_style::StyleError),
}

impl CoreError {
    pub(crate) fn hook(hook: &'static str, source: HookError) -> Self {
        CoreError::Hook { hook, source }
    }
}

/// Errors raised while dispatching on the event bus
#[derive(Error, Debug)]
pub enum BusError {
    /// A listener failed; listeners after it were not called
    #[error("Listener {index} for '{event}' failed: {source}")]
    Listener {
        event: String,
        index: usize,
        #[source]
        source: HookError,
    },
}

/// Result type for core runtime operations
pub type Result<T> = std::result::Result<T, CoreError>;

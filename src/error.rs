use crate::route::SlotKind;
use thiserror::Error;

/// The boxed error type produced by route handlers, filters and lifecycle hooks.
///
/// Handlers may fail with any error type `E: Into<RouteError>`; the router boxes it before handing
/// it to the error handler.
pub type RouteError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by the router itself.
///
/// Registration errors are returned synchronously to the caller of the registering method and are
/// never logged-and-swallowed.
#[derive(Debug, Error)]
pub enum Error {
    /// The pattern could not be compiled.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// Two dynamic captures would share one branch position, so one of them could never match.
    #[error(
        "route pattern {pattern:?} puts a capture where a different capture is already registered, \
         one of them would never be matched"
    )]
    ConflictingCapture { pattern: String },

    /// The slot for this path is already occupied.
    #[error("{kind} for route pattern {pattern:?} already exists")]
    RouteExists { kind: SlotKind, pattern: String },

    /// A router can not be mounted under this prefix without shadowing an existing `/` branch.
    #[error("can not mount a router under {prefix:?}, a route already continues with '/' there")]
    MountConflict { prefix: String },

    /// No task handler is registered for the path.
    #[error("no task handler found for path {path:?}")]
    TaskNotFound { path: String },

    /// The request path is not valid percent-encoded UTF-8.
    #[error("couldn't percent decode request path: {0}")]
    DecodePath(#[from] std::str::Utf8Error),

    /// A handler, filter or task handler failed to initialize.
    #[error("failed to initialize route components: {0}")]
    Init(#[source] RouteError),
}

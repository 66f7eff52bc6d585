// Error types for the Trellis framework

use thiserror::Error;

/// Failures raised by the declaration compiler, the registry and the
/// reference dispatcher.
///
/// Compilation failures are fatal and fail-fast: the first one aborts
/// the whole pass and no partial registry is produced. Every compile
/// variant names the offending class and method so misconfiguration is
/// diagnosable without a debugger.
#[derive(Error, Debug)]
pub enum Error {
    // ---- compile-time configuration failures ----
    #[error("Source directory not found: {0}")]
    SourceDirectoryNotFound(String),

    #[error("No bundles defined for compilation")]
    BundlesNotDefined,

    #[error("Duplicate bundle name: {0}")]
    DuplicateBundle(String),

    #[error("Source directory for bundle '{bundle}' not found: {dir}")]
    BundleSourceNotFound { bundle: String, dir: String },

    #[error(
        "Method '{method}' of controller '{controller}' is annotated as a route but has no pattern defined"
    )]
    RoutePatternNotDefined { controller: String, method: String },

    #[error(
        "Method '{method}' of controller '{controller}' is annotated as a route but has no HTTP method (get, post, ...) defined"
    )]
    RouteMethodNotDefined { controller: String, method: String },

    #[error("Unknown HTTP method '{token}' on '{controller}::{method}'")]
    UnknownHttpMethod {
        controller: String,
        method: String,
        token: String,
    },

    #[error(
        "Method '{method}' of controller '{controller}' declares both a conventional route and a direct binding"
    )]
    RouteKindConflict { controller: String, method: String },

    #[error("Method '{method}' is not defined on controller '{controller}'")]
    ControllerMethodNotDefined { controller: String, method: String },

    #[error(
        "Method '{method}' of controller '{controller}' is bound as a '{phase}' filter but carries declarations of its own"
    )]
    FilterHasAnnotation {
        controller: String,
        method: String,
        phase: String,
    },

    #[error("Class '{0}' carries both controller and service metadata")]
    AmbiguousClassMetadata(String),

    #[error("Service key '{0}' is already registered")]
    DuplicateServiceKey(String),

    #[error("Route name '{0}' is already bound")]
    DuplicateRouteName(String),

    #[error("Route '{path}' declares template '{template}' but no renderer is configured")]
    RendererNotConfigured { path: String, template: String },

    // ---- lookup and dispatch failures ----
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status code used by the reference dispatcher when a failure
    /// surfaces at request time. Compile failures never reach dispatch.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::RouteNotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    /// Whether this failure belongs to the compile-time taxonomy.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Error::SourceDirectoryNotFound(_)
                | Error::BundlesNotDefined
                | Error::DuplicateBundle(_)
                | Error::BundleSourceNotFound { .. }
                | Error::RoutePatternNotDefined { .. }
                | Error::RouteMethodNotDefined { .. }
                | Error::UnknownHttpMethod { .. }
                | Error::RouteKindConflict { .. }
                | Error::ControllerMethodNotDefined { .. }
                | Error::FilterHasAnnotation { .. }
                | Error::AmbiguousClassMetadata(_)
                | Error::DuplicateServiceKey(_)
                | Error::DuplicateRouteName(_)
                | Error::RendererNotConfigured { .. }
        )
    }
}

// Trellis - a declarative metadata-to-runtime compiler
//
// This library turns annotated controller and service declarations into
// routes, filter chains and dependency registrations at startup.

// Re-export core functionality
pub use trellis_core::*;

// Re-export configuration loading
pub use trellis_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AppContext,
        BundleDescriptor,
        ClassDescriptor,
        ControllerMeta,
        DeclarationCompiler,
        DirectMeta,
        Error,
        FilterMeta,
        HttpMethod,
        HttpRequest,
        HttpResponse,
        Lifetime,
        ManifestSource,
        MethodDescriptor,
        MethodOutput,
        ParameterMeta,
        PropertyDescriptor,
        Registry,
        RouteMeta,
        ServiceInstance,
        ServiceMeta,
        instance_of,
        method_body,
    };
    pub use trellis_config::ConfigSet;
}

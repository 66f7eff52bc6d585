// Core library for the Trellis framework
// Metadata schema, declaration compiler, registry and filter chains

pub mod compiler;
pub mod context;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod http;
pub mod metadata;
pub mod registry;
pub mod scan;
pub mod source;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use compiler::DeclarationCompiler;
pub use context::AppContext;
pub use descriptor::{
    instance_of, method_body, BoxFuture, BundleDescriptor, ClassDescriptor, ConstructorFn,
    MethodDescriptor, MethodFn, MethodOutput, PropertyDescriptor, PropertyReadFn, ServiceInstance,
};
pub use error::Error;
pub use filter::{AfterFn, BeforeFn, FilterChain, FilterFlow, HandlerFn};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use metadata::{
    ControllerMeta, DirectMeta, FilterMeta, FilterPhase, Lifetime, ParameterMeta, RouteMeta,
    ServiceMeta,
};
pub use registry::{CompiledRoute, Registry, Resolved, RouteKind, ServiceCell, ServiceFactory};
pub use source::{ManifestSource, ReflectionSource};
pub use store::{MemoryBackend, Page, PageResult, Row, TableBackend, TableStore};
pub use template::{Renderer, TextRenderer};

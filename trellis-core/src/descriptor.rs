//! Reflected program structure.
//!
//! A [`ClassDescriptor`] is one class as the reflection source sees it:
//! its class-level metadata, its methods with theirs, and its static
//! properties. Method bodies are explicit type-erased closures
//! registered alongside the metadata, so metadata and code never need
//! to share a compilation unit; the compiler validates every reference
//! between them before anything can be dispatched.

use crate::context::AppContext;
use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::metadata::{ControllerMeta, DirectMeta, FilterMeta, ParameterMeta, RouteMeta, ServiceMeta};
use serde_json::{Map, Value};
use std::any::Any;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future used across the dispatch surface.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A constructed controller or service instance, type-erased.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Constructor closure: the application context is the only injected
/// dependency.
pub type ConstructorFn = Arc<dyn Fn(Arc<AppContext>) -> ServiceInstance + Send + Sync>;

/// Lazy accessor for a Parameter-marked static property.
pub type PropertyReadFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// What a method invocation produced.
///
/// Route handlers return `Response` (or `View` when a template is in
/// effect, or `None` for an empty 204). Before filters return
/// `Request` to continue with a possibly mutated request, `Response`
/// to short-circuit, or `None` to continue unchanged. After filters
/// return `Response` to replace the outbound response or `None` to
/// keep it.
pub enum MethodOutput {
    Response(HttpResponse),
    Request(HttpRequest),
    View(Map<String, Value>),
    None,
}

/// Type-erased async method body.
///
/// Invoked as `(instance, request, response)`; the response is `Some`
/// only for After-filter invocations.
pub type MethodFn = Arc<
    dyn Fn(ServiceInstance, HttpRequest, Option<HttpResponse>) -> BoxFuture<Result<MethodOutput, Error>>
        + Send
        + Sync,
>;

/// Downcast a type-erased instance to its concrete type.
pub fn instance_of<T: Send + Sync + 'static>(instance: &ServiceInstance) -> Result<Arc<T>, Error> {
    instance.clone().downcast::<T>().map_err(|_| {
        Error::Internal(format!(
            "instance is not a {}",
            std::any::type_name::<T>()
        ))
    })
}

/// A named group of classes sharing a root namespace.
#[derive(Clone, Debug)]
pub struct BundleDescriptor {
    pub name: String,
    pub namespace: String,
    /// When set, the reflection source verifies the directory exists.
    pub source_dir: Option<PathBuf>,
}

impl BundleDescriptor {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            source_dir: None,
        }
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }
}

/// One reflected class.
#[derive(Clone)]
pub struct ClassDescriptor {
    /// Qualified name, `::`-separated (e.g. `demo::controller::Foo`).
    pub name: String,
    pub controller: Option<ControllerMeta>,
    pub service: Option<ServiceMeta>,
    pub methods: Vec<MethodDescriptor>,
    pub properties: Vec<PropertyDescriptor>,
    pub construct: ConstructorFn,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, construct: ConstructorFn) -> Self {
        Self {
            name: name.into(),
            controller: None,
            service: None,
            methods: Vec::new(),
            properties: Vec::new(),
            construct,
        }
    }

    pub fn controller(mut self, meta: ControllerMeta) -> Self {
        self.controller = Some(meta);
        self
    }

    pub fn service(mut self, meta: ServiceMeta) -> Self {
        self.service = Some(meta);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Last segment of the qualified name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Dot-joined, lower-cased qualified name; the service key.
    pub fn dotted_key(&self) -> String {
        self.name
            .split("::")
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl std::fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("controller", &self.controller.is_some())
            .field("service", &self.service.is_some())
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// One reflected method with its declarations and body.
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub route: Option<RouteMeta>,
    pub direct: Option<DirectMeta>,
    pub before: Option<FilterMeta>,
    pub after: Option<FilterMeta>,
    pub body: MethodFn,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, body: MethodFn) -> Self {
        Self {
            name: name.into(),
            route: None,
            direct: None,
            before: None,
            after: None,
            body,
        }
    }

    pub fn route(mut self, meta: RouteMeta) -> Self {
        self.route = Some(meta);
        self
    }

    pub fn direct(mut self, meta: DirectMeta) -> Self {
        self.direct = Some(meta);
        self
    }

    pub fn before(mut self, meta: FilterMeta) -> Self {
        self.before = Some(meta);
        self
    }

    pub fn after(mut self, meta: FilterMeta) -> Self {
        self.after = Some(meta);
        self
    }

    /// Whether the method carries any route-family or filter metadata.
    /// Filter targets must be clean of all of it.
    pub fn has_declarations(&self) -> bool {
        self.route.is_some() || self.direct.is_some() || self.before.is_some() || self.after.is_some()
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("route", &self.route.is_some())
            .field("direct", &self.direct.is_some())
            .finish()
    }
}

/// One reflected static property.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub parameter: Option<ParameterMeta>,
    pub read: PropertyReadFn,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, read: PropertyReadFn) -> Self {
        Self {
            name: name.into(),
            parameter: None,
            read,
        }
    }

    pub fn parameter(mut self) -> Self {
        self.parameter = Some(ParameterMeta);
        self
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("parameter", &self.parameter.is_some())
            .finish()
    }
}

/// Shorthand for building a method body from an async closure result.
///
/// Most descriptor bodies only need the request; this keeps fixture
/// and application code free of `Box::pin` noise.
pub fn method_body<F, Fut>(f: F) -> MethodFn
where
    F: Fn(ServiceInstance, HttpRequest, Option<HttpResponse>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<MethodOutput, Error>> + Send + 'static,
{
    Arc::new(move |instance, request, response| Box::pin(f(instance, request, response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_class(name: &str) -> ClassDescriptor {
        ClassDescriptor::new(name, Arc::new(|_ctx| Arc::new(()) as ServiceInstance))
    }

    #[test]
    fn test_short_name_and_dotted_key() {
        let class = noop_class("demo::controller::Foo");
        assert_eq!(class.short_name(), "Foo");
        assert_eq!(class.dotted_key(), "demo.controller.foo");
    }

    #[test]
    fn test_find_method() {
        let body = method_body(|_i, _r, _p| async { Ok(MethodOutput::None) });
        let class = noop_class("demo::controller::Foo")
            .method(MethodDescriptor::new("save", body));
        assert!(class.find_method("save").is_some());
        assert!(class.find_method("missing").is_none());
    }

    #[test]
    fn test_has_declarations() {
        let body = method_body(|_i, _r, _p| async { Ok(MethodOutput::None) });
        let plain = MethodDescriptor::new("before", body.clone());
        assert!(!plain.has_declarations());

        let routed = MethodDescriptor::new("route", body)
            .route(crate::metadata::RouteMeta::new().pattern("/teste").method("get"));
        assert!(routed.has_declarations());
    }

    #[test]
    fn test_instance_downcast() {
        let instance: ServiceInstance = Arc::new(42u32);
        assert_eq!(*instance_of::<u32>(&instance).unwrap(), 42);
        assert!(instance_of::<String>(&instance).is_err());
    }
}

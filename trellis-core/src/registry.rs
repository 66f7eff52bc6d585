//! The runtime registry produced by compilation.
//!
//! After the declaration compiler finishes, the registry exclusively
//! owns every resolved binding: service factories keyed by dotted
//! service keys, the mounted route table, reverse route names and
//! parameter accessors. It is read-mostly from then on; the only
//! mutable state is the shared-service instance cache, which
//! guarantees at most one instance per key for the process lifetime.

use crate::context::AppContext;
use crate::descriptor::{ConstructorFn, PropertyReadFn, ServiceInstance};
use crate::error::Error;
use crate::filter::{FilterChain, HandlerFn};
use crate::http::HttpMethod;
use crate::metadata::Lifetime;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// Lazily constructed singleton slot for a shared service.
///
/// `OnceLock` serializes concurrent first accesses, so two worker
/// threads racing on the same key observe the same instance.
pub struct ServiceCell {
    construct: ConstructorFn,
    context: Arc<AppContext>,
    slot: OnceLock<ServiceInstance>,
}

impl ServiceCell {
    pub fn new(construct: ConstructorFn, context: Arc<AppContext>) -> Self {
        Self {
            construct,
            context,
            slot: OnceLock::new(),
        }
    }

    /// The shared instance, constructing it on first access.
    pub fn get(&self) -> ServiceInstance {
        self.slot
            .get_or_init(|| (self.construct)(self.context.clone()))
            .clone()
    }

    /// Whether the instance has been materialized yet.
    pub fn is_materialized(&self) -> bool {
        self.slot.get().is_some()
    }
}

enum ServiceEntry {
    Transient(ConstructorFn),
    Shared(Arc<ServiceCell>),
    Factory(ConstructorFn),
}

/// What a service lookup yields.
pub enum Resolved {
    /// A constructed instance (transient or shared lifetime).
    Instance(ServiceInstance),
    /// The constructor itself (protected-factory lifetime); looking it
    /// up never triggers construction.
    Factory(ServiceFactory),
}

impl Resolved {
    pub fn instance(self) -> Result<ServiceInstance, Error> {
        match self {
            Resolved::Instance(instance) => Ok(instance),
            Resolved::Factory(_) => Err(Error::Internal(
                "protected-factory service resolved where an instance was expected".into(),
            )),
        }
    }
}

/// A constructor bound to the application context, handed out for
/// protected-factory services.
#[derive(Clone)]
pub struct ServiceFactory {
    construct: ConstructorFn,
    context: Arc<AppContext>,
}

impl ServiceFactory {
    pub fn construct(&self) -> ServiceInstance {
        (self.construct)(self.context.clone())
    }
}

/// How a compiled route is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteKind {
    /// Conventional route from Route metadata.
    Basic,
    /// RPC-style POST endpoint; `form` selects multipart body parsing
    /// in the host dispatch layer.
    Direct { form: bool },
}

/// One fully wired route.
#[derive(Clone)]
pub struct CompiledRoute {
    /// Mount pattern of the owning controller.
    pub mount: String,
    /// Full path under the mount.
    pub path: String,
    pub methods: Vec<HttpMethod>,
    pub kind: RouteKind,
    pub name: Option<String>,
    pub handler: HandlerFn,
    pub filters: FilterChain,
}

impl CompiledRoute {
    pub fn accepts(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.as_str() == method)
    }
}

impl std::fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

/// The compiled registry. See the module docs for ownership rules.
pub struct Registry {
    context: Arc<AppContext>,
    services: HashMap<String, ServiceEntry>,
    routes: Vec<CompiledRoute>,
    route_names: HashMap<String, String>,
    parameters: HashMap<String, PropertyReadFn>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("routes", &self.routes)
            .field("route_names", &self.route_names)
            .field("parameters", &self.parameters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            services: HashMap::new(),
            routes: Vec::new(),
            route_names: HashMap::new(),
            parameters: HashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Register a service factory under a key with a lifetime policy.
    ///
    /// Returns the shared cell for shared services so the compiler can
    /// wire handlers straight to it.
    pub fn register_service(
        &mut self,
        key: impl Into<String>,
        lifetime: Lifetime,
        construct: ConstructorFn,
    ) -> Option<Arc<ServiceCell>> {
        let key = key.into();
        debug!(service = %key, lifetime = lifetime.as_str(), "Registering service");

        match lifetime {
            Lifetime::Transient => {
                self.services.insert(key, ServiceEntry::Transient(construct));
                None
            }
            Lifetime::Shared => {
                let cell = Arc::new(ServiceCell::new(construct, self.context.clone()));
                self.services.insert(key, ServiceEntry::Shared(cell.clone()));
                Some(cell)
            }
            Lifetime::ProtectedFactory => {
                self.services.insert(key, ServiceEntry::Factory(construct));
                None
            }
        }
    }

    /// Resolve a service by key according to its lifetime policy.
    pub fn resolve(&self, key: &str) -> Result<Resolved, Error> {
        let entry = self
            .services
            .get(key)
            .ok_or_else(|| Error::ServiceNotFound(key.to_string()))?;

        trace!(service = %key, "Resolving service");
        Ok(match entry {
            ServiceEntry::Transient(construct) => {
                Resolved::Instance(construct(self.context.clone()))
            }
            ServiceEntry::Shared(cell) => Resolved::Instance(cell.get()),
            ServiceEntry::Factory(construct) => Resolved::Factory(ServiceFactory {
                construct: construct.clone(),
                context: self.context.clone(),
            }),
        })
    }

    pub fn has_service(&self, key: &str) -> bool {
        self.services.contains_key(key)
    }

    /// Mount a compiled route. A name already bound by an earlier
    /// route fails the pass instead of silently rebinding.
    pub fn register_route(&mut self, route: CompiledRoute) -> Result<(), Error> {
        debug!(path = %route.path, methods = ?route.methods, "Mounting route");
        if let Some(name) = &route.name {
            if self.route_names.contains_key(name) {
                return Err(Error::DuplicateRouteName(name.clone()));
            }
            self.route_names.insert(name.clone(), route.path.clone());
        }
        self.routes.push(route);
        Ok(())
    }

    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Reverse lookup: path bound to a route name.
    pub fn url_for(&self, name: &str) -> Option<&str> {
        self.route_names.get(name).map(String::as_str)
    }

    /// Register a lazy parameter accessor under `<serviceKey>.<property>`.
    pub fn register_parameter(&mut self, key: impl Into<String>, read: PropertyReadFn) {
        let key = key.into();
        debug!(parameter = %key, "Registering parameter");
        self.parameters.insert(key, read);
    }

    /// Read a parameter value. The accessor runs on every lookup; the
    /// value is never memoized at compile time.
    pub fn parameter(&self, key: &str) -> Result<Value, Error> {
        self.parameters
            .get(key)
            .map(|read| read())
            .ok_or_else(|| Error::ParameterNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        id: usize,
    }

    fn counting_ctor(counter: Arc<AtomicUsize>) -> ConstructorFn {
        Arc::new(move |_ctx| {
            let id = counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(Counter { id }) as ServiceInstance
        })
    }

    fn registry() -> Registry {
        Registry::new(Arc::new(AppContext::new()))
    }

    #[test]
    fn test_shared_lookups_are_identical() {
        let mut reg = registry();
        let counter = Arc::new(AtomicUsize::new(0));
        reg.register_service("demo.svc", Lifetime::Shared, counting_ctor(counter.clone()));

        let a = reg.resolve("demo.svc").unwrap().instance().unwrap();
        let b = reg.resolve("demo.svc").unwrap().instance().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_lookups_are_distinct() {
        let mut reg = registry();
        let counter = Arc::new(AtomicUsize::new(0));
        reg.register_service("demo.svc", Lifetime::Transient, counting_ctor(counter.clone()));

        let a = reg.resolve("demo.svc").unwrap().instance().unwrap();
        let b = reg.resolve("demo.svc").unwrap().instance().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        let a = a.downcast::<Counter>().unwrap();
        let b = b.downcast::<Counter>().unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_protected_factory_lookup_does_not_construct() {
        let mut reg = registry();
        let counter = Arc::new(AtomicUsize::new(0));
        reg.register_service(
            "demo.svc",
            Lifetime::ProtectedFactory,
            counting_ctor(counter.clone()),
        );

        let resolved = reg.resolve("demo.svc").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        match resolved {
            Resolved::Factory(factory) => {
                factory.construct();
                assert_eq!(counter.load(Ordering::SeqCst), 1);
            }
            Resolved::Instance(_) => panic!("expected a factory"),
        }
    }

    #[test]
    fn test_unknown_service() {
        let reg = registry();
        assert!(matches!(
            reg.resolve("nope"),
            Err(Error::ServiceNotFound(_))
        ));
    }

    #[test]
    fn test_shared_cell_races_yield_one_instance() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cell = Arc::new(ServiceCell::new(
            counting_ctor(counter.clone()),
            Arc::new(AppContext::new()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || cell.get())
            })
            .collect();

        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        for pair in instances.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[test]
    fn test_parameter_reads_on_every_lookup() {
        let mut reg = registry();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        reg.register_parameter(
            "demo.svc.limit",
            Arc::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
                json!(200)
            }),
        );

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(reg.parameter("demo.svc.limit").unwrap(), json!(200));
        assert_eq!(reg.parameter("demo.svc.limit").unwrap(), json!(200));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(matches!(
            reg.parameter("demo.svc.nope"),
            Err(Error::ParameterNotFound(_))
        ));
    }

    fn named_route(path: &str, name: Option<&str>) -> CompiledRoute {
        CompiledRoute {
            mount: "/demo_Foo/".into(),
            path: path.into(),
            methods: vec![HttpMethod::GET],
            kind: RouteKind::Basic,
            name: name.map(String::from),
            handler: Arc::new(|_req| Box::pin(async { Ok(crate::http::HttpResponse::ok()) })),
            filters: FilterChain::new(),
        }
    }

    #[test]
    fn test_route_names() {
        let mut reg = registry();
        reg.register_route(named_route("/demo_Foo/teste", Some("foo_teste")))
            .unwrap();

        assert_eq!(reg.url_for("foo_teste"), Some("/demo_Foo/teste"));
        assert_eq!(reg.url_for("missing"), None);
        assert_eq!(reg.routes().len(), 1);
    }

    #[test]
    fn test_duplicate_route_name_is_rejected() {
        let mut reg = registry();
        reg.register_route(named_route("/demo_Foo/a", Some("dup")))
            .unwrap();

        let err = reg
            .register_route(named_route("/demo_Foo/b", Some("dup")))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRouteName(_)));

        // The failed route never mounts; the first binding is intact.
        assert_eq!(reg.routes().len(), 1);
        assert_eq!(reg.url_for("dup"), Some("/demo_Foo/a"));

        reg.register_route(named_route("/demo_Foo/c", None)).unwrap();
        reg.register_route(named_route("/demo_Foo/d", None)).unwrap();
        assert_eq!(reg.routes().len(), 3);
    }
}

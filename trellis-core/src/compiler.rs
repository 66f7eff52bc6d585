//! The declaration compiler.
//!
//! A one-shot, synchronous pass executed at process start: walk every
//! discovered class of every bundle, classify it by its class-level
//! metadata, and emit service, route, filter and parameter bindings
//! into a fresh [`Registry`]. The compiler is stateless between runs;
//! a failed pass leaves no partial registry behind.
//!
//! Compilation runs in two phases so filters can reference methods on
//! other controllers: phase one registers every service and indexes
//! every controller, phase two wires routes and resolves filter
//! references against that index.

use crate::context::AppContext;
use crate::descriptor::{BundleDescriptor, ClassDescriptor, MethodDescriptor, MethodOutput};
use crate::error::Error;
use crate::filter::{AfterFn, BeforeFn, FilterChain, FilterFlow, HandlerFn};
use crate::http::{HttpMethod, HttpResponse};
use crate::metadata::{DirectMeta, FilterMeta, FilterPhase, Lifetime, RouteMeta};
use crate::registry::{CompiledRoute, Registry, RouteKind, ServiceCell};
use crate::source::ReflectionSource;
use crate::template::Renderer;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

/// Compiles bundle declarations into a runtime registry.
pub struct DeclarationCompiler {
    context: Arc<AppContext>,
    source_root: Option<PathBuf>,
    renderer: Option<Arc<dyn Renderer>>,
}

/// A controller discovered in phase one, awaiting route wiring.
struct PendingController {
    bundle: String,
    class: ClassDescriptor,
    service_key: String,
    mount: String,
    cell: Arc<ServiceCell>,
}

impl DeclarationCompiler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            source_root: None,
            renderer: None,
        }
    }

    /// Require this source root to exist; relative bundle source
    /// directories are resolved against it.
    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Renderer used for routes that declare a template.
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Run the full compilation pass.
    pub fn compile(
        &self,
        source: &dyn ReflectionSource,
        bundles: &[BundleDescriptor],
    ) -> Result<Registry, Error> {
        self.check_parameters(bundles)?;

        let mut registry = Registry::new(self.context.clone());
        let mut pending: Vec<PendingController> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut seen = HashSet::new();

        // Phase one: discover, classify, register services.
        for bundle in bundles {
            if !seen.insert(bundle.name.clone()) {
                return Err(Error::DuplicateBundle(bundle.name.clone()));
            }

            let bundle = self.absolutize(bundle);
            debug!(bundle = %bundle.name, namespace = %bundle.namespace, "Compiling bundle");

            for class in source.discover(&bundle)? {
                match (&class.controller, &class.service) {
                    (Some(_), Some(_)) => {
                        return Err(Error::AmbiguousClassMetadata(class.name.clone()));
                    }
                    (Some(_), None) => {
                        let controller = self.define_controller(&mut registry, &bundle, class)?;
                        index.insert(controller.service_key.clone(), pending.len());
                        pending.push(controller);
                    }
                    (None, Some(service)) => {
                        let lifetime = service.lifetime;
                        self.define_service(&mut registry, class, lifetime)?;
                    }
                    (None, None) => {
                        trace!(class = %class.name, "Skipping plain class");
                    }
                }
            }
        }

        // Phase two: wire routes and resolve filters.
        for i in 0..pending.len() {
            self.map_routes(&mut registry, &pending, i)?;
        }

        debug!(
            routes = registry.routes().len(),
            "Compilation pass complete"
        );
        Ok(registry)
    }

    fn check_parameters(&self, bundles: &[BundleDescriptor]) -> Result<(), Error> {
        if let Some(root) = &self.source_root {
            if !root.is_dir() {
                return Err(Error::SourceDirectoryNotFound(root.display().to_string()));
            }
        }
        if bundles.is_empty() {
            return Err(Error::BundlesNotDefined);
        }
        Ok(())
    }

    /// Resolve a relative bundle source directory against the root.
    fn absolutize(&self, bundle: &BundleDescriptor) -> BundleDescriptor {
        let mut bundle = bundle.clone();
        if let (Some(root), Some(dir)) = (&self.source_root, &bundle.source_dir) {
            if dir.is_relative() {
                bundle.source_dir = Some(root.join(dir));
            }
        }
        bundle
    }

    /// Register the controller's own shared service and mount point.
    fn define_controller(
        &self,
        registry: &mut Registry,
        bundle: &BundleDescriptor,
        class: ClassDescriptor,
    ) -> Result<PendingController, Error> {
        let short = class.short_name().to_string();
        let service_key = format!("{}.{}", bundle.name.to_lowercase(), short.to_lowercase());
        let mount = format!("/{}_{}/", bundle.name.to_lowercase(), short);

        // Two controllers sharing a short name would collide on both
        // the service key and the mount.
        if registry.has_service(&service_key) {
            return Err(Error::DuplicateServiceKey(service_key));
        }

        debug!(
            controller = %class.name,
            service = %service_key,
            mount = %mount,
            "Defining controller service"
        );

        let cell = registry
            .register_service(service_key.clone(), Lifetime::Shared, class.construct.clone())
            .ok_or_else(|| {
                Error::Internal(format!(
                    "shared registration for '{}' yielded no cell",
                    service_key
                ))
            })?;

        Ok(PendingController {
            bundle: bundle.name.clone(),
            class,
            service_key,
            mount,
            cell,
        })
    }

    /// Register a service class and its Parameter-marked properties.
    fn define_service(
        &self,
        registry: &mut Registry,
        class: ClassDescriptor,
        lifetime: Lifetime,
    ) -> Result<(), Error> {
        let key = class.dotted_key();
        if registry.has_service(&key) {
            return Err(Error::DuplicateServiceKey(key));
        }
        debug!(service = %key, class = %class.name, "Defining service");
        registry.register_service(key.clone(), lifetime, class.construct.clone());

        for property in &class.properties {
            if property.parameter.is_some() {
                registry.register_parameter(
                    format!("{}.{}", key, property.name),
                    property.read.clone(),
                );
            }
        }
        Ok(())
    }

    /// Wire every routed method of one controller.
    fn map_routes(
        &self,
        registry: &mut Registry,
        pending: &[PendingController],
        owner: usize,
    ) -> Result<(), Error> {
        let controller = &pending[owner];

        // Controller-level filters apply to every route, wrapping the
        // route-level filters.
        let mut class_before: Vec<BeforeFn> = Vec::new();
        let mut class_after: Vec<AfterFn> = Vec::new();
        if let Some(meta) = &controller.class.controller {
            for filter in &meta.filters {
                self.collect_filters(
                    filter,
                    pending,
                    owner,
                    &mut class_before,
                    &mut class_after,
                )?;
            }
        }

        for method in &controller.class.methods {
            if method.route.is_some() && method.direct.is_some() {
                return Err(Error::RouteKindConflict {
                    controller: controller.class.name.clone(),
                    method: method.name.clone(),
                });
            }

            if method.route.is_none() && method.direct.is_none() {
                continue;
            }

            let mut chain = FilterChain::new();
            chain.before.extend(class_before.iter().cloned());
            if let Some(before) = &method.before {
                self.collect_filters(before, pending, owner, &mut chain.before, &mut chain.after)?;
            }
            if let Some(after) = &method.after {
                self.collect_filters(after, pending, owner, &mut chain.before, &mut chain.after)?;
            }
            chain.after.extend(class_after.iter().cloned());

            if let Some(route) = &method.route {
                self.map_basic_route(registry, controller, method, route, chain)?;
            } else if let Some(direct) = &method.direct {
                self.map_direct_route(registry, controller, method, direct, chain)?;
            }
        }

        Ok(())
    }

    /// Mount a conventional route.
    fn map_basic_route(
        &self,
        registry: &mut Registry,
        controller: &PendingController,
        method: &MethodDescriptor,
        route: &RouteMeta,
        filters: FilterChain,
    ) -> Result<(), Error> {
        let tokens = route.method_tokens();
        if tokens.is_empty() {
            return Err(Error::RouteMethodNotDefined {
                controller: controller.class.name.clone(),
                method: method.name.clone(),
            });
        }

        let mut methods = Vec::with_capacity(tokens.len());
        for token in &tokens {
            methods.push(HttpMethod::from_str(token).ok_or_else(|| Error::UnknownHttpMethod {
                controller: controller.class.name.clone(),
                method: method.name.clone(),
                token: token.clone(),
            })?);
        }

        let path = match &route.pattern {
            Some(pattern) => {
                if pattern.is_empty() || !pattern.starts_with('/') {
                    return Err(Error::RoutePatternNotDefined {
                        controller: controller.class.name.clone(),
                        method: method.name.clone(),
                    });
                }
                join_mount(&controller.mount, pattern)
            }
            // No pattern: the lower-cased method name is the segment.
            None => join_mount(&controller.mount, &method.name.to_lowercase()),
        };

        let handler = match &route.template {
            Some(template) => {
                let renderer =
                    self.renderer
                        .clone()
                        .ok_or_else(|| Error::RendererNotConfigured {
                            path: path.clone(),
                            template: template.clone(),
                        })?;
                rendering_handler(controller, method, renderer, template.clone())
            }
            None => plain_handler(controller, method),
        };

        trace!(
            bundle = %controller.bundle,
            path = %path,
            methods = ?methods,
            "Mapping route"
        );

        registry.register_route(CompiledRoute {
            mount: controller.mount.clone(),
            path,
            methods,
            kind: RouteKind::Basic,
            name: route.name.clone(),
            handler,
            filters,
        })
    }

    /// Mount an RPC-style route: always POST under the method's name.
    fn map_direct_route(
        &self,
        registry: &mut Registry,
        controller: &PendingController,
        method: &MethodDescriptor,
        direct: &DirectMeta,
        filters: FilterChain,
    ) -> Result<(), Error> {
        let path = join_mount(&controller.mount, &method.name);
        trace!(bundle = %controller.bundle, path = %path, form = direct.form, "Mapping direct route");

        registry.register_route(CompiledRoute {
            mount: controller.mount.clone(),
            path,
            methods: vec![HttpMethod::POST],
            kind: RouteKind::Direct { form: direct.form },
            name: None,
            handler: plain_handler(controller, method),
            filters,
        })
    }

    /// Resolve one filter declaration into bound callbacks, in
    /// declaration order.
    fn collect_filters(
        &self,
        filter: &FilterMeta,
        pending: &[PendingController],
        owner: usize,
        before: &mut Vec<BeforeFn>,
        after: &mut Vec<AfterFn>,
    ) -> Result<(), Error> {
        for entry in &filter.methods {
            let target = locate_target(entry, pending, owner, filter.phase)?;
            match filter.phase {
                FilterPhase::Before => before.push(bind_before(target)),
                FilterPhase::After => after.push(bind_after(target)),
            }
        }
        Ok(())
    }
}

/// A resolved filter target: the owning cell plus the method body.
struct FilterTarget {
    cell: Arc<ServiceCell>,
    method: MethodDescriptor,
}

/// Locate a filter entry's target method, enforcing that it exists and
/// carries no declarations of its own.
fn locate_target(
    entry: &str,
    pending: &[PendingController],
    owner: usize,
    phase: FilterPhase,
) -> Result<FilterTarget, Error> {
    let (service_key, method_name) = match entry.split_once(':') {
        Some((service, method)) => (service.to_string(), method),
        None => (pending[owner].service_key.clone(), entry),
    };

    let controller = pending
        .iter()
        .find(|p| p.service_key == service_key)
        .ok_or_else(|| Error::ServiceNotFound(service_key.clone()))?;

    let method = controller.class.find_method(method_name).ok_or_else(|| {
        Error::ControllerMethodNotDefined {
            controller: controller.class.name.clone(),
            method: method_name.to_string(),
        }
    })?;

    if method.has_declarations() {
        return Err(Error::FilterHasAnnotation {
            controller: controller.class.name.clone(),
            method: method_name.to_string(),
            phase: phase.as_str().to_string(),
        });
    }

    Ok(FilterTarget {
        cell: controller.cell.clone(),
        method: method.clone(),
    })
}

/// Bind a Before callback: `target(request) → request | response`.
fn bind_before(target: FilterTarget) -> BeforeFn {
    let cell = target.cell;
    let body = target.method.body;
    let name = target.method.name;
    Arc::new(move |request| {
        let instance = cell.get();
        let body = body.clone();
        let name = name.clone();
        Box::pin(async move {
            let passthrough = request.clone();
            match body(instance, request, None).await? {
                MethodOutput::Request(next) => Ok(FilterFlow::Next(next)),
                MethodOutput::Response(response) => Ok(FilterFlow::Halt(response)),
                MethodOutput::None => Ok(FilterFlow::Next(passthrough)),
                MethodOutput::View(_) => Err(Error::Internal(format!(
                    "before filter '{}' returned a view context",
                    name
                ))),
            }
        })
    })
}

/// Bind an After callback: `target(request, response) → response`.
fn bind_after(target: FilterTarget) -> AfterFn {
    let cell = target.cell;
    let body = target.method.body;
    let name = target.method.name;
    Arc::new(move |request, response| {
        let instance = cell.get();
        let body = body.clone();
        let name = name.clone();
        Box::pin(async move {
            let passthrough = response.clone();
            match body(instance, request, Some(response)).await? {
                MethodOutput::Response(next) => Ok(next),
                MethodOutput::None => Ok(passthrough),
                MethodOutput::Request(_) | MethodOutput::View(_) => Err(Error::Internal(format!(
                    "after filter '{}' must return a response",
                    name
                ))),
            }
        })
    })
}

/// Handler for a route without a template: the method's return value
/// is the full response. A view context renders as JSON, no output as
/// an empty 204.
fn plain_handler(controller: &PendingController, method: &MethodDescriptor) -> HandlerFn {
    let cell = controller.cell.clone();
    let body = method.body.clone();
    let name = method.name.clone();
    Arc::new(move |request| {
        let instance = cell.get();
        let body = body.clone();
        let name = name.clone();
        Box::pin(async move {
            match body(instance, request, None).await? {
                MethodOutput::Response(response) => Ok(response),
                MethodOutput::View(context) => HttpResponse::ok().with_json(&context),
                MethodOutput::None => Ok(HttpResponse::no_content()),
                MethodOutput::Request(_) => Err(Error::Internal(format!(
                    "handler '{}' returned a request",
                    name
                ))),
            }
        })
    })
}

/// Handler for a templated route: the method produces a view context
/// and the renderer produces the body. Returning a response directly
/// bypasses the template.
fn rendering_handler(
    controller: &PendingController,
    method: &MethodDescriptor,
    renderer: Arc<dyn Renderer>,
    template: String,
) -> HandlerFn {
    let cell = controller.cell.clone();
    let body = method.body.clone();
    let name = method.name.clone();
    Arc::new(move |request| {
        let instance = cell.get();
        let body = body.clone();
        let name = name.clone();
        let renderer = renderer.clone();
        let template = template.clone();
        Box::pin(async move {
            let context = match body(instance, request, None).await? {
                MethodOutput::View(context) => context,
                MethodOutput::None => serde_json::Map::new(),
                MethodOutput::Response(response) => return Ok(response),
                MethodOutput::Request(_) => {
                    return Err(Error::Internal(format!(
                        "handler '{}' returned a request",
                        name
                    )));
                }
            };

            let rendered = renderer.render(&template, &context)?;
            Ok(HttpResponse::ok()
                .with_header("Content-Type", "text/html; charset=utf-8")
                .with_body(rendered.into_bytes()))
        })
    })
}

/// Join a path segment or pattern under a controller mount.
fn join_mount(mount: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        mount.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{method_body, ServiceInstance};
    use crate::metadata::{ControllerMeta, RouteMeta, ServiceMeta};
    use crate::source::ManifestSource;

    fn context() -> Arc<AppContext> {
        Arc::new(AppContext::new())
    }

    fn noop_ctor() -> crate::descriptor::ConstructorFn {
        Arc::new(|_ctx| Arc::new(()) as ServiceInstance)
    }

    fn ok_body() -> crate::descriptor::MethodFn {
        method_body(|_i, _r, _p| async { Ok(MethodOutput::Response(HttpResponse::ok())) })
    }

    fn bundle() -> BundleDescriptor {
        BundleDescriptor::new("demo", "demo::controller")
    }

    #[test]
    fn test_no_bundles_fails() {
        let compiler = DeclarationCompiler::new(context());
        let err = compiler.compile(&ManifestSource::new(), &[]).unwrap_err();
        assert!(matches!(err, Error::BundlesNotDefined));
    }

    #[test]
    fn test_missing_source_root_fails() {
        let compiler = DeclarationCompiler::new(context()).source_root("/nonexistent/src");
        let err = compiler
            .compile(&ManifestSource::new(), &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::SourceDirectoryNotFound(_)));
    }

    #[test]
    fn test_duplicate_bundle_fails() {
        let compiler = DeclarationCompiler::new(context());
        let err = compiler
            .compile(&ManifestSource::new(), &[bundle(), bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateBundle(_)));
    }

    #[test]
    fn test_ambiguous_class_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .service(ServiceMeta::shared());
        let source = ManifestSource::new().with("demo::controller", class);

        let compiler = DeclarationCompiler::new(context());
        let err = compiler.compile(&source, &[bundle()]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousClassMetadata(_)));
    }

    #[test]
    fn test_plain_classes_are_skipped() {
        let class = ClassDescriptor::new("demo::controller::Plain", noop_ctor());
        let source = ManifestSource::new().with("demo::controller", class);

        let registry = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap();
        assert!(registry.routes().is_empty());
        assert!(!registry.has_service("demo.controller.plain"));
    }

    #[test]
    fn test_route_without_method_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("route", ok_body()).route(RouteMeta::new().pattern("/teste")),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::RouteMethodNotDefined { .. }));
    }

    #[test]
    fn test_unknown_http_method_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("route", ok_body())
                    .route(RouteMeta::new().pattern("/teste").method("fetch")),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownHttpMethod { .. }));
    }

    #[test]
    fn test_relative_pattern_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("route", ok_body())
                    .route(RouteMeta::new().pattern("teste").method("get")),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::RoutePatternNotDefined { .. }));
    }

    #[test]
    fn test_route_and_direct_conflict_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("save", ok_body())
                    .route(RouteMeta::new().pattern("/save").method("post"))
                    .direct(DirectMeta::new()),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::RouteKindConflict { .. }));
    }

    #[test]
    fn test_template_without_renderer_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("page", ok_body()).route(
                    RouteMeta::new()
                        .pattern("/page")
                        .method("get")
                        .template("page.html"),
                ),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::RendererNotConfigured { .. }));
    }

    #[test]
    fn test_filter_naming_missing_method_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("route", ok_body())
                    .route(RouteMeta::new().pattern("/teste").method("get"))
                    .before(FilterMeta::before(["missing"])),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::ControllerMethodNotDefined { .. }));
    }

    #[test]
    fn test_filter_target_with_declarations_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("route", ok_body())
                    .route(RouteMeta::new().pattern("/teste").method("get"))
                    .before(FilterMeta::before(["guard"])),
            )
            .method(MethodDescriptor::new("guard", ok_body()).direct(DirectMeta::new()));
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::FilterHasAnnotation { .. }));
    }

    #[test]
    fn test_filter_qualifier_with_unknown_service_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("route", ok_body())
                    .route(RouteMeta::new().pattern("/teste").method("get"))
                    .before(FilterMeta::before(["demo.bar:guard"])),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::ServiceNotFound(_)));
    }

    #[test]
    fn test_duplicate_controller_key_fails() {
        let a = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new());
        let b = ClassDescriptor::new("demo::controller::legacy::Foo", noop_ctor())
            .controller(ControllerMeta::new());
        let source = ManifestSource::new()
            .with("demo::controller", a)
            .with("demo::controller", b);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateServiceKey(_)));
    }

    #[test]
    fn test_duplicate_service_key_fails() {
        let a = ClassDescriptor::new("demo::service::Mailer", noop_ctor())
            .service(ServiceMeta::shared());
        let b = ClassDescriptor::new("demo::service::Mailer", noop_ctor())
            .service(ServiceMeta::transient());
        let source = ManifestSource::new()
            .with("demo::service", a)
            .with("demo::service", b);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[BundleDescriptor::new("demo", "demo::service")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateServiceKey(_)));
    }

    #[test]
    fn test_duplicate_route_name_fails() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("a", ok_body())
                    .route(RouteMeta::new().pattern("/a").method("get").name("dup")),
            )
            .method(
                MethodDescriptor::new("b", ok_body())
                    .route(RouteMeta::new().pattern("/b").method("get").name("dup")),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let err = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRouteName(_)));
    }

    #[test]
    fn test_synthesized_path_uses_lowercased_method_name() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(
                MethodDescriptor::new("listAll", ok_body()).route(RouteMeta::new().method("get")),
            );
        let source = ManifestSource::new().with("demo::controller", class);

        let registry = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap();
        assert_eq!(registry.routes()[0].path, "/demo_Foo/listall");
    }

    #[test]
    fn test_direct_route_mounts_as_post() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new())
            .method(MethodDescriptor::new("save", ok_body()).direct(DirectMeta::new().form(true)));
        let source = ManifestSource::new().with("demo::controller", class);

        let registry = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap();
        let route = &registry.routes()[0];
        assert_eq!(route.path, "/demo_Foo/save");
        assert_eq!(route.methods, vec![HttpMethod::POST]);
        assert_eq!(route.kind, RouteKind::Direct { form: true });
    }

    #[test]
    fn test_controller_service_is_shared() {
        let class = ClassDescriptor::new("demo::controller::Foo", noop_ctor())
            .controller(ControllerMeta::new());
        let source = ManifestSource::new().with("demo::controller", class);

        let registry = DeclarationCompiler::new(context())
            .compile(&source, &[bundle()])
            .unwrap();
        let a = registry.resolve("demo.foo").unwrap().instance().unwrap();
        let b = registry.resolve("demo.foo").unwrap().instance().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_join_mount() {
        assert_eq!(join_mount("/demo_Foo/", "/teste"), "/demo_Foo/teste");
        assert_eq!(join_mount("/demo_Foo/", "save"), "/demo_Foo/save");
    }
}

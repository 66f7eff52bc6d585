//! Metadata schema for class and method declarations.
//!
//! These are the typed descriptors the declaration compiler consumes:
//! `Controller` and `Service` at the class level, `Route`, `Direct`,
//! `Before` and `After` at the method level, `Parameter` on static
//! properties. Pure data with fluent builders; the compiler owns all
//! interpretation.

/// Service lifetime policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    /// Every lookup constructs a new instance.
    Transient,
    /// First lookup constructs and caches; singleton per registry.
    Shared,
    /// Lookup yields the constructor itself, never an instance.
    ProtectedFactory,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Transient => "transient",
            Lifetime::Shared => "shared",
            Lifetime::ProtectedFactory => "protected-factory",
        }
    }

    /// Parse a lifetime policy token as written in service metadata.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "transient" => Some(Lifetime::Transient),
            "shared" => Some(Lifetime::Shared),
            "protected-factory" => Some(Lifetime::ProtectedFactory),
            _ => None,
        }
    }
}

/// Which side of the handler a filter runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterPhase {
    Before,
    After,
}

impl FilterPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPhase::Before => "before",
            FilterPhase::After => "after",
        }
    }
}

/// An ordered set of filter method references for one phase.
///
/// Each entry is either a bare method name (resolved on the owning
/// controller) or `service.key:method` for cross-controller reuse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterMeta {
    pub phase: FilterPhase,
    pub methods: Vec<String>,
}

impl FilterMeta {
    pub fn before<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phase: FilterPhase::Before,
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn after<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phase: FilterPhase::After,
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }
}

/// Class-level controller declaration.
///
/// The optional filter list applies to every route the controller
/// mounts, wrapping any route-level filters.
#[derive(Clone, Debug, Default)]
pub struct ControllerMeta {
    pub filters: Vec<FilterMeta>,
}

impl ControllerMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FilterMeta) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Class-level service declaration.
#[derive(Clone, Copy, Debug)]
pub struct ServiceMeta {
    pub lifetime: Lifetime,
}

impl ServiceMeta {
    pub fn new(lifetime: Lifetime) -> Self {
        Self { lifetime }
    }

    pub fn shared() -> Self {
        Self::new(Lifetime::Shared)
    }

    pub fn transient() -> Self {
        Self::new(Lifetime::Transient)
    }

    pub fn protected_factory() -> Self {
        Self::new(Lifetime::ProtectedFactory)
    }
}

/// Conventional HTTP route declaration.
#[derive(Clone, Debug, Default)]
pub struct RouteMeta {
    /// Path pattern under the controller mount. When absent, the
    /// lower-cased method name becomes the path segment.
    pub pattern: Option<String>,
    /// Template to render the handler's view context with.
    pub template: Option<String>,
    /// Name bound for reverse URL lookup.
    pub name: Option<String>,
    /// Single HTTP method token.
    pub method: Option<String>,
    /// Alternative list of HTTP method tokens.
    pub methods: Vec<String>,
}

impl RouteMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// The declared method tokens: the single method wins over the list.
    pub fn method_tokens(&self) -> Vec<String> {
        match &self.method {
            Some(m) => vec![m.clone()],
            None => self.methods.clone(),
        }
    }
}

/// RPC-style route declaration: always POST under the method's name.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectMeta {
    /// Forwarded to the host dispatch layer; selects multipart/form
    /// body parsing instead of a structured payload.
    pub form: bool,
}

impl DirectMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(mut self, form: bool) -> Self {
        self.form = form;
        self
    }
}

/// Marker exposing a static property as a configuration parameter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParameterMeta;

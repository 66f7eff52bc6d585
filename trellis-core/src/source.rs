//! Reflection source boundary.
//!
//! The compiler never touches a concrete reflection API; it asks a
//! [`ReflectionSource`] for the classes of a bundle and trusts the
//! descriptors it gets back verbatim. [`ManifestSource`] is the
//! standard implementation: an explicit namespace-to-classes manifest,
//! the Rust-side equivalent of an annotation reader walking a source
//! tree.

use crate::descriptor::{BundleDescriptor, ClassDescriptor};
use crate::error::Error;
use std::collections::HashMap;
use tracing::trace;

/// Enumerates candidate classes for a bundle.
///
/// Each `discover` call re-scans; the sequence is finite and carries
/// exactly the declared metadata with no interpretation.
pub trait ReflectionSource: Send + Sync {
    fn discover(&self, bundle: &BundleDescriptor) -> Result<Vec<ClassDescriptor>, Error>;
}

/// Manifest-backed reflection source.
///
/// Classes register under their bundle namespace. An unknown or empty
/// namespace yields an empty sequence, not an error; a bundle whose
/// declared source directory does not exist fails with
/// `BundleSourceNotFound`.
#[derive(Default)]
pub struct ManifestSource {
    bundles: HashMap<String, Vec<ClassDescriptor>>,
}

impl ManifestSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under a bundle namespace.
    pub fn register(&mut self, namespace: impl Into<String>, class: ClassDescriptor) -> &mut Self {
        self.bundles.entry(namespace.into()).or_default().push(class);
        self
    }

    /// Builder-style registration.
    pub fn with(mut self, namespace: impl Into<String>, class: ClassDescriptor) -> Self {
        self.register(namespace, class);
        self
    }
}

impl ReflectionSource for ManifestSource {
    fn discover(&self, bundle: &BundleDescriptor) -> Result<Vec<ClassDescriptor>, Error> {
        if let Some(dir) = &bundle.source_dir {
            if !dir.is_dir() {
                return Err(Error::BundleSourceNotFound {
                    bundle: bundle.name.clone(),
                    dir: dir.display().to_string(),
                });
            }
        }

        let classes = self.bundles.get(&bundle.namespace).cloned().unwrap_or_default();
        trace!(
            bundle = %bundle.name,
            namespace = %bundle.namespace,
            classes = classes.len(),
            "Discovered bundle classes"
        );
        Ok(classes)
    }
}

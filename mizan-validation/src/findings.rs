//! Unresolvable findings.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use mizan_container::handler::Handler;
use mizan_container::key::TypeKey;
use mizan_container::model::Dependency;
use mizan_container::registry::HandlerRegistry;

use crate::report::Report;

/// A required dependency that cannot be satisfied, and the handler that declared it.
///
/// Identity is the handler plus the [`Dependency`] value. Two identical
/// unkeyed dependencies on one component are a single finding.
#[derive(Clone)]
pub struct Finding {
    dependency: Dependency,
    handler: Arc<Handler>,
}

impl Finding {
    pub fn new(dependency: Dependency, handler: Arc<Handler>) -> Self {
        Self { dependency, handler }
    }

    #[inline]
    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    /// The consuming handler.
    #[inline]
    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }
}

impl PartialEq for Finding {
    fn eq(&self, other: &Self) -> bool {
        self.handler.id() == other.handler.id() && self.dependency == other.dependency
    }
}

impl Eq for Finding {}

impl Hash for Finding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handler.id().hash(state);
        self.dependency.hash(state);
    }
}

impl fmt::Debug for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finding")
            .field("component", &self.handler.model().name())
            .field("dependency", &self.dependency)
            .finish()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cannot resolve {}", self.handler.model().name(), self.dependency)
    }
}

/// The set of findings from one analysis. Empty means every required
/// dependency is resolvable, directly or through a factory.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    inner: HashSet<Finding>,
}

impl Findings {
    pub(crate) fn insert(&mut self, finding: Finding) -> bool {
        self.inner.insert(finding)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.inner.iter()
    }

    pub fn contains(&self, finding: &Finding) -> bool {
        self.inner.contains(finding)
    }

    /// Findings whose consuming handler supports `ty`.
    pub fn for_service(&self, ty: &TypeKey) -> impl Iterator<Item = &Finding> {
        let ty = *ty;
        self.inner.iter().filter(move |f| f.handler.supports(&ty))
    }

    /// Findings whose consuming handler can be requested as `T`.
    pub fn for_component<T: ?Sized + 'static>(&self) -> Vec<&Finding> {
        self.for_service(&TypeKey::of::<T>()).collect()
    }

    /// `true` if some handler serving `T` has a finding.
    pub fn has_invalid_component<T: ?Sized + 'static>(&self) -> bool {
        self.for_service(&TypeKey::of::<T>()).next().is_some()
    }

    /// `true` if no handler serving `T` has a finding.
    pub fn has_valid_component<T: ?Sized + 'static>(&self) -> bool {
        !self.has_invalid_component::<T>()
    }

    /// Builds a human- and machine-readable report against the analyzed registry.
    ///
    /// Suggestions are drawn from the service types of its registered handlers.
    pub fn report<R: HandlerRegistry + ?Sized>(&self, registry: &R) -> Report {
        let mut services: Vec<TypeKey> = registry
            .all_handlers()
            .iter()
            .flat_map(|handler| handler.model().services().to_vec())
            .collect();
        services.sort();
        services.dedup();
        Report::new(self, &services)
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::collections::hash_set::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a Findings {
    type Item = &'a Finding;
    type IntoIter = std::collections::hash_set::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

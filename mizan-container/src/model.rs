//! Component models: what a component offers and what it needs.

use std::fmt;
use std::sync::Arc;

use anymap2::SendSyncAnyMap;

use crate::factory::FactoryMap;
use crate::key::TypeKey;
use crate::lifestyle::Lifestyle;

/// One construction requirement of a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    target: TypeKey,
    key: Option<String>,
    optional: bool,
    has_default: bool,
}

impl Dependency {
    /// A required dependency on `T`.
    pub fn on<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    pub fn new(target: TypeKey) -> Self {
        Self {
            target,
            key: None,
            optional: false,
            has_default: false,
        }
    }

    /// Sets the dependency key (the parameter name).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[inline]
    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    pub fn has_default_value(&self) -> bool {
        self.has_default
    }

    /// Neither optional nor defaulted.
    #[inline]
    pub fn is_required(&self) -> bool {
        !self.optional && !self.has_default
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{key}: {}", self.target),
            None => write!(f, "{}", self.target),
        }
    }
}

/// Opaque per-component metadata, keyed by type.
///
/// The factory machinery stores a [`FactoryMap`] here. The bag is shared,
/// so a model rebuilt for the same component sees the same properties.
pub type ExtendedProperties = Arc<SendSyncAnyMap>;

/// Description of a component: its services, implementation and dependencies.
///
/// Models are immutable once built.
#[derive(Clone)]
pub struct ComponentModel {
    name: String,
    services: Vec<TypeKey>,
    implementation: TypeKey,
    lifestyle: Lifestyle,
    dependencies: Vec<Dependency>,
    extended: ExtendedProperties,
}

impl ComponentModel {
    /// Creates a model whose only service is its implementation type.
    pub fn new(name: impl Into<String>, implementation: TypeKey) -> Self {
        Self {
            name: name.into(),
            services: vec![implementation],
            implementation,
            lifestyle: Lifestyle::default(),
            dependencies: Vec::new(),
            extended: Arc::new(SendSyncAnyMap::new()),
        }
    }

    /// Replaces the service list. An empty list keeps the implementation type.
    pub fn with_services(mut self, services: Vec<TypeKey>) -> Self {
        if !services.is_empty() {
            self.services = services;
        }
        self
    }

    pub fn with_lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = lifestyle;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_extended(mut self, extended: ExtendedProperties) -> Self {
        self.extended = extended;
        self
    }

    /// Stores a factory map in a fresh extended-properties bag.
    pub fn with_factory_map(self, map: FactoryMap) -> Self {
        let mut props = SendSyncAnyMap::new();
        props.insert(map);
        self.with_extended(Arc::new(props))
    }

    /// Unique component name inside one registry.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn services(&self) -> &[TypeKey] {
        &self.services
    }

    #[inline]
    pub fn implementation(&self) -> TypeKey {
        self.implementation
    }

    #[inline]
    pub fn lifestyle(&self) -> Lifestyle {
        self.lifestyle
    }

    #[inline]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn required_dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(|d| d.is_required())
    }

    #[inline]
    pub fn extended(&self) -> &ExtendedProperties {
        &self.extended
    }

    /// The factory map stashed in the extended properties, if any.
    pub fn factory_map(&self) -> Option<&FactoryMap> {
        self.extended.get::<FactoryMap>()
    }

    /// Returns `true` if `ty` is one of this component's services.
    pub fn supports(&self, ty: &TypeKey) -> bool {
        self.services.contains(ty)
    }
}

impl fmt::Debug for ComponentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentModel")
            .field("name", &self.name)
            .field("services", &self.services)
            .field("lifestyle", &self.lifestyle)
            .field("dependencies", &self.dependencies)
            .field("is_factory", &self.factory_map().is_some())
            .finish()
    }
}
